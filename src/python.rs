//! Python host binding.
//!
//! Thin PyO3 layer over the request pipeline. Settings arrive as the host's
//! JSON option blob; the catalog built from them is cached and rebuilt only
//! when their fingerprint changes.

use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::catalog::categories::CategoryCatalog;
use crate::catalog::declarations::parse_declarations;
use crate::catalog::handle::CatalogHandle;
use crate::config::settings::Settings;
use crate::logging::structured::LogContext;
use crate::pipeline::context::RequestKind;
use crate::pipeline::request::{process_request as run_request, RequestInput};
use crate::security::headers::SecurityHeaderBuilder;
use crate::security::nonce::CspNonce;

lazy_static! {
    static ref CATALOG: Mutex<Option<CatalogHandle>> = Mutex::new(None);
}

fn load_settings(settings_json: &str) -> PyResult<Settings> {
    Settings::from_json_str(settings_json).map_err(|e| {
        log::error!("SETTINGS_REJECTED error={}", e);
        PyValueError::new_err(e.to_string())
    })
}

fn catalog_for(settings: &Settings) -> Arc<CategoryCatalog> {
    let mut slot = CATALOG.lock();
    match slot.as_ref() {
        Some(handle) => {
            handle.apply(settings);
            handle.snapshot()
        }
        None => {
            let handle = CatalogHandle::new(settings);
            let catalog = handle.snapshot();
            *slot = Some(handle);
            catalog
        }
    }
}

/// Resolve consent and compute response data for one request.
///
/// # Arguments
/// * `settings_json` - Host option blob
/// * `consent_cookie` - URL-decoded consent cookie value, if sent
/// * `host` - Request host, used for legacy cookie cleanup
/// * `secure` - Whether the request arrived over TLS
/// * `kind` - "page", "admin" or "ajax"
#[pyfunction]
#[pyo3(signature = (settings_json, consent_cookie=None, host="".to_string(), secure=false, kind="page".to_string()))]
fn process_request(
    py: Python<'_>,
    settings_json: String,
    consent_cookie: Option<String>,
    host: String,
    secure: bool,
    kind: String,
) -> PyResult<Py<PyAny>> {
    crate::init_logger();

    let settings = load_settings(&settings_json)?;
    let catalog = catalog_for(&settings);
    let input = RequestInput {
        consent_cookie,
        host,
        secure,
        kind: RequestKind::from_str_lossy(&kind),
    };

    let outcome = run_request(&settings, &catalog, &input);

    let py_result = PyDict::new(py);
    py_result.set_item("request_id", &outcome.request_id)?;
    py_result.set_item("kind", outcome.kind.as_str())?;
    py_result.set_item("granted_categories", outcome.consent.granted_categories().to_vec())?;
    py_result.set_item("allow_tracking", outcome.consent.allow_tracking())?;
    py_result.set_item("consent_error", outcome.consent_error.as_deref())?;

    let signals = PyDict::new(py);
    for (signal, state) in outcome.consent.signal_vector().iter() {
        signals.set_item(signal.as_str(), state.as_str())?;
    }
    py_result.set_item("signals", signals)?;

    let flat = PyDict::new(py);
    for (path, granted) in outcome.consent.flat_map() {
        flat.set_item(path, *granted)?;
    }
    py_result.set_item("consent", flat)?;

    py_result.set_item("cookie_cleanup", outcome.cookie_cleanup.clone())?;

    match &outcome.headers {
        Some(headers) => {
            py_result.set_item("headers", headers.clone().into_pairs())?;
            py_result.set_item("markup_nonce", headers.markup_nonce().map(CspNonce::as_str))?;
        }
        None => {
            py_result.set_item("headers", py.None())?;
            py_result.set_item("markup_nonce", py.None())?;
        }
    }

    let banner = match &outcome.banner {
        Some(banner) => Some(
            serde_json::to_string(banner).map_err(|e| PyValueError::new_err(e.to_string()))?,
        ),
        None => None,
    };
    py_result.set_item("banner_json", banner)?;

    match &outcome.tracking {
        Some(plan) => {
            let tracking = PyDict::new(py);
            tracking.set_item("property_id", &plan.property_id)?;
            tracking.set_item("nonce", &plan.nonce)?;
            let signals = PyDict::new(py);
            for (signal, state) in plan.consent_signals.iter() {
                signals.set_item(signal.as_str(), state.as_str())?;
            }
            tracking.set_item("signals", signals)?;
            py_result.set_item("tracking", tracking)?;
        }
        None => py_result.set_item("tracking", py.None())?,
    }

    Ok(py_result.into())
}

/// Build security headers for a response.
///
/// Uses the host's nonce when given, otherwise generates one.
///
/// Returns (headers, nonce used in the markup or None)
#[pyfunction]
#[pyo3(signature = (settings_json, nonce=None, secure=false))]
fn build_security_headers(
    settings_json: String,
    nonce: Option<String>,
    secure: bool,
) -> PyResult<(Vec<(String, String)>, Option<String>)> {
    crate::init_logger();

    let settings = load_settings(&settings_json)?;
    let nonce = match nonce {
        Some(token) => CspNonce::from_token(&token)
            .ok_or_else(|| PyValueError::new_err(format!("invalid nonce token: {token:?}")))?,
        None => CspNonce::generate(),
    };

    let ctx = LogContext::generate();
    let headers = SecurityHeaderBuilder::new(&settings).build(&nonce, secure, &ctx);
    let markup_nonce = headers.markup_nonce().map(|n| n.as_str().to_string());

    Ok((headers.into_pairs(), markup_nonce))
}

/// Parse cookie/group declaration text into a list of group dicts.
#[pyfunction]
fn parse_cookie_declarations(py: Python<'_>, text: String) -> PyResult<Py<PyAny>> {
    let groups_list = PyList::empty(py);
    for group in parse_declarations(&text) {
        let group_dict = PyDict::new(py);
        group_dict.set_item("id", &group.id)?;
        group_dict.set_item("title", &group.title)?;
        group_dict.set_item("description", &group.description)?;
        group_dict.set_item("notice", &group.notice)?;

        let records = PyList::empty(py);
        for record in &group.records {
            let [name, provider, purpose, duration] = record.fields();
            let record_dict = PyDict::new(py);
            record_dict.set_item("name", name)?;
            record_dict.set_item("provider", provider)?;
            record_dict.set_item("purpose", purpose)?;
            record_dict.set_item("duration", duration)?;
            records.append(record_dict)?;
        }
        group_dict.set_item("records", records)?;

        groups_list.append(group_dict)?;
    }
    Ok(groups_list.into())
}

/// Fresh CSP nonce for hosts that render outside `process_request`.
#[pyfunction]
fn generate_nonce() -> PyResult<String> {
    Ok(CspNonce::generate().as_str().to_string())
}

/// Python module definition
#[pymodule]
fn consentkit_core(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(process_request, m)?)?;
    m.add_function(wrap_pyfunction!(build_security_headers, m)?)?;
    m.add_function(wrap_pyfunction!(parse_cookie_declarations, m)?)?;
    m.add_function(wrap_pyfunction!(generate_nonce, m)?)?;
    Ok(())
}
