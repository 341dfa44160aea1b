//! Per-request consent pipeline.
//!
//! Coordinates the request workflow:
//! 1. Consent cookie decoding (malformed -> default-deny)
//! 2. Legacy cookie cleanup directives
//! 3. Consent resolution against the catalog snapshot
//! 4. Security headers (page requests only)
//! 5. Banner and tracking data (page requests only)

use serde::Serialize;

use crate::catalog::categories::CategoryCatalog;
use crate::config::settings::Settings;
use crate::consent::cleanup::legacy_cleanup_directives;
use crate::consent::resolver::{ConsentResolver, ConsentState};
use crate::consent::store::{ConsentReading, ConsentStore};
use crate::security::headers::{SecurityHeaderBuilder, SecurityHeaders};
use crate::view::banner::{build_banner, BannerView};
use crate::view::tracking::{plan_tracking, TrackingPlan};

use super::context::{RequestContext, RequestKind};

/// What the host knows about the incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestInput {
    /// Already URL-decoded value of the consent cookie, if sent.
    pub consent_cookie: Option<String>,
    pub host: String,
    pub secure: bool,
    pub kind: RequestKind,
}

/// Everything computed for one request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestOutcome {
    pub request_id: String,
    pub kind: RequestKind,
    pub consent: ConsentState,
    /// Reason the stored cookie was rejected, if it was.
    pub consent_error: Option<String>,
    pub headers: Option<SecurityHeaders>,
    /// `Set-Cookie` values expiring a pre-versioning consent cookie.
    pub cookie_cleanup: Vec<String>,
    pub banner: Option<BannerView>,
    pub tracking: Option<TrackingPlan>,
}

impl RequestOutcome {
    /// Rewrite `nonce="proxy"` placeholders in outgoing markup.
    ///
    /// Uses the nonce carried by the header set, so markup and CSP agree.
    pub fn apply_to_markup<'a>(&self, markup: &'a str) -> std::borrow::Cow<'a, str> {
        match &self.headers {
            Some(headers) => headers.apply_to_markup(markup),
            None => std::borrow::Cow::Borrowed(markup),
        }
    }
}

/// Process one request.
///
/// Main entry point for the host. Never fails: a bad cookie degrades to
/// essential-only consent and is logged.
pub fn process_request(
    settings: &Settings,
    catalog: &CategoryCatalog,
    input: &RequestInput,
) -> RequestOutcome {
    let request = RequestContext::new(input.kind, input.secure);
    let ctx = request.log_context();

    let store = ConsentStore::new(settings.consent_version);
    let reading = store.read(input.consent_cookie.as_deref(), &ctx);

    let cookie_cleanup = if reading.needs_legacy_cleanup() {
        let directives = legacy_cleanup_directives(&settings.consent_cookie_name, &input.host);
        crate::log_info!(
            ctx,
            "LEGACY_COOKIE_CLEANUP",
            cookie = settings.consent_cookie_name,
            directives = directives.len(),
        );
        directives
    } else {
        Vec::new()
    };

    let consent = resolve_consent(catalog, &reading, &request);

    let (headers, banner, tracking) = if request.kind.is_page() {
        let headers = SecurityHeaderBuilder::new(settings).build(request.nonce(), request.secure, &ctx);
        let banner = build_banner(catalog, &consent, reading.needs_prompt());
        let tracking = plan_tracking(settings, &consent, request.nonce());
        (Some(headers), Some(banner), tracking)
    } else {
        crate::log_debug!(ctx, "PAGE_OUTPUT_SKIPPED", kind = request.kind.as_str());
        (None, None, None)
    };

    crate::log_info!(
        ctx,
        "REQUEST_COMPLETE",
        kind = request.kind.as_str(),
        granted = consent.granted_categories().join(","),
        tracking = tracking.is_some(),
        headers = headers.as_ref().map(SecurityHeaders::len).unwrap_or(0),
        cleanup = cookie_cleanup.len(),
        elapsed_us = request.elapsed_micros(),
    );

    RequestOutcome {
        request_id: request.request_id.clone(),
        kind: request.kind,
        consent,
        consent_error: reading.condition.as_ref().map(|c| c.to_string()),
        headers,
        cookie_cleanup,
        banner,
        tracking,
    }
}

fn resolve_consent(
    catalog: &CategoryCatalog,
    reading: &ConsentReading,
    request: &RequestContext,
) -> ConsentState {
    if reading.condition.is_some() {
        return ConsentState::default_deny(catalog);
    }
    ConsentResolver::new(catalog, &reading.flat_map).resolve(&request.log_context())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::categories::configuration_changed;
    use serde_json::Value;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.csp_enabled = true;
        settings.ga_property_id = "G-TEST".to_string();
        settings
            .category_fields
            .insert("statistics_enabled".into(), Value::Bool(true));
        settings
    }

    fn input(cookie: Option<&str>, kind: RequestKind) -> RequestInput {
        RequestInput {
            consent_cookie: cookie.map(str::to_string),
            host: "www.example.com".to_string(),
            secure: true,
            kind,
        }
    }

    #[test]
    fn test_page_request_with_consent() {
        let settings = settings();
        let catalog = configuration_changed(&settings);
        let outcome = process_request(
            &settings,
            &catalog,
            &input(Some(r#"{"statistics":true,"_version":1}"#), RequestKind::Page),
        );

        assert!(outcome.consent.allow_tracking());
        assert!(outcome.consent_error.is_none());
        assert!(outcome.cookie_cleanup.is_empty());

        let headers = outcome.headers.as_ref().unwrap();
        let csp = headers.get("Content-Security-Policy").unwrap();
        let tracking = outcome.tracking.as_ref().unwrap();
        assert!(csp.contains(&format!("'nonce-{}'", tracking.nonce)));
        assert!(!csp.contains("nonce-proxy"));

        let banner = outcome.banner.as_ref().unwrap();
        assert!(!banner.prompt);
    }

    #[test]
    fn test_markup_nonce_matches_header() {
        let settings = settings();
        let catalog = configuration_changed(&settings);
        let outcome = process_request(&settings, &catalog, &input(None, RequestKind::Page));

        let markup = outcome.apply_to_markup(r#"<script nonce="proxy">x()</script>"#);
        let token = outcome
            .headers
            .as_ref()
            .and_then(SecurityHeaders::markup_nonce)
            .unwrap()
            .as_str()
            .to_string();
        assert_eq!(markup, format!(r#"<script nonce="{token}">x()</script>"#));
    }

    #[test]
    fn test_legacy_cookie_is_cleaned_up() {
        let settings = settings();
        let catalog = configuration_changed(&settings);
        let outcome = process_request(
            &settings,
            &catalog,
            &input(Some(r#"{"statistics":true}"#), RequestKind::Page),
        );

        assert!(!outcome.consent.allow_tracking());
        assert_eq!(outcome.consent.granted_categories(), ["essential".to_string()]);
        assert_eq!(outcome.cookie_cleanup.len(), 2);
        assert!(outcome.cookie_cleanup[0].starts_with("cmnstr=;"));
        assert!(outcome.banner.unwrap().prompt);
    }

    #[test]
    fn test_malformed_cookie_degrades() {
        let settings = settings();
        let catalog = configuration_changed(&settings);
        let outcome = process_request(&settings, &catalog, &input(Some("{oops"), RequestKind::Page));

        assert!(outcome.consent_error.is_some());
        assert!(outcome.cookie_cleanup.is_empty());
        assert!(outcome.tracking.is_none());
        assert!(outcome.consent.is_unlocked("essential"));
    }

    #[test]
    fn test_admin_and_ajax_skip_page_output() {
        let settings = settings();
        let catalog = configuration_changed(&settings);
        for kind in [RequestKind::Admin, RequestKind::Ajax] {
            let outcome = process_request(
                &settings,
                &catalog,
                &input(Some(r#"{"statistics":true,"_version":1}"#), kind),
            );
            assert!(outcome.headers.is_none());
            assert!(outcome.banner.is_none());
            assert!(outcome.tracking.is_none());
            assert!(outcome.consent.allow_tracking());
            let markup = r#"<script nonce="proxy"></script>"#;
            assert_eq!(outcome.apply_to_markup(markup), markup);
        }
    }
}
