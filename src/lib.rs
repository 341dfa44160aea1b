//! ConsentKit Core - Consent resolution and response hardening
//!
//! This crate decides, per request, which consent categories a visitor has
//! authorized and computes the security headers for the response. It is
//! exposed to Python via PyO3 behind the `python` feature. The
//! implementation prioritizes:
//!
//! 1. **Default-deny** - A cookie that cannot be trusted grants nothing
//! 2. **Logging** - Every decision point logged with request context
//! 3. **Request scope** - State is built once per request and never shared
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Per-request orchestrator
//! - `consent` - Cookie decoding and hierarchical consent resolution
//! - `catalog` - Consent categories and the cookie declaration parser
//! - `security` - CSP nonces, security headers, markup nonce substitution
//! - `gate` - Masking of embedded content until consent is given
//! - `view` - Banner, cookie table and tracking data for the renderer
//! - `config` - Host settings
//! - `logging` - Structured logging with request context

pub mod catalog;
pub mod config;
pub mod consent;
pub mod error;
pub mod gate;
pub mod logging;
pub mod pipeline;
pub mod security;
pub mod view;

#[cfg(feature = "python")]
mod python;

pub use catalog::{configuration_changed, CatalogHandle, CategoryCatalog};
pub use config::{load_settings_file, Settings};
pub use consent::{ConsentResolver, ConsentState, ConsentStore};
pub use error::{ConfigError, MalformedConsentDocument};
pub use pipeline::{process_request, RequestInput, RequestKind, RequestOutcome};
pub use security::{CspNonce, SecurityHeaderBuilder, SecurityHeaders};

/// Initialize the module-level logger.
///
/// Safe to call repeatedly; only the first call installs the logger.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}
