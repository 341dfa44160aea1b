//! Error types.
//!
//! None of these abort a request. Consent decoding failures degrade to
//! default-deny, configuration failures surface to the host at load time.

use thiserror::Error;

/// The stored consent cookie could not be trusted.
///
/// Recovered locally: the visitor is treated as having granted only the
/// essential category and is prompted again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedConsentDocument {
    #[error("consent cookie is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("consent document is not a JSON object")]
    NotAnObject,

    #[error("consent document has no _version marker")]
    MissingVersion,

    #[error("consent document version {found} does not match expected {expected}")]
    VersionMismatch { found: u64, expected: u64 },
}

impl MalformedConsentDocument {
    /// Legacy documents (no version marker) must also be cleared client-side.
    pub fn is_legacy(&self) -> bool {
        matches!(self, MalformedConsentDocument::MissingVersion)
    }

    /// Short machine-readable reason for log lines.
    pub fn reason(&self) -> &'static str {
        match self {
            MalformedConsentDocument::InvalidJson(_) => "invalid_json",
            MalformedConsentDocument::NotAnObject => "not_an_object",
            MalformedConsentDocument::MissingVersion => "missing_version",
            MalformedConsentDocument::VersionMismatch { .. } => "version_mismatch",
        }
    }
}

/// Errors raised while loading host settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings are not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unknown framing policy: {0}")]
    UnknownFramingPolicy(String),

    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
}
