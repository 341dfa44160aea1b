//! Consent cookie decoding.
//!
//! Decodes the raw cookie value into the flat consent map. A cookie that is
//! not valid JSON, not an object, or lacks the `_version` marker is never
//! partially trusted: the caller gets an empty map (default-deny) and the
//! condition to report.

use serde_json::Value;

use crate::consent::document::{flatten, FlatConsentMap, VERSION_KEY};
use crate::error::MalformedConsentDocument;
use crate::logging::structured::LogContext;

/// Decoder for the consent cookie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsentStore {
    expected_version: Option<u64>,
}

/// Outcome of reading the consent cookie for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsentReading {
    pub flat_map: FlatConsentMap,
    /// Whether the request carried a non-empty consent cookie at all.
    pub cookie_present: bool,
    pub condition: Option<MalformedConsentDocument>,
}

impl ConsentReading {
    /// The stored cookie predates versioning and must be expired client-side.
    pub fn needs_legacy_cleanup(&self) -> bool {
        self.condition
            .as_ref()
            .map(MalformedConsentDocument::is_legacy)
            .unwrap_or(false)
    }

    /// Whether the visitor still has to be asked for consent.
    pub fn needs_prompt(&self) -> bool {
        !self.cookie_present || self.condition.is_some()
    }
}

impl ConsentStore {
    pub fn new(expected_version: Option<u64>) -> Self {
        Self { expected_version }
    }

    /// Decode a raw cookie value into the flat consent map.
    pub fn parse(&self, raw: &str) -> Result<FlatConsentMap, MalformedConsentDocument> {
        let document: Value = serde_json::from_str(raw.trim())
            .map_err(|e| MalformedConsentDocument::InvalidJson(e.to_string()))?;

        let object = document
            .as_object()
            .ok_or(MalformedConsentDocument::NotAnObject)?;

        let version = object
            .get(VERSION_KEY)
            .and_then(Value::as_u64)
            .ok_or(MalformedConsentDocument::MissingVersion)?;

        if let Some(expected) = self.expected_version {
            if version != expected {
                return Err(MalformedConsentDocument::VersionMismatch {
                    found: version,
                    expected,
                });
            }
        }

        Ok(flatten(object))
    }

    /// Read the request's consent cookie, degrading every failure to
    /// default-deny.
    pub fn read(&self, raw: Option<&str>, ctx: &LogContext) -> ConsentReading {
        let raw = match raw.map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => raw,
            None => {
                crate::log_debug!(ctx, "CONSENT_COOKIE_ABSENT");
                return ConsentReading::default();
            }
        };

        match self.parse(raw) {
            Ok(flat_map) => {
                crate::log_debug!(ctx, "CONSENT_COOKIE_DECODED", entries = flat_map.len());
                ConsentReading {
                    flat_map,
                    cookie_present: true,
                    condition: None,
                }
            }
            Err(condition) => {
                crate::log_warn!(
                    ctx,
                    "CONSENT_COOKIE_MALFORMED",
                    reason = condition.reason(),
                    detail = condition,
                );
                ConsentReading {
                    flat_map: FlatConsentMap::new(),
                    cookie_present: true,
                    condition: Some(condition),
                }
            }
        }
    }
}
