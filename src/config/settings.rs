//! Static host settings.
//!
//! Mirrors the host's option surface. Defaults match what a fresh
//! installation ships with.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::catalog::categories::BASE_CATEGORY_KEYS;
use crate::config::coerce::{
    lenient_bool, lenient_optional_u64, lenient_u64, value_to_bool, value_to_string, value_to_text,
};
use crate::error::ConfigError;

pub const DEFAULT_HSTS_MAX_AGE: u64 = 31_536_000;
pub const DEFAULT_CONSENT_COOKIE: &str = "cmnstr";
pub const DEFAULT_MASK_PROMPT: &str = "This content requires your consent to {category}";
pub const DEFAULT_CSP_POLICY: &str = "default-src 'self' 'nonce-proxy' 'strict-dynamic'; style-src-attr 'unsafe-inline'; img-src 'self' data:; form-action 'self'; upgrade-insecure-requests; block-all-mixed-content;";

/// Source of the `frame-ancestors` directive when the policy omits one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FramingPolicy {
    None,
    #[default]
    SelfOnly,
    Custom,
}

impl FramingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FramingPolicy::None => "none",
            FramingPolicy::SelfOnly => "self",
            FramingPolicy::Custom => "custom",
        }
    }
}

impl TryFrom<String> for FramingPolicy {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "none" | "" => Ok(FramingPolicy::None),
            "self" => Ok(FramingPolicy::SelfOnly),
            "custom" => Ok(FramingPolicy::Custom),
            other => Err(ConfigError::UnknownFramingPolicy(other.to_string())),
        }
    }
}

impl From<FramingPolicy> for String {
    fn from(policy: FramingPolicy) -> Self {
        policy.as_str().to_string()
    }
}

impl fmt::Display for FramingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category customization, assembled once from the flat option surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryConfig {
    pub enabled: bool,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Raw cookie/group declaration text.
    pub cookies: String,
    /// Consent prompt override for masked content of this category.
    pub prompt: Option<String>,
}

/// Settings consumed by the consent and security-header core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub referrer_policy: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub x_content_type_options_enabled: bool,

    #[serde(deserialize_with = "lenient_bool")]
    pub hsts_enabled: bool,
    #[serde(deserialize_with = "lenient_u64")]
    pub hsts_max_age: u64,
    #[serde(deserialize_with = "lenient_bool")]
    pub hsts_include_subdomains: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub hsts_preload: bool,

    #[serde(deserialize_with = "lenient_bool")]
    pub csp_enabled: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub csp_report_only: bool,
    pub csp_policy: String,
    pub csp_report_to: String,
    pub framing_policy: FramingPolicy,
    pub framing_custom_origins: String,

    pub coop_policy: String,
    pub coep_policy: String,
    pub corp_policy: String,

    #[serde(deserialize_with = "lenient_bool")]
    pub permissions_policy_enabled: bool,
    pub permissions_policy: String,

    pub mask_prompt: String,
    pub ga_property_id: String,
    pub consent_cookie_name: String,
    /// When set, stored documents carrying a different `_version` are stale.
    #[serde(deserialize_with = "lenient_optional_u64")]
    pub consent_version: Option<u64>,

    /// Flat `{key}_enabled` / `{key}_title` / `{key}_description` /
    /// `{key}_cookies` / `{key}_prompt` options.
    #[serde(flatten)]
    pub category_fields: BTreeMap<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
            x_content_type_options_enabled: true,
            hsts_enabled: false,
            hsts_max_age: DEFAULT_HSTS_MAX_AGE,
            hsts_include_subdomains: false,
            hsts_preload: false,
            csp_enabled: false,
            csp_report_only: false,
            csp_policy: DEFAULT_CSP_POLICY.to_string(),
            csp_report_to: String::new(),
            framing_policy: FramingPolicy::default(),
            framing_custom_origins: String::new(),
            coop_policy: "same-origin-allow-popups".to_string(),
            coep_policy: String::new(),
            corp_policy: "same-origin".to_string(),
            permissions_policy_enabled: false,
            permissions_policy: String::new(),
            mask_prompt: DEFAULT_MASK_PROMPT.to_string(),
            ga_property_id: String::new(),
            consent_cookie_name: DEFAULT_CONSENT_COOKIE.to_string(),
            consent_version: None,
            category_fields: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Parse settings from the host's JSON option dump.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        log::debug!(
            "SETTINGS_PARSED csp_enabled={} hsts_enabled={} category_fields={}",
            settings.csp_enabled,
            settings.hsts_enabled,
            settings.category_fields.len()
        );
        Ok(settings)
    }

    /// Effective HSTS max-age (0 falls back to one year).
    pub fn effective_hsts_max_age(&self) -> u64 {
        if self.hsts_max_age == 0 {
            DEFAULT_HSTS_MAX_AGE
        } else {
            self.hsts_max_age
        }
    }

    /// Fold the flat per-category options into a map keyed by category.
    ///
    /// `essential` is always enabled regardless of its stored flag.
    pub fn category_configs(&self) -> BTreeMap<String, CategoryConfig> {
        BASE_CATEGORY_KEYS
            .iter()
            .map(|key| (key.to_string(), self.category_config(key)))
            .collect()
    }

    fn category_config(&self, key: &str) -> CategoryConfig {
        let field = |suffix: &str| self.category_fields.get(&format!("{key}_{suffix}"));

        let enabled = key == crate::catalog::categories::ESSENTIAL
            || field("enabled").and_then(value_to_bool).unwrap_or(false);

        CategoryConfig {
            enabled,
            title: field("title").and_then(value_to_text),
            description: field("description").and_then(value_to_text),
            cookies: field("cookies").map(value_to_string).unwrap_or_default(),
            prompt: field("prompt").and_then(value_to_text),
        }
    }

    /// SHA-256 over the canonical JSON form; changes iff any option changes.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_string(self).unwrap_or_default();
        hex::encode(Sha256::digest(canonical.as_bytes()))
    }
}

/// Load settings from a JSON file on disk.
pub fn load_settings_file(path: impl AsRef<Path>) -> anyhow::Result<Settings> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(ConfigError::from)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    let settings = Settings::from_json_str(&raw)
        .with_context(|| format!("parsing settings from {}", path.display()))?;
    log::info!(
        "SETTINGS_LOADED path={} fingerprint={}",
        path.display(),
        &settings.fingerprint()[..12]
    );
    Ok(settings)
}
