//! HTTP security header assembly.
//!
//! Computes header values only; writing them to the response (and deciding
//! whether a request gets them at all) is the transport layer's job.

use std::borrow::Cow;

use serde::Serialize;

use crate::config::settings::{FramingPolicy, Settings};
use crate::logging::structured::LogContext;
use crate::security::markup::{collapse_newlines, sanitize_report_uri, substitute_markup_nonce};
use crate::security::nonce::CspNonce;

pub const REFERRER_POLICY: &str = "Referrer-Policy";
pub const X_CONTENT_TYPE_OPTIONS: &str = "X-Content-Type-Options";
pub const STRICT_TRANSPORT_SECURITY: &str = "Strict-Transport-Security";
pub const CONTENT_SECURITY_POLICY: &str = "Content-Security-Policy";
pub const CONTENT_SECURITY_POLICY_REPORT_ONLY: &str = "Content-Security-Policy-Report-Only";
pub const CROSS_ORIGIN_OPENER_POLICY: &str = "Cross-Origin-Opener-Policy";
pub const CROSS_ORIGIN_EMBEDDER_POLICY: &str = "Cross-Origin-Embedder-Policy";
pub const CROSS_ORIGIN_RESOURCE_POLICY: &str = "Cross-Origin-Resource-Policy";
pub const PERMISSIONS_POLICY: &str = "Permissions-Policy";

/// Placeholder in the configured policy replaced by the request nonce.
pub const CSP_NONCE_PLACEHOLDER: &str = "nonce-proxy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityHeader {
    pub name: &'static str,
    pub value: String,
}

impl SecurityHeader {
    fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Headers for one response plus the nonce the markup must carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecurityHeaders {
    headers: Vec<SecurityHeader>,
    /// Set when the CSP references the nonce; markup placeholders must then
    /// receive exactly this token.
    markup_nonce: Option<CspNonce>,
}

impl SecurityHeaders {
    pub fn iter(&self) -> impl Iterator<Item = &SecurityHeader> {
        self.headers.iter()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn markup_nonce(&self) -> Option<&CspNonce> {
        self.markup_nonce.as_ref()
    }

    /// Substitute `nonce="proxy"` attributes with the token used in the CSP.
    ///
    /// Markup is returned untouched when the policy carries no nonce.
    pub fn apply_to_markup<'a>(&self, markup: &'a str) -> Cow<'a, str> {
        match &self.markup_nonce {
            Some(nonce) => substitute_markup_nonce(markup, nonce),
            None => Cow::Borrowed(markup),
        }
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.headers
            .into_iter()
            .map(|h| (h.name.to_string(), h.value))
            .collect()
    }
}

/// Builds header values from static settings and the request nonce.
#[derive(Debug, Clone, Copy)]
pub struct SecurityHeaderBuilder<'a> {
    settings: &'a Settings,
}

impl<'a> SecurityHeaderBuilder<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// All enabled headers, in a fixed order.
    ///
    /// `secure` is the host's "request arrived over TLS" fact; HSTS is
    /// withheld on plaintext connections.
    pub fn build(&self, nonce: &CspNonce, secure: bool, ctx: &LogContext) -> SecurityHeaders {
        let mut headers = Vec::new();
        let mut markup_nonce = None;

        headers.extend(self.referrer_policy());
        headers.extend(self.content_type_options());
        headers.extend(self.strict_transport_security(secure));
        if let Some((header, nonce_used)) = self.content_security_policy(nonce) {
            if nonce_used {
                markup_nonce = Some(nonce.clone());
            }
            headers.push(header);
        }
        headers.extend(self.cross_origin());
        headers.extend(self.permissions_policy());

        crate::log_debug!(
            ctx,
            "SECURITY_HEADERS_BUILT",
            count = headers.len(),
            secure = secure,
            nonce_in_markup = markup_nonce.is_some(),
        );

        SecurityHeaders {
            headers,
            markup_nonce,
        }
    }

    pub fn referrer_policy(&self) -> Option<SecurityHeader> {
        let policy = self.settings.referrer_policy.trim();
        (!policy.is_empty()).then(|| SecurityHeader::new(REFERRER_POLICY, policy))
    }

    pub fn content_type_options(&self) -> Option<SecurityHeader> {
        self.settings
            .x_content_type_options_enabled
            .then(|| SecurityHeader::new(X_CONTENT_TYPE_OPTIONS, "nosniff"))
    }

    pub fn strict_transport_security(&self, secure: bool) -> Option<SecurityHeader> {
        if !self.settings.hsts_enabled || !secure {
            return None;
        }

        let mut parts = vec![format!("max-age={}", self.settings.effective_hsts_max_age())];
        if self.settings.hsts_include_subdomains {
            parts.push("includeSubDomains".to_string());
        }
        if self.settings.hsts_preload {
            parts.push("preload".to_string());
        }

        Some(SecurityHeader::new(STRICT_TRANSPORT_SECURITY, parts.join("; ")))
    }

    /// The CSP (or report-only) header and whether it references the nonce.
    pub fn content_security_policy(&self, nonce: &CspNonce) -> Option<(SecurityHeader, bool)> {
        if !self.settings.csp_enabled {
            return None;
        }

        let name = if self.settings.csp_report_only {
            CONTENT_SECURITY_POLICY_REPORT_ONLY
        } else {
            CONTENT_SECURITY_POLICY
        };

        let mut policy = collapse_newlines(&self.settings.csp_policy);
        let nonce_used = policy.contains(CSP_NONCE_PLACEHOLDER);
        if nonce_used {
            policy = policy.replace(CSP_NONCE_PLACEHOLDER, &nonce.source());
        }
        let policy = policy.trim_end_matches(|c: char| c == ';' || c.is_whitespace());

        let mut parts = Vec::new();
        if !policy.is_empty() {
            parts.push(policy.to_string());
        }

        if !policy.contains("frame-ancestors") {
            if let Some(ancestors) = self.frame_ancestors() {
                parts.push(format!("frame-ancestors {ancestors}"));
            }
        }

        if let Some(uri) = sanitize_report_uri(&self.settings.csp_report_to) {
            parts.push(format!("report-uri {uri}"));
        }

        if parts.is_empty() {
            return None;
        }

        Some((SecurityHeader::new(name, parts.join("; ")), nonce_used))
    }

    fn frame_ancestors(&self) -> Option<String> {
        match self.settings.framing_policy {
            FramingPolicy::None => Some("'none'".to_string()),
            FramingPolicy::SelfOnly => Some("'self'".to_string()),
            FramingPolicy::Custom => {
                let origins = collapse_newlines(&self.settings.framing_custom_origins);
                (!origins.is_empty()).then_some(origins)
            }
        }
    }

    pub fn cross_origin(&self) -> Vec<SecurityHeader> {
        [
            (CROSS_ORIGIN_OPENER_POLICY, &self.settings.coop_policy),
            (CROSS_ORIGIN_EMBEDDER_POLICY, &self.settings.coep_policy),
            (CROSS_ORIGIN_RESOURCE_POLICY, &self.settings.corp_policy),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(name, value)| SecurityHeader::new(name, value.trim()))
        .collect()
    }

    pub fn permissions_policy(&self) -> Option<SecurityHeader> {
        if !self.settings.permissions_policy_enabled {
            return None;
        }
        let policy = collapse_newlines(&self.settings.permissions_policy);
        (!policy.is_empty()).then(|| SecurityHeader::new(PERMISSIONS_POLICY, policy))
    }
}
