//! Markup-side nonce substitution and directive value hygiene.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

use crate::security::nonce::CspNonce;

lazy_static! {
    /// `nonce="proxy"` / `nonce='proxy'` placeholder attributes
    static ref MARKUP_NONCE_PLACEHOLDER: Regex =
        Regex::new(r#"nonce=["']proxy["']"#).unwrap();

    /// Line breaks inside header values
    static ref LINE_BREAKS: Regex = Regex::new(r"[ \t]*[\r\n]+\s*").unwrap();

    /// Absolute http(s) URL with a host
    static ref HTTP_URL: Regex = Regex::new(r"^https?://[^/?#\s]+").unwrap();
}

/// Replace every nonce placeholder attribute with the request's token.
pub fn substitute_markup_nonce<'a>(markup: &'a str, nonce: &CspNonce) -> Cow<'a, str> {
    let replacement = format!("nonce=\"{}\"", nonce.as_str());
    MARKUP_NONCE_PLACEHOLDER.replace_all(markup, replacement.as_str())
}

/// Trim and turn embedded line breaks into single spaces.
pub fn collapse_newlines(value: &str) -> String {
    LINE_BREAKS.replace_all(value.trim(), " ").into_owned()
}

/// Clean a `report-uri` target.
///
/// Drops whitespace, control characters and anything that could terminate
/// the directive; accepts absolute http(s) URLs and root-relative paths.
pub fn sanitize_report_uri(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .filter(|c| !matches!(c, '"' | '\'' | ';' | ',' | '<' | '>' | '`' | '\\'))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let relative = cleaned.starts_with('/') && !cleaned.starts_with("//");
    if relative || HTTP_URL.is_match(&cleaned) {
        Some(cleaned)
    } else {
        None
    }
}
