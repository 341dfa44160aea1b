//! Expiry of legacy consent cookies.
//!
//! Cookies written before the document carried `_version` may have been set
//! for the bare domain or the `www.` host. Both are expired so the visitor is
//! asked again with a clean slate.

const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Cookie domains to clear for `host`: the host itself and its
/// `www.`-stripped form. Ports are dropped, duplicates removed.
pub fn cleanup_domains(host: &str) -> Vec<String> {
    let host = strip_port(host.trim()).to_ascii_lowercase();
    if host.is_empty() {
        return Vec::new();
    }

    let mut domains = vec![host.clone()];
    if let Some(bare) = host.strip_prefix("www.") {
        if !bare.is_empty() {
            domains.push(bare.to_string());
        }
    }
    domains
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal: keep everything up to the closing bracket.
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// `Set-Cookie` values expiring `cookie_name` on every cleanup domain.
///
/// Without a usable host a single host-only directive is produced.
pub fn legacy_cleanup_directives(cookie_name: &str, host: &str) -> Vec<String> {
    let base = format!("{cookie_name}=; Expires={EXPIRED}; Max-Age=0; Path=/");
    let domains = cleanup_domains(host);
    if domains.is_empty() {
        return vec![base];
    }
    domains
        .into_iter()
        .map(|domain| format!("{base}; Domain={domain}"))
        .collect()
}
