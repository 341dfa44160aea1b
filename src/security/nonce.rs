//! Per-request CSP nonce.
//!
//! Generated once at request start from the OS CSPRNG and shared by the CSP
//! header and the markup. Generating a second one for the same request
//! breaks every inline script.

use std::fmt;

use lazy_static::lazy_static;
use rand::rngs::OsRng;
use rand::RngCore;
use regex::Regex;
use serde::Serialize;

/// Random bytes per nonce (hex-encoded to twice as many characters).
pub const NONCE_BYTES: usize = 16;

lazy_static! {
    /// Characters a nonce may carry without escaping in a header or attribute.
    static ref NONCE_TOKEN: Regex = Regex::new(r"^[A-Za-z0-9+/_=-]+$").unwrap();
}

/// Single-use CSP nonce token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CspNonce(String);

impl CspNonce {
    /// Fresh 16-byte hex nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Adopt a nonce the host already generated for this request.
    ///
    /// Rejects tokens that would need escaping in a header or attribute.
    pub fn from_token(token: &str) -> Option<Self> {
        if NONCE_TOKEN.is_match(token) {
            Some(Self(token.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// CSP source expression without quotes: `nonce-{token}`.
    pub fn source(&self) -> String {
        format!("nonce-{}", self.0)
    }
}

impl fmt::Display for CspNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
