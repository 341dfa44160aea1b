//! Request context management.
//!
//! Holds the request-scoped facts created once at request start: the id
//! used in log lines, the start time and the CSP nonce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logging::structured::LogContext;
use crate::security::nonce::CspNonce;

/// What kind of request the host is serving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    #[default]
    Page,
    Admin,
    Ajax,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Page => "page",
            RequestKind::Admin => "admin",
            RequestKind::Ajax => "ajax",
        }
    }

    /// Parse the host's request kind; anything unknown is a page.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => RequestKind::Admin,
            "ajax" => RequestKind::Ajax,
            _ => RequestKind::Page,
        }
    }

    /// Front-end page responses get headers, banner and tracking.
    pub fn is_page(&self) -> bool {
        matches!(self, RequestKind::Page)
    }
}

/// Context for a single request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub started_at: DateTime<Utc>,
    pub kind: RequestKind,
    /// Whether the request arrived over TLS.
    pub secure: bool,
    nonce: CspNonce,
}

impl RequestContext {
    pub fn new(kind: RequestKind, secure: bool) -> Self {
        Self {
            request_id: format!("req-{}", &Uuid::new_v4().simple().to_string()[..8]),
            started_at: Utc::now(),
            kind,
            secure,
            nonce: CspNonce::generate(),
        }
    }

    /// The request's nonce. Generated exactly once, in `new`.
    pub fn nonce(&self) -> &CspNonce {
        &self.nonce
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.request_id)
    }

    pub fn elapsed_micros(&self) -> i64 {
        (Utc::now() - self.started_at)
            .num_microseconds()
            .unwrap_or(i64::MAX)
    }
}
