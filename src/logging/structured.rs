//! Structured logging utilities.
//!
//! Provides context-aware logging with request_id and an optional
//! consent path included in every log message.

use std::fmt;

use uuid::Uuid;

/// Logging context for a single request.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub request_id: String,
    pub path: Option<String>,
}

impl LogContext {
    pub fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            path: None,
        }
    }

    /// Context with a freshly generated request id (`req-xxxxxxxx`).
    pub fn generate() -> Self {
        Self::new(&format!("req-{}", &Uuid::new_v4().simple().to_string()[..8]))
    }

    pub fn with_path(&self, path: &str) -> Self {
        Self {
            request_id: self.request_id.clone(),
            path: Some(path.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[request={}] [path={}]", self.request_id, path),
            None => write!(f, "[request={}]", self.request_id),
        }
    }
}

/// Log `EVENT key=value ...` at `$level`, prefixed by the context.
///
/// Values are rendered with `Display`.
#[macro_export]
macro_rules! log_event {
    ($level:expr, $ctx:expr, $event:literal $(, $key:ident = $value:expr)* $(,)?) => {
        log::log!(
            $level,
            concat!("{} ", $event $(, " ", stringify!($key), "={}")*),
            $ctx
            $(, $value)*
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::log_event!(log::Level::Info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::log_event!(log::Level::Warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::log_event!(log::Level::Error, $($arg)*) };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::log_event!(log::Level::Debug, $($arg)*) };
}
