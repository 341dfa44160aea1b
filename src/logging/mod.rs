//! Structured logging with request context.
//!
//! Provides logging macros and utilities that include the request_id
//! (and optionally the consent path being evaluated) in every log message.

pub mod structured;

pub use structured::*;
