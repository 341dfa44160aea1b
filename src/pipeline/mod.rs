//! Request pipeline module.
//!
//! Per-request orchestration that coordinates:
//! - Consent cookie decoding
//! - Consent resolution against the catalog snapshot
//! - Security header assembly
//! - Banner and tracking data for the renderer

pub mod context;
pub mod request;

pub use context::*;
pub use request::*;
