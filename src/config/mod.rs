//! Host configuration.
//!
//! The host hands over its flat option surface once; per-category fields are
//! folded into a typed map keyed by category so nothing downstream performs
//! string-concatenated option lookups.

pub mod coerce;
pub mod settings;

pub use settings::*;
