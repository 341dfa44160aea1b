//! Consent module.
//!
//! Turns the visitor's stored consent cookie into a request-scoped decision:
//! - `document` - flat <-> nested conversion of the consent document
//! - `store` - decoding and validation of the raw cookie value
//! - `resolver` - hierarchical unlock logic and the consent-signal vector
//! - `cleanup` - expiry directives for legacy (unversioned) cookies

pub mod cleanup;
pub mod document;
pub mod resolver;
pub mod store;

pub use cleanup::*;
pub use document::*;
pub use resolver::*;
pub use store::*;
