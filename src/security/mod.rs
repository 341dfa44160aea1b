//! Security module.
//!
//! Provides per-request nonces, response security headers and markup nonce
//! substitution.

pub mod headers;
pub mod markup;
pub mod nonce;

pub use headers::*;
pub use markup::*;
pub use nonce::*;
