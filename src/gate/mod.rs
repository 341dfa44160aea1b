//! Content gate module.
//!
//! Decides whether embedded content tagged with a consent path is shown or
//! replaced by a consent prompt.

pub mod decision;

pub use decision::*;
