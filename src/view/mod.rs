//! Render-side view data.
//!
//! Serializable models handed to the host's templating step. Nothing here
//! produces markup.
//! - `banner` - per-category consent banner data
//! - `cookie_table` - cookie listings built from declaration text
//! - `tracking` - inputs for the tracking-code emitter

pub mod banner;
pub mod cookie_table;
pub mod tracking;

pub use banner::*;
pub use cookie_table::*;
pub use tracking::*;
