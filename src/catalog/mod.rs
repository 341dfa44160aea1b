//! Category catalog module.
//!
//! Built-in consent categories plus the subcategories (groups) declared in
//! each category's cookie text:
//! - `categories` - base categories, consent signals, the catalog itself
//! - `declarations` - the line-oriented cookie/group declaration parser
//! - `handle` - host-owned handle that rebuilds the catalog on config change

pub mod categories;
pub mod declarations;
pub mod handle;

pub use categories::*;
pub use declarations::*;
pub use handle::*;
