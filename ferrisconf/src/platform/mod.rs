//! Platform dispatch tables.
//!
//! This module maps platform identifiers onto the two decisions the
//! pipeline makes per device:
//!
//! - which command prints the running configuration
//!   ([`PlatformCommandTable`]), and
//! - which retrieval strategy to use ([`MethodTable`]).
//!
//! Both are immutable values built once at startup and shared between
//! concurrent host tasks.

mod method;
mod table;

pub use method::{MethodTable, RetrievalMethod};
pub use table::{DEFAULT_PLATFORM, PlatformCommandTable};
