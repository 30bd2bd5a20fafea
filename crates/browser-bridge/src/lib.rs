//! Browser-driving capability seam
//!
//! The wizard driver treats the browser as an opaque capability: open a URL,
//! query an element by descriptor, click it, type into it, read it, take a
//! screenshot. This crate defines that seam plus a scripted in-memory
//! implementation used throughout the test suites.

pub mod driver;
pub mod errors;
pub mod scripted;

pub use driver::*;
pub use errors::*;
pub use scripted::*;

/// Returns `true` when the devtools backend is compiled in stub mode.
pub const fn is_stubbed() -> bool {
    cfg!(feature = "stub")
}
