//! Per-locale selector tables for the campaign wizard
//!
//! The catalog maps logical element names to ordered descriptor lists, one
//! list per interface locale plus one locale-agnostic fallback list. Adding
//! a locale or an alternative selector is a data change, not a code change.

pub mod catalog;
pub mod defaults;
pub mod descriptor;
pub mod errors;
pub mod locale;
pub mod popups;

pub use catalog::*;
pub use descriptor::*;
pub use errors::*;
pub use locale::*;
pub use popups::*;
