//! Campaign wizard automation driver core
//!
//! Drives the fixed campaign-creation step sequence against a live browser
//! session: locale detection, per-locale element resolution with fallback
//! ordering, popup interception, retry with backoff and locale escalation,
//! and failure diagnostics capture.

pub mod context;
pub mod diagnostics;
pub mod errors;
pub mod executor;
pub mod locale;
pub mod popups;
pub mod resolver;
pub mod steps;

pub use context::*;
pub use diagnostics::*;
pub use errors::*;
pub use executor::*;
pub use locale::*;
pub use popups::*;
pub use resolver::*;
pub use steps::*;
