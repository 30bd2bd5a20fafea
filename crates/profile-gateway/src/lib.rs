//! Profile lifecycle collaborator
//!
//! Client for the local profile-manager HTTP API (start/stop/list a browser
//! session by profile id). The orchestrator consumes the [`ProfileLifecycle`]
//! trait; this crate supplies the HTTP implementation and a scripted
//! in-memory double for tests.

pub mod api;
pub mod errors;
pub mod http;
pub mod scripted;

pub use api::*;
pub use errors::*;
pub use http::*;
pub use scripted::*;
