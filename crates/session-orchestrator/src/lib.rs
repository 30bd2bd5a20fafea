//! Orchestration of campaign wizard runs across browser profiles
//!
//! One task per profile, bounded by a concurrency limit; per-profile outcomes
//! are aggregated into a run report. Profile isolation is the core contract:
//! sessions, locales and failures never leak between profiles.

pub mod orchestrator;
pub mod report;

pub use orchestrator::*;
pub use report::*;
