//! AdPilot CLI application
//!
//! Wires the workspace crates into a command-line tool: configuration,
//! tracing, the profile gateway, the wizard executor and the orchestrator.

pub mod cli;
pub mod config;
pub mod status;
pub mod telemetry;
