//! Console status rendering

use adpilot_core_types::{StatusSink, StatusUpdate};
use tracing::info;

/// Sink that renders every status transition as a structured log line.
///
/// Emission is synchronous and cheap; the orchestrator calls it from inside
/// wizard runs, so it must never block.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleStatusSink;

impl ConsoleStatusSink {
    pub fn new() -> Self {
        Self
    }
}

impl StatusSink for ConsoleStatusSink {
    fn emit(&self, update: StatusUpdate) {
        match &update.current_step {
            Some(step) => info!(
                profile = %update.profile,
                state = %update.state,
                step,
                "{}",
                update.message
            ),
            None => info!(
                profile = %update.profile,
                state = %update.state,
                "{}",
                update.message
            ),
        }
    }
}
