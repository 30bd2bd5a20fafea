//! Run report aggregation

use std::collections::BTreeMap;

use adpilot_core_types::{ProfileId, RunId, RunState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use wizard_driver::FailureRecord;

/// Terminal outcome of one profile's run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileOutcome {
    Succeeded,
    /// The run failed; a failure record is present when the wizard got far
    /// enough to capture evidence (session-establishment failures carry none).
    Failed {
        reason: String,
        record: Option<Box<FailureRecord>>,
    },
    Aborted,
}

impl ProfileOutcome {
    pub fn state(&self) -> RunState {
        match self {
            ProfileOutcome::Succeeded => RunState::Succeeded,
            ProfileOutcome::Failed { .. } => RunState::Failed,
            ProfileOutcome::Aborted => RunState::Aborted,
        }
    }
}

/// Aggregate result of one orchestration run; every requested profile has
/// exactly one entry.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run: RunId,
    pub outcomes: BTreeMap<ProfileId, ProfileOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes
            .values()
            .all(|o| matches!(o, ProfileOutcome::Succeeded))
    }

    /// (succeeded, failed, aborted) counts.
    pub fn tally(&self) -> (usize, usize, usize) {
        let mut tally = (0, 0, 0);
        for outcome in self.outcomes.values() {
            match outcome {
                ProfileOutcome::Succeeded => tally.0 += 1,
                ProfileOutcome::Failed { .. } => tally.1 += 1,
                ProfileOutcome::Aborted => tally.2 += 1,
            }
        }
        tally
    }
}
