//! Shared primitives for the AdPilot campaign wizard driver crates.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a managed browser profile, as reported by the lifecycle API.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ProfileId(pub String);

impl ProfileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one orchestration run across a set of profiles.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of one profile's wizard run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Aborted,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Succeeded | RunState::Failed | RunState::Aborted
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            RunState::Pending => "pending",
            RunState::Running => "running",
            RunState::Succeeded => "succeeded",
            RunState::Failed => "failed",
            RunState::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the four campaign objectives the wizard accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignObjective {
    Sales,
    Leads,
    WebsiteTraffic,
    NoGuidance,
}

impl CampaignObjective {
    /// Logical selector-catalog name of the objective card for this objective.
    pub fn element_name(self) -> &'static str {
        match self {
            CampaignObjective::Sales => "objective-sales",
            CampaignObjective::Leads => "objective-leads",
            CampaignObjective::WebsiteTraffic => "objective-website-traffic",
            CampaignObjective::NoGuidance => "objective-no-guidance",
        }
    }
}

/// User-supplied inputs for one campaign-creation run.
///
/// Immutable once an orchestration run starts; shared read-only across all
/// concurrently running sessions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignSpec {
    pub name: String,
    pub objective: CampaignObjective,
    pub titles: Vec<String>,
    pub locations: BTreeSet<String>,
    pub daily_budget: String,
    #[serde(default)]
    pub max_cpc_bid: Option<String>,
}

impl CampaignSpec {
    /// Hard limit on ad titles the wizard accepts.
    pub const MAX_TITLES: usize = 15;

    pub fn validate(&self) -> Result<(), SpecError> {
        if self.name.trim().is_empty() {
            return Err(SpecError::MissingField("name"));
        }
        if self.titles.is_empty() {
            return Err(SpecError::MissingField("titles"));
        }
        if self.titles.len() > Self::MAX_TITLES {
            return Err(SpecError::TooManyTitles {
                given: self.titles.len(),
                max: Self::MAX_TITLES,
            });
        }
        if self.titles.iter().any(|t| t.trim().is_empty()) {
            return Err(SpecError::MissingField("titles"));
        }
        if self.locations.is_empty() {
            return Err(SpecError::MissingField("locations"));
        }
        if self.daily_budget.trim().is_empty() {
            return Err(SpecError::MissingField("daily_budget"));
        }
        Ok(())
    }
}

/// Campaign spec validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("campaign spec field '{0}' is missing or empty")]
    MissingField(&'static str),

    #[error("campaign spec has {given} titles, the wizard accepts at most {max}")]
    TooManyTitles { given: usize, max: usize },
}

/// Progress update emitted to the presentation layer on every state transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub profile: ProfileId,
    pub state: RunState,
    pub current_step: Option<String>,
    pub message: String,
    pub at: chrono::DateTime<chrono::Utc>,
}

impl StatusUpdate {
    pub fn new(
        profile: ProfileId,
        state: RunState,
        current_step: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            profile,
            state,
            current_step,
            message: message.into(),
            at: chrono::Utc::now(),
        }
    }
}

/// Consumer of status updates.
///
/// Emission is fire-and-forget; a saturated or dropped consumer never blocks
/// or fails a wizard run.
pub trait StatusSink: Send + Sync {
    fn emit(&self, update: StatusUpdate);
}

/// Sink that discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullStatusSink;

impl StatusSink for NullStatusSink {
    fn emit(&self, _update: StatusUpdate) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> CampaignSpec {
        CampaignSpec {
            name: "spring-sale".into(),
            objective: CampaignObjective::Sales,
            titles: vec!["Big spring sale".into(), "Save 20% today".into()],
            locations: ["Lisbon".to_string()].into_iter().collect(),
            daily_budget: "50".into(),
            max_cpc_bid: None,
        }
    }

    #[test]
    fn valid_spec_passes() {
        assert!(spec().validate().is_ok());
    }

    #[test]
    fn rejects_too_many_titles() {
        let mut s = spec();
        s.titles = (0..16).map(|i| format!("title {i}")).collect();
        assert_eq!(
            s.validate(),
            Err(SpecError::TooManyTitles { given: 16, max: 15 })
        );
    }

    #[test]
    fn rejects_empty_locations() {
        let mut s = spec();
        s.locations.clear();
        assert_eq!(s.validate(), Err(SpecError::MissingField("locations")));
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Succeeded.is_terminal());
        assert!(RunState::Aborted.is_terminal());
        assert!(!RunState::Running.is_terminal());
    }
}
