//! Per-session execution context
//!
//! The active locale and the attempt log are values inside the context,
//! never process-wide state: that is what makes concurrent orchestration of
//! many sessions safe. The browser session handle is owned exclusively by
//! one context for its entire lifetime.

use std::sync::Arc;

use adpilot_core_types::{ProfileId, RunState};
use browser_bridge::BrowserDriver;
use chrono::{DateTime, Utc};
use selector_catalog::{ElementDescriptor, Locale};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Outcome of one step attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    ElementNotFound,
    PostConditionFailed,
    DriverFailure,
}

/// Append-only record of one step attempt; never mutated after append.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepAttemptRecord {
    pub step: String,
    pub attempt: u32,
    pub locale: Locale,
    pub descriptor: Option<ElementDescriptor>,
    pub elapsed_ms: u64,
    pub outcome: AttemptOutcome,
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

/// State owned by one profile's wizard run.
pub struct SessionContext {
    profile: ProfileId,
    driver: Arc<dyn BrowserDriver>,
    locale: Locale,
    state: RunState,
    attempts: Vec<StepAttemptRecord>,
}

impl SessionContext {
    pub fn new(profile: ProfileId, driver: Arc<dyn BrowserDriver>) -> Self {
        Self {
            profile,
            driver,
            locale: Locale::Unknown,
            state: RunState::Pending,
            attempts: Vec::new(),
        }
    }

    pub fn profile(&self) -> &ProfileId {
        &self.profile
    }

    pub fn driver(&self) -> &dyn BrowserDriver {
        self.driver.as_ref()
    }

    pub fn driver_arc(&self) -> Arc<dyn BrowserDriver> {
        Arc::clone(&self.driver)
    }

    /// Exactly one locale is active at any time.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        if locale != self.locale {
            info!(profile = %self.profile, from = %self.locale, to = %locale, "active locale changed");
            self.locale = locale;
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn set_state(&mut self, state: RunState) {
        self.state = state;
    }

    pub fn record(&mut self, record: StepAttemptRecord) {
        self.attempts.push(record);
    }

    pub fn attempts(&self) -> &[StepAttemptRecord] {
        &self.attempts
    }

    /// Distinct locales that have been attempted so far, in first-use order.
    pub fn locales_tried(&self) -> Vec<Locale> {
        let mut tried = Vec::new();
        for record in &self.attempts {
            if !tried.contains(&record.locale) {
                tried.push(record.locale);
            }
        }
        tried
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_bridge::{ScriptedDriver, ScriptedPage};

    fn record(step: &str, locale: Locale, outcome: AttemptOutcome) -> StepAttemptRecord {
        StepAttemptRecord {
            step: step.to_string(),
            attempt: 1,
            locale,
            descriptor: None,
            elapsed_ms: 5,
            outcome,
            detail: None,
            at: Utc::now(),
        }
    }

    #[test]
    fn locales_tried_deduplicates_in_order() {
        let driver = Arc::new(ScriptedDriver::new(ScriptedPage::new("x")));
        let mut ctx = SessionContext::new(ProfileId::new("p1"), driver);
        ctx.record(record("submit", Locale::Portuguese, AttemptOutcome::ElementNotFound));
        ctx.record(record("submit", Locale::Portuguese, AttemptOutcome::ElementNotFound));
        ctx.record(record("submit", Locale::English, AttemptOutcome::ElementNotFound));
        ctx.record(record("submit", Locale::Spanish, AttemptOutcome::ElementNotFound));
        assert_eq!(
            ctx.locales_tried(),
            vec![Locale::Portuguese, Locale::English, Locale::Spanish]
        );
    }
}
