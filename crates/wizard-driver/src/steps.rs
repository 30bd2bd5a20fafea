//! The fixed wizard step sequence
//!
//! Seven steps in ordinal order; a step is never attempted before all prior
//! steps have succeeded. Every step carries an explicit post-condition;
//! success is never inferred from the absence of an error.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Action a step performs. The executor interprets these against the
/// campaign spec and the selector catalog.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepAction {
    /// Open the wizard's entry URL.
    Navigate,
    /// Prove an authenticated dashboard is in front of us.
    VerifyLogin,
    /// Open the new-campaign wizard, pick the objective, name the campaign.
    SelectObjective,
    /// Enter the ad titles, one headline slot at a time.
    EnterTitles,
    /// Enter target locations and accept the suggestion for each.
    ChooseLocations,
    /// Fill budget and bidding, advance to the review surface.
    Review,
    /// Publish the campaign.
    Submit,
}

impl StepAction {
    pub fn name(self) -> &'static str {
        match self {
            StepAction::Navigate => "navigate",
            StepAction::VerifyLogin => "verify-login",
            StepAction::SelectObjective => "select-objective",
            StepAction::EnterTitles => "enter-titles",
            StepAction::ChooseLocations => "choose-locations",
            StepAction::Review => "review",
            StepAction::Submit => "submit",
        }
    }
}

/// Where the expected text of a post-condition comes from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Literal(String),
    /// The last ad title of the campaign spec.
    LastTitle,
}

/// Independently observable success signal for one step.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostCondition {
    /// A catalog element is visible on the page.
    ElementVisible(String),
    /// The current URL contains the given fragment.
    UrlContains(String),
    /// The current URL matches the given regex.
    UrlMatches(String),
    /// A catalog element's text contains the expected text.
    ElementTextContains { element: String, text: TextSource },
}

/// Per-step retry budget: attempt count, base delay and backoff multiplier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryBudget {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2_000,
            multiplier: 2.0,
        }
    }
}

impl RetryBudget {
    /// Backoff before retry `attempt + 1`: `base * multiplier^(attempt-1)`,
    /// capped at 60 seconds.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let total_ms = (self.base_delay_ms as f64 * factor) as u64;
        Duration::from_millis(total_ms.min(60_000))
    }
}

/// One step of the fixed sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name: String,
    pub ordinal: usize,
    pub action: StepAction,
    pub expect: PostCondition,
    pub retry: RetryBudget,
}

/// Build the campaign wizard sequence with a shared retry budget.
pub fn wizard_steps(retry: RetryBudget) -> Vec<StepDefinition> {
    let actions: [(StepAction, PostCondition); 7] = [
        (
            StepAction::Navigate,
            PostCondition::UrlContains("ads.google.com".into()),
        ),
        (
            StepAction::VerifyLogin,
            PostCondition::ElementVisible("new-campaign-button".into()),
        ),
        (
            // The wizard only shows the naming panel once an objective has
            // been accepted, so that panel's input proves the selection.
            StepAction::SelectObjective,
            PostCondition::ElementVisible("campaign-name-input".into()),
        ),
        (
            StepAction::EnterTitles,
            PostCondition::ElementTextContains {
                element: "headline-input".into(),
                text: TextSource::LastTitle,
            },
        ),
        (
            StepAction::ChooseLocations,
            PostCondition::ElementVisible("location-chip".into()),
        ),
        (
            StepAction::Review,
            PostCondition::ElementVisible("publish-button".into()),
        ),
        (
            StepAction::Submit,
            PostCondition::ElementVisible("submit-confirmation".into()),
        ),
    ];

    actions
        .into_iter()
        .enumerate()
        .map(|(ordinal, (action, expect))| StepDefinition {
            name: action.name().to_string(),
            ordinal,
            action,
            expect,
            retry: retry.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_ordinal_ordered() {
        let steps = wizard_steps(RetryBudget::default());
        assert_eq!(steps.len(), 7);
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.ordinal, i);
        }
        assert_eq!(steps[0].action, StepAction::Navigate);
        assert_eq!(steps[6].action, StepAction::Submit);
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let budget = RetryBudget {
            max_attempts: 5,
            base_delay_ms: 1_000,
            multiplier: 2.0,
        };
        assert_eq!(budget.delay(1), Duration::from_millis(1_000));
        assert_eq!(budget.delay(2), Duration::from_millis(2_000));
        assert_eq!(budget.delay(3), Duration::from_millis(4_000));
        assert_eq!(budget.delay(30), Duration::from_secs(60));
    }

    #[test]
    fn every_step_has_an_explicit_post_condition() {
        // Guards against a step sneaking in that would "succeed" merely by
        // not raising.
        for step in wizard_steps(RetryBudget::default()) {
            match step.expect {
                PostCondition::ElementVisible(ref name) => assert!(!name.is_empty()),
                PostCondition::UrlContains(ref s) => assert!(!s.is_empty()),
                PostCondition::UrlMatches(ref s) => assert!(!s.is_empty()),
                PostCondition::ElementTextContains { ref element, .. } => {
                    assert!(!element.is_empty())
                }
            }
        }
    }
}
