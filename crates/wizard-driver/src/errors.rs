//! Wizard driver error types

use browser_bridge::DriverError;
use selector_catalog::ElementDescriptor;
use thiserror::Error;

/// Errors surfaced while executing wizard steps.
#[derive(Debug, Error)]
pub enum WizardError {
    /// No descriptor for the element matched a live element. Recoverable:
    /// drives retry and locale escalation. Carries the last descriptor in
    /// the trial order so attempt records can name what was tried.
    #[error("element '{element}' not found with any descriptor")]
    ElementNotFound {
        element: String,
        last_tried: Option<ElementDescriptor>,
    },

    /// The step's action ran but its success signal never appeared.
    /// Handled exactly like [`WizardError::ElementNotFound`].
    #[error("post-condition failed for step '{step}': {reason}")]
    PostConditionFailed {
        step: String,
        reason: String,
        descriptor: Option<ElementDescriptor>,
    },

    /// The selector catalog carries no entry for a logical name the step
    /// sequence references. A configuration defect, not a page condition.
    #[error("logical element '{0}' is missing from the selector catalog")]
    UnknownElement(String),

    /// Backend interaction failure; retried like a missing element since
    /// an instantaneously replaced element reports the same way.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl WizardError {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, WizardError::UnknownElement(_))
    }
}
