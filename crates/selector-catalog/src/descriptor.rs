//! Element descriptors: a strategy tag plus a strategy-specific pattern

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy used to locate an element on a live page.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorStrategy {
    /// CSS selector matching.
    Css,

    /// Visible text content matching (substring).
    VisibleText,

    /// `aria-label` attribute matching.
    AriaLabel,

    /// `placeholder` attribute matching.
    Placeholder,

    /// Structural XPath matching.
    XPath,
}

impl SelectorStrategy {
    pub fn name(self) -> &'static str {
        match self {
            SelectorStrategy::Css => "css",
            SelectorStrategy::VisibleText => "visible-text",
            SelectorStrategy::AriaLabel => "aria-label",
            SelectorStrategy::Placeholder => "placeholder",
            SelectorStrategy::XPath => "xpath",
        }
    }
}

/// One way of finding a logical element.
///
/// Descriptors are ordered inside their list; the order encodes trial
/// priority and is never mutated at runtime.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub strategy: SelectorStrategy,
    pub pattern: String,
}

impl ElementDescriptor {
    pub fn new(strategy: SelectorStrategy, pattern: impl Into<String>) -> Self {
        Self {
            strategy,
            pattern: pattern.into(),
        }
    }

    pub fn css(pattern: impl Into<String>) -> Self {
        Self::new(SelectorStrategy::Css, pattern)
    }

    pub fn text(pattern: impl Into<String>) -> Self {
        Self::new(SelectorStrategy::VisibleText, pattern)
    }

    pub fn aria(pattern: impl Into<String>) -> Self {
        Self::new(SelectorStrategy::AriaLabel, pattern)
    }

    pub fn placeholder(pattern: impl Into<String>) -> Self {
        Self::new(SelectorStrategy::Placeholder, pattern)
    }

    pub fn xpath(pattern: impl Into<String>) -> Self {
        Self::new(SelectorStrategy::XPath, pattern)
    }
}

impl fmt::Display for ElementDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy.name(), self.pattern)
    }
}
