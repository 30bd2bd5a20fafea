//! Known transient overlay patterns and their dismiss descriptors

use serde::{Deserialize, Serialize};

use crate::descriptor::ElementDescriptor;

/// One known overlay family (cookie consent, onboarding tour, ...).
///
/// `probes` detect the overlay; `dismiss` descriptors are tried in order
/// until one of them clicks away the overlay.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopupPattern {
    pub name: String,
    pub probes: Vec<ElementDescriptor>,
    pub dismiss: Vec<ElementDescriptor>,
}

impl PopupPattern {
    pub fn new(
        name: impl Into<String>,
        probes: Vec<ElementDescriptor>,
        dismiss: Vec<ElementDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            probes,
            dismiss,
        }
    }
}

/// Built-in overlay inventory for the target application.
pub fn default_popup_patterns() -> Vec<PopupPattern> {
    vec![
        PopupPattern::new(
            "cookie-consent",
            vec![
                ElementDescriptor::css("div[role='dialog'][aria-modal='true'] .cookie-banner"),
                ElementDescriptor::css("#cookie-consent"),
            ],
            vec![
                ElementDescriptor::text("Aceitar tudo"),
                ElementDescriptor::text("Accept all"),
                ElementDescriptor::text("Aceptar todo"),
                ElementDescriptor::css("#cookie-consent button.accept"),
            ],
        ),
        PopupPattern::new(
            "onboarding-tour",
            vec![
                ElementDescriptor::css("div.onboarding-tour"),
                ElementDescriptor::css("div[data-test-id='tour-card']"),
            ],
            vec![
                ElementDescriptor::text("Pular"),
                ElementDescriptor::text("Skip"),
                ElementDescriptor::text("Omitir"),
                ElementDescriptor::aria("Close"),
            ],
        ),
        PopupPattern::new(
            "notification-prompt",
            vec![ElementDescriptor::css("div[data-test-id='notification-prompt']")],
            vec![
                ElementDescriptor::text("Agora não"),
                ElementDescriptor::text("Not now"),
                ElementDescriptor::text("Ahora no"),
                ElementDescriptor::aria("Dismiss"),
            ],
        ),
    ]
}
