//! Interface locale enumeration and the deterministic escalation chain

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interface locale of the target web application.
///
/// The wizard ships selector tables for three locales; `Unknown` is the
/// result of failed detection and carries no locale-specific selectors.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    Portuguese,
    English,
    Spanish,
    Unknown,
}

impl Locale {
    /// Locale priority order: primary first.
    pub const PRIORITY: [Locale; 3] = [Locale::Portuguese, Locale::English, Locale::Spanish];

    pub fn name(self) -> &'static str {
        match self {
            Locale::Portuguese => "pt",
            Locale::English => "en",
            Locale::Spanish => "es",
            Locale::Unknown => "unknown",
        }
    }

    /// Map an ISO 639-1 language code (optionally with a region suffix,
    /// e.g. `pt-BR`) to a supported locale.
    pub fn from_language_code(code: &str) -> Locale {
        let primary = code
            .split(|c| c == '-' || c == '_')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match primary.as_str() {
            "pt" => Locale::Portuguese,
            "en" => Locale::English,
            "es" => Locale::Spanish,
            _ => Locale::Unknown,
        }
    }

    /// Escalation chain for a detected locale: the detected locale first,
    /// then the remaining locales in priority order. An undetected locale
    /// contributes nothing of its own, so the chain starts at the primary.
    /// Every chain has exactly `PRIORITY.len()` entries and no duplicates,
    /// which bounds total step attempts to budget x locales.
    pub fn escalation_chain(detected: Locale) -> Vec<Locale> {
        let mut chain = Vec::with_capacity(Self::PRIORITY.len());
        if detected != Locale::Unknown {
            chain.push(detected);
        }
        for locale in Self::PRIORITY {
            if !chain.contains(&locale) {
                chain.push(locale);
            }
        }
        chain
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
