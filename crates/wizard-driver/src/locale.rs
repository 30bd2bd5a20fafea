//! Interface locale detection
//!
//! Two signals, in order: the document's `lang` attribute, then language
//! detection over the text of a fixed navigation region. Detection is
//! read-only and never raises; no signal means `Locale::Unknown`, which the
//! escalation chain handles like any other starting point.

use browser_bridge::BrowserDriver;
use selector_catalog::{Locale, SelectorCatalog};
use tracing::{debug, info};
use whatlang::Lang;

/// Logical name of the page region whose text discriminates the locale.
const PROBE_ELEMENT: &str = "top-navigation";

/// Minimum whatlang confidence before the text signal is trusted.
const MIN_CONFIDENCE: f64 = 0.2;

/// Locale detector; runs once at session start and once more on explicit
/// retry escalation at most.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocaleDetector;

impl LocaleDetector {
    pub fn new() -> Self {
        Self
    }

    pub async fn detect(&self, driver: &dyn BrowserDriver, catalog: &SelectorCatalog) -> Locale {
        if let Ok(Some(code)) = driver.page_language().await {
            let locale = Locale::from_language_code(&code);
            if locale != Locale::Unknown {
                info!(%locale, lang_attr = %code, "locale detected from document language");
                return locale;
            }
            debug!(lang_attr = %code, "document language not a supported locale");
        }

        if let Some(entry) = catalog.get(PROBE_ELEMENT) {
            for descriptor in entry.descriptors_for(Locale::Unknown) {
                let Ok(Some(handle)) = driver.find_element(descriptor).await else {
                    continue;
                };
                let Ok(text) = driver.read_text(&handle).await else {
                    continue;
                };
                if let Some(locale) = classify_text(&text) {
                    info!(%locale, "locale detected from page text");
                    return locale;
                }
            }
        }

        debug!("no locale signal matched");
        Locale::Unknown
    }
}

fn classify_text(text: &str) -> Option<Locale> {
    if text.trim().is_empty() {
        return None;
    }
    let info = whatlang::detect(text)?;
    if info.confidence() < MIN_CONFIDENCE {
        return None;
    }
    match info.lang() {
        Lang::Por => Some(Locale::Portuguese),
        Lang::Eng => Some(Locale::English),
        Lang::Spa => Some(Locale::Spanish),
        _ => None,
    }
}
