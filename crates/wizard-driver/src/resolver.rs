//! Element resolver with per-locale fallback ordering
//!
//! Builds the trial list as locale-specific descriptors followed by the
//! locale-agnostic fallback descriptors and tries each in order with a
//! bounded existence poll. First match wins, no scoring. Resolution is
//! read-only with respect to page state apart from implicit scrolling.

use std::sync::Arc;
use std::time::Duration;

use browser_bridge::{BrowserDriver, ElementHandle};
use selector_catalog::{ElementDescriptor, Locale, SelectorCatalog};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::errors::WizardError;

/// Bounded-wait settings for the existence poll.
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Maximum wait per descriptor before moving to the next one.
    pub descriptor_wait: Duration,
    /// Interval between existence probes.
    pub poll_interval: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            descriptor_wait: Duration::from_secs(2),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// A live element together with the descriptor that matched it.
#[derive(Clone, Debug)]
pub struct ResolvedElement {
    pub handle: ElementHandle,
    pub descriptor: ElementDescriptor,
}

/// Default element resolver.
pub struct ElementResolver {
    catalog: Arc<SelectorCatalog>,
    config: ResolverConfig,
}

impl ElementResolver {
    pub fn new(catalog: Arc<SelectorCatalog>, config: ResolverConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &SelectorCatalog {
        &self.catalog
    }

    /// Resolve a logical element name under the active locale.
    ///
    /// `Ok(None)` means every descriptor was exhausted; that is a signal for
    /// the step executor's retry policy, not an error.
    pub async fn resolve(
        &self,
        driver: &dyn BrowserDriver,
        name: &str,
        locale: Locale,
    ) -> Result<Option<ResolvedElement>, WizardError> {
        let entry = self
            .catalog
            .get(name)
            .ok_or_else(|| WizardError::UnknownElement(name.to_string()))?;
        let trial = entry.descriptors_for(locale);
        debug!(element = name, %locale, descriptors = trial.len(), "resolving element");
        let hit = self
            .resolve_descriptors(driver, &trial, self.config.descriptor_wait)
            .await;
        if hit.is_none() {
            debug!(element = name, %locale, "all descriptors exhausted");
        }
        Ok(hit)
    }

    /// Try descriptors in order, polling each until `wait` elapses.
    ///
    /// Backend failures on a single descriptor are logged and treated as a
    /// miss for that descriptor; the next descriptor still gets its trial.
    pub async fn resolve_descriptors(
        &self,
        driver: &dyn BrowserDriver,
        descriptors: &[&ElementDescriptor],
        wait: Duration,
    ) -> Option<ResolvedElement> {
        for descriptor in descriptors {
            let deadline = Instant::now() + wait;
            loop {
                match driver.find_element(descriptor).await {
                    Ok(Some(handle)) => {
                        if let Err(err) = driver.scroll_into_view(&handle).await {
                            warn!(%descriptor, "scroll into view failed: {err}");
                        }
                        debug!(%descriptor, element = %handle, "descriptor matched");
                        return Some(ResolvedElement {
                            handle,
                            descriptor: (*descriptor).clone(),
                        });
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(%descriptor, "descriptor probe failed: {err}");
                        break;
                    }
                }
                if Instant::now() >= deadline {
                    break;
                }
                sleep(self.config.poll_interval).await;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_bridge::{ScriptedDriver, ScriptedElement, ScriptedPage};
    use selector_catalog::{SelectorCatalog, SelectorEntry};

    fn catalog() -> Arc<SelectorCatalog> {
        let mut catalog = SelectorCatalog::new();
        catalog.insert(
            "new-campaign-button",
            SelectorEntry::new()
                .with_locale(
                    Locale::Portuguese,
                    vec![ElementDescriptor::text("Nova campanha")],
                )
                .with_locale(
                    Locale::English,
                    vec![ElementDescriptor::text("New campaign")],
                )
                .with_fallback(vec![ElementDescriptor::css("#new-campaign")]),
        );
        Arc::new(catalog)
    }

    fn resolver() -> ElementResolver {
        ElementResolver::new(
            catalog(),
            ResolverConfig {
                descriptor_wait: Duration::from_millis(20),
                poll_interval: Duration::from_millis(5),
            },
        )
    }

    fn page_with_button(text: &str) -> ScriptedPage {
        ScriptedPage::new("https://ads.example.com").with_element(
            ScriptedElement::new("btn")
                .with_matcher(ElementDescriptor::css("#new-campaign"))
                .with_text(text),
        )
    }

    #[tokio::test]
    async fn locale_descriptor_wins_over_fallback() {
        let driver = ScriptedDriver::new(page_with_button("Nova campanha"));
        let hit = resolver()
            .resolve(&driver, "new-campaign-button", Locale::Portuguese)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.descriptor, ElementDescriptor::text("Nova campanha"));
    }

    #[tokio::test]
    async fn falls_back_when_locale_text_misses() {
        // English text on the page, Portuguese active locale: only the
        // locale-agnostic CSS fallback matches.
        let driver = ScriptedDriver::new(page_with_button("New campaign"));
        let hit = resolver()
            .resolve(&driver, "new-campaign-button", Locale::Portuguese)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.descriptor, ElementDescriptor::css("#new-campaign"));
    }

    #[tokio::test]
    async fn exhaustion_is_none_not_an_error() {
        let driver = ScriptedDriver::new(ScriptedPage::new("about:blank"));
        let hit = resolver()
            .resolve(&driver, "new-campaign-button", Locale::English)
            .await
            .unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn unknown_logical_name_is_an_error() {
        let driver = ScriptedDriver::new(ScriptedPage::new("about:blank"));
        let err = resolver()
            .resolve(&driver, "no-such-element", Locale::English)
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::UnknownElement(_)));
        assert!(!err.is_recoverable());
    }
}
