//! Selector catalog: logical element name -> per-locale descriptor lists

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::ElementDescriptor;
use crate::errors::CatalogError;
use crate::locale::Locale;

/// Descriptor lists for one logical element.
///
/// Locale-specific lists are tried first, then the locale-agnostic fallback
/// list is appended. Entries are read-only after load.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SelectorEntry {
    #[serde(default)]
    pub per_locale: HashMap<Locale, Vec<ElementDescriptor>>,
    #[serde(default)]
    pub fallback: Vec<ElementDescriptor>,
}

impl SelectorEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locale(
        mut self,
        locale: Locale,
        descriptors: Vec<ElementDescriptor>,
    ) -> Self {
        self.per_locale.insert(locale, descriptors);
        self
    }

    pub fn with_fallback(mut self, descriptors: Vec<ElementDescriptor>) -> Self {
        self.fallback = descriptors;
        self
    }

    /// Build the ordered trial list for the given locale: locale-specific
    /// descriptors first, then the locale-agnostic fallback descriptors.
    pub fn descriptors_for(&self, locale: Locale) -> Vec<&ElementDescriptor> {
        let mut trial: Vec<&ElementDescriptor> = self
            .per_locale
            .get(&locale)
            .map(|list| list.iter().collect())
            .unwrap_or_default();
        trial.extend(self.fallback.iter());
        trial
    }
}

/// Read-only table of logical element names, loaded once at process start.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SelectorCatalog {
    entries: HashMap<String, SelectorEntry>,
}

impl SelectorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog bundle from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|err| CatalogError::Deserialize(err.to_string()))
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: SelectorEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&SelectorEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|name| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::SelectorStrategy;
    use std::io::Write;

    fn entry() -> SelectorEntry {
        SelectorEntry::new()
            .with_locale(
                Locale::Portuguese,
                vec![ElementDescriptor::text("Nova campanha")],
            )
            .with_locale(
                Locale::English,
                vec![ElementDescriptor::text("New campaign")],
            )
            .with_fallback(vec![ElementDescriptor::css("button.new-campaign")])
    }

    #[test]
    fn trial_list_appends_fallback_last() {
        let entry = entry();
        let trial = entry.descriptors_for(Locale::Portuguese);
        assert_eq!(trial.len(), 2);
        assert_eq!(trial[0].pattern, "Nova campanha");
        assert_eq!(trial[1].strategy, SelectorStrategy::Css);
    }

    #[test]
    fn unknown_locale_uses_fallback_only() {
        let entry = entry();
        let trial = entry.descriptors_for(Locale::Unknown);
        assert_eq!(trial.len(), 1);
        assert_eq!(trial[0].pattern, "button.new-campaign");
    }

    #[test]
    fn round_trips_through_json_bundle() {
        let mut catalog = SelectorCatalog::new();
        catalog.insert("new-campaign-button", entry());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&catalog).unwrap()).unwrap();

        let loaded = SelectorCatalog::load(file.path()).unwrap();
        assert!(loaded.contains("new-campaign-button"));
        assert_eq!(
            loaded
                .get("new-campaign-button")
                .unwrap()
                .descriptors_for(Locale::English)[0]
                .pattern,
            "New campaign"
        );
    }
}
