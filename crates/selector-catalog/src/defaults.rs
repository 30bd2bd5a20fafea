//! Built-in selector catalog for the campaign wizard
//!
//! Locale-specific descriptors carry the visible strings the interface
//! renders in each language; the fallback lists carry the structural
//! selectors that survive locale changes.

use crate::catalog::{SelectorCatalog, SelectorEntry};
use crate::descriptor::ElementDescriptor as D;
use crate::locale::Locale;

/// Catalog used when no bundle file is supplied.
pub fn default_catalog() -> SelectorCatalog {
    let mut catalog = SelectorCatalog::new();

    catalog.insert(
        "top-navigation",
        SelectorEntry::new().with_fallback(vec![
            D::css("nav[role='navigation']"),
            D::css("header nav"),
            D::xpath("//nav"),
        ]),
    );

    catalog.insert(
        "new-campaign-button",
        SelectorEntry::new()
            .with_locale(Locale::Portuguese, vec![D::text("Nova campanha")])
            .with_locale(Locale::English, vec![D::text("New campaign")])
            .with_locale(Locale::Spanish, vec![D::text("Nueva campaña")])
            .with_fallback(vec![
                D::css("button[data-test-id='new-campaign']"),
                D::xpath("//button[contains(@class, 'new-campaign')]"),
            ]),
    );

    catalog.insert(
        "objective-sales",
        SelectorEntry::new()
            .with_locale(Locale::Portuguese, vec![D::text("Vendas")])
            .with_locale(Locale::English, vec![D::text("Sales")])
            .with_locale(Locale::Spanish, vec![D::text("Ventas")])
            .with_fallback(vec![D::css("div[data-test-id='objective-sales']")]),
    );

    catalog.insert(
        "objective-leads",
        SelectorEntry::new()
            .with_locale(Locale::Portuguese, vec![D::text("Leads")])
            .with_locale(Locale::English, vec![D::text("Leads")])
            .with_locale(Locale::Spanish, vec![D::text("Clientes potenciales")])
            .with_fallback(vec![D::css("div[data-test-id='objective-leads']")]),
    );

    catalog.insert(
        "objective-website-traffic",
        SelectorEntry::new()
            .with_locale(Locale::Portuguese, vec![D::text("Tráfego do website")])
            .with_locale(Locale::English, vec![D::text("Website traffic")])
            .with_locale(Locale::Spanish, vec![D::text("Tráfico del sitio web")])
            .with_fallback(vec![D::css("div[data-test-id='objective-website-traffic']")]),
    );

    catalog.insert(
        "objective-no-guidance",
        SelectorEntry::new()
            .with_locale(
                Locale::Portuguese,
                vec![D::text("Criar campanha sem orientação de objetivo")],
            )
            .with_locale(
                Locale::English,
                vec![D::text("Create a campaign without a goal's guidance")],
            )
            .with_locale(
                Locale::Spanish,
                vec![D::text("Crear una campaña sin la orientación de un objetivo")],
            )
            .with_fallback(vec![D::css("button[data-test-id='objective-none']")]),
    );

    catalog.insert(
        "campaign-name-input",
        SelectorEntry::new()
            .with_locale(Locale::Portuguese, vec![D::placeholder("nome")])
            .with_locale(Locale::English, vec![D::placeholder("name")])
            .with_locale(Locale::Spanish, vec![D::placeholder("nombre")])
            .with_fallback(vec![D::css("input[data-test-id='campaign-name-input']")]),
    );

    catalog.insert(
        "headline-input",
        SelectorEntry::new()
            .with_locale(Locale::Portuguese, vec![D::placeholder("título")])
            .with_locale(Locale::English, vec![D::placeholder("headline")])
            .with_locale(Locale::Spanish, vec![D::placeholder("título")])
            .with_fallback(vec![
                D::css("input[data-test-id='headline-input']"),
                D::xpath("//input[contains(@aria-label, 'headline')]"),
            ]),
    );

    catalog.insert(
        "budget-input",
        SelectorEntry::new()
            .with_locale(Locale::Portuguese, vec![D::placeholder("orçamento")])
            .with_locale(Locale::English, vec![D::placeholder("budget")])
            .with_locale(Locale::Spanish, vec![D::placeholder("presupuesto")])
            .with_fallback(vec![D::css("input[data-test-id='budget-input']")]),
    );

    catalog.insert(
        "max-cpc-input",
        SelectorEntry::new()
            .with_locale(Locale::Portuguese, vec![D::aria("lance máximo")])
            .with_locale(Locale::English, vec![D::aria("maximum bid")])
            .with_locale(Locale::Spanish, vec![D::aria("puja máxima")])
            .with_fallback(vec![D::css("input[data-test-id='max-cpc-input']")]),
    );

    catalog.insert(
        "location-input",
        SelectorEntry::new()
            .with_locale(Locale::Portuguese, vec![D::placeholder("localização")])
            .with_locale(Locale::English, vec![D::placeholder("location")])
            .with_locale(Locale::Spanish, vec![D::placeholder("ubicación")])
            .with_fallback(vec![D::css("input[data-test-id='location-input']")]),
    );

    catalog.insert(
        "location-suggestion",
        SelectorEntry::new().with_fallback(vec![
            D::css("div[data-test-id='location-suggestion']"),
            D::xpath("//div[contains(@class, 'suggestion')]"),
        ]),
    );

    catalog.insert(
        "location-chip",
        SelectorEntry::new().with_fallback(vec![
            D::css("div[data-test-id='location-chip']"),
            D::css("div.selected-location"),
        ]),
    );

    catalog.insert(
        "save-continue-button",
        SelectorEntry::new()
            .with_locale(Locale::Portuguese, vec![D::text("Salvar e continuar")])
            .with_locale(Locale::English, vec![D::text("Save and continue")])
            .with_locale(Locale::Spanish, vec![D::text("Guardar y continuar")])
            .with_fallback(vec![D::css("button[data-test-id='save-continue']")]),
    );

    catalog.insert(
        "publish-button",
        SelectorEntry::new()
            .with_locale(Locale::Portuguese, vec![D::text("Publicar")])
            .with_locale(Locale::English, vec![D::text("Publish")])
            .with_locale(Locale::Spanish, vec![D::text("Publicar")])
            .with_fallback(vec![D::css("button[data-test-id='publish']")]),
    );

    catalog.insert(
        "submit-confirmation",
        SelectorEntry::new()
            .with_locale(Locale::Portuguese, vec![D::text("Sua campanha foi publicada")])
            .with_locale(Locale::English, vec![D::text("Your campaign is published")])
            .with_locale(Locale::Spanish, vec![D::text("Tu campaña se ha publicado")])
            .with_fallback(vec![
                D::css("div[data-test-id='campaign-published']"),
                D::css("div.confirmation-banner"),
            ]),
    );

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 16] = [
        "top-navigation",
        "new-campaign-button",
        "objective-sales",
        "objective-leads",
        "objective-website-traffic",
        "objective-no-guidance",
        "campaign-name-input",
        "headline-input",
        "budget-input",
        "max-cpc-input",
        "location-input",
        "location-suggestion",
        "location-chip",
        "save-continue-button",
        "publish-button",
        "submit-confirmation",
    ];

    #[test]
    fn default_catalog_covers_every_wizard_element() {
        let catalog = default_catalog();
        for name in REQUIRED {
            assert!(catalog.contains(name), "missing catalog entry: {name}");
        }
    }

    #[test]
    fn every_entry_resolves_to_a_nonempty_trial_list() {
        let catalog = default_catalog();
        for name in REQUIRED {
            let entry = catalog.get(name).unwrap();
            for locale in [Locale::Portuguese, Locale::English, Locale::Spanish, Locale::Unknown] {
                assert!(
                    !entry.descriptors_for(locale).is_empty(),
                    "{name} has no descriptors for {locale}"
                );
            }
        }
    }
}
