//! Scripted in-memory driver
//!
//! A canned page model behind the real `BrowserDriver` API, used by the unit
//! and integration suites. Pages are scripted as element inventories plus
//! effects that fire when an element is clicked, which is enough to walk the
//! whole wizard sequence without a browser.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use selector_catalog::{ElementDescriptor, SelectorStrategy};
use tracing::debug;

use crate::driver::{BrowserDriver, DriverFactory, ElementHandle, SessionEndpoint};
use crate::errors::DriverError;

/// One element on a scripted page.
#[derive(Clone, Debug)]
pub struct ScriptedElement {
    pub id: String,
    pub matchers: Vec<ElementDescriptor>,
    pub text: String,
    pub visible: bool,
}

impl ScriptedElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            matchers: Vec::new(),
            text: String::new(),
            visible: true,
        }
    }

    pub fn with_matcher(mut self, descriptor: ElementDescriptor) -> Self {
        self.matchers.push(descriptor);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    fn matches(&self, descriptor: &ElementDescriptor) -> bool {
        if !self.visible {
            return false;
        }
        match descriptor.strategy {
            SelectorStrategy::VisibleText => self.text.contains(&descriptor.pattern),
            _ => self.matchers.iter().any(|m| m == descriptor),
        }
    }
}

/// A scripted page: url, title, declared language and element inventory.
#[derive(Clone, Debug, Default)]
pub struct ScriptedPage {
    pub url: String,
    pub title: String,
    pub lang: Option<String>,
    pub elements: Vec<ScriptedElement>,
}

impl ScriptedPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_element(mut self, element: ScriptedElement) -> Self {
        self.elements.push(element);
        self
    }
}

/// Mutation applied to the current page when a scripted effect fires.
#[derive(Clone, Debug)]
pub enum PageEffect {
    SetUrl(String),
    SetTitle(String),
    AddElement(ScriptedElement),
    RemoveElement(String),
    SetText { element: String, text: String },
}

#[derive(Default)]
struct ScriptedState {
    page: ScriptedPage,
    routes: HashMap<String, ScriptedPage>,
    click_effects: HashMap<String, Vec<PageEffect>>,
    enter_effects: HashMap<String, Vec<PageEffect>>,
    clicks: Vec<String>,
    typed: Vec<(String, String)>,
    screenshot_fails: bool,
}

impl ScriptedState {
    fn apply(&mut self, effects: Vec<PageEffect>) {
        for effect in effects {
            match effect {
                PageEffect::SetUrl(url) => self.page.url = url,
                PageEffect::SetTitle(title) => self.page.title = title,
                PageEffect::AddElement(element) => self.page.elements.push(element),
                PageEffect::RemoveElement(id) => {
                    self.page.elements.retain(|el| el.id != id);
                }
                PageEffect::SetText { element, text } => {
                    if let Some(el) = self.page.elements.iter_mut().find(|el| el.id == element) {
                        el.text = text;
                    }
                }
            }
        }
    }

    fn element(&self, id: &str) -> Option<&ScriptedElement> {
        self.page.elements.iter().find(|el| el.id == id)
    }
}

/// In-memory scripted driver.
pub struct ScriptedDriver {
    state: Mutex<ScriptedState>,
}

impl ScriptedDriver {
    pub fn new(page: ScriptedPage) -> Self {
        Self {
            state: Mutex::new(ScriptedState {
                page,
                ..Default::default()
            }),
        }
    }

    /// Register the page loaded when `navigate` is called with `url`.
    pub fn script_route(&self, url: impl Into<String>, page: ScriptedPage) {
        self.state.lock().routes.insert(url.into(), page);
    }

    /// Register effects fired when the element with `id` is clicked.
    pub fn script_click(&self, id: impl Into<String>, effects: Vec<PageEffect>) {
        self.state.lock().click_effects.insert(id.into(), effects);
    }

    /// Register effects fired when enter is pressed inside the element.
    pub fn script_enter(&self, id: impl Into<String>, effects: Vec<PageEffect>) {
        self.state.lock().enter_effects.insert(id.into(), effects);
    }

    pub fn fail_screenshots(&self) {
        self.state.lock().screenshot_fails = true;
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().clicks.clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.lock().typed.clone()
    }

    pub fn url(&self) -> String {
        self.state.lock().page.url.clone()
    }
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        debug!(url, "scripted navigation");
        match state.routes.get(url).cloned() {
            Some(page) => state.page = page,
            None => state.page.url = url.to_string(),
        }
        Ok(())
    }

    async fn find_element(
        &self,
        descriptor: &ElementDescriptor,
    ) -> Result<Option<ElementHandle>, DriverError> {
        let state = self.state.lock();
        let hit = state
            .page
            .elements
            .iter()
            .find(|el| el.matches(descriptor))
            .map(|el| ElementHandle(el.id.clone()));
        Ok(hit)
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if state.element(&element.0).is_none() {
            return Err(DriverError::StaleHandle(element.0.clone()));
        }
        state.clicks.push(element.0.clone());
        if let Some(effects) = state.click_effects.get(&element.0).cloned() {
            state.apply(effects);
        }
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let id = element.0.clone();
        match state.page.elements.iter_mut().find(|el| el.id == id) {
            Some(el) => el.text = text.to_string(),
            None => return Err(DriverError::StaleHandle(id)),
        }
        state.typed.push((id, text.to_string()));
        Ok(())
    }

    async fn press_enter(&self, element: &ElementHandle) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if state.element(&element.0).is_none() {
            return Err(DriverError::StaleHandle(element.0.clone()));
        }
        if let Some(effects) = state.enter_effects.get(&element.0).cloned() {
            state.apply(effects);
        }
        Ok(())
    }

    async fn read_text(&self, element: &ElementHandle) -> Result<String, DriverError> {
        let state = self.state.lock();
        state
            .element(&element.0)
            .map(|el| el.text.clone())
            .ok_or_else(|| DriverError::StaleHandle(element.0.clone()))
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<(), DriverError> {
        let state = self.state.lock();
        if state.element(&element.0).is_none() {
            return Err(DriverError::StaleHandle(element.0.clone()));
        }
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        let state = self.state.lock();
        if state.screenshot_fails {
            return Err(DriverError::Screenshot("scripted failure".to_string()));
        }
        Ok(b"scripted-screenshot".to_vec())
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        let state = self.state.lock();
        let mut source = format!("<html lang=\"{}\">", state.page.lang.as_deref().unwrap_or(""));
        for el in &state.page.elements {
            source.push_str(&format!("<div id=\"{}\">{}</div>", el.id, el.text));
        }
        source.push_str("</html>");
        Ok(source)
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.state.lock().page.url.clone())
    }

    async fn title(&self) -> Result<String, DriverError> {
        Ok(self.state.lock().page.title.clone())
    }

    async fn page_language(&self) -> Result<Option<String>, DriverError> {
        Ok(self.state.lock().page.lang.clone())
    }
}

/// Factory dispensing pre-registered scripted drivers, keyed by the
/// endpoint's devtools address.
#[derive(Default)]
pub struct ScriptedDriverFactory {
    drivers: Mutex<HashMap<String, Arc<dyn BrowserDriver>>>,
}

impl ScriptedDriverFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, key: impl Into<String>, driver: Arc<dyn BrowserDriver>) {
        self.drivers.lock().insert(key.into(), driver);
    }
}

#[async_trait]
impl DriverFactory for ScriptedDriverFactory {
    async fn connect(
        &self,
        endpoint: &SessionEndpoint,
    ) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        let key = endpoint
            .devtools_ws
            .clone()
            .ok_or_else(|| DriverError::Backend("endpoint carries no devtools address".into()))?;
        self.drivers
            .lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| DriverError::Backend(format!("no scripted driver for {key}")))
    }
}
