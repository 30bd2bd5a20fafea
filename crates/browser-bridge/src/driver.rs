//! The `BrowserDriver` trait and backend factory seam

use async_trait::async_trait;
use selector_catalog::ElementDescriptor;
use std::fmt;
use std::sync::Arc;

use crate::errors::DriverError;

/// Opaque handle to a live element on the current page.
///
/// A handle is only valid until the page replaces the element; backends
/// report replacement as [`DriverError::StaleHandle`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementHandle(pub String);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Browser-driving capability consumed by the wizard driver.
///
/// `find_element` is a single-pass existence query; the bounded polling loop
/// lives in the element resolver, not in the backend. All methods are
/// read-only with respect to page state except `navigate`, `click`,
/// `type_text` and `press_enter`.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// Query one descriptor against the live page. `Ok(None)` means no
    /// visible, interactable element currently matches.
    async fn find_element(
        &self,
        descriptor: &ElementDescriptor,
    ) -> Result<Option<ElementHandle>, DriverError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError>;

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError>;

    async fn press_enter(&self, element: &ElementHandle) -> Result<(), DriverError>;

    async fn read_text(&self, element: &ElementHandle) -> Result<String, DriverError>;

    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<(), DriverError>;

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    async fn page_source(&self) -> Result<String, DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    async fn title(&self) -> Result<String, DriverError>;

    /// The document's `lang` attribute, when the page declares one.
    async fn page_language(&self) -> Result<Option<String>, DriverError>;
}

/// Connection info for an externally managed browser session.
///
/// Produced by the profile lifecycle API; consumed by a driver factory.
#[derive(Clone, Debug, Default)]
pub struct SessionEndpoint {
    pub devtools_ws: Option<String>,
    pub debug_port: Option<u16>,
}

/// Creates a driver bound to one externally started browser session.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn connect(
        &self,
        endpoint: &SessionEndpoint,
    ) -> Result<Arc<dyn BrowserDriver>, DriverError>;
}

const STUB_REASON: &str =
    "browser bridge is stubbed; wire a devtools backend and build without the 'stub' feature";

/// Factory for the devtools backend.
///
/// The real backend lives outside this workspace; in stub mode every
/// connection attempt reports [`DriverError::Backend`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DevtoolsDriverFactory;

#[async_trait]
impl DriverFactory for DevtoolsDriverFactory {
    async fn connect(
        &self,
        endpoint: &SessionEndpoint,
    ) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        if crate::is_stubbed() {
            return Err(DriverError::Backend(STUB_REASON.to_string()));
        }
        let _ = endpoint;
        Err(DriverError::Backend(
            "no devtools backend registered".to_string(),
        ))
    }
}
