//! Popup interceptor
//!
//! Sweeps the page for known transient overlays and dismisses them. Invoked
//! opportunistically around every step's primary action; absence of a
//! dismissible popup is the common case, so a sweep never raises and an
//! empty page is a no-op.

use browser_bridge::BrowserDriver;
use selector_catalog::{default_popup_patterns, PopupPattern};
use tracing::{info, warn};

use crate::resolver::ElementResolver;

/// Catalog-driven overlay dismissal.
pub struct PopupInterceptor {
    patterns: Vec<PopupPattern>,
}

impl PopupInterceptor {
    pub fn new(patterns: Vec<PopupPattern>) -> Self {
        Self { patterns }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_popup_patterns())
    }

    /// Scan for known overlays and dismiss any that are present.
    ///
    /// Returns the number of overlays dismissed. Idempotent: repeated sweeps
    /// on a page with no popups return zero and leave no trace.
    pub async fn sweep(&self, driver: &dyn BrowserDriver, resolver: &ElementResolver) -> usize {
        let mut dismissed = 0;
        for pattern in &self.patterns {
            let probes: Vec<_> = pattern.probes.iter().collect();
            let present = resolver
                .resolve_descriptors(driver, &probes, std::time::Duration::ZERO)
                .await
                .is_some();
            if !present {
                continue;
            }

            let mut closed = false;
            for descriptor in &pattern.dismiss {
                match driver.find_element(descriptor).await {
                    Ok(Some(handle)) => match driver.click(&handle).await {
                        Ok(()) => {
                            info!(pattern = %pattern.name, %descriptor, "dismissed overlay");
                            dismissed += 1;
                            closed = true;
                            break;
                        }
                        Err(err) => {
                            warn!(pattern = %pattern.name, "overlay dismiss click failed: {err}");
                        }
                    },
                    Ok(None) => {}
                    Err(err) => {
                        warn!(pattern = %pattern.name, "overlay dismiss probe failed: {err}");
                    }
                }
            }
            if !closed {
                warn!(pattern = %pattern.name, "overlay detected but no dismiss descriptor matched");
            }
        }
        dismissed
    }
}
