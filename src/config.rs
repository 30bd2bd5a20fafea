//! Application configuration
//!
//! A single JSON file with one section per subsystem. Every field has a
//! compiled default, so a missing file or a partial file both work; the CLI
//! only requires explicit configuration for non-local deployments.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use profile_gateway::{RetryPolicy, DEFAULT_API_URL};
use serde::{Deserialize, Serialize};
use wizard_driver::{ResolverConfig, RetryBudget, WizardConfig};

/// Top-level configuration bundle.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewaySection,
    pub automation: AutomationSection,
    pub wizard: WizardSection,
    pub logging: LoggingSection,
}

/// Profile lifecycle API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    pub api_url: String,
    pub timeout_secs: u64,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            retry_max_attempts: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 10_000,
        }
    }
}

impl GatewaySection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            jitter: true,
        }
    }
}

/// Orchestration-level settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSection {
    pub max_concurrency: usize,
    pub evidence_dir: PathBuf,
    /// Location of the named selection sets file.
    pub selections_path: Option<PathBuf>,
}

impl Default for AutomationSection {
    fn default() -> Self {
        Self {
            max_concurrency: 3,
            evidence_dir: PathBuf::from("evidence"),
            selections_path: None,
        }
    }
}

/// Wizard executor settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardSection {
    pub base_url: String,
    pub session_timeout_secs: u64,
    pub descriptor_wait_ms: u64,
    pub poll_interval_ms: u64,
    /// Optional selector bundle overriding the built-in catalog.
    pub catalog_path: Option<PathBuf>,
    pub retry: RetrySection,
}

impl Default for WizardSection {
    fn default() -> Self {
        let wizard = WizardConfig::default();
        let resolver = ResolverConfig::default();
        Self {
            base_url: wizard.base_url,
            session_timeout_secs: wizard.session_timeout.as_secs(),
            descriptor_wait_ms: resolver.descriptor_wait.as_millis() as u64,
            poll_interval_ms: resolver.poll_interval.as_millis() as u64,
            catalog_path: None,
            retry: RetrySection::default(),
        }
    }
}

impl WizardSection {
    pub fn wizard_config(&self) -> WizardConfig {
        WizardConfig {
            base_url: self.base_url.clone(),
            session_timeout: Duration::from_secs(self.session_timeout_secs),
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            descriptor_wait: Duration::from_millis(self.descriptor_wait_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn retry_budget(&self) -> RetryBudget {
        RetryBudget {
            max_attempts: self.retry.max_attempts,
            base_delay_ms: self.retry.base_delay_ms,
            multiplier: self.retry.multiplier,
        }
    }
}

/// Per-step retry budget settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetrySection {
    fn default() -> Self {
        let budget = RetryBudget::default();
        Self {
            max_attempts: budget.max_attempts,
            base_delay_ms: budget.base_delay_ms,
            multiplier: budget.multiplier,
        }
    }
}

/// Logging settings; `RUST_LOG` overrides the configured filter.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from an explicit path, the default location, or defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("adpilot").join("config.json"))
    }

    pub fn selections_path(&self) -> PathBuf {
        self.automation
            .selections_path
            .clone()
            .or_else(|| dirs::config_dir().map(|dir| dir.join("adpilot").join("selections.json")))
            .unwrap_or_else(|| PathBuf::from("selections.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = AppConfig::default();
        assert_eq!(config.gateway.api_url, DEFAULT_API_URL);
        assert_eq!(config.automation.max_concurrency, 3);
        assert_eq!(config.wizard.retry.max_attempts, 3);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "automation": { "max_concurrency": 5 } }"#).unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.automation.max_concurrency, 5);
        assert_eq!(config.gateway.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }
}
