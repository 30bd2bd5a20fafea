//! HTTP client for the local profile-manager API
//!
//! Wire format is the conventional local-API envelope: `{ code, msg, data }`
//! with `code == 0` on success. Transport failures are retried with jittered
//! exponential backoff; API verdicts are returned as-is.

use std::time::Duration;

use adpilot_core_types::ProfileId;
use async_trait::async_trait;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::{ProfileInfo, ProfileLifecycle, ProfileStatus, SessionHandle};
use crate::errors::GatewayError;

/// Default local endpoint of the profile manager.
pub const DEFAULT_API_URL: &str = "http://localhost:50325";

/// Bounded jittered exponential retry for transport failures.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry: `base * 2^(attempt-1)`, capped, with
    /// up to 25% additive jitter to avoid thundering the local API.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = 2u64.saturating_pow(attempt.saturating_sub(1));
        let base_ms = (self.base_delay.as_millis() as u64).saturating_mul(exp);
        let capped_ms = base_ms.min(self.max_delay.as_millis() as u64);
        let jitter_ms = if self.jitter && capped_ms > 0 {
            rand::thread_rng().gen_range(0..=capped_ms / 4)
        } else {
            0
        };
        Duration::from_millis(capped_ms + jitter_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ProfileList {
    #[serde(default)]
    list: Vec<RawProfile>,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    user_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StartData {
    #[serde(default)]
    ws: Option<WsEndpoints>,
    #[serde(default)]
    debug_port: Option<String>,
    #[serde(default)]
    webdriver: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WsEndpoints {
    #[serde(default)]
    puppeteer: Option<String>,
    #[serde(default)]
    selenium: Option<String>,
}

/// HTTP implementation of [`ProfileLifecycle`].
pub struct HttpProfileGateway {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpProfileGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            retry,
        }
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Envelope<T>, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|err| GatewayError::ServiceUnreachable(err.to_string()))?;
        response
            .json::<Envelope<T>>()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }

    async fn get_with_retry<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Envelope<T>, GatewayError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.get_once(path, query).await {
                Ok(envelope) => return Ok(envelope),
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay(attempt);
                    warn!(
                        path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "profile service unreachable, retrying"
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn classify(profile: &ProfileId, code: i64, msg: Option<String>) -> GatewayError {
        let message = msg.unwrap_or_else(|| "unknown error".to_string());
        let lowered = message.to_ascii_lowercase();
        if lowered.contains("not exist") || lowered.contains("not found") {
            GatewayError::NotFound(profile.0.clone())
        } else if lowered.contains("already") || lowered.contains("is open") {
            GatewayError::AlreadyRunning(profile.0.clone())
        } else {
            GatewayError::Api { code, message }
        }
    }
}

#[async_trait]
impl ProfileLifecycle for HttpProfileGateway {
    async fn list_profiles(&self) -> Result<Vec<ProfileInfo>, GatewayError> {
        let envelope: Envelope<ProfileList> = self
            .get_with_retry("/api/v1/user/list", &[("page_size", "2000")])
            .await?;
        if envelope.code != 0 {
            return Err(GatewayError::Api {
                code: envelope.code,
                message: envelope.msg.unwrap_or_default(),
            });
        }
        let profiles = envelope
            .data
            .map(|d| d.list)
            .unwrap_or_default()
            .into_iter()
            .map(|raw| ProfileInfo {
                id: ProfileId(raw.user_id),
                name: raw.name.unwrap_or_default(),
                status: match raw.status.as_deref() {
                    Some("Active") | Some("active") => ProfileStatus::Running,
                    Some(_) => ProfileStatus::Available,
                    None => ProfileStatus::Unknown,
                },
            })
            .collect::<Vec<_>>();
        info!(count = profiles.len(), "listed profiles");
        Ok(profiles)
    }

    async fn start_session(&self, profile: &ProfileId) -> Result<SessionHandle, GatewayError> {
        debug!(profile = %profile, "starting browser session");
        let envelope: Envelope<StartData> = self
            .get_with_retry(
                "/api/v1/browser/start",
                &[("user_id", profile.0.as_str()), ("open_tabs", "1")],
            )
            .await?;
        if envelope.code != 0 {
            return Err(Self::classify(profile, envelope.code, envelope.msg));
        }
        let data = envelope
            .data
            .ok_or_else(|| GatewayError::Decode("start response carries no data".into()))?;
        let mut handle = SessionHandle::new(profile.clone());
        if let Some(ws) = data.ws {
            handle.devtools_ws = ws.puppeteer.or(ws.selenium);
        }
        handle.debug_port = data.debug_port.and_then(|port| port.parse().ok());
        handle.webdriver_path = data.webdriver;
        info!(profile = %profile, "browser session started");
        Ok(handle)
    }

    async fn stop_session(&self, profile: &ProfileId) -> Result<(), GatewayError> {
        debug!(profile = %profile, "stopping browser session");
        let envelope: Envelope<serde_json::Value> = self
            .get_with_retry("/api/v1/browser/stop", &[("user_id", profile.0.as_str())])
            .await?;
        if envelope.code != 0 {
            return Err(Self::classify(profile, envelope.code, envelope.msg));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_decodes_profile_list() {
        let raw = r#"{
            "code": 0,
            "msg": "success",
            "data": { "list": [
                { "user_id": "p1", "name": "warm-account" },
                { "user_id": "p2", "name": "fresh", "status": "Active" }
            ]}
        }"#;
        let envelope: Envelope<ProfileList> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.code, 0);
        let list = envelope.data.unwrap().list;
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].user_id, "p1");
        assert_eq!(list[1].status.as_deref(), Some("Active"));
    }

    #[test]
    fn envelope_decodes_start_data() {
        let raw = r#"{
            "code": 0,
            "data": {
                "ws": { "puppeteer": "ws://127.0.0.1:9222/devtools", "selenium": "127.0.0.1:9222" },
                "debug_port": "9222",
                "webdriver": "/opt/chromedriver"
            }
        }"#;
        let envelope: Envelope<StartData> = serde_json::from_str(raw).unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data.debug_port.as_deref(), Some("9222"));
        assert!(data.ws.unwrap().puppeteer.unwrap().starts_with("ws://"));
    }

    #[test]
    fn classification_of_api_verdicts() {
        let profile = ProfileId::new("p1");
        assert!(matches!(
            HttpProfileGateway::classify(&profile, -1, Some("user account does not exist".into())),
            GatewayError::NotFound(_)
        ));
        assert!(matches!(
            HttpProfileGateway::classify(&profile, -1, Some("browser is already open".into())),
            GatewayError::AlreadyRunning(_)
        ));
        assert!(matches!(
            HttpProfileGateway::classify(&profile, 500, Some("internal".into())),
            GatewayError::Api { code: 500, .. }
        ));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(400),
            jitter: false,
        };
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(3), Duration::from_millis(400));
        // capped
        assert_eq!(policy.delay(6), Duration::from_millis(400));
    }
}
