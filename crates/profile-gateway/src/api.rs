//! Lifecycle trait and wire-facing types

use adpilot_core_types::ProfileId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;

/// Status of a managed profile as reported by the lifecycle API.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    Available,
    Running,
    Unknown,
}

/// One profile listing entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub id: ProfileId,
    pub name: String,
    pub status: ProfileStatus,
}

/// Connection details for a started browser session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    pub profile: ProfileId,
    pub devtools_ws: Option<String>,
    pub debug_port: Option<u16>,
    pub webdriver_path: Option<String>,
}

impl SessionHandle {
    pub fn new(profile: ProfileId) -> Self {
        Self {
            profile,
            devtools_ws: None,
            debug_port: None,
            webdriver_path: None,
        }
    }
}

/// External profile lifecycle collaborator.
#[async_trait]
pub trait ProfileLifecycle: Send + Sync {
    async fn list_profiles(&self) -> Result<Vec<ProfileInfo>, GatewayError>;

    async fn start_session(&self, profile: &ProfileId) -> Result<SessionHandle, GatewayError>;

    async fn stop_session(&self, profile: &ProfileId) -> Result<(), GatewayError>;
}
