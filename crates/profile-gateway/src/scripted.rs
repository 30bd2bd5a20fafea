//! Scripted lifecycle double for tests
//!
//! Tracks start/stop pairing and the high-water mark of concurrently active
//! sessions, which the orchestration suite asserts on.

use std::collections::HashMap;

use adpilot_core_types::ProfileId;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::{ProfileInfo, ProfileLifecycle, ProfileStatus, SessionHandle};
use crate::errors::GatewayError;

/// Scripted behavior for one profile.
#[derive(Clone, Debug)]
pub enum ScriptedStart {
    /// Start succeeds; the handle's devtools address is set to this key.
    Ok(String),
    /// Start fails with the given error.
    Fail(GatewayError),
}

#[derive(Default)]
struct ScriptedLifecycleState {
    profiles: Vec<ProfileInfo>,
    starts: HashMap<ProfileId, ScriptedStart>,
    started: HashMap<ProfileId, u32>,
    stopped: HashMap<ProfileId, u32>,
    active: usize,
    max_active: usize,
    list_error: Option<GatewayError>,
}

/// In-memory [`ProfileLifecycle`] implementation.
#[derive(Default)]
pub struct ScriptedLifecycle {
    state: Mutex<ScriptedLifecycleState>,
}

impl ScriptedLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_profile(&self, id: impl Into<String>, name: impl Into<String>) {
        let id = ProfileId::new(id);
        self.state.lock().profiles.push(ProfileInfo {
            id,
            name: name.into(),
            status: ProfileStatus::Available,
        });
    }

    pub fn script_start(&self, id: impl Into<String>, behavior: ScriptedStart) {
        self.state
            .lock()
            .starts
            .insert(ProfileId::new(id), behavior);
    }

    pub fn script_list_error(&self, error: GatewayError) {
        self.state.lock().list_error = Some(error);
    }

    pub fn start_count(&self, id: &str) -> u32 {
        *self
            .state
            .lock()
            .started
            .get(&ProfileId::new(id))
            .unwrap_or(&0)
    }

    pub fn stop_count(&self, id: &str) -> u32 {
        *self
            .state
            .lock()
            .stopped
            .get(&ProfileId::new(id))
            .unwrap_or(&0)
    }

    /// High-water mark of simultaneously active sessions.
    pub fn max_active(&self) -> usize {
        self.state.lock().max_active
    }
}

#[async_trait]
impl ProfileLifecycle for ScriptedLifecycle {
    async fn list_profiles(&self) -> Result<Vec<ProfileInfo>, GatewayError> {
        let state = self.state.lock();
        if let Some(err) = &state.list_error {
            return Err(err.clone());
        }
        Ok(state.profiles.clone())
    }

    async fn start_session(&self, profile: &ProfileId) -> Result<SessionHandle, GatewayError> {
        let mut state = self.state.lock();
        let behavior = state
            .starts
            .get(profile)
            .cloned()
            .unwrap_or(ScriptedStart::Fail(GatewayError::NotFound(
                profile.0.clone(),
            )));
        match behavior {
            ScriptedStart::Ok(key) => {
                *state.started.entry(profile.clone()).or_insert(0) += 1;
                state.active += 1;
                state.max_active = state.max_active.max(state.active);
                let mut handle = SessionHandle::new(profile.clone());
                handle.devtools_ws = Some(key);
                Ok(handle)
            }
            ScriptedStart::Fail(err) => Err(err),
        }
    }

    async fn stop_session(&self, profile: &ProfileId) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        *state.stopped.entry(profile.clone()).or_insert(0) += 1;
        state.active = state.active.saturating_sub(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracks_start_stop_pairing() {
        let lifecycle = ScriptedLifecycle::new();
        lifecycle.script_start("p1", ScriptedStart::Ok("ws-1".into()));

        let profile = ProfileId::new("p1");
        let handle = lifecycle.start_session(&profile).await.unwrap();
        assert_eq!(handle.devtools_ws.as_deref(), Some("ws-1"));
        assert_eq!(lifecycle.max_active(), 1);

        lifecycle.stop_session(&profile).await.unwrap();
        assert_eq!(lifecycle.start_count("p1"), 1);
        assert_eq!(lifecycle.stop_count("p1"), 1);
    }

    #[tokio::test]
    async fn unscripted_profile_is_not_found() {
        let lifecycle = ScriptedLifecycle::new();
        let err = lifecycle
            .start_session(&ProfileId::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }
}
