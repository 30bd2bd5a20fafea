//! Bounded-concurrency run orchestration
//!
//! Fans the profile list out over a semaphore-bounded task set. Each task
//! owns exactly one session from start to stop; a profile failure never
//! touches any other profile's run. Cancellation is cooperative: in-flight
//! sessions stop at their next step boundary and queued profiles are marked
//! aborted without ever starting a session.

use std::collections::BTreeMap;
use std::sync::Arc;

use adpilot_core_types::{CampaignSpec, ProfileId, RunId, RunState, StatusSink, StatusUpdate};
use browser_bridge::{DriverFactory, SessionEndpoint};
use chrono::Utc;
use profile_gateway::ProfileLifecycle;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wizard_driver::{SessionContext, WizardExecutor, WizardOutcome};

use crate::report::{ProfileOutcome, RunReport};

/// Orchestrates wizard runs across many profiles.
#[derive(Clone)]
pub struct Orchestrator {
    lifecycle: Arc<dyn ProfileLifecycle>,
    factory: Arc<dyn DriverFactory>,
    executor: Arc<WizardExecutor>,
    max_concurrency: usize,
}

impl Orchestrator {
    pub fn new(
        lifecycle: Arc<dyn ProfileLifecycle>,
        factory: Arc<dyn DriverFactory>,
        executor: Arc<WizardExecutor>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            lifecycle,
            factory,
            executor,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Run the wizard for every listed profile and collect one terminal
    /// outcome per profile. Never returns early: a failing profile only
    /// fails itself.
    pub async fn run(
        &self,
        profiles: Vec<ProfileId>,
        spec: Arc<CampaignSpec>,
        cancel: CancellationToken,
        status: Arc<dyn StatusSink>,
    ) -> RunReport {
        let run = RunId::new();
        let started_at = Utc::now();
        info!(run = %run.0, profiles = profiles.len(), limit = self.max_concurrency, "orchestration run started");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        let mut seen = Vec::new();
        for profile in profiles {
            // A profile listed twice still gets exactly one session.
            if seen.contains(&profile) {
                continue;
            }
            seen.push(profile.clone());

            let orchestrator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let spec = Arc::clone(&spec);
            let cancel = cancel.clone();
            let status = Arc::clone(&status);
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (profile, ProfileOutcome::Aborted),
                };
                if cancel.is_cancelled() {
                    status.emit(StatusUpdate::new(
                        profile.clone(),
                        RunState::Aborted,
                        None,
                        "cancelled before session start",
                    ));
                    return (profile, ProfileOutcome::Aborted);
                }
                let outcome = orchestrator
                    .run_profile(&profile, &spec, &cancel, status.as_ref())
                    .await;
                (profile, outcome)
            });
        }

        let mut outcomes = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((profile, outcome)) => {
                    info!(%profile, state = %outcome.state(), "profile run finished");
                    outcomes.insert(profile, outcome);
                }
                Err(err) => {
                    // Identity is lost on panic; the profile without an
                    // outcome is filled in below.
                    warn!("profile task panicked: {err}");
                }
            }
        }
        for profile in seen {
            outcomes.entry(profile).or_insert(ProfileOutcome::Failed {
                reason: "profile task panicked".to_string(),
                record: None,
            });
        }

        let report = RunReport {
            run,
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };
        let (succeeded, failed, aborted) = report.tally();
        info!(run = %report.run.0, succeeded, failed, aborted, "orchestration run finished");
        report
    }

    /// One profile: start the session, drive the wizard, stop the session.
    /// The stop call runs on every path once the session was started.
    async fn run_profile(
        &self,
        profile: &ProfileId,
        spec: &CampaignSpec,
        cancel: &CancellationToken,
        status: &dyn StatusSink,
    ) -> ProfileOutcome {
        status.emit(StatusUpdate::new(
            profile.clone(),
            RunState::Pending,
            None,
            "starting browser session",
        ));

        let handle = match self.lifecycle.start_session(profile).await {
            Ok(handle) => handle,
            Err(err) => {
                warn!(%profile, "session start failed: {err}");
                status.emit(StatusUpdate::new(
                    profile.clone(),
                    RunState::Failed,
                    None,
                    err.to_string(),
                ));
                return ProfileOutcome::Failed {
                    reason: err.to_string(),
                    record: None,
                };
            }
        };

        let guard = SessionGuard::new(Arc::clone(&self.lifecycle), profile.clone());

        let endpoint = SessionEndpoint {
            devtools_ws: handle.devtools_ws.clone(),
            debug_port: handle.debug_port,
        };
        let outcome = match self.factory.connect(&endpoint).await {
            Ok(driver) => {
                let mut ctx = SessionContext::new(profile.clone(), driver);
                match self.executor.run(&mut ctx, spec, cancel, status).await {
                    WizardOutcome::Succeeded => ProfileOutcome::Succeeded,
                    WizardOutcome::Failed { reason, record, .. } => ProfileOutcome::Failed {
                        reason,
                        record: Some(record),
                    },
                    WizardOutcome::Aborted => ProfileOutcome::Aborted,
                }
            }
            Err(err) => {
                warn!(%profile, "driver connection failed: {err}");
                status.emit(StatusUpdate::new(
                    profile.clone(),
                    RunState::Failed,
                    None,
                    err.to_string(),
                ));
                ProfileOutcome::Failed {
                    reason: err.to_string(),
                    record: None,
                }
            }
        };

        guard.release().await;
        outcome
    }
}

/// Releases a started session exactly once. The normal path awaits
/// [`SessionGuard::release`]; if the run never gets there (a panic inside
/// the wizard, or the task's future being dropped), `Drop` spawns the stop
/// so the browser session is not leaked.
struct SessionGuard {
    lifecycle: Arc<dyn ProfileLifecycle>,
    profile: ProfileId,
    armed: bool,
}

impl SessionGuard {
    fn new(lifecycle: Arc<dyn ProfileLifecycle>, profile: ProfileId) -> Self {
        Self {
            lifecycle,
            profile,
            armed: true,
        }
    }

    async fn release(mut self) {
        self.armed = false;
        if let Err(err) = self.lifecycle.stop_session(&self.profile).await {
            warn!(profile = %self.profile, "session stop failed: {err}");
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(profile = %self.profile, "run ended abruptly, stopping its session");
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let lifecycle = Arc::clone(&self.lifecycle);
            let profile = self.profile.clone();
            handle.spawn(async move {
                if let Err(err) = lifecycle.stop_session(&profile).await {
                    warn!(%profile, "session stop failed: {err}");
                }
            });
        }
    }
}
