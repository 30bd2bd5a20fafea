//! Step state machine
//!
//! Runs the fixed step sequence against one session. Each step gets a retry
//! budget per locale; when the budget is spent the executor escalates along
//! the locale chain before giving up. A step failure after the full chain is
//! terminal for the session: evidence is captured and the run ends FAILED.
//! Cancellation is honored at step boundaries and during backoff waits.

use std::sync::Arc;
use std::time::Duration;

use adpilot_core_types::{CampaignSpec, RunState, StatusSink, StatusUpdate};
use browser_bridge::BrowserDriver;
use chrono::Utc;
use regex::Regex;
use selector_catalog::{ElementDescriptor, Locale, SelectorCatalog};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::{AttemptOutcome, SessionContext, StepAttemptRecord};
use crate::diagnostics::{DiagnosticsCapturer, DiagnosticsSink, FailureRecord};
use crate::errors::WizardError;
use crate::locale::LocaleDetector;
use crate::popups::PopupInterceptor;
use crate::resolver::{ElementResolver, ResolvedElement, ResolverConfig};
use crate::steps::{wizard_steps, PostCondition, RetryBudget, StepAction, StepDefinition, TextSource};

/// Executor settings for one deployment.
#[derive(Clone, Debug)]
pub struct WizardConfig {
    /// Entry URL of the campaign wizard.
    pub base_url: String,
    /// Wall-clock ceiling for one session; expiry counts as budget
    /// exhaustion at whatever step is active.
    pub session_timeout: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ads.google.com".to_string(),
            session_timeout: Duration::from_secs(300),
        }
    }
}

/// Terminal result of one wizard run.
#[derive(Debug)]
pub enum WizardOutcome {
    /// All steps passed their post-conditions; the campaign is published.
    Succeeded,
    /// A step exhausted retries across the whole locale chain, or hit an
    /// unrecoverable error. Evidence was captured before the session ended.
    Failed {
        step: String,
        reason: String,
        record: Box<FailureRecord>,
    },
    /// Cancelled at a step boundary; no evidence capture.
    Aborted,
}

enum StepResult {
    Passed,
    Exhausted { reason: String },
    Unrecoverable { reason: String },
    Cancelled,
}

/// Drives one session through the step sequence.
pub struct WizardExecutor {
    catalog: Arc<SelectorCatalog>,
    resolver: ElementResolver,
    popups: PopupInterceptor,
    detector: LocaleDetector,
    capturer: DiagnosticsCapturer,
    steps: Vec<StepDefinition>,
    config: WizardConfig,
}

impl WizardExecutor {
    pub fn new(
        catalog: Arc<SelectorCatalog>,
        resolver_config: ResolverConfig,
        retry: RetryBudget,
        sink: Arc<dyn DiagnosticsSink>,
        config: WizardConfig,
    ) -> Self {
        Self {
            resolver: ElementResolver::new(Arc::clone(&catalog), resolver_config),
            popups: PopupInterceptor::with_defaults(),
            detector: LocaleDetector::new(),
            capturer: DiagnosticsCapturer::new(sink),
            steps: wizard_steps(retry),
            catalog,
            config,
        }
    }

    pub fn with_popups(mut self, popups: PopupInterceptor) -> Self {
        self.popups = popups;
        self
    }

    /// Run the full sequence for one session.
    ///
    /// Steps run strictly in ordinal order; a step is only entered once all
    /// prior steps have passed. The locale is detected right after the entry
    /// page loads and is re-examined only through escalation.
    pub async fn run(
        &self,
        ctx: &mut SessionContext,
        spec: &CampaignSpec,
        cancel: &CancellationToken,
        status: &dyn StatusSink,
    ) -> WizardOutcome {
        let deadline = Instant::now() + self.config.session_timeout;
        ctx.set_state(RunState::Running);
        self.emit(status, ctx, None, "wizard run started");

        for step in &self.steps {
            if cancel.is_cancelled() {
                ctx.set_state(RunState::Aborted);
                self.emit(status, ctx, Some(&step.name), "cancelled at step boundary");
                return WizardOutcome::Aborted;
            }
            self.emit(status, ctx, Some(&step.name), "step started");

            match self.run_step(ctx, step, spec, cancel, deadline).await {
                StepResult::Passed => {
                    info!(profile = %ctx.profile(), step = %step.name, "step passed");
                    self.emit(status, ctx, Some(&step.name), "step passed");
                    if step.action == StepAction::Navigate {
                        let locale = self.detector.detect(ctx.driver(), &self.catalog).await;
                        ctx.set_locale(locale);
                    }
                }
                StepResult::Cancelled => {
                    ctx.set_state(RunState::Aborted);
                    self.emit(status, ctx, Some(&step.name), "cancelled during step");
                    return WizardOutcome::Aborted;
                }
                StepResult::Exhausted { reason } | StepResult::Unrecoverable { reason } => {
                    ctx.set_state(RunState::Failed);
                    let record = self.capturer.capture(ctx, &step.name, &reason).await;
                    self.emit(status, ctx, Some(&step.name), reason.clone());
                    return WizardOutcome::Failed {
                        step: step.name.clone(),
                        reason,
                        record: Box::new(record),
                    };
                }
            }
        }

        ctx.set_state(RunState::Succeeded);
        self.emit(status, ctx, None, "campaign published");
        WizardOutcome::Succeeded
    }

    /// One step: retry budget per locale, then escalate along the chain.
    /// Total attempts are bounded by budget x chain length.
    async fn run_step(
        &self,
        ctx: &mut SessionContext,
        step: &StepDefinition,
        spec: &CampaignSpec,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> StepResult {
        let driver = ctx.driver_arc();
        let chain = Locale::escalation_chain(ctx.locale());

        for (position, &locale) in chain.iter().enumerate() {
            ctx.set_locale(locale);
            for attempt in 1..=step.retry.max_attempts {
                if cancel.is_cancelled() {
                    return StepResult::Cancelled;
                }
                if Instant::now() >= deadline {
                    return StepResult::Exhausted {
                        reason: format!("session timeout expired at step '{}'", step.name),
                    };
                }

                let started = Instant::now();
                self.popups.sweep(driver.as_ref(), &self.resolver).await;
                let result = match self.perform(driver.as_ref(), step, spec, locale).await {
                    Ok(()) => {
                        // A step's own action can raise an overlay that masks
                        // its success signal.
                        self.popups.sweep(driver.as_ref(), &self.resolver).await;
                        self.check(driver.as_ref(), step, spec, locale).await
                    }
                    Err(err) => Err(err),
                };
                let elapsed_ms = started.elapsed().as_millis() as u64;

                match result {
                    Ok(descriptor) => {
                        ctx.record(StepAttemptRecord {
                            step: step.name.clone(),
                            attempt,
                            locale,
                            descriptor,
                            elapsed_ms,
                            outcome: AttemptOutcome::Success,
                            detail: None,
                            at: Utc::now(),
                        });
                        return StepResult::Passed;
                    }
                    Err(err) => {
                        let (outcome, descriptor) = match &err {
                            WizardError::PostConditionFailed { descriptor, .. } => {
                                (AttemptOutcome::PostConditionFailed, descriptor.clone())
                            }
                            WizardError::ElementNotFound { last_tried, .. } => {
                                (AttemptOutcome::ElementNotFound, last_tried.clone())
                            }
                            WizardError::Driver(_) => (AttemptOutcome::DriverFailure, None),
                            _ => (AttemptOutcome::ElementNotFound, None),
                        };
                        ctx.record(StepAttemptRecord {
                            step: step.name.clone(),
                            attempt,
                            locale,
                            descriptor,
                            elapsed_ms,
                            outcome,
                            detail: Some(err.to_string()),
                            at: Utc::now(),
                        });
                        if !err.is_recoverable() {
                            return StepResult::Unrecoverable {
                                reason: err.to_string(),
                            };
                        }
                        warn!(
                            step = %step.name, %locale, attempt,
                            "step attempt failed: {err}"
                        );
                        if attempt < step.retry.max_attempts {
                            let delay = step.retry.delay(attempt);
                            debug!(step = %step.name, ?delay, "backing off before retry");
                            tokio::select! {
                                _ = cancel.cancelled() => return StepResult::Cancelled,
                                _ = sleep(delay) => {}
                            }
                        }
                    }
                }
            }
            if let Some(next) = chain.get(position + 1) {
                info!(
                    step = %step.name, from = %locale, to = %next,
                    "retry budget spent, escalating locale"
                );
            }
        }

        let tried: Vec<_> = chain.iter().map(ToString::to_string).collect();
        StepResult::Exhausted {
            reason: format!(
                "step '{}' failed after exhausting locales [{}]",
                step.name,
                tried.join(", ")
            ),
        }
    }

    /// Resolve a catalog element and treat exhaustion as a step failure.
    async fn require(
        &self,
        driver: &dyn BrowserDriver,
        name: &str,
        locale: Locale,
    ) -> Result<ResolvedElement, WizardError> {
        match self.resolver.resolve(driver, name, locale).await? {
            Some(found) => Ok(found),
            None => Err(WizardError::ElementNotFound {
                element: name.to_string(),
                last_tried: self.last_tried(name, locale),
            }),
        }
    }

    /// Last descriptor in an element's trial order under the given locale.
    /// Failed attempts record it so the failure log names what was tried.
    fn last_tried(&self, name: &str, locale: Locale) -> Option<ElementDescriptor> {
        self.catalog
            .get(name)
            .and_then(|entry| entry.descriptors_for(locale).last().map(|d| (*d).clone()))
    }

    async fn perform(
        &self,
        driver: &dyn BrowserDriver,
        step: &StepDefinition,
        spec: &CampaignSpec,
        locale: Locale,
    ) -> Result<(), WizardError> {
        match step.action {
            StepAction::Navigate => {
                driver.navigate(&self.config.base_url).await?;
            }
            // No action of its own: the post-condition carries the check.
            StepAction::VerifyLogin => {}
            StepAction::SelectObjective => {
                let open = self.require(driver, "new-campaign-button", locale).await?;
                driver.click(&open.handle).await?;
                let card = self
                    .require(driver, spec.objective.element_name(), locale)
                    .await?;
                driver.click(&card.handle).await?;
                // Some wizard variants ask for the name on a later panel.
                if let Some(name_input) = self
                    .resolver
                    .resolve(driver, "campaign-name-input", locale)
                    .await?
                {
                    driver.click(&name_input.handle).await?;
                    driver.type_text(&name_input.handle, &spec.name).await?;
                }
            }
            StepAction::EnterTitles => {
                for title in &spec.titles {
                    let input = self.require(driver, "headline-input", locale).await?;
                    driver.click(&input.handle).await?;
                    driver.type_text(&input.handle, title).await?;
                    driver.press_enter(&input.handle).await?;
                }
            }
            StepAction::ChooseLocations => {
                for location in &spec.locations {
                    let input = self.require(driver, "location-input", locale).await?;
                    driver.click(&input.handle).await?;
                    driver.type_text(&input.handle, location).await?;
                    match self
                        .resolver
                        .resolve(driver, "location-suggestion", locale)
                        .await?
                    {
                        Some(suggestion) => driver.click(&suggestion.handle).await?,
                        // No dropdown rendered; the field accepts plain enter.
                        None => driver.press_enter(&input.handle).await?,
                    }
                }
            }
            StepAction::Review => {
                let budget = self.require(driver, "budget-input", locale).await?;
                driver.click(&budget.handle).await?;
                driver.type_text(&budget.handle, &spec.daily_budget).await?;
                if let Some(bid) = &spec.max_cpc_bid {
                    if let Some(input) =
                        self.resolver.resolve(driver, "max-cpc-input", locale).await?
                    {
                        driver.click(&input.handle).await?;
                        driver.type_text(&input.handle, bid).await?;
                    }
                }
                let advance = self.require(driver, "save-continue-button", locale).await?;
                driver.click(&advance.handle).await?;
            }
            StepAction::Submit => {
                let publish = self.require(driver, "publish-button", locale).await?;
                driver.click(&publish.handle).await?;
            }
        }
        Ok(())
    }

    /// Evaluate the step's post-condition. Success returns the descriptor
    /// that proved it, when an element was involved.
    async fn check(
        &self,
        driver: &dyn BrowserDriver,
        step: &StepDefinition,
        spec: &CampaignSpec,
        locale: Locale,
    ) -> Result<Option<ElementDescriptor>, WizardError> {
        match &step.expect {
            PostCondition::ElementVisible(name) => {
                match self.resolver.resolve(driver, name, locale).await? {
                    Some(found) => Ok(Some(found.descriptor)),
                    None => Err(WizardError::PostConditionFailed {
                        step: step.name.clone(),
                        reason: format!("'{name}' is not visible"),
                        descriptor: self.last_tried(name, locale),
                    }),
                }
            }
            PostCondition::UrlContains(fragment) => {
                let url = driver.current_url().await?;
                if url.contains(fragment) {
                    Ok(None)
                } else {
                    Err(WizardError::PostConditionFailed {
                        step: step.name.clone(),
                        reason: format!("url '{url}' does not contain '{fragment}'"),
                        descriptor: None,
                    })
                }
            }
            PostCondition::UrlMatches(pattern) => {
                let re = Regex::new(pattern).map_err(|err| WizardError::PostConditionFailed {
                    step: step.name.clone(),
                    reason: format!("invalid url pattern '{pattern}': {err}"),
                    descriptor: None,
                })?;
                let url = driver.current_url().await?;
                if re.is_match(&url) {
                    Ok(None)
                } else {
                    Err(WizardError::PostConditionFailed {
                        step: step.name.clone(),
                        reason: format!("url '{url}' does not match '{pattern}'"),
                        descriptor: None,
                    })
                }
            }
            PostCondition::ElementTextContains { element, text } => {
                let expected = match text {
                    TextSource::Literal(value) => value.clone(),
                    TextSource::LastTitle => spec.titles.last().cloned().unwrap_or_default(),
                };
                let found = self
                    .resolver
                    .resolve(driver, element, locale)
                    .await?
                    .ok_or_else(|| WizardError::PostConditionFailed {
                        step: step.name.clone(),
                        reason: format!("'{element}' is not visible"),
                        descriptor: self.last_tried(element, locale),
                    })?;
                let actual = driver.read_text(&found.handle).await?;
                if actual.contains(&expected) {
                    Ok(Some(found.descriptor))
                } else {
                    Err(WizardError::PostConditionFailed {
                        step: step.name.clone(),
                        reason: format!(
                            "'{element}' text '{actual}' does not contain '{expected}'"
                        ),
                        descriptor: Some(found.descriptor),
                    })
                }
            }
        }
    }

    fn emit(
        &self,
        status: &dyn StatusSink,
        ctx: &SessionContext,
        step: Option<&str>,
        message: impl Into<String>,
    ) {
        status.emit(StatusUpdate::new(
            ctx.profile().clone(),
            ctx.state(),
            step.map(str::to_string),
            message,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullDiagnosticsSink;
    use adpilot_core_types::{CampaignObjective, NullStatusSink, ProfileId};
    use browser_bridge::{PageEffect, ScriptedDriver, ScriptedElement, ScriptedPage};
    use selector_catalog::defaults::default_catalog;
    use selector_catalog::ElementDescriptor as D;
    use std::sync::Mutex;

    const ENTRY_URL: &str = "https://ads.google.com";

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<StatusUpdate>>);

    impl StatusSink for RecordingSink {
        fn emit(&self, update: StatusUpdate) {
            self.0.lock().unwrap().push(update);
        }
    }

    fn spec() -> CampaignSpec {
        CampaignSpec {
            name: "spring-sale".into(),
            objective: CampaignObjective::Sales,
            titles: vec!["Big spring sale".into(), "Save 20% today".into()],
            locations: ["Lisboa".to_string()].into_iter().collect(),
            daily_budget: "50".into(),
            max_cpc_bid: None,
        }
    }

    fn executor() -> WizardExecutor {
        WizardExecutor::new(
            Arc::new(default_catalog()),
            ResolverConfig {
                descriptor_wait: Duration::from_millis(5),
                poll_interval: Duration::from_millis(1),
            },
            RetryBudget {
                max_attempts: 2,
                base_delay_ms: 1,
                multiplier: 1.0,
            },
            Arc::new(NullDiagnosticsSink),
            WizardConfig {
                base_url: ENTRY_URL.into(),
                session_timeout: Duration::from_secs(30),
            },
        )
    }

    /// Scripted Portuguese wizard. When `publishes` is false the publish
    /// click never produces a confirmation, so the final step cannot pass.
    fn scripted_wizard(publishes: bool) -> Arc<ScriptedDriver> {
        let driver = ScriptedDriver::new(ScriptedPage::new("about:blank"));
        driver.script_route(
            ENTRY_URL,
            ScriptedPage::new("https://ads.google.com/aw/overview")
                .with_lang("pt-BR")
                .with_element(
                    ScriptedElement::new("btn-new")
                        .with_matcher(D::css("button[data-test-id='new-campaign']"))
                        .with_text("Nova campanha"),
                ),
        );
        driver.script_click(
            "btn-new",
            vec![PageEffect::AddElement(
                ScriptedElement::new("card-sales")
                    .with_matcher(D::css("div[data-test-id='objective-sales']"))
                    .with_text("Vendas"),
            )],
        );
        driver.script_click(
            "card-sales",
            vec![
                PageEffect::AddElement(
                    ScriptedElement::new("name-input")
                        .with_matcher(D::css("input[data-test-id='campaign-name-input']")),
                ),
                PageEffect::AddElement(
                    ScriptedElement::new("headline")
                        .with_matcher(D::css("input[data-test-id='headline-input']")),
                ),
                PageEffect::AddElement(
                    ScriptedElement::new("loc-input")
                        .with_matcher(D::css("input[data-test-id='location-input']")),
                ),
                PageEffect::AddElement(
                    ScriptedElement::new("budget")
                        .with_matcher(D::css("input[data-test-id='budget-input']")),
                ),
                PageEffect::AddElement(
                    ScriptedElement::new("btn-continue")
                        .with_matcher(D::css("button[data-test-id='save-continue']"))
                        .with_text("Salvar e continuar"),
                ),
            ],
        );
        driver.script_enter(
            "loc-input",
            vec![PageEffect::AddElement(
                ScriptedElement::new("chip")
                    .with_matcher(D::css("div[data-test-id='location-chip']"))
                    .with_text("Lisboa"),
            )],
        );
        driver.script_click(
            "btn-continue",
            vec![PageEffect::AddElement(
                ScriptedElement::new("btn-publish")
                    .with_matcher(D::css("button[data-test-id='publish']"))
                    .with_text("Publicar"),
            )],
        );
        if publishes {
            driver.script_click(
                "btn-publish",
                vec![
                    PageEffect::SetUrl("https://ads.google.com/aw/campaigns".into()),
                    PageEffect::AddElement(
                        ScriptedElement::new("confirm")
                            .with_matcher(D::css("div[data-test-id='campaign-published']"))
                            .with_text("Sua campanha foi publicada"),
                    ),
                ],
            );
        }
        Arc::new(driver)
    }

    #[tokio::test]
    async fn full_sequence_succeeds_on_a_portuguese_page() {
        let driver = scripted_wizard(true);
        let mut ctx = SessionContext::new(ProfileId::new("p1"), driver.clone());
        let sink = RecordingSink::default();

        let outcome = executor()
            .run(&mut ctx, &spec(), &CancellationToken::new(), &sink)
            .await;

        assert!(matches!(outcome, WizardOutcome::Succeeded));
        assert_eq!(ctx.state(), RunState::Succeeded);
        assert_eq!(ctx.locale(), Locale::Portuguese);
        // One successful attempt per step, all under the detected locale.
        assert_eq!(ctx.attempts().len(), 7);
        assert!(ctx
            .attempts()
            .iter()
            .all(|r| r.outcome == AttemptOutcome::Success));
        // Both titles landed in the headline slot; the second is what remains.
        let typed = driver.typed();
        assert!(typed.contains(&("headline".into(), "Big spring sale".into())));
        assert!(typed.contains(&("headline".into(), "Save 20% today".into())));

        let updates = sink.0.lock().unwrap();
        assert_eq!(updates.last().unwrap().state, RunState::Succeeded);
    }

    #[tokio::test]
    async fn missing_confirmation_escalates_through_all_locales_then_fails() {
        let driver = scripted_wizard(false);
        let mut ctx = SessionContext::new(ProfileId::new("p1"), driver);

        let outcome = executor()
            .run(&mut ctx, &spec(), &CancellationToken::new(), &NullStatusSink)
            .await;

        let WizardOutcome::Failed { step, record, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(step, "submit");
        assert_eq!(ctx.state(), RunState::Failed);
        assert_eq!(
            record.locales_tried,
            vec![Locale::Portuguese, Locale::English, Locale::Spanish]
        );
        // Attempts at the failing step are bounded by budget x chain length.
        let submit_attempts = ctx
            .attempts()
            .iter()
            .filter(|r| r.step == "submit")
            .count();
        assert_eq!(submit_attempts, 6);
        assert!(ctx
            .attempts()
            .iter()
            .filter(|r| r.step == "submit")
            .all(|r| r.outcome == AttemptOutcome::PostConditionFailed));
        // Every failed attempt names the descriptor it last tried.
        assert!(ctx
            .attempts()
            .iter()
            .filter(|r| r.step == "submit")
            .all(|r| r.descriptor.is_some()));
    }

    #[tokio::test]
    async fn pre_cancelled_token_aborts_before_any_step() {
        let driver = scripted_wizard(true);
        let mut ctx = SessionContext::new(ProfileId::new("p1"), driver.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = executor()
            .run(&mut ctx, &spec(), &cancel, &NullStatusSink)
            .await;

        assert!(matches!(outcome, WizardOutcome::Aborted));
        assert_eq!(ctx.state(), RunState::Aborted);
        assert!(ctx.attempts().is_empty());
        assert!(driver.clicks().is_empty());
    }

    #[tokio::test]
    async fn expired_session_timeout_counts_as_exhaustion() {
        let driver = scripted_wizard(true);
        let mut ctx = SessionContext::new(ProfileId::new("p1"), driver);
        let exec = WizardExecutor::new(
            Arc::new(default_catalog()),
            ResolverConfig::default(),
            RetryBudget::default(),
            Arc::new(NullDiagnosticsSink),
            WizardConfig {
                base_url: ENTRY_URL.into(),
                session_timeout: Duration::ZERO,
            },
        );

        let outcome = exec
            .run(&mut ctx, &spec(), &CancellationToken::new(), &NullStatusSink)
            .await;

        let WizardOutcome::Failed { step, reason, .. } = outcome else {
            panic!("expected failure");
        };
        assert_eq!(step, "navigate");
        assert!(reason.contains("timeout"));
        assert_eq!(ctx.state(), RunState::Failed);
    }
}
