//! End-to-end orchestration against scripted sessions: one profile that
//! walks the whole wizard, one whose final step never passes, one whose
//! session cannot be started at all.

use std::sync::Arc;
use std::time::Duration;

use adpilot_core_types::{CampaignObjective, CampaignSpec, NullStatusSink, ProfileId};
use browser_bridge::{
    PageEffect, ScriptedDriver, ScriptedDriverFactory, ScriptedElement, ScriptedPage,
};
use profile_gateway::{GatewayError, ScriptedLifecycle, ScriptedStart};
use selector_catalog::defaults::default_catalog;
use selector_catalog::{ElementDescriptor as D, Locale};
use session_orchestrator::{Orchestrator, ProfileOutcome};
use tokio_util::sync::CancellationToken;
use wizard_driver::{
    DiagnosticsSink, FsDiagnosticsSink, NullDiagnosticsSink, ResolverConfig, RetryBudget,
    WizardConfig, WizardExecutor,
};

const ENTRY_URL: &str = "https://ads.google.com";

fn spec() -> Arc<CampaignSpec> {
    Arc::new(CampaignSpec {
        name: "spring-sale".into(),
        objective: CampaignObjective::Sales,
        titles: vec!["Big spring sale".into(), "Save 20% today".into()],
        locations: ["Lisboa".to_string()].into_iter().collect(),
        daily_budget: "50".into(),
        max_cpc_bid: Some("1.20".into()),
    })
}

fn executor(sink: Arc<dyn DiagnosticsSink>, base_delay_ms: u64) -> Arc<WizardExecutor> {
    Arc::new(WizardExecutor::new(
        Arc::new(default_catalog()),
        ResolverConfig {
            descriptor_wait: Duration::from_millis(5),
            poll_interval: Duration::from_millis(1),
        },
        RetryBudget {
            max_attempts: 2,
            base_delay_ms,
            multiplier: 1.0,
        },
        sink,
        WizardConfig {
            base_url: ENTRY_URL.into(),
            session_timeout: Duration::from_secs(30),
        },
    ))
}

/// Portuguese page that walks every step. With `publishes` false the
/// confirmation never appears and the submit step cannot pass.
fn scripted_wizard(lang: Option<&str>, publishes: bool) -> Arc<ScriptedDriver> {
    let driver = ScriptedDriver::new(ScriptedPage::new("about:blank"));
    let mut dashboard = ScriptedPage::new(format!("{ENTRY_URL}/overview")).with_element(
        ScriptedElement::new("btn-new")
            .with_matcher(D::css("button[data-test-id='new-campaign']"))
            .with_text(if lang.is_some() { "Nova campanha" } else { "" }),
    );
    if let Some(lang) = lang {
        dashboard = dashboard.with_lang(lang);
    }
    driver.script_route(ENTRY_URL, dashboard);
    driver.script_click(
        "btn-new",
        vec![PageEffect::AddElement(
            ScriptedElement::new("card-sales")
                .with_matcher(D::css("div[data-test-id='objective-sales']")),
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
                ScriptedElement::new("max-cpc")
                    .with_matcher(D::css("input[data-test-id='max-cpc-input']")),
            ),
            PageEffect::AddElement(
                ScriptedElement::new("btn-continue")
                    .with_matcher(D::css("button[data-test-id='save-continue']")),
            ),
        ],
    );
    driver.script_enter(
        "loc-input",
        vec![PageEffect::AddElement(
            ScriptedElement::new("chip").with_matcher(D::css("div[data-test-id='location-chip']")),
        )],
    );
    driver.script_click(
        "btn-continue",
        vec![PageEffect::AddElement(
            ScriptedElement::new("btn-publish")
                .with_matcher(D::css("button[data-test-id='publish']")),
        )],
    );
    if publishes {
        driver.script_click(
            "btn-publish",
            vec![PageEffect::AddElement(
                ScriptedElement::new("confirm")
                    .with_matcher(D::css("div[data-test-id='campaign-published']")),
            )],
        );
    }
    Arc::new(driver)
}

#[tokio::test]
async fn mixed_cohort_yields_one_outcome_per_profile() {
    let lifecycle = Arc::new(ScriptedLifecycle::new());
    let factory = Arc::new(ScriptedDriverFactory::new());

    // A: Portuguese page, full success.
    lifecycle.add_profile("profile-a", "warm account");
    lifecycle.script_start("profile-a", ScriptedStart::Ok("ws-a".into()));
    factory.register("ws-a", scripted_wizard(Some("pt-BR"), true));

    // B: no locale signal and a submit step that can never pass.
    lifecycle.add_profile("profile-b", "odd account");
    lifecycle.script_start("profile-b", ScriptedStart::Ok("ws-b".into()));
    factory.register("ws-b", scripted_wizard(None, false));

    // C: the profile manager cannot start a session at all.
    lifecycle.add_profile("profile-c", "dead account");
    lifecycle.script_start(
        "profile-c",
        ScriptedStart::Fail(GatewayError::ServiceUnreachable("connection refused".into())),
    );

    let evidence = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(
        lifecycle.clone(),
        factory,
        executor(Arc::new(FsDiagnosticsSink::new(evidence.path())), 1),
        2,
    );

    let report = orchestrator
        .run(
            vec![
                ProfileId::new("profile-a"),
                ProfileId::new("profile-b"),
                ProfileId::new("profile-c"),
            ],
            spec(),
            CancellationToken::new(),
            Arc::new(NullStatusSink),
        )
        .await;

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.tally(), (1, 2, 0));
    assert!(lifecycle.max_active() <= 2);

    assert!(matches!(
        report.outcomes.get(&ProfileId::new("profile-a")),
        Some(ProfileOutcome::Succeeded)
    ));

    let Some(ProfileOutcome::Failed {
        record: Some(record),
        ..
    }) = report.outcomes.get(&ProfileId::new("profile-b"))
    else {
        panic!("profile-b should fail with a captured record");
    };
    assert_eq!(record.step, "submit");
    assert_eq!(
        record.locales_tried,
        vec![Locale::Portuguese, Locale::English, Locale::Spanish]
    );
    let screenshot = record.screenshot_path.as_ref().expect("screenshot");
    assert!(screenshot.exists());
    assert!(record.page_source_path.as_ref().unwrap().exists());

    let Some(ProfileOutcome::Failed { record, reason }) =
        report.outcomes.get(&ProfileId::new("profile-c"))
    else {
        panic!("profile-c should fail");
    };
    assert!(record.is_none());
    assert!(reason.contains("unreachable"));

    // Started sessions are stopped exactly once; unstarted ones never are.
    for profile in ["profile-a", "profile-b"] {
        assert_eq!(lifecycle.start_count(profile), 1);
        assert_eq!(lifecycle.stop_count(profile), 1);
    }
    assert_eq!(lifecycle.stop_count("profile-c"), 0);
}

#[tokio::test]
async fn cancellation_mid_run_aborts_and_releases_the_session() {
    let lifecycle = Arc::new(ScriptedLifecycle::new());
    let factory = Arc::new(ScriptedDriverFactory::new());
    lifecycle.add_profile("profile-a", "warm account");
    lifecycle.script_start("profile-a", ScriptedStart::Ok("ws-a".into()));
    // The submit step never passes and backoff is long, so the run is
    // parked in a retry wait when the cancel lands.
    factory.register("ws-a", scripted_wizard(Some("pt-BR"), false));

    let orchestrator = Orchestrator::new(
        lifecycle.clone(),
        factory,
        executor(Arc::new(NullDiagnosticsSink), 10_000),
        1,
    );

    let cancel = CancellationToken::new();
    let run = tokio::spawn({
        let cancel = cancel.clone();
        let orchestrator = orchestrator.clone();
        async move {
            orchestrator
                .run(
                    vec![ProfileId::new("profile-a")],
                    spec(),
                    cancel,
                    Arc::new(NullStatusSink),
                )
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    cancel.cancel();
    let report = run.await.unwrap();

    assert!(matches!(
        report.outcomes.get(&ProfileId::new("profile-a")),
        Some(ProfileOutcome::Aborted)
    ));
    assert_eq!(lifecycle.start_count("profile-a"), 1);
    assert_eq!(lifecycle.stop_count("profile-a"), 1);
}
