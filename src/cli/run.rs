//! `adpilot run` command

use std::path::Path;
use std::sync::Arc;

use adpilot_core_types::{CampaignSpec, ProfileId, StatusSink};
use anyhow::{bail, Context};
use browser_bridge::{
    DevtoolsDriverFactory, DriverFactory, PageEffect, ScriptedDriver, ScriptedDriverFactory,
    ScriptedElement, ScriptedPage,
};
use clap::Args;
use profile_gateway::{HttpProfileGateway, ProfileLifecycle, ScriptedLifecycle, ScriptedStart};
use selector_catalog::defaults::default_catalog;
use selector_catalog::{ElementDescriptor, SelectorCatalog};
use session_orchestrator::{Orchestrator, ProfileOutcome, RunReport};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use wizard_driver::{DiagnosticsSink, FsDiagnosticsSink, WizardExecutor};

use crate::config::AppConfig;
use crate::status::ConsoleStatusSink;

use super::selection::SelectionStore;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Campaign spec file (JSON).
    #[arg(long, value_name = "FILE")]
    pub campaign: std::path::PathBuf,

    /// Profile ids to run against, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub profiles: Vec<String>,

    /// Named selection set to run against.
    #[arg(long, conflicts_with = "profiles")]
    pub selection: Option<String>,

    /// Override the configured concurrency limit.
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Run against an in-memory scripted wizard instead of live sessions.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: RunArgs, config: &AppConfig) -> anyhow::Result<i32> {
    let spec = load_campaign(&args.campaign)?;

    let profiles: Vec<ProfileId> = if !args.profiles.is_empty() {
        args.profiles.iter().map(ProfileId::new).collect()
    } else if let Some(name) = &args.selection {
        SelectionStore::open(config)
            .resolve(name)?
            .into_iter()
            .map(ProfileId::new)
            .collect()
    } else {
        bail!("either --profiles or --selection is required");
    };
    if profiles.is_empty() {
        bail!("profile list is empty");
    }

    let catalog = Arc::new(load_catalog(config)?);
    let sink: Arc<dyn DiagnosticsSink> =
        Arc::new(FsDiagnosticsSink::new(&config.automation.evidence_dir));
    let executor = Arc::new(WizardExecutor::new(
        catalog,
        config.wizard.resolver_config(),
        config.wizard.retry_budget(),
        sink,
        config.wizard.wizard_config(),
    ));

    let (lifecycle, factory): (Arc<dyn ProfileLifecycle>, Arc<dyn DriverFactory>) =
        if args.dry_run {
            scripted_harness(&profiles, &config.wizard.base_url)
        } else {
            (
                Arc::new(HttpProfileGateway::new(
                    config.gateway.api_url.clone(),
                    config.gateway.timeout(),
                    config.gateway.retry_policy(),
                )),
                Arc::new(DevtoolsDriverFactory),
            )
        };

    let max_concurrency = args
        .max_concurrency
        .unwrap_or(config.automation.max_concurrency);
    let orchestrator = Orchestrator::new(lifecycle, factory, executor, max_concurrency);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; aborting runs at their next step boundary");
            interrupt.cancel();
        }
    });

    let status: Arc<dyn StatusSink> = Arc::new(ConsoleStatusSink::new());
    let report = orchestrator
        .run(profiles, Arc::new(spec), cancel, status)
        .await;

    render(&report, args.json)?;
    Ok(if report.all_succeeded() { 0 } else { 1 })
}

fn load_campaign(path: &Path) -> anyhow::Result<CampaignSpec> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read campaign file {}", path.display()))?;
    let spec: CampaignSpec = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse campaign file {}", path.display()))?;
    spec.validate()
        .with_context(|| format!("invalid campaign spec {}", path.display()))?;
    Ok(spec)
}

fn load_catalog(config: &AppConfig) -> anyhow::Result<SelectorCatalog> {
    match &config.wizard.catalog_path {
        Some(path) => SelectorCatalog::load(path)
            .with_context(|| format!("failed to load selector bundle {}", path.display())),
        None => Ok(default_catalog()),
    }
}

fn render(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("run {}", report.run.0);
    for (profile, outcome) in &report.outcomes {
        match outcome {
            ProfileOutcome::Succeeded => println!("  {:<24} succeeded", profile.0),
            ProfileOutcome::Failed { reason, .. } => {
                println!("  {:<24} failed: {reason}", profile.0)
            }
            ProfileOutcome::Aborted => println!("  {:<24} aborted", profile.0),
        }
    }
    let (succeeded, failed, aborted) = report.tally();
    println!("{succeeded} succeeded, {failed} failed, {aborted} aborted");
    Ok(())
}

/// In-memory stand-in for the profile manager and the browser backend:
/// every profile gets a session whose pages walk the whole wizard happily.
fn scripted_harness(
    profiles: &[ProfileId],
    entry_url: &str,
) -> (Arc<dyn ProfileLifecycle>, Arc<dyn DriverFactory>) {
    let lifecycle = Arc::new(ScriptedLifecycle::new());
    let factory = Arc::new(ScriptedDriverFactory::new());
    for (i, profile) in profiles.iter().enumerate() {
        let key = format!("ws-dry-{i}");
        lifecycle.add_profile(&profile.0, format!("dry-run profile {i}"));
        lifecycle.script_start(&profile.0, ScriptedStart::Ok(key.clone()));
        factory.register(key, scripted_wizard(entry_url));
    }
    (lifecycle, factory)
}

fn scripted_wizard(entry_url: &str) -> Arc<ScriptedDriver> {
    let driver = ScriptedDriver::new(ScriptedPage::new("about:blank"));
    driver.script_route(
        entry_url,
        ScriptedPage::new(format!("{entry_url}/overview"))
            .with_lang("pt-BR")
            .with_element(
                ScriptedElement::new("btn-new")
                    .with_matcher(ElementDescriptor::css("button[data-test-id='new-campaign']"))
                    .with_text("Nova campanha"),
            ),
    );
    driver.script_click(
        "btn-new",
        vec![
            PageEffect::AddElement(
                ScriptedElement::new("card-sales")
                    .with_matcher(ElementDescriptor::css("div[data-test-id='objective-sales']"))
                    .with_text("Vendas"),
            ),
            PageEffect::AddElement(
                ScriptedElement::new("card-leads")
                    .with_matcher(ElementDescriptor::css("div[data-test-id='objective-leads']"))
                    .with_text("Leads"),
            ),
            PageEffect::AddElement(
                ScriptedElement::new("card-traffic")
                    .with_matcher(ElementDescriptor::css(
                        "div[data-test-id='objective-website-traffic']",
                    ))
                    .with_text("Tráfego do website"),
            ),
            PageEffect::AddElement(
                ScriptedElement::new("card-none")
                    .with_matcher(ElementDescriptor::css("button[data-test-id='objective-none']"))
                    .with_text("Criar campanha sem orientação de objetivo"),
            ),
        ],
    );
    let wizard_panel = vec![
        PageEffect::AddElement(
            ScriptedElement::new("name-input")
                .with_matcher(ElementDescriptor::css("input[data-test-id='campaign-name-input']")),
        ),
        PageEffect::AddElement(
            ScriptedElement::new("headline")
                .with_matcher(ElementDescriptor::css("input[data-test-id='headline-input']")),
        ),
        PageEffect::AddElement(
            ScriptedElement::new("loc-input")
                .with_matcher(ElementDescriptor::css("input[data-test-id='location-input']")),
        ),
        PageEffect::AddElement(
            ScriptedElement::new("budget")
                .with_matcher(ElementDescriptor::css("input[data-test-id='budget-input']")),
        ),
        PageEffect::AddElement(
            ScriptedElement::new("max-cpc")
                .with_matcher(ElementDescriptor::css("input[data-test-id='max-cpc-input']")),
        ),
        PageEffect::AddElement(
            ScriptedElement::new("btn-continue")
                .with_matcher(ElementDescriptor::css("button[data-test-id='save-continue']"))
                .with_text("Salvar e continuar"),
        ),
    ];
    for card in ["card-sales", "card-leads", "card-traffic", "card-none"] {
        driver.script_click(card, wizard_panel.clone());
    }
    driver.script_enter(
        "loc-input",
        vec![PageEffect::AddElement(
            ScriptedElement::new("chip")
                .with_matcher(ElementDescriptor::css("div[data-test-id='location-chip']")),
        )],
    );
    driver.script_click(
        "btn-continue",
        vec![PageEffect::AddElement(
            ScriptedElement::new("btn-publish")
                .with_matcher(ElementDescriptor::css("button[data-test-id='publish']"))
                .with_text("Publicar"),
        )],
    );
    driver.script_click(
        "btn-publish",
        vec![PageEffect::AddElement(
            ScriptedElement::new("confirm")
                .with_matcher(ElementDescriptor::css("div[data-test-id='campaign-published']"))
                .with_text("Sua campanha foi publicada"),
        )],
    );
    Arc::new(driver)
}
