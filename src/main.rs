use adpilot_cli::cli::{dispatch, Cli};
use adpilot_cli::config::AppConfig;
use adpilot_cli::telemetry;
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            2
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = AppConfig::load(cli.config.as_deref())?;
    telemetry::init(&config.logging)?;
    dispatch(cli.command, config).await
}
