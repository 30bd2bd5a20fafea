//! `adpilot profiles` command

use clap::Args;
use profile_gateway::{HttpProfileGateway, ProfileLifecycle};

use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct ProfilesArgs {
    /// Emit the listing as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ProfilesArgs, config: &AppConfig) -> anyhow::Result<i32> {
    let gateway = HttpProfileGateway::new(
        config.gateway.api_url.clone(),
        config.gateway.timeout(),
        config.gateway.retry_policy(),
    );
    let profiles = gateway.list_profiles().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(0);
    }

    if profiles.is_empty() {
        println!("no profiles found");
        return Ok(0);
    }
    println!("{:<24} {:<32} {}", "ID", "NAME", "STATUS");
    for profile in &profiles {
        println!(
            "{:<24} {:<32} {:?}",
            profile.id.0, profile.name, profile.status
        );
    }
    Ok(0)
}
