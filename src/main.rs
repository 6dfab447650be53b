// ABOUTME: Entry point for the charmhand CLI application.
// ABOUTME: Parses arguments and dispatches to the stage or deploy flow.

mod cli;

use std::collections::BTreeMap;

use charmhand::deploy::{DeployParams, Deployer};
use charmhand::error::{Error, Result};
use charmhand::juju::{JujuCli, StatusPoller};
use charmhand::repository::Stager;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Stage { source, series } => {
            let repository = Stager::new().stage(&source, &series)?;
            println!("{}", repository.display());
            Ok(())
        }
        Commands::Deploy {
            charm,
            set,
            force_machine,
            source,
            series,
        } => {
            let params = DeployParams {
                options: parse_options(&set)?,
                force_machine,
                charm_source: source,
                series,
            };
            let deployer = Deployer::new(JujuCli::new(), StatusPoller::new());
            let unit = deployer.deploy(&charm, params).await?;
            println!("{}", unit.public_address);
            Ok(())
        }
    }
}

fn parse_options(pairs: &[String]) -> Result<Option<BTreeMap<String, String>>> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let mut options = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| Error::InvalidOption(pair.clone()))?;
        options.insert(key.to_string(), value.to_string());
    }
    Ok(Some(options))
}
