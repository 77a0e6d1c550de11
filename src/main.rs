mod cli;

use anyhow::Context;
use clap::Parser;
use featurepipe::pipeline::{load_config, validate_config, Featurization};
use featurepipe::plugins::{PluginRegistry, FEATURIZE_DOMAIN};
use featurepipe::util::write_artifact;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging; RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let registry = PluginRegistry::with_builtins();

    match cli.command {
        cli::Commands::Run { config, jobs } => {
            run(&config, jobs, &registry).await.context("featurization run failed")?;
        }
        cli::Commands::Validate { config } => {
            let c = load_config(&config)?;
            validate_config(&c)?;
            registry.resolve(FEATURIZE_DOMAIN, &c.featurizers)?;
            println!("Config '{}' validated", c.display_name());
        }
        cli::Commands::List => {
            for name in registry.names(FEATURIZE_DOMAIN) {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

async fn run(path: &Path, jobs: Option<usize>, registry: &PluginRegistry) -> anyhow::Result<()> {
    let mut config = load_config(path)?;
    if jobs.is_some() {
        config.concurrency = jobs;
    }
    validate_config(&config)?;

    info!("Featurization started: {}", config.display_name());
    let featurization = Featurization::from_config(config, registry)?;
    let report = featurization.run().await?;

    let manifest_path = featurization
        .config()
        .features_dir
        .join("runs")
        .join(format!("{}.json", report.run_id));
    let manifest = serde_json::to_vec_pretty(&report.manifest())?;
    write_artifact(&manifest_path, &manifest).await?;
    info!("Run manifest written to {}", manifest_path.display());

    Ok(())
}
