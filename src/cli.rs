use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "featurepipe")]
#[command(about = "Run every configured featurizer over every configured dataset", long_about = None)]
#[command(version)]
pub struct Cli {
    /// More log output (-v for debug, -vv for trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Featurize all datasets with all featurizers
    Run {
        /// Featurization config (YAML)
        config: PathBuf,

        /// Override the number of worker slots
        #[arg(short = 'j', long)]
        jobs: Option<usize>,
    },
    /// Check a config file and its featurizer names without running
    Validate {
        config: PathBuf,
    },
    /// List available featurizers
    List,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
