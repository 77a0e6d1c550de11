pub mod config;
pub mod executor;
pub mod job;
pub mod pool;
pub mod reporter;

pub use config::{load_config, validate_config, FeaturizeConfig};
pub use executor::Featurization;
pub use job::{Job, Outcome};
pub use pool::WorkerPool;
pub use reporter::{LogReporter, OutcomeReporter, RunManifest, RunReport, SetupFailure};
