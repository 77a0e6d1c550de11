//! Batch featurization: apply every configured featurizer to every
//! configured dataset on a bounded worker pool, one artifact per pair.

pub mod dataset;
pub mod error;
pub mod featurizers;
pub mod pipeline;
pub mod plugins;
pub mod sink;
pub mod util;

pub use dataset::Dataset;
pub use error::FeaturizeError;
pub use pipeline::{FeaturizeConfig, Featurization, Outcome, RunReport};
pub use plugins::{Featurizer, PluginRegistry};
