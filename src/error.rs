use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the featurization harness itself.
///
/// Plugin transforms return `anyhow::Result`; these variants cover the
/// cases the harness detects on its own so callers can tell them apart.
#[derive(Error, Debug)]
pub enum FeaturizeError {
    #[error("failed to open dataset `{name}` at {path:?}")]
    DatasetOpen {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dataset `{name}`")]
    DatasetParse {
        name: String,
        #[source]
        source: csv::Error,
    },

    #[error("dataset `{name}` has no column '{column}'")]
    MissingColumn { name: String, column: String },

    #[error("unknown {domain} plugin '{name}'")]
    UnknownPlugin { domain: String, name: String },

    #[error("featurizer '{plugin}' implements neither a batch nor an elementwise transform")]
    MissingCapability { plugin: String },

    #[error("featurizer '{plugin}' returned {actual} values for {expected} rows")]
    LengthMismatch {
        plugin: String,
        expected: usize,
        actual: usize,
    },

    #[error("job ({dataset}, {plugin}) panicked: {message}")]
    JobPanicked {
        dataset: String,
        plugin: String,
        message: String,
    },

    #[error("worker pool is closed")]
    PoolClosed,
}
