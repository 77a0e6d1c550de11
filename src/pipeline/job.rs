use crate::dataset::Dataset;
use crate::error::FeaturizeError;
use crate::plugins::Featurizer;
use crate::sink::{OutputKey, OutputSink};
use anyhow::Context;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};

/// One (dataset, featurizer) pairing. Both sides are shared read-only.
#[derive(Debug, Clone)]
pub struct Job {
    pub dataset: Arc<Dataset>,
    pub featurizer: Arc<Featurizer>,
}

impl Job {
    pub fn new(dataset: Arc<Dataset>, featurizer: Arc<Featurizer>) -> Self {
        Self {
            dataset,
            featurizer,
        }
    }

    pub fn dataset_name(&self) -> &str {
        self.dataset.name()
    }

    pub fn plugin_name(&self) -> &str {
        self.featurizer.name()
    }

    pub fn key(&self) -> OutputKey {
        OutputKey::new(self.dataset_name(), self.plugin_name())
    }

    /// Featurize and write. Never fails: every error, panics included,
    /// becomes a `Failure` outcome for this pair.
    pub async fn execute(self, sink: Arc<dyn OutputSink>) -> Outcome {
        let dataset_name = self.dataset_name().to_string();
        let plugin_name = self.plugin_name().to_string();
        let span = info_span!("job", dataset = %dataset_name, featurizer = %plugin_name);

        // Run in its own task so a panic in the sink is contained too.
        let run = tokio::spawn(self.run(sink).instrument(span));
        match run.await {
            Ok(Ok((location, rows))) => Outcome::Success {
                dataset_name,
                plugin_name,
                location,
                rows,
            },
            Ok(Err(error)) => Outcome::Failure {
                dataset_name,
                plugin_name,
                error,
            },
            Err(join_err) => {
                let message = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    join_err.to_string()
                };
                let error = FeaturizeError::JobPanicked {
                    dataset: dataset_name.clone(),
                    plugin: plugin_name.clone(),
                    message,
                };
                Outcome::Failure {
                    dataset_name,
                    plugin_name,
                    error: error.into(),
                }
            }
        }
    }

    async fn run(self, sink: Arc<dyn OutputSink>) -> anyhow::Result<(String, usize)> {
        let key = self.key();
        let Job {
            dataset,
            featurizer,
        } = self;

        debug!("transform started");
        // transforms are CPU bound; keep them off the async workers
        let featurized = tokio::task::spawn_blocking(move || featurizer.generate(&dataset))
            .await
            .map_err(|e| {
                let message = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                anyhow::Error::new(FeaturizeError::JobPanicked {
                    dataset: key.dataset.clone(),
                    plugin: key.featurizer.clone(),
                    message,
                })
            })??;

        let location = sink.location(&key);
        sink.write(&key, &featurized)
            .await
            .with_context(|| format!("failed to write features to {}", location))?;
        debug!(rows = featurized.len(), "features written");
        Ok((location, featurized.len()))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Terminal result of one job.
#[derive(Debug)]
pub enum Outcome {
    Success {
        dataset_name: String,
        plugin_name: String,
        location: String,
        rows: usize,
    },
    Failure {
        dataset_name: String,
        plugin_name: String,
        error: anyhow::Error,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn dataset_name(&self) -> &str {
        match self {
            Outcome::Success { dataset_name, .. } | Outcome::Failure { dataset_name, .. } => {
                dataset_name
            }
        }
    }

    pub fn plugin_name(&self) -> &str {
        match self {
            Outcome::Success { plugin_name, .. } | Outcome::Failure { plugin_name, .. } => {
                plugin_name
            }
        }
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            Outcome::Failure { error, .. } => Some(error),
            Outcome::Success { .. } => None,
        }
    }
}
