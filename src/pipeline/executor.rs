use crate::dataset::Dataset;
use crate::error::FeaturizeError;
use crate::pipeline::config::FeaturizeConfig;
use crate::pipeline::job::{Job, Outcome};
use crate::pipeline::pool::WorkerPool;
use crate::pipeline::reporter::{LogReporter, OutcomeReporter, RunReport, SetupFailure};
use crate::plugins::{Featurizer, PluginRegistry, FEATURIZE_DOMAIN};
use crate::sink::{CsvSink, OutputSink};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Runs every configured featurizer over every configured dataset.
pub struct Featurization {
    config: FeaturizeConfig,
    featurizers: Vec<Arc<Featurizer>>,
    sink: Arc<dyn OutputSink>,
}

impl Featurization {
    pub fn new(
        config: FeaturizeConfig,
        featurizers: Vec<Arc<Featurizer>>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            config,
            featurizers,
            sink,
        }
    }

    /// Resolve the configured featurizers and write CSV under `features_dir`.
    pub fn from_config(config: FeaturizeConfig, registry: &PluginRegistry) -> anyhow::Result<Self> {
        let featurizers = registry.resolve(FEATURIZE_DOMAIN, &config.featurizers)?;
        let sink = Arc::new(CsvSink::new(config.features_dir.clone()));
        Ok(Self::new(config, featurizers, sink))
    }

    pub fn config(&self) -> &FeaturizeConfig {
        &self.config
    }

    pub fn featurizers(&self) -> &[Arc<Featurizer>] {
        &self.featurizers
    }

    /// Run all featurization jobs, logging each outcome.
    pub async fn run(&self) -> anyhow::Result<RunReport> {
        self.run_with(&mut LogReporter).await
    }

    /// Run all featurization jobs, handing each outcome to `reporter` as
    /// soon as it is collected. Returns once every submitted job has one.
    pub async fn run_with<R: OutcomeReporter>(&self, reporter: &mut R) -> anyhow::Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id, name = %self.config.display_name());
        self.dispatch(run_id, reporter).instrument(span).await
    }

    async fn dispatch<R: OutcomeReporter>(
        &self,
        run_id: Uuid,
        reporter: &mut R,
    ) -> anyhow::Result<RunReport> {
        let started_at = Utc::now();
        let workers = self.config.worker_count();
        info!(
            "Starting featurization: {} dataset(s) x {} featurizer(s) on {} worker(s)",
            self.config.data.len(),
            self.featurizers.len(),
            workers
        );

        let mut pool = WorkerPool::new(workers, self.sink.clone());
        let mut outcomes = Vec::new();
        let mut setup_failures = Vec::new();

        for dataset_name in &self.config.data {
            // report whatever already finished while we were loading
            while let Some(outcome) = pool.try_next_outcome() {
                reporter.job_completed(&outcome);
                outcomes.push(outcome);
            }

            let dataset = match Dataset::load(&self.config.data_dir, dataset_name).await {
                Ok(d) => Arc::new(d),
                Err(e) => {
                    let error = anyhow::Error::new(e);
                    reporter.setup_failed(dataset_name, &error);
                    setup_failures.push(SetupFailure {
                        dataset_name: dataset_name.clone(),
                        error,
                    });
                    continue;
                }
            };

            if let Err(e) = submit_pairs(&mut pool, &dataset, &self.featurizers) {
                // already-submitted jobs are still drained and reported
                error!("Stopped submitting jobs: {}", e);
                break;
            }
        }
        pool.close();

        drain(&mut pool, reporter, &mut outcomes).await;
        let lost = pool.pending();
        pool.shutdown().await;
        if lost > 0 {
            anyhow::bail!("worker pool stopped with {} job(s) unaccounted for", lost);
        }

        let report = RunReport {
            run_id,
            name: self.config.name.clone(),
            started_at,
            finished_at: Utc::now(),
            outcomes,
            setup_failures,
        };
        reporter.run_finished(&report);
        Ok(report)
    }
}

fn submit_pairs(
    pool: &mut WorkerPool,
    dataset: &Arc<Dataset>,
    featurizers: &[Arc<Featurizer>],
) -> Result<(), FeaturizeError> {
    for featurizer in featurizers {
        info!("Featurizing {} with {}....", dataset.name(), featurizer.name());
        pool.submit(Job::new(dataset.clone(), featurizer.clone()))?;
    }
    Ok(())
}

/// Block on the pool until every submitted job has been collected, reporting
/// each outcome as it arrives.
async fn drain<R: OutcomeReporter>(
    pool: &mut WorkerPool,
    reporter: &mut R,
    outcomes: &mut Vec<Outcome>,
) {
    while let Some(outcome) = pool.next_outcome().await {
        reporter.job_completed(&outcome);
        outcomes.push(outcome);
    }
}
