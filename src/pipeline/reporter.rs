use crate::pipeline::job::Outcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

/// Receives results as the engine collects them. Implementations must not
/// fail; reporting never changes the course of a run.
pub trait OutcomeReporter: Send {
    fn job_completed(&mut self, outcome: &Outcome);

    fn setup_failed(&mut self, dataset_name: &str, error: &anyhow::Error);

    fn run_finished(&mut self, _report: &RunReport) {}
}

/// Reports to the tracing subscriber.
#[derive(Debug, Default)]
pub struct LogReporter;

impl OutcomeReporter for LogReporter {
    fn job_completed(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Success {
                dataset_name,
                plugin_name,
                location,
                rows,
            } => info!(
                dataset = %dataset_name,
                featurizer = %plugin_name,
                rows,
                "Completed featurization of dataset `{}` with featurizer `{}` -> {}",
                dataset_name, plugin_name, location
            ),
            Outcome::Failure {
                dataset_name,
                plugin_name,
                error,
            } => error!(
                dataset = %dataset_name,
                featurizer = %plugin_name,
                "{}",
                failure_line(dataset_name, plugin_name, error)
            ),
        }
    }

    fn setup_failed(&mut self, dataset_name: &str, error: &anyhow::Error) {
        error!(
            dataset = %dataset_name,
            "Skipping dataset `{}`, it could not be loaded: {:#}",
            dataset_name, error
        );
    }

    fn run_finished(&mut self, report: &RunReport) {
        info!(
            run_id = %report.run_id,
            jobs = report.outcomes.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            setup_failures = report.setup_failures.len(),
            "Featurization finished"
        );
    }
}

/// Single-line failure message; the cause chain is joined with `: `.
fn failure_line(dataset_name: &str, plugin_name: &str, error: &anyhow::Error) -> String {
    format!(
        "Failed featurization of dataset `{}` with featurizer `{}`: {:#}",
        dataset_name, plugin_name, error
    )
}

/// A dataset that produced no jobs because it failed to load.
#[derive(Debug)]
pub struct SetupFailure {
    pub dataset_name: String,
    pub error: anyhow::Error,
}

/// Everything a run produced, in collection order.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<Outcome>,
    pub setup_failures: Vec<SetupFailure>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Outcome for a given pair, if that job ran.
    pub fn outcome(&self, dataset_name: &str, plugin_name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.dataset_name() == dataset_name && o.plugin_name() == plugin_name)
    }

    pub fn manifest(&self) -> RunManifest {
        let mut jobs: Vec<JobRecord> = self
            .outcomes
            .iter()
            .map(|o| match o {
                Outcome::Success {
                    dataset_name,
                    plugin_name,
                    location,
                    rows,
                } => JobRecord {
                    dataset: dataset_name.clone(),
                    featurizer: plugin_name.clone(),
                    status: JobStatus::Success,
                    location: Some(location.clone()),
                    rows: Some(*rows),
                    error: None,
                },
                Outcome::Failure {
                    dataset_name,
                    plugin_name,
                    error,
                } => JobRecord {
                    dataset: dataset_name.clone(),
                    featurizer: plugin_name.clone(),
                    status: JobStatus::Failure,
                    location: None,
                    rows: None,
                    error: Some(format!("{:#}", error)),
                },
            })
            .collect();
        // completion order is arbitrary; keep the manifest stable
        jobs.sort_by(|a, b| (&a.dataset, &a.featurizer).cmp(&(&b.dataset, &b.featurizer)));

        RunManifest {
            run_id: self.run_id,
            name: self.name.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            total_jobs: self.outcomes.len(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            setup_failures: self
                .setup_failures
                .iter()
                .map(|f| SetupRecord {
                    dataset: f.dataset_name.clone(),
                    error: format!("{:#}", f.error),
                })
                .collect(),
            jobs,
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Failure,
}

#[derive(Debug, Serialize)]
pub struct JobRecord {
    pub dataset: String,
    pub featurizer: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetupRecord {
    pub dataset: String,
    pub error: String,
}

/// JSON summary written next to the artifacts after a run.
#[derive(Debug, Serialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_jobs: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub setup_failures: Vec<SetupRecord>,
    pub jobs: Vec<JobRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        let now = Utc::now();
        RunReport {
            run_id: Uuid::new_v4(),
            name: Some("bench".into()),
            started_at: now,
            finished_at: now,
            outcomes: vec![
                Outcome::Failure {
                    dataset_name: "b".into(),
                    plugin_name: "p1".into(),
                    error: anyhow::anyhow!("root cause").context("transform failed"),
                },
                Outcome::Success {
                    dataset_name: "a".into(),
                    plugin_name: "p2".into(),
                    location: "Features/a/p2.csv".into(),
                    rows: 3,
                },
            ],
            setup_failures: vec![SetupFailure {
                dataset_name: "missing".into(),
                error: anyhow::anyhow!("no such file"),
            }],
        }
    }

    #[test]
    fn counts_and_lookup() {
        let r = report();
        assert_eq!(r.succeeded(), 1);
        assert_eq!(r.failed(), 1);
        assert!(r.outcome("a", "p2").unwrap().is_success());
        assert!(r.outcome("a", "p1").is_none());
    }

    #[test]
    fn manifest_is_sorted_and_keeps_cause_chain() {
        let m = report().manifest();
        assert_eq!(m.total_jobs, 2);
        assert_eq!(m.jobs[0].dataset, "a");
        assert_eq!(m.jobs[1].error.as_deref(), Some("transform failed: root cause"));

        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["jobs"][0]["status"], "success");
        assert!(json["jobs"][0].get("error").is_none());
        assert_eq!(json["setup_failures"][0]["dataset"], "missing");
    }

    #[test]
    fn failure_line_is_one_line_with_cause_chain() {
        let error = anyhow::anyhow!("root cause").context("transform failed");
        let line = failure_line("b", "p1", &error);
        assert!(!line.contains('\n'));
        assert_eq!(
            line,
            "Failed featurization of dataset `b` with featurizer `p1`: transform failed: root cause"
        );
    }

    #[test]
    fn log_reporter_accepts_every_shape() {
        let r = report();
        let mut reporter = LogReporter;
        for o in &r.outcomes {
            reporter.job_completed(o);
        }
        reporter.setup_failed("missing", &r.setup_failures[0].error);
        reporter.run_finished(&r);
    }
}
