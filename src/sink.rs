use crate::dataset::Dataset;
use crate::util::{feature_set_location, write_artifact};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Identity of one artifact. Distinct (dataset, featurizer) pairs never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputKey {
    pub dataset: String,
    pub featurizer: String,
}

impl OutputKey {
    pub fn new(dataset: impl Into<String>, featurizer: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            featurizer: featurizer.into(),
        }
    }
}

/// Sink trait: persist one featurized dataset under its key.
/// Writing the same key again replaces the previous artifact.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Human-readable location for `key`, used in logs and the run manifest.
    fn location(&self, key: &OutputKey) -> String;

    async fn write(&self, key: &OutputKey, dataset: &Dataset) -> anyhow::Result<()>;
}

/// CSV files under a root directory: `<root>/<dataset>/<featurizer>.csv`
pub struct CsvSink {
    root: PathBuf,
}

impl CsvSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &OutputKey) -> PathBuf {
        feature_set_location(&self.root, &key.dataset, &key.featurizer)
    }
}

#[async_trait]
impl OutputSink for CsvSink {
    fn location(&self, key: &OutputKey) -> String {
        self.path_for(key).display().to_string()
    }

    async fn write(&self, key: &OutputKey, dataset: &Dataset) -> anyhow::Result<()> {
        let bytes = dataset.to_csv()?;
        write_artifact(&self.path_for(key), &bytes).await
    }
}

/// Keeps artifacts in memory. Useful when embedding the engine and in tests.
#[derive(Default)]
pub struct MemorySink {
    artifacts: Mutex<HashMap<OutputKey, Dataset>>,
    writes: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &OutputKey) -> Option<Dataset> {
        self.artifacts.lock().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.artifacts.lock().await.len()
    }

    /// Total writes, including overwrites of an existing key.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    fn location(&self, key: &OutputKey) -> String {
        format!("memory://{}/{}", key.dataset, key.featurizer)
    }

    async fn write(&self, key: &OutputKey, dataset: &Dataset) -> anyhow::Result<()> {
        self.artifacts
            .lock()
            .await
            .insert(key.clone(), dataset.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
