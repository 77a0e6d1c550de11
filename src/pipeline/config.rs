use crate::util::sanitize_filename;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Featurization run configuration, read from YAML.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct FeaturizeConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Dataset names, loaded from `<data_dir>/<name>.csv` in this order
    pub data: Vec<String>,
    /// Featurizer names, resolved through the plugin registry
    pub featurizers: Vec<String>,
    /// Worker slots; defaults to the available CPU parallelism
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_features_dir")]
    pub features_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("Data")
}

fn default_features_dir() -> PathBuf {
    PathBuf::from("Features")
}

impl FeaturizeConfig {
    pub fn new(data: Vec<String>, featurizers: Vec<String>) -> Self {
        Self {
            name: None,
            data,
            featurizers,
            concurrency: None,
            data_dir: default_data_dir(),
            features_dir: default_features_dir(),
        }
    }

    /// Number of worker slots to run with.
    pub fn worker_count(&self) -> usize {
        self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// Make relative data/feature directories relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.data_dir.is_relative() {
            self.data_dir = base.join(&self.data_dir);
        }
        if self.features_dir.is_relative() {
            self.features_dir = base.join(&self.features_dir);
        }
    }
}

/// Load YAML file into FeaturizeConfig; directories resolve against the file's folder
pub fn load_config(path: &Path) -> anyhow::Result<FeaturizeConfig> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    let mut config: FeaturizeConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse YAML {:?}", path))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);
    Ok(config)
}

/// Validate: non-empty lists, unique non-empty file-safe names, at least one worker
pub fn validate_config(c: &FeaturizeConfig) -> anyhow::Result<()> {
    if c.data.is_empty() {
        anyhow::bail!("no datasets configured under 'data'");
    }
    if c.featurizers.is_empty() {
        anyhow::bail!("no featurizers configured under 'featurizers'");
    }

    for (kind, names) in [("dataset", &c.data), ("featurizer", &c.featurizers)] {
        let mut seen = HashSet::new();
        for n in names {
            if n.trim().is_empty() {
                anyhow::bail!("empty {} name", kind);
            }
            // names become path components of the artifact location
            if n == "." || n == ".." || sanitize_filename(n) != *n {
                anyhow::bail!("{} name '{}' is not usable as a file name", kind, n);
            }
            // duplicates would race on the same output file
            if !seen.insert(n.as_str()) {
                anyhow::bail!("duplicate {} name '{}'", kind, n);
            }
        }
    }

    if c.concurrency == Some(0) {
        anyhow::bail!("concurrency must be at least 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_yaml_with_defaults() {
        let c: FeaturizeConfig =
            serde_yaml::from_str("data: [reviews]\nfeaturizers: [wordcount]\n").unwrap();
        assert_eq!(c.data, vec!["reviews"]);
        assert_eq!(c.data_dir, PathBuf::from("Data"));
        assert_eq!(c.features_dir, PathBuf::from("Features"));
        assert!(c.concurrency.is_none());
        assert!(c.worker_count() >= 1);
        assert_eq!(c.display_name(), "<unnamed>");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<FeaturizeConfig, _> =
            serde_yaml::from_str("data: [a]\nfeaturizers: [b]\nworkers: 3\n");
        assert!(res.is_err());
    }

    #[test]
    fn load_resolves_dirs_against_config_folder() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("featurize.yaml");
        std::fs::write(
            &path,
            "name: bench\ndata: [a]\nfeaturizers: [wordcount]\nconcurrency: 2\nfeatures_dir: /abs/out\n",
        )
        .unwrap();

        let c = load_config(&path).unwrap();
        assert_eq!(c.data_dir, dir.path().join("Data"));
        assert_eq!(c.features_dir, PathBuf::from("/abs/out"));
        assert_eq!(c.worker_count(), 2);
        assert_eq!(c.display_name(), "bench");
    }

    #[test]
    fn validate_accepts_minimal_config() {
        let c = FeaturizeConfig::new(names(&["a", "b"]), names(&["wordcount"]));
        validate_config(&c).unwrap();
    }

    #[test]
    fn validate_rejects_empty_lists() {
        let c = FeaturizeConfig::new(vec![], names(&["wordcount"]));
        assert!(validate_config(&c).is_err());
        let c = FeaturizeConfig::new(names(&["a"]), vec![]);
        assert!(validate_config(&c).is_err());
    }

    #[test]
    fn validate_rejects_duplicates() {
        let c = FeaturizeConfig::new(names(&["a"]), names(&["wordcount", "wordcount"]));
        let err = validate_config(&c).unwrap_err();
        assert!(err.to_string().contains("duplicate featurizer name 'wordcount'"));
    }

    #[test]
    fn validate_rejects_names_that_would_collide_on_disk() {
        // both would land in <features_dir>/a_b/
        let c = FeaturizeConfig::new(names(&["a:b", "a_b"]), names(&["wordcount"]));
        let err = validate_config(&c).unwrap_err();
        assert!(err.to_string().contains("'a:b'"));

        let c = FeaturizeConfig::new(names(&["a"]), names(&["word/count"]));
        assert!(validate_config(&c).is_err());
    }

    #[test]
    fn validate_rejects_relative_dir_names() {
        for bad in [".", ".."] {
            let c = FeaturizeConfig::new(names(&[bad]), names(&["wordcount"]));
            assert!(validate_config(&c).is_err(), "dataset {bad:?} accepted");
            let c = FeaturizeConfig::new(names(&["a"]), names(&[bad]));
            assert!(validate_config(&c).is_err(), "featurizer {bad:?} accepted");
        }
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut c = FeaturizeConfig::new(names(&["a"]), names(&["wordcount"]));
        c.concurrency = Some(0);
        assert!(validate_config(&c).is_err());
    }
}
