use crate::dataset::Dataset;
use crate::error::FeaturizeError;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Domain tag under which featurizers are registered.
pub const FEATURIZE_DOMAIN: &str = "featurize";

/// Featurizer that needs the whole text column at once.
pub trait BatchTransform: Send + Sync {
    fn featurize_list(&self, texts: &[String]) -> anyhow::Result<Vec<String>>;
}

/// Featurizer applied to one text value at a time.
pub trait ElementTransform: Send + Sync {
    fn featurize(&self, text: &str) -> anyhow::Result<String>;
}

impl<F> BatchTransform for F
where
    F: Fn(&[String]) -> anyhow::Result<Vec<String>> + Send + Sync,
{
    fn featurize_list(&self, texts: &[String]) -> anyhow::Result<Vec<String>> {
        self(texts)
    }
}

impl<F> ElementTransform for F
where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync,
{
    fn featurize(&self, text: &str) -> anyhow::Result<String> {
        self(text)
    }
}

/// The normalized call shape of a featurizer.
#[derive(Clone)]
pub enum Transform {
    Batch(Arc<dyn BatchTransform>),
    Elementwise(Arc<dyn ElementTransform>),
}

/// What a plugin offers before normalization. Either, both or neither
/// capability may be present.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub batch: Option<Arc<dyn BatchTransform>>,
    pub elementwise: Option<Arc<dyn ElementTransform>>,
}

impl Capabilities {
    pub fn with_batch(mut self, t: impl BatchTransform + 'static) -> Self {
        self.batch = Some(Arc::new(t));
        self
    }

    pub fn with_elementwise(mut self, t: impl ElementTransform + 'static) -> Self {
        self.elementwise = Some(Arc::new(t));
        self
    }
}

/// A named, shareable featurizer.
#[derive(Clone)]
pub struct Featurizer {
    name: String,
    transform: Option<Transform>,
}

impl std::fmt::Debug for Featurizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shape = match &self.transform {
            Some(Transform::Batch(_)) => "batch",
            Some(Transform::Elementwise(_)) => "elementwise",
            None => "none",
        };
        f.debug_struct("Featurizer")
            .field("name", &self.name)
            .field("transform", &shape)
            .finish()
    }
}

impl Featurizer {
    pub fn batch(name: impl Into<String>, t: impl BatchTransform + 'static) -> Self {
        Self {
            name: name.into(),
            transform: Some(Transform::Batch(Arc::new(t))),
        }
    }

    pub fn elementwise(name: impl Into<String>, t: impl ElementTransform + 'static) -> Self {
        Self {
            name: name.into(),
            transform: Some(Transform::Elementwise(Arc::new(t))),
        }
    }

    /// Normalize raw capabilities. Batch wins when both are offered; a
    /// featurizer with neither is kept and fails every job it runs.
    pub fn from_capabilities(name: impl Into<String>, caps: Capabilities) -> Self {
        let transform = match (caps.batch, caps.elementwise) {
            (Some(b), _) => Some(Transform::Batch(b)),
            (None, Some(e)) => Some(Transform::Elementwise(e)),
            (None, None) => None,
        };
        Self {
            name: name.into(),
            transform,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Run the transform over `texts`, enforcing one output per input.
    pub fn apply(&self, texts: &[String]) -> anyhow::Result<Vec<String>> {
        let features = match &self.transform {
            Some(Transform::Batch(t)) => t.featurize_list(texts)?,
            Some(Transform::Elementwise(t)) => texts
                .iter()
                .map(|text| t.featurize(text))
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => {
                return Err(FeaturizeError::MissingCapability {
                    plugin: self.name.clone(),
                }
                .into())
            }
        };

        if features.len() != texts.len() {
            return Err(FeaturizeError::LengthMismatch {
                plugin: self.name.clone(),
                expected: texts.len(),
                actual: features.len(),
            }
            .into());
        }
        Ok(features)
    }

    /// Featurize `dataset` into a new dataset; the input is never modified.
    pub fn generate(&self, dataset: &Dataset) -> anyhow::Result<Dataset> {
        let features = self.apply(&dataset.texts())?;
        Ok(dataset.with_features(features)?)
    }
}

type Factory = Box<dyn Fn() -> Featurizer + Send + Sync>;

/// Name -> constructor lookup, grouped by domain.
#[derive(Default)]
pub struct PluginRegistry {
    domains: HashMap<String, BTreeMap<String, Factory>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the bundled featurizers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::featurizers::register_builtins(&mut registry);
        registry
    }

    pub fn register<F>(&mut self, domain: &str, name: &str, factory: F)
    where
        F: Fn() -> Featurizer + Send + Sync + 'static,
    {
        self.domains
            .entry(domain.to_string())
            .or_default()
            .insert(name.to_string(), Box::new(factory));
    }

    /// Registered names in `domain`, sorted.
    pub fn names(&self, domain: &str) -> Vec<&str> {
        self.domains
            .get(domain)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Instantiate each configured name, in order. Any unknown name fails
    /// the whole resolution.
    pub fn resolve(
        &self,
        domain: &str,
        names: &[String],
    ) -> Result<Vec<Arc<Featurizer>>, FeaturizeError> {
        let plugins = self.domains.get(domain);
        names
            .iter()
            .map(|name| {
                plugins
                    .and_then(|m| m.get(name))
                    .map(|factory| Arc::new(factory()))
                    .ok_or_else(|| FeaturizeError::UnknownPlugin {
                        domain: domain.to_string(),
                        name: name.clone(),
                    })
            })
            .collect()
    }
}
