use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::wait::error::{Error, Result};

/// Loaded project configuration
///
/// Only the parts needed to resolve image names are modelled here.
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Images declared by the project, keyed by their config name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<String, ImageConfig>,

    /// State generated by previous builds (present once the config is loaded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<GeneratedConfig>,

    /// Other projects whose images hooks may reference as `name.key`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyConfig>,
}

impl ProjectConfig {
    /// Load a project config from YAML on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse a project config from a YAML string
    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Load the project configs of all declared dependencies
    ///
    /// Relative paths are resolved against `base_dir`, normally the directory
    /// holding this project's config file.
    pub fn load_dependencies(&self, base_dir: impl AsRef<Path>) -> Result<Vec<Dependency>> {
        let base_dir = base_dir.as_ref();
        self.dependencies
            .iter()
            .map(|dep| {
                let path = base_dir.join(&dep.path);
                debug!(dependency = %dep.name, path = %path.display(), "Loading dependency config");
                Ok(Dependency::new(&dep.name, Self::from_path(&path)?))
            })
            .collect()
    }

    /// Whether generated state is available
    pub fn is_loaded(&self) -> bool {
        self.generated.is_some()
    }

    /// Tag produced by the last build of an image, if any
    pub fn built_tag(&self, image_key: &str) -> Option<&str> {
        self.generated
            .as_ref()
            .and_then(|g| g.images.get(image_key))
            .map(|i| i.tag.as_str())
            .filter(|t| !t.is_empty())
    }
}

/// An image declared in the project config
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    /// Image repository (e.g. "ghcr.io/acme/api")
    pub image: String,

    /// Static tags; the first one is used when nothing was built yet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Generated state written after builds
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedConfig {
    #[serde(default)]
    pub images: BTreeMap<String, GeneratedImage>,
}

/// Build result for one image
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq)]
pub struct GeneratedImage {
    pub tag: String,
}

/// Declared dependency: a name and the path of its project config
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DependencyConfig {
    pub name: String,
    pub path: String,
}

/// A project this project depends on, with its config loaded
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dependency {
    pub name: String,
    pub config: ProjectConfig,
}

impl Dependency {
    pub fn new(name: impl Into<String>, config: ProjectConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}
