use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::wait::error::{Error, Result};

/// Default deadline for a wait hook when no positive timeout is configured
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(150);

/// Fixed delay before the first check and between subsequent checks
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A file holding one or more hooks, executed in order
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HookFile {
    #[serde(default)]
    pub hooks: Vec<HookConfig>,
}

impl HookFile {
    /// Load a hook file from YAML on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse a hook file from a YAML string
    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// A single hook definition
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HookConfig {
    /// Human readable name used in log and error messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Events this hook is attached to (e.g. "after:deploy")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,

    /// Condition the selected containers must reach
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<HookWaitConfig>,

    /// Which containers to watch
    #[serde(default, rename = "where")]
    pub where_: HookWhere,
}

impl HookConfig {
    /// Name shown to the user for this hook
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("wait")
    }

    /// Container filter of this hook, empty if none was given
    pub fn container_where(&self) -> ContainerWhere {
        self.where_.container.clone().unwrap_or_default()
    }
}

/// Wait condition of a hook
///
/// A container satisfies the condition when either configured criterion
/// matches its observed status.
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HookWaitConfig {
    /// Container must be running and pass its readiness check
    #[serde(default)]
    pub running: bool,

    /// Container must have terminated with exactly this exit code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated_with_code: Option<i32>,

    /// Deadline in seconds; absent, zero or negative uses the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
}

/// Where a hook applies
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HookWhere {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerWhere>,
}

/// Additive container filters. Every field that is set narrows the selection.
#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerWhere {
    /// Key of an image in the project config (or `dependency.key`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,

    /// Image reference or `image(key)` expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_selector: Option<String>,

    /// Pod labels that must all match
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub label_selector: BTreeMap<String, String>,

    /// Exact pod name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,

    /// Exact container name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,

    /// Namespace to search, defaults to the client's namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ContainerWhere {
    /// Whether an image based filter was requested
    pub fn wants_images(&self) -> bool {
        non_empty(&self.image_name).is_some() || non_empty(&self.image_selector).is_some()
    }
}

/// Treat empty strings the same as unset fields
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Timing policy for a single wait
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay before the first check and between checks
    pub interval: Duration,
    /// Total time budget measured from the start of the wait
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl PollConfig {
    /// Poll policy for a wait condition, falling back to the default deadline
    pub fn for_wait(wait: &HookWaitConfig) -> Self {
        let timeout = match wait.timeout {
            Some(secs) if secs > 0 => Duration::from_secs(secs.unsigned_abs()),
            _ => DEFAULT_WAIT_TIMEOUT,
        };
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// JSON schema of the hook file format
pub fn hook_schema() -> Result<String> {
    let schema = schemars::schema_for!(HookFile);
    Ok(serde_json::to_string_pretty(&schema)?)
}
