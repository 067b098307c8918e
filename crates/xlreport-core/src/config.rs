//! Configuration loading
//!
//! Settings come from a TOML file with one section per environment:
//!
//! ```toml
//! [environment]
//! current = "development"
//!
//! [store]
//! uri = "mongodb://localhost:27017"
//! database = "drs"
//!
//! [environments.development]
//! export_dir = "exports"
//!
//! [environments.development.templates]
//! 20 = "Incident Detail Export"
//! ```
//!
//! `Settings::resolve` picks the active environment and produces the
//! `RuntimeConfig` handed to the dispatcher.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::TemplateId;

pub const DEFAULT_TASK_COLLECTION: &str = "System_tasks";
pub const DEFAULT_LEASE_SECONDS: u64 = 3600;

fn default_task_collection() -> String {
    DEFAULT_TASK_COLLECTION.to_string()
}

const fn default_lease_seconds() -> u64 {
    DEFAULT_LEASE_SECONDS
}

/// Raw configuration file contents.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Settings {
    pub environment: EnvironmentSelector,
    pub store: StoreSettings,
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentSettings>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EnvironmentSelector {
    pub current: String,
}

/// Database connection settings
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreSettings {
    pub uri: String,
    pub database: String,
    #[serde(default = "default_task_collection")]
    pub task_collection: String,
}

/// Per-environment settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EnvironmentSettings {
    pub export_dir: PathBuf,
    #[serde(default = "default_lease_seconds")]
    pub lease_seconds: u64,
    /// Template id -> task name. Only these templates are dispatched.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

/// Resolved configuration for one environment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RuntimeConfig {
    pub environment: String,
    pub export_dir: PathBuf,
    pub lease_seconds: u64,
    pub templates: BTreeMap<TemplateId, String>,
    pub store: StoreSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Name of the active environment; `env_override` wins over `environment.current`.
    pub fn environment_name<'a>(&'a self, env_override: Option<&'a str>) -> &'a str {
        env_override
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.environment.current)
            .trim()
    }

    /// The active environment's section.
    pub fn environment(&self, env_override: Option<&str>) -> Result<&EnvironmentSettings, ConfigError> {
        let name = self.environment_name(env_override);
        self.environments
            .get(name)
            .ok_or_else(|| ConfigError::MissingEnvironment(name.to_string()))
    }

    /// Resolve the active environment into runtime settings.
    pub fn resolve(&self, env_override: Option<&str>) -> Result<RuntimeConfig, ConfigError> {
        let name = self.environment_name(env_override).to_string();
        let env = self.environment(env_override)?;

        let templates = env
            .templates
            .iter()
            .map(|(id, task_name)| {
                id.parse::<TemplateId>()
                    .map(|id| (id, task_name.clone()))
                    .map_err(|_| ConfigError::InvalidTemplateId(id.clone()))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(RuntimeConfig {
            environment: name,
            export_dir: env.export_dir.clone(),
            lease_seconds: env.lease_seconds,
            templates,
            store: self.store.clone(),
        })
    }
}

impl RuntimeConfig {
    pub fn template_name(&self, id: TemplateId) -> Option<&str> {
        self.templates.get(&id).map(String::as_str)
    }

    pub fn template_ids(&self) -> impl Iterator<Item = TemplateId> + '_ {
        self.templates.keys().copied()
    }

    pub fn lease(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lease_seconds.min(u64::from(u32::MAX)) as i64)
    }
}
