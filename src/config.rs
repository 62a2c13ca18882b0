use crate::manager::{ManagerOptions, DEFAULT_NOTIFICATION_MS};
use crate::store::DEFAULT_BUSY_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RosterConfig {
    pub workspace: Option<String>,
    pub busy_timeout_ms: Option<u64>,
    pub seed_on_first_run: Option<bool>,
    pub notification_ms: Option<u64>,
}

impl RosterConfig {
    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            seed_on_first_run: self.seed_on_first_run.unwrap_or(true),
            notification_ms: self.notification_ms.unwrap_or(DEFAULT_NOTIFICATION_MS),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BUSY_TIMEOUT)
    }

    pub fn workspace_path(&self) -> Option<PathBuf> {
        self.workspace.as_deref().map(PathBuf::from)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("rosterd.toml")
}

/// Reads the config file if it exists. An explicit path that is missing is
/// an error; the default path being absent is not.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RosterConfig> {
    let explicit = path.is_some();
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        if explicit {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Ok(RosterConfig::default());
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RosterConfig = toml::from_str(&contents)?;
    Ok(config)
}
