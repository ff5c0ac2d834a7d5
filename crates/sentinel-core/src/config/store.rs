//! Config store for loading sentinel.toml layers.

use std::path::{Path, PathBuf};

use super::merge::merge_configs;
use super::paths::{ConfigLayer, config_path_for_layer};
use super::{SentinelConfig, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    global_dir: PathBuf,
    project_root: PathBuf,
}

impl ConfigStore {
    /// Store for `project_root` with the per-user config directory.
    pub fn for_project(project_root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let global_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("sentinel");

        Ok(Self::from_paths(global_dir, project_root.into()))
    }

    pub fn from_paths(global_dir: PathBuf, project_root: PathBuf) -> Self {
        Self {
            global_dir,
            project_root,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config_path(&self, layer: ConfigLayer) -> PathBuf {
        config_path_for_layer(layer, &self.global_dir, &self.project_root)
    }

    /// Load one layer; a missing file is `None`.
    pub fn load_layer(&self, layer: ConfigLayer) -> anyhow::Result<Option<SentinelConfig>> {
        let path = self.config_path(layer);
        if !path.exists() {
            return Ok(None);
        }
        tracing::debug!(path = %path.display(), ?layer, "loading config layer");
        parser::parse_sentinel_toml(&path).map(Some)
    }

    /// Global and project layers merged, project winning.
    pub fn load(&self) -> anyhow::Result<SentinelConfig> {
        let global = self.load_layer(ConfigLayer::Global)?;
        let project = self.load_layer(ConfigLayer::Project)?;
        Ok(merge_configs(global, project))
    }
}
