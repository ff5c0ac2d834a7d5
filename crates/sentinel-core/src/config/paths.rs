//! Config path resolution helpers.

use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "sentinel.toml";

/// Configuration layers, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigLayer {
    /// Per-user defaults under the platform config directory
    Global,
    /// Checked into the target repository
    Project,
}

pub fn config_path_for_layer(layer: ConfigLayer, global_dir: &Path, project_root: &Path) -> PathBuf {
    match layer {
        ConfigLayer::Global => global_dir.join(CONFIG_FILE_NAME),
        ConfigLayer::Project => project_root.join(CONFIG_FILE_NAME),
    }
}
