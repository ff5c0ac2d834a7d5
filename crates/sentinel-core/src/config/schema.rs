//! Configuration schema for sentinel.toml
//!
//! The same shape is used for both layers:
//! - Global: ~/.config/sentinel/sentinel.toml
//! - Project: <target>/sentinel.toml
//!
//! Every field is optional so a layer only states what it overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::install::InstallConfig;
use crate::phase::Phase;
use crate::platform::PlatformKind;

#[allow(clippy::expect_used)]
static VARIABLE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]+(?:_[A-Z0-9]+)*$").expect("variable key pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SentinelConfig {
    /// Hosting platform (defaults to github)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformKind>,

    /// Install every phase up to this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,

    /// Install exactly these phases (overrides `phase` when non-empty)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<Phase>>,

    /// Paths automated agents may modify
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_paths: Option<Vec<String>>,

    /// Directory with template overrides, relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,

    /// Extra template variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl SentinelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for key in self.variables.keys() {
            if !VARIABLE_KEY.is_match(key) {
                anyhow::bail!(
                    "Invalid template variable name '{}': use upper-case letters, digits and single underscores",
                    key
                );
            }
        }

        if let Some(paths) = &self.allowed_paths {
            if let Some(bad) = paths.iter().find(|p| p.trim().is_empty() || p.contains(',')) {
                anyhow::bail!("Invalid allowed path '{}': must be non-empty and contain no commas", bad);
            }
        }

        Ok(())
    }

    /// Template override directory, resolved against `project_root`.
    pub fn resolved_template_dir(&self, project_root: &Path) -> Option<PathBuf> {
        self.template_dir.as_ref().map(|dir| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                project_root.join(dir)
            }
        })
    }

    /// Build install options for `target` from this (merged) configuration.
    pub fn to_install_config(&self, target: &Path) -> InstallConfig {
        let mut config = InstallConfig::new(target)
            .with_platform(self.platform.unwrap_or_default())
            .with_phase(self.phase.unwrap_or(Phase::FIRST))
            .with_phases(self.phases.clone().unwrap_or_default())
            .with_allowed_paths(self.allowed_paths.clone().unwrap_or_default());
        config.variables.extend(self.variables.clone());
        config
    }
}
