//! Platform adapter layer.
//!
//! Everything that differs between hosting platforms goes through
//! [`PlatformAdapter`]: pipeline file naming, CLI probing, label creation,
//! secret/variable listing and post-install guidance. The install stages only
//! ever see the trait.

pub mod github;
pub mod runner;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::labels::Label;
use crate::phase::PhaseRegistry;

pub use github::GitHubAdapter;
pub use runner::{CliCommand, CliOutput, CommandRunner, SystemRunner};

/// Supported hosting platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlatformKind {
    /// GitHub Actions, driven through the `gh` CLI
    #[default]
    #[serde(rename = "github")]
    GitHub,
}

impl PlatformKind {
    pub const ALL: &'static [PlatformKind] = &[PlatformKind::GitHub];

    pub fn id(self) -> &'static str {
        match self {
            PlatformKind::GitHub => "github",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PlatformKind::GitHub => "GitHub",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PlatformKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PlatformKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.id() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = PlatformKind::ALL.iter().map(|k| k.id()).collect();
                format!("unknown platform '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Platform-specific operations used by the install stages.
#[async_trait]
pub trait PlatformAdapter: Send + Sync + fmt::Debug {
    fn kind(&self) -> PlatformKind;

    /// Directory pipeline files are written to.
    fn pipeline_dir(&self, target: &Path) -> PathBuf;

    /// Logical template path for a pipeline basename.
    fn template_path(&self, base_name: &str) -> String;

    /// File name a pipeline basename is written as.
    fn dest_file_name(&self, base_name: &str) -> String;

    async fn is_cli_installed(&self) -> bool;

    /// Why the CLI is unusable, or `None` when it is ready.
    async fn cli_problem(&self) -> Option<String> {
        if self.is_cli_installed().await {
            None
        } else {
            Some(format!("{} CLI not found", self.kind().display_name()))
        }
    }

    fn cli_install_hint(&self) -> String;

    /// Every pipeline file sentinel can install, derived from the phase
    /// catalog rather than from disk.
    fn existing_pipeline_files(&self) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for base in PhaseRegistry::builtin().workflow_basenames() {
            let name = self.dest_file_name(&base);
            if !files.contains(&name) {
                files.push(name);
            }
        }
        files
    }

    /// Create or update a label. Fails with `PlatformCommand`.
    async fn create_label(&self, label: &Label, cwd: &Path) -> Result<()>;

    /// Configured secret names. Fails with `CliAuth` when the platform
    /// rejects the caller; an empty listing is `Ok(vec![])`.
    async fn list_secrets(&self, cwd: &Path) -> Result<Vec<String>>;

    /// Configured variable names, with the same failure contract as
    /// [`PlatformAdapter::list_secrets`].
    async fn list_variables(&self, cwd: &Path) -> Result<Vec<String>>;

    fn post_install_instructions(&self, installed_files: &[String]) -> Option<String>;
}

/// Construct the adapter for a platform kind.
pub fn create_adapter(kind: PlatformKind) -> Box<dyn PlatformAdapter> {
    match kind {
        PlatformKind::GitHub => Box::new(GitHubAdapter::new()),
    }
}
