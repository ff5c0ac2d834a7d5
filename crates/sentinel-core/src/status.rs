//! Status collection for a target repository.
//!
//! Read-only: reports validation results, which known pipeline files are
//! present and whether the policy block exists. Nothing is written.

use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use crate::install::InstallConfig;
use crate::platform::PlatformAdapter;
use crate::policy::{MARKER_END, MARKER_START, PolicyPatcher};
use crate::validate::{ValidationReport, validate_environment};

#[derive(Debug, Clone, Serialize)]
pub struct TargetStatus {
    pub target: PathBuf,
    pub platform: String,
    pub validation: ValidationReport,
    pub pipeline_files: Vec<PipelineFileStatus>,
    pub policy: PolicyState,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineFileStatus {
    pub name: String,
    pub installed: bool,
    /// Set when presence could not be determined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyState {
    /// No CLAUDE.md in the target
    Missing,
    /// CLAUDE.md exists without a sentinel block
    Absent,
    /// Exactly one well-formed block
    Present,
    /// Markers unmatched or misordered; the next install repairs them
    Corrupted,
    /// CLAUDE.md exists but could not be read as text; install fails on it too
    Unreadable { reason: String },
}

impl TargetStatus {
    pub fn installed_count(&self) -> usize {
        self.pipeline_files.iter().filter(|f| f.installed).count()
    }

    /// True when some file could not be inspected.
    pub fn has_errors(&self) -> bool {
        self.pipeline_files.iter().any(|f| f.error.is_some())
            || matches!(self.policy, PolicyState::Unreadable { .. })
    }
}

pub async fn collect_status(config: &InstallConfig, adapter: &dyn PlatformAdapter) -> TargetStatus {
    let validation = validate_environment(config, adapter).await;
    let dir = adapter.pipeline_dir(&config.target);

    let mut pipeline_files = Vec::new();
    for name in adapter.existing_pipeline_files() {
        let path = dir.join(&name);
        let (installed, error) = match tokio::fs::try_exists(&path).await {
            Ok(exists) => (exists, None),
            Err(err) => {
                warn!("Cannot check {}: {}", path.display(), err);
                (false, Some(err.to_string()))
            }
        };
        pipeline_files.push(PipelineFileStatus {
            name,
            installed,
            error,
        });
    }

    let policy_path = PolicyPatcher::policy_path(&config.target);
    let policy = match tokio::fs::read_to_string(&policy_path).await {
        Ok(text) => policy_state(&text),
        Err(err) if err.kind() == ErrorKind::NotFound => PolicyState::Missing,
        Err(err) => {
            warn!("Cannot read {}: {}", policy_path.display(), err);
            PolicyState::Unreadable {
                reason: err.to_string(),
            }
        }
    };

    TargetStatus {
        target: config.target.clone(),
        platform: adapter.kind().id().to_string(),
        validation,
        pipeline_files,
        policy,
    }
}

fn policy_state(text: &str) -> PolicyState {
    match (text.find(MARKER_START), text.find(MARKER_END)) {
        (None, None) => PolicyState::Absent,
        (Some(start), Some(end))
            if end > start
                && text.matches(MARKER_START).count() == 1
                && text.matches(MARKER_END).count() == 1 =>
        {
            PolicyState::Present
        }
        _ => PolicyState::Corrupted,
    }
}
