//! Error taxonomy for install stages.
//!
//! Validation problems abort an install. Authentication and command failures
//! reported by a platform CLI are downgraded by the stage that receives them
//! (labels, secrets). Filesystem errors propagate to the caller untouched.

use std::path::PathBuf;

use thiserror::Error;

use crate::phase::Phase;

pub type Result<T, E = SentinelError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("Environment validation failed:\n{}", format_problems(.problems))]
    EnvironmentValidation { problems: Vec<String> },

    #[error("Not authenticated for `{command}`: {message}")]
    CliAuth { command: String, message: String },

    #[error("`{command}` failed: {message}")]
    PlatformCommand { command: String, message: String },

    #[error("Template not found: {path}")]
    TemplateNotFound { path: String },

    #[error("Unknown phase: {phase}")]
    UnknownPhase { phase: Phase },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SentinelError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the platform rejected the caller's credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::CliAuth { .. })
    }
}

fn format_problems(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("  - {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}
