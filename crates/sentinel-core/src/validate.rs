//! Environment precheck run before any mutation.

use std::path::Path;

use git2::Repository;
use serde::Serialize;

use crate::error::SentinelError;
use crate::install::InstallConfig;
use crate::platform::PlatformAdapter;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn into_result(self) -> Result<(), SentinelError> {
        if self.valid {
            Ok(())
        } else {
            Err(SentinelError::EnvironmentValidation {
                problems: self.errors,
            })
        }
    }
}

/// Run every check and report all failures together.
pub async fn validate_environment(
    config: &InstallConfig,
    adapter: &dyn PlatformAdapter,
) -> ValidationReport {
    let mut errors = Vec::new();

    if let Err(problem) = check_repository(&config.target) {
        errors.push(problem);
    }

    if let Some(problem) = adapter.cli_problem().await {
        errors.push(format!("{problem}. {}", adapter.cli_install_hint()));
    }

    for error in &errors {
        tracing::debug!(problem = %error, "validation failed");
    }
    ValidationReport::from_errors(errors)
}

fn check_repository(target: &Path) -> Result<(), String> {
    if !target.is_dir() {
        return Err(format!("Target directory does not exist: {}", target.display()));
    }

    // `open` (not `discover`) so a subdirectory of a repository is rejected.
    match Repository::open(target) {
        Ok(repo) if repo.is_bare() => Err(format!(
            "Target is a bare git repository: {}",
            target.display()
        )),
        Ok(_) => Ok(()),
        Err(err) => Err(format!(
            "Not the root of a git repository: {} ({})",
            target.display(),
            err.message()
        )),
    }
}
