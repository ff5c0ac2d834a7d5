//! GitHub adapter, driven through the `gh` CLI.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use semver::Version;
use serde::Deserialize;

use super::runner::{CliCommand, CliOutput, CommandRunner, SystemRunner};
use super::{PlatformAdapter, PlatformKind};
use crate::error::{Result, SentinelError};
use crate::labels::Label;

/// First `gh` release that supports `gh variable list --json`.
pub const MIN_GH_VERSION: Version = Version::new(2, 40, 0);

const GH: &str = "gh";
const WORKFLOWS_DIR: &str = ".github/workflows";

/// Files whose installation needs extra manual steps.
const DEPLOY_GUARD_FILE: &str = "sentinel-deploy-guard.yml";
const CI_REPAIR_FILE: &str = "sentinel-ci-repair.yml";

// Text `gh` prints when the token is missing, expired or lacks a scope. A
// structured exit code would be better, but `gh` exits 1 for all of these.
#[allow(clippy::expect_used)]
static AUTH_FAILURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(authenticat|not logged in|gh auth login|unauthori[sz]ed|forbidden|permission|bad credentials|resource not accessible|HTTP 4\d\d)",
    )
    .expect("auth failure pattern is valid")
});

#[derive(Debug, Clone)]
pub struct GitHubAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl Default for GitHubAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubAdapter {
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner))
    }

    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Version reported by `gh --version`, if `gh` runs at all.
    pub async fn cli_version(&self) -> Option<Version> {
        let output = self
            .runner
            .run(&CliCommand::new(GH).arg("--version"))
            .await
            .ok()?;
        if !output.success {
            return None;
        }
        parse_gh_version(&output.stdout)
    }

    async fn run_gh(&self, command: CliCommand) -> Result<CliOutput> {
        let output = self.runner.run(&command).await.map_err(|err| {
            SentinelError::PlatformCommand {
                command: command.to_string(),
                message: format!("failed to start: {err}"),
            }
        })?;

        if output.success {
            Ok(output)
        } else {
            Err(classify_failure(&command, &output))
        }
    }

    async fn list_names(&self, noun: &str, cwd: &Path) -> Result<Vec<String>> {
        let command = CliCommand::new(GH)
            .args([noun, "list", "--json", "name"])
            .current_dir(cwd);
        let output = self.run_gh(command.clone()).await?;
        parse_name_list(&output.stdout).map_err(|message| SentinelError::PlatformCommand {
            command: command.to_string(),
            message,
        })
    }
}

#[async_trait]
impl PlatformAdapter for GitHubAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::GitHub
    }

    fn pipeline_dir(&self, target: &Path) -> PathBuf {
        target.join(WORKFLOWS_DIR)
    }

    fn template_path(&self, base_name: &str) -> String {
        format!("github/{base_name}.yml")
    }

    fn dest_file_name(&self, base_name: &str) -> String {
        format!("{base_name}.yml")
    }

    async fn is_cli_installed(&self) -> bool {
        self.cli_problem().await.is_none()
    }

    async fn cli_problem(&self) -> Option<String> {
        match self.cli_version().await {
            Some(version) if version >= MIN_GH_VERSION => None,
            Some(version) => {
                tracing::debug!(%version, minimum = %MIN_GH_VERSION, "gh is too old");
                Some(format!(
                    "GitHub CLI {version} is older than the required {MIN_GH_VERSION}"
                ))
            }
            None => Some("GitHub CLI not found".to_string()),
        }
    }

    fn cli_install_hint(&self) -> String {
        format!(
            "Install the GitHub CLI {MIN_GH_VERSION} or newer (https://cli.github.com) and run `gh auth login`"
        )
    }

    async fn create_label(&self, label: &Label, cwd: &Path) -> Result<()> {
        let command = CliCommand::new(GH)
            .args(["label", "create", label.name.as_str()])
            .args(["--color", label.color.as_str()])
            .args(["--description", label.description.as_str()])
            .arg("--force")
            .current_dir(cwd);

        // Auth problems are still a failed mutation from the caller's view.
        match self.run_gh(command).await {
            Ok(_) => Ok(()),
            Err(SentinelError::CliAuth { command, message }) => {
                Err(SentinelError::PlatformCommand { command, message })
            }
            Err(err) => Err(err),
        }
    }

    async fn list_secrets(&self, cwd: &Path) -> Result<Vec<String>> {
        self.list_names("secret", cwd).await
    }

    async fn list_variables(&self, cwd: &Path) -> Result<Vec<String>> {
        self.list_names("variable", cwd).await
    }

    fn post_install_instructions(&self, installed_files: &[String]) -> Option<String> {
        let installed = |name: &str| installed_files.iter().any(|f| f == name);
        let mut sections = Vec::new();

        if installed(CI_REPAIR_FILE) {
            sections.push(
                "CI repair needs a GitHub App:\n\
                 1. Create an app with contents, pull requests and actions permissions.\n\
                 2. Install it on this repository.\n\
                 3. gh variable set SENTINEL_APP_ID --body <app id>\n\
                 4. gh secret set SENTINEL_APP_PRIVATE_KEY < private-key.pem"
                    .to_string(),
            );
        }

        if installed(DEPLOY_GUARD_FILE) {
            sections.push(
                "Deploy guard needs a protected environment:\n\
                 1. Create the environment under Settings > Environments.\n\
                 2. Add required reviewers so blocked deployments wait for a human.\n\
                 3. gh variable set SENTINEL_DEPLOY_ENVIRONMENT --body <environment name>"
                    .to_string(),
            );
        }

        if sections.is_empty() {
            None
        } else {
            Some(sections.join("\n\n"))
        }
    }
}

/// Decide whether a failed `gh` call was an authentication problem.
pub fn classify_failure(command: &CliCommand, output: &CliOutput) -> SentinelError {
    let message = output.combined();
    let message = if message.is_empty() {
        "exited with a non-zero status".to_string()
    } else {
        message
    };

    if AUTH_FAILURE.is_match(&message) {
        SentinelError::CliAuth {
            command: command.to_string(),
            message,
        }
    } else {
        SentinelError::PlatformCommand {
            command: command.to_string(),
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    name: String,
}

fn parse_name_list(stdout: &str) -> std::result::Result<Vec<String>, String> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<NamedEntry> = serde_json::from_str(trimmed)
        .map_err(|err| format!("unexpected JSON output: {err}"))?;
    Ok(entries.into_iter().map(|e| e.name).collect())
}

/// Parse `gh version 2.45.0 (2024-03-04)`.
fn parse_gh_version(stdout: &str) -> Option<Version> {
    let line = stdout.lines().next()?;
    let raw = line.split_whitespace().nth(2)?;
    Version::parse(raw.trim_start_matches('v')).ok()
}
