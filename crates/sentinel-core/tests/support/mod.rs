#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use git2::Repository;
use tempfile::TempDir;

use sentinel_core::error::{Result, SentinelError};
use sentinel_core::labels::Label;
use sentinel_core::platform::{PlatformAdapter, PlatformKind};

/// Calls a [`FakeAdapter`] received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateLabel(String),
    ListSecrets,
    ListVariables,
}

#[derive(Debug, Clone)]
pub enum Listing {
    Names(Vec<String>),
    AuthFailure,
    CommandFailure,
}

impl Listing {
    pub fn names(names: &[&str]) -> Self {
        Listing::Names(names.iter().map(|s| s.to_string()).collect())
    }

    fn respond(&self, noun: &str) -> Result<Vec<String>> {
        match self {
            Listing::Names(names) => Ok(names.clone()),
            Listing::AuthFailure => Err(SentinelError::CliAuth {
                command: format!("fake {noun} list"),
                message: "HTTP 403: Resource not accessible by integration".to_string(),
            }),
            Listing::CommandFailure => Err(SentinelError::PlatformCommand {
                command: format!("fake {noun} list"),
                message: "no git remotes found".to_string(),
            }),
        }
    }
}

/// In-memory platform that records every call. Clones share state.
#[derive(Debug, Clone)]
pub struct FakeAdapter {
    calls: Arc<Mutex<Vec<Call>>>,
    cli_installed: bool,
    failing_labels: Vec<String>,
    secrets: Listing,
    variables: Listing,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            cli_installed: true,
            failing_labels: Vec::new(),
            secrets: Listing::names(&[]),
            variables: Listing::names(&[]),
        }
    }

    pub fn without_cli(mut self) -> Self {
        self.cli_installed = false;
        self
    }

    pub fn failing_label(mut self, name: &str) -> Self {
        self.failing_labels.push(name.to_string());
        self
    }

    pub fn with_secrets(mut self, listing: Listing) -> Self {
        self.secrets = listing;
        self
    }

    pub fn with_variables(mut self, listing: Listing) -> Self {
        self.variables = listing;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn label_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateLabel(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PlatformAdapter for FakeAdapter {
    fn kind(&self) -> PlatformKind {
        PlatformKind::GitHub
    }

    fn pipeline_dir(&self, target: &Path) -> PathBuf {
        target.join(".github").join("workflows")
    }

    fn template_path(&self, base_name: &str) -> String {
        format!("github/{base_name}.yml")
    }

    fn dest_file_name(&self, base_name: &str) -> String {
        format!("{base_name}.yml")
    }

    async fn is_cli_installed(&self) -> bool {
        self.cli_installed
    }

    fn cli_install_hint(&self) -> String {
        "install the fake CLI".to_string()
    }

    async fn create_label(&self, label: &Label, _cwd: &Path) -> Result<()> {
        self.record(Call::CreateLabel(label.name.clone()));
        if self.failing_labels.contains(&label.name) {
            return Err(SentinelError::PlatformCommand {
                command: format!("fake label create {}", label.name),
                message: "HTTP 422: Validation Failed".to_string(),
            });
        }
        Ok(())
    }

    async fn list_secrets(&self, _cwd: &Path) -> Result<Vec<String>> {
        self.record(Call::ListSecrets);
        self.secrets.respond("secret")
    }

    async fn list_variables(&self, _cwd: &Path) -> Result<Vec<String>> {
        self.record(Call::ListVariables);
        self.variables.respond("variable")
    }

    fn post_install_instructions(&self, installed_files: &[String]) -> Option<String> {
        installed_files
            .iter()
            .any(|f| f == "sentinel-deploy-guard.yml")
            .then(|| "protect the deploy environment".to_string())
    }
}

/// Temporary directory initialised as a git repository.
pub fn git_repo() -> TempDir {
    let temp = TempDir::new().unwrap();
    Repository::init(temp.path()).unwrap();
    temp
}

/// Every file under `root` except `.git`, with contents.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    collect(root, root, &mut files);
    files
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.file_name().is_some_and(|n| n == ".git") {
            continue;
        }
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let relative = path.strip_prefix(root).unwrap().to_path_buf();
            files.insert(relative, std::fs::read(&path).unwrap());
        }
    }
}
