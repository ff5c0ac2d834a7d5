//! Template loading by logical path (e.g. `policy/sentinel-rules.md`).

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Result, SentinelError};

/// Supplies raw template text.
#[async_trait]
pub trait TemplateSource: Send + Sync + std::fmt::Debug {
    async fn load(&self, logical_path: &str) -> Result<String>;
}

const EMBEDDED: &[(&str, &str)] = &[
    (
        "github/sentinel-triage.yml",
        include_str!("../../templates/github/sentinel-triage.yml"),
    ),
    (
        "github/sentinel-fix.yml",
        include_str!("../../templates/github/sentinel-fix.yml"),
    ),
    (
        "github/sentinel-review.yml",
        include_str!("../../templates/github/sentinel-review.yml"),
    ),
    (
        "github/sentinel-ci-repair.yml",
        include_str!("../../templates/github/sentinel-ci-repair.yml"),
    ),
    (
        "github/sentinel-deploy-guard.yml",
        include_str!("../../templates/github/sentinel-deploy-guard.yml"),
    ),
    (
        "policy/sentinel-rules.md",
        include_str!("../../templates/policy/sentinel-rules.md"),
    ),
];

/// Templates compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedTemplates;

impl EmbeddedTemplates {
    pub fn new() -> Self {
        Self
    }

    pub fn get(&self, logical_path: &str) -> Option<&'static str> {
        EMBEDDED
            .iter()
            .find(|(path, _)| *path == logical_path)
            .map(|(_, text)| *text)
    }

    pub fn paths(&self) -> impl Iterator<Item = &'static str> {
        EMBEDDED.iter().map(|(path, _)| *path)
    }
}

#[async_trait]
impl TemplateSource for EmbeddedTemplates {
    async fn load(&self, logical_path: &str) -> Result<String> {
        self.get(logical_path)
            .map(str::to_string)
            .ok_or_else(|| SentinelError::TemplateNotFound {
                path: logical_path.to_string(),
            })
    }
}

/// Per-file overrides from a directory, falling back to the embedded set.
#[derive(Debug, Clone)]
pub struct LayeredTemplates {
    override_dir: PathBuf,
    fallback: EmbeddedTemplates,
}

impl LayeredTemplates {
    pub fn new(override_dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: override_dir.into(),
            fallback: EmbeddedTemplates,
        }
    }

    pub fn override_dir(&self) -> &Path {
        &self.override_dir
    }
}

#[async_trait]
impl TemplateSource for LayeredTemplates {
    async fn load(&self, logical_path: &str) -> Result<String> {
        if !is_plain_relative(Path::new(logical_path)) {
            return Err(SentinelError::TemplateNotFound {
                path: logical_path.to_string(),
            });
        }

        let candidate = self.override_dir.join(logical_path);
        match tokio::fs::read_to_string(&candidate).await {
            Ok(text) => {
                tracing::debug!(template = logical_path, path = %candidate.display(), "using template override");
                Ok(text)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                self.fallback.load(logical_path).await
            }
            Err(err) => Err(SentinelError::io(candidate, err)),
        }
    }
}

fn is_plain_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
