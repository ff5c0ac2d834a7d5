//! Install orchestration.
//!
//! One linear run: validate, write each selected phase's pipelines, then
//! create the shared label set, patch the policy block and check secrets once
//! each. Validation is the only stage that aborts; later stages report soft
//! failures through [`InstallResult`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::labels::create_labels;
use crate::phase::{Phase, PhasePlan, PhaseRegistry, PhaseSelection};
use crate::platform::{PlatformAdapter, PlatformKind, create_adapter};
use crate::policy::PolicyPatcher;
use crate::secrets::{SecretsRequirement, check_secrets};
use crate::template::{EmbeddedTemplates, TemplateSource, TemplateVars};
use crate::validate::validate_environment;
use crate::workflows::WorkflowWriter;

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_NODE_VERSION: &str = "20";

const NO_PATH_RESTRICTION: &str = "- Any path (no restriction configured)";

/// Options for a single install run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    pub target: PathBuf,
    pub platform: PlatformKind,
    pub phase: Phase,
    /// Non-empty switches from cumulative to explicit selection.
    pub phases: Vec<Phase>,
    pub dry_run: bool,
    pub allowed_paths: Vec<String>,
    /// Extra template variables, applied over the built-ins.
    pub variables: TemplateVars,
}

impl InstallConfig {
    /// Cumulative install of phase 1 into `target`.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            platform: PlatformKind::default(),
            phase: Phase::FIRST,
            phases: Vec::new(),
            dry_run: false,
            allowed_paths: Vec::new(),
            variables: TemplateVars::new(),
        }
    }

    pub fn with_platform(mut self, platform: PlatformKind) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_phases(mut self, phases: impl IntoIterator<Item = Phase>) -> Self {
        self.phases = phases.into_iter().collect();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_allowed_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn selection(&self) -> PhaseSelection {
        PhaseSelection::from_config(self.phase, &self.phases)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallResult {
    pub phases: Vec<Phase>,
    pub workflows: Vec<String>,
    pub labels: Vec<String>,
    /// `(label, error)` pairs the platform rejected.
    pub label_failures: Vec<(String, String)>,
    pub claude_md_patched: bool,
    pub secrets_ok: bool,
    pub missing: SecretsRequirement,
    pub post_install: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    Validating,
    Writing,
    LabelCreating,
    Patching,
    SecretsChecking,
    Done,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallStage::Validating => "validating environment",
            InstallStage::Writing => "writing workflows",
            InstallStage::LabelCreating => "creating labels",
            InstallStage::Patching => "patching CLAUDE.md",
            InstallStage::SecretsChecking => "checking secrets",
            InstallStage::Done => "done",
        };
        f.write_str(name)
    }
}

fn enter(stage: InstallStage) {
    tracing::info!(stage = %stage, "install stage");
}

#[derive(Debug)]
pub struct Installer {
    adapter: Box<dyn PlatformAdapter>,
    templates: Box<dyn TemplateSource>,
    registry: PhaseRegistry,
}

impl Installer {
    /// Installer over the built-in phase catalog and embedded templates.
    pub fn new(adapter: Box<dyn PlatformAdapter>) -> Self {
        Self {
            adapter,
            templates: Box::new(EmbeddedTemplates::new()),
            registry: PhaseRegistry::builtin().clone(),
        }
    }

    /// Installer for the platform named in `config`.
    pub fn for_config(config: &InstallConfig) -> Self {
        Self::new(create_adapter(config.platform))
    }

    pub fn with_templates(mut self, templates: Box<dyn TemplateSource>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_registry(mut self, registry: PhaseRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn adapter(&self) -> &dyn PlatformAdapter {
        self.adapter.as_ref()
    }

    pub fn registry(&self) -> &PhaseRegistry {
        &self.registry
    }

    pub async fn install(&self, config: &InstallConfig) -> Result<InstallResult> {
        let adapter = self.adapter.as_ref();
        let target = config.target.as_path();

        enter(InstallStage::Validating);
        validate_environment(config, adapter).await.into_result()?;

        let plan = PhasePlan::accumulate(self.registry.select(&config.selection())?);
        let ordinals = plan.ordinals();
        let vars = template_vars(config, adapter, &ordinals);

        enter(InstallStage::Writing);
        let writer = WorkflowWriter::new(adapter, self.templates.as_ref());
        let mut workflows = Vec::new();
        for phase in &plan.phases {
            tracing::info!(phase = %phase.phase, name = %phase.name, "installing phase");
            let written = writer.write_phase(phase, target, config.dry_run, &vars).await?;
            workflows.extend(written);
        }

        enter(InstallStage::LabelCreating);
        let labels = create_labels(&plan.labels, target, config.dry_run, adapter).await;

        enter(InstallStage::Patching);
        let claude_md_patched = PolicyPatcher::new(self.templates.as_ref())
            .patch(target, config.dry_run, &vars)
            .await?;

        enter(InstallStage::SecretsChecking);
        let secrets = check_secrets(&plan.requirement, target, adapter).await;

        let post_install = adapter.post_install_instructions(&workflows);
        enter(InstallStage::Done);

        Ok(InstallResult {
            phases: ordinals,
            workflows,
            labels: labels.processed,
            label_failures: labels.failed,
            claude_md_patched,
            secrets_ok: secrets.ok,
            missing: secrets.missing,
            post_install,
            dry_run: config.dry_run,
        })
    }
}

/// Built-in template variables, overlaid by `config.variables`.
pub fn template_vars(
    config: &InstallConfig,
    adapter: &dyn PlatformAdapter,
    phases: &[Phase],
) -> TemplateVars {
    let mut vars = TemplateVars::new();
    vars.insert("PLATFORM".into(), adapter.kind().display_name().to_string());
    vars.insert(
        "PHASES".into(),
        phases
            .iter()
            .map(Phase::to_string)
            .collect::<Vec<_>>()
            .join(","),
    );
    vars.insert(
        "PIPELINE_DIR".into(),
        relative_dir(&config.target, &adapter.pipeline_dir(&config.target)),
    );
    vars.insert("ALLOWED_PATHS".into(), allowed_paths_list(&config.allowed_paths));
    vars.insert("ALLOWED_PATHS_CSV".into(), config.allowed_paths.join(","));
    vars.insert("DEFAULT_BRANCH".into(), DEFAULT_BRANCH.into());
    vars.insert("NODE_VERSION".into(), DEFAULT_NODE_VERSION.into());

    vars.extend(config.variables.clone());
    vars
}

fn allowed_paths_list(paths: &[String]) -> String {
    if paths.is_empty() {
        return NO_PATH_RESTRICTION.to_string();
    }
    paths
        .iter()
        .map(|p| format!("- `{p}`"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn relative_dir(target: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(target).unwrap_or(dir);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
