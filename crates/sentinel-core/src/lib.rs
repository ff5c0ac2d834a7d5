//! Sentinel Core Library
//!
//! Installs automated-remediation CI pipelines into a target repository:
//! pipeline files per phase, platform labels, a policy block in `CLAUDE.md`
//! and a check that the required secrets and variables are configured.

pub mod config;
pub mod error;
pub mod install;
pub mod labels;
pub mod phase;
pub mod platform;
pub mod policy;
pub mod secrets;
pub mod status;
pub mod template;
pub mod validate;
pub mod workflows;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigLayer, ConfigStore, SentinelConfig};

    // Errors
    pub use crate::error::{Result, SentinelError};

    // Install
    pub use crate::install::{InstallConfig, InstallResult, InstallStage, Installer};

    // Phases
    pub use crate::phase::{Phase, PhaseConfig, PhasePlan, PhaseRegistry, PhaseSelection};

    // Platform
    pub use crate::platform::{GitHubAdapter, PlatformAdapter, PlatformKind, create_adapter};

    // Stages
    pub use crate::labels::{Label, LabelReport};
    pub use crate::secrets::{SecretsCheckResult, SecretsRequirement};
    pub use crate::status::{PolicyState, TargetStatus};
    pub use crate::template::{
        EmbeddedTemplates, LayeredTemplates, TemplateSource, TemplateVars, render_template,
    };
    pub use crate::validate::ValidationReport;
}
