//! Phase catalog.
//!
//! A phase bundles pipeline files, labels and secret/variable requirements.
//! Phases are ordered; installing phase N installs every phase up to N unless
//! an explicit subset is requested (see [`PhaseSelection`]).

mod plan;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};

pub use plan::{PhasePlan, PhaseSelection};

/// Ordinal identifier of an install unit. Always ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Phase(u8);

impl Phase {
    pub const FIRST: Phase = Phase(1);

    pub const fn new(ordinal: u8) -> Option<Self> {
        if ordinal == 0 {
            None
        } else {
            Some(Self(ordinal))
        }
    }

    pub const fn ordinal(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Phase {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Phase::new(value).ok_or_else(|| "phase must be a positive integer".to_string())
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> Self {
        phase.0
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let ordinal: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid phase '{s}': expected a positive integer"))?;
        Phase::try_from(ordinal)
    }
}

/// Static description of one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseConfig {
    pub phase: Phase,
    pub name: String,
    /// Pipeline file basenames, without platform-specific extension.
    pub workflows: Vec<String>,
    pub labels: Vec<String>,
    pub secrets: Vec<String>,
    pub variables: Vec<String>,
}

impl PhaseConfig {
    pub fn new(phase: Phase, name: impl Into<String>) -> Self {
        Self {
            phase,
            name: name.into(),
            workflows: Vec::new(),
            labels: Vec::new(),
            secrets: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn with_workflows<I, S>(mut self, workflows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.workflows.extend(workflows.into_iter().map(Into::into));
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn with_secrets<I, S>(mut self, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secrets.extend(secrets.into_iter().map(Into::into));
        self
    }

    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables.extend(variables.into_iter().map(Into::into));
        self
    }
}

/// Immutable registry of phases keyed by ordinal.
#[derive(Debug, Clone, Default)]
pub struct PhaseRegistry {
    phases: BTreeMap<Phase, PhaseConfig>,
}

static BUILTIN: LazyLock<PhaseRegistry> = LazyLock::new(builtin_phases);

impl PhaseRegistry {
    pub fn new(phases: impl IntoIterator<Item = PhaseConfig>) -> Self {
        Self {
            phases: phases.into_iter().map(|p| (p.phase, p)).collect(),
        }
    }

    /// The catalog shipped with sentinel.
    pub fn builtin() -> &'static PhaseRegistry {
        &BUILTIN
    }

    pub fn get(&self, phase: Phase) -> Option<&PhaseConfig> {
        self.phases.get(&phase)
    }

    /// All phases in ascending order.
    pub fn all(&self) -> impl Iterator<Item = &PhaseConfig> {
        self.phases.values()
    }

    pub fn latest(&self) -> Option<Phase> {
        self.phases.keys().next_back().copied()
    }

    /// Resolve a selection into phase configs, ascending and without duplicates.
    pub fn select(&self, selection: &PhaseSelection) -> Result<Vec<&PhaseConfig>> {
        match selection {
            PhaseSelection::Explicit(requested) => {
                let mut ordinals = requested.clone();
                ordinals.sort();
                ordinals.dedup();
                ordinals
                    .into_iter()
                    .map(|phase| {
                        self.get(phase)
                            .ok_or(SentinelError::UnknownPhase { phase })
                    })
                    .collect()
            }
            PhaseSelection::Cumulative(up_to) => {
                let selected: Vec<_> = self.phases.range(..=*up_to).map(|(_, p)| p).collect();
                if selected.is_empty() {
                    return Err(SentinelError::UnknownPhase { phase: *up_to });
                }
                Ok(selected)
            }
        }
    }

    /// Every workflow basename across the catalog, deduplicated, in phase order.
    pub fn workflow_basenames(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for config in self.all() {
            for workflow in &config.workflows {
                if !names.contains(workflow) {
                    names.push(workflow.clone());
                }
            }
        }
        names
    }
}

fn builtin_phases() -> PhaseRegistry {
    PhaseRegistry::new([
        PhaseConfig::new(Phase(1), "Issue triage")
            .with_workflows(["sentinel-triage"])
            .with_labels(["sentinel", "sentinel:triage", "needs-info"])
            .with_secrets(["ANTHROPIC_API_KEY"]),
        PhaseConfig::new(Phase(2), "Automated fixes")
            .with_workflows(["sentinel-fix", "sentinel-review"])
            .with_labels(["sentinel", "sentinel:fix", "sentinel:needs-review"])
            .with_secrets(["ANTHROPIC_API_KEY"])
            .with_variables(["SENTINEL_MODEL"]),
        PhaseConfig::new(Phase(3), "CI failure repair")
            .with_workflows(["sentinel-ci-repair"])
            .with_labels(["sentinel", "sentinel:ci-repair"])
            .with_secrets(["ANTHROPIC_API_KEY", "SENTINEL_APP_PRIVATE_KEY"])
            .with_variables(["SENTINEL_APP_ID"]),
        PhaseConfig::new(Phase(4), "Deploy guard")
            .with_workflows(["sentinel-deploy-guard"])
            .with_labels(["sentinel", "sentinel:deploy-blocked"])
            .with_variables(["SENTINEL_MODEL", "SENTINEL_DEPLOY_ENVIRONMENT"]),
    ])
}
