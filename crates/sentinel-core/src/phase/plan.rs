//! Phase selection and cross-phase accumulation.

use super::{Phase, PhaseConfig};
use crate::secrets::SecretsRequirement;

/// Which phases an install covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseSelection {
    /// Every registered phase up to and including the given one.
    Cumulative(Phase),
    /// Exactly the listed phases.
    Explicit(Vec<Phase>),
}

impl PhaseSelection {
    /// A non-empty explicit list wins over the cumulative ordinal.
    pub fn from_config(phase: Phase, phases: &[Phase]) -> Self {
        if phases.is_empty() {
            Self::Cumulative(phase)
        } else {
            Self::Explicit(phases.to_vec())
        }
    }
}

/// Selected phases plus the labels and requirements they share, deduplicated
/// across phases in first-seen order.
#[derive(Debug, Clone)]
pub struct PhasePlan<'a> {
    pub phases: Vec<&'a PhaseConfig>,
    pub labels: Vec<String>,
    pub requirement: SecretsRequirement,
}

impl<'a> PhasePlan<'a> {
    pub fn accumulate(phases: Vec<&'a PhaseConfig>) -> Self {
        let mut labels = Vec::new();
        let mut requirement = SecretsRequirement::default();

        for config in &phases {
            extend_unique(&mut labels, &config.labels);
            extend_unique(&mut requirement.secrets, &config.secrets);
            extend_unique(&mut requirement.variables, &config.variables);
        }

        Self {
            phases,
            labels,
            requirement,
        }
    }

    pub fn ordinals(&self) -> Vec<Phase> {
        self.phases.iter().map(|c| c.phase).collect()
    }
}

fn extend_unique(into: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PhaseRegistry;

    fn p(n: u8) -> Phase {
        Phase::new(n).expect("non-zero phase")
    }

    fn registry() -> PhaseRegistry {
        PhaseRegistry::new([
            PhaseConfig::new(p(1), "triage")
                .with_workflows(["triage"])
                .with_labels(["sentinel", "triage"])
                .with_secrets(["API_KEY"]),
            PhaseConfig::new(p(2), "fix")
                .with_workflows(["fix"])
                .with_labels(["sentinel", "fix"])
                .with_secrets(["API_KEY", "APP_KEY"])
                .with_variables(["MODEL"]),
        ])
    }

    #[test]
    fn test_selection_from_config() {
        assert_eq!(
            PhaseSelection::from_config(p(2), &[]),
            PhaseSelection::Cumulative(p(2))
        );
        assert_eq!(
            PhaseSelection::from_config(p(2), &[p(1)]),
            PhaseSelection::Explicit(vec![p(1)])
        );
    }

    #[test]
    fn test_accumulate_dedups_across_phases() {
        let registry = registry();
        let selected = registry
            .select(&PhaseSelection::Cumulative(p(2)))
            .expect("phases exist");
        let plan = PhasePlan::accumulate(selected);

        assert_eq!(plan.labels, vec!["sentinel", "triage", "fix"]);
        assert_eq!(plan.requirement.secrets, vec!["API_KEY", "APP_KEY"]);
        assert_eq!(plan.requirement.variables, vec!["MODEL"]);
        assert_eq!(plan.ordinals(), vec![p(1), p(2)]);
    }

    #[test]
    fn test_accumulate_explicit_subset_only() {
        let registry = registry();
        let selected = registry
            .select(&PhaseSelection::Explicit(vec![p(2)]))
            .expect("phase exists");
        let plan = PhasePlan::accumulate(selected);

        assert_eq!(plan.labels, vec!["sentinel", "fix"]);
        assert!(!plan.labels.contains(&"triage".to_string()));
    }

    #[test]
    fn test_accumulate_empty() {
        let plan = PhasePlan::accumulate(Vec::new());
        assert!(plan.labels.is_empty());
        assert!(plan.requirement.is_empty());
    }
}
