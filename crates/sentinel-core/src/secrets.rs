//! Verification that required secrets and variables exist on the platform.

use std::path::Path;

use serde::Serialize;

use crate::platform::PlatformAdapter;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecretsRequirement {
    pub secrets: Vec<String>,
    pub variables: Vec<String>,
}

impl SecretsRequirement {
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty() && self.variables.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretsCheckResult {
    pub ok: bool,
    pub missing: SecretsRequirement,
}

impl SecretsCheckResult {
    fn all_missing(requirement: &SecretsRequirement) -> Self {
        Self {
            ok: false,
            missing: requirement.clone(),
        }
    }
}

/// Compare the requirement with what the platform reports. Never fails: a
/// listing error of any kind reports the whole requirement as missing.
pub async fn check_secrets(
    requirement: &SecretsRequirement,
    target: &Path,
    adapter: &dyn PlatformAdapter,
) -> SecretsCheckResult {
    if requirement.is_empty() {
        return SecretsCheckResult {
            ok: true,
            missing: SecretsRequirement::default(),
        };
    }

    let listed = async {
        let secrets = adapter.list_secrets(target).await?;
        let variables = adapter.list_variables(target).await?;
        Ok::<_, crate::error::SentinelError>((secrets, variables))
    }
    .await;

    let (secrets, variables) = match listed {
        Ok(listed) => listed,
        Err(err) if err.is_auth() => {
            tracing::warn!(error = %err, "platform CLI is not authenticated, cannot verify secrets");
            return SecretsCheckResult::all_missing(requirement);
        }
        Err(err) => {
            tracing::warn!(error = %err, "could not list secrets and variables");
            return SecretsCheckResult::all_missing(requirement);
        }
    };

    let missing = SecretsRequirement {
        secrets: difference(&requirement.secrets, &secrets),
        variables: difference(&requirement.variables, &variables),
    };

    for name in &missing.secrets {
        tracing::warn!(secret = %name, "required secret is not configured");
    }
    for name in &missing.variables {
        tracing::warn!(variable = %name, "required variable is not configured");
    }

    SecretsCheckResult {
        ok: missing.is_empty(),
        missing,
    }
}

fn difference(required: &[String], existing: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !existing.contains(name))
        .cloned()
        .collect()
}
