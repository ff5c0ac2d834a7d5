//! Label reconciliation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use serde::Serialize;

use crate::platform::PlatformAdapter;

pub const DEFAULT_LABEL_COLOR: &str = "ededed";
pub const DEFAULT_LABEL_DESCRIPTION: &str = "Managed by sentinel";

static LABEL_TABLE: LazyLock<HashMap<&'static str, (&'static str, &'static str)>> =
    LazyLock::new(|| {
        HashMap::from([
            ("sentinel", ("5319e7", "Handled by the sentinel pipelines")),
            ("sentinel:triage", ("fbca04", "Queued for automated triage")),
            ("needs-info", ("d4c5f9", "Waiting on more information from the reporter")),
            ("sentinel:fix", ("0e8a16", "Queued for an automated fix")),
            ("sentinel:needs-review", ("1d76db", "Automated change awaiting human review")),
            ("sentinel:ci-repair", ("e99695", "Automated CI failure repair")),
            ("sentinel:deploy-blocked", ("b60205", "Deployment held by the deploy guard")),
        ])
    });

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub name: String,
    pub color: String,
    pub description: String,
}

impl Label {
    /// Look up color and description, falling back to the defaults.
    pub fn resolve(name: &str) -> Self {
        let (color, description) = LABEL_TABLE
            .get(name)
            .copied()
            .unwrap_or((DEFAULT_LABEL_COLOR, DEFAULT_LABEL_DESCRIPTION));
        Self {
            name: name.to_string(),
            color: color.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelReport {
    /// Every attempted name, in input order, failures included.
    pub processed: Vec<String>,
    /// `(name, error)` for labels the platform rejected.
    pub failed: Vec<(String, String)>,
}

/// Create each label on the platform. One label failing never stops the rest.
pub async fn create_labels(
    names: &[String],
    target: &Path,
    dry_run: bool,
    adapter: &dyn PlatformAdapter,
) -> LabelReport {
    let mut report = LabelReport::default();

    for name in names {
        let label = Label::resolve(name);

        if dry_run {
            tracing::info!(label = %label.name, color = %label.color, "[dry-run] would create label");
        } else if let Err(err) = adapter.create_label(&label, target).await {
            tracing::warn!(label = %label.name, error = %err, "failed to create label");
            report.failed.push((label.name.clone(), err.to_string()));
        } else {
            tracing::info!(label = %label.name, "label ready");
        }

        report.processed.push(label.name);
    }

    report
}
