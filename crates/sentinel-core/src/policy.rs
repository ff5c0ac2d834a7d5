//! Marker-delimited block in the target's `CLAUDE.md`.
//!
//! The block is owned by sentinel and rewritten on every install; everything
//! outside it belongs to the repository and is preserved byte-for-byte.
//! Re-running with the same inputs never touches the file.

use std::path::{Path, PathBuf};

use crate::error::{Result, SentinelError};
use crate::template::{TemplateSource, TemplateVars, render_template};

pub const MARKER_START: &str = "<!-- sentinel:begin -->";
pub const MARKER_END: &str = "<!-- sentinel:end -->";

pub const POLICY_FILE: &str = "CLAUDE.md";
pub const POLICY_TEMPLATE: &str = "policy/sentinel-rules.md";

/// Wrap rendered policy text in the markers. No trailing newline, so that the
/// block always ends exactly at `MARKER_END`.
pub fn wrap_block(rendered: &str) -> String {
    format!("{MARKER_START}\n{}\n{MARKER_END}", rendered.trim_end())
}

/// Put `block` into `existing`: replace a well-formed marker pair in place,
/// otherwise append after one blank line. Half-present or misordered markers
/// are stripped first.
pub fn apply_marker_block(existing: &str, block: &str) -> String {
    let start = existing.find(MARKER_START);
    let end = existing.find(MARKER_END);

    if let (Some(start), Some(end)) = (start, end) {
        if end > start {
            let tail = end + MARKER_END.len();
            let mut out = String::with_capacity(existing.len() + block.len());
            out.push_str(&existing[..start]);
            out.push_str(block);
            out.push_str(&existing[tail..]);
            return out;
        }
    }

    let base = if start.is_some() || end.is_some() {
        tracing::warn!("policy markers are corrupted, rebuilding the sentinel block");
        existing.replace(MARKER_START, "").replace(MARKER_END, "")
    } else {
        existing.to_string()
    };

    let base = base.trim_end();
    if base.is_empty() {
        block.to_string()
    } else {
        format!("{base}\n\n{block}")
    }
}

#[derive(Debug)]
pub struct PolicyPatcher<'a> {
    templates: &'a dyn TemplateSource,
}

impl<'a> PolicyPatcher<'a> {
    pub fn new(templates: &'a dyn TemplateSource) -> Self {
        Self { templates }
    }

    pub fn policy_path(target: &Path) -> PathBuf {
        target.join(POLICY_FILE)
    }

    /// Returns whether the document changed (or would change, in dry run).
    pub async fn patch(&self, target: &Path, dry_run: bool, vars: &TemplateVars) -> Result<bool> {
        let template = self.templates.load(POLICY_TEMPLATE).await?;
        let block = wrap_block(&render_template(&template, vars));

        let path = Self::policy_path(target);
        let existing = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(SentinelError::io(path, err)),
        };

        let next = apply_marker_block(&existing, &block);
        if next == existing {
            tracing::info!(file = %path.display(), "policy block already up to date");
            return Ok(false);
        }

        if dry_run {
            tracing::info!(file = %path.display(), "[dry-run] would update policy block");
            return Ok(true);
        }

        tokio::fs::write(&path, next)
            .await
            .map_err(|err| SentinelError::io(&path, err))?;
        tracing::info!(file = %path.display(), "policy block written");
        Ok(true)
    }
}
