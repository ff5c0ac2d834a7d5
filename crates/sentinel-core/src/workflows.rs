//! Renders one phase's pipeline files into the target.

use std::path::Path;

use crate::error::{Result, SentinelError};
use crate::phase::PhaseConfig;
use crate::platform::PlatformAdapter;
use crate::template::{TemplateSource, TemplateVars, render_template};

#[derive(Debug)]
pub struct WorkflowWriter<'a> {
    adapter: &'a dyn PlatformAdapter,
    templates: &'a dyn TemplateSource,
}

impl<'a> WorkflowWriter<'a> {
    pub fn new(adapter: &'a dyn PlatformAdapter, templates: &'a dyn TemplateSource) -> Self {
        Self { adapter, templates }
    }

    /// Write every workflow of `phase`, overwriting existing files. Returns the
    /// destination file names in declaration order.
    pub async fn write_phase(
        &self,
        phase: &PhaseConfig,
        target: &Path,
        dry_run: bool,
        vars: &TemplateVars,
    ) -> Result<Vec<String>> {
        let dir = self.adapter.pipeline_dir(target);
        let mut written = Vec::with_capacity(phase.workflows.len());

        for base in &phase.workflows {
            let template = self
                .templates
                .load(&self.adapter.template_path(base))
                .await?;
            let rendered = render_template(&template, vars);
            let file_name = self.adapter.dest_file_name(base);
            let dest = dir.join(&file_name);

            if dry_run {
                tracing::info!(phase = %phase.phase, file = %dest.display(), "[dry-run] would write workflow");
            } else {
                tokio::fs::create_dir_all(&dir)
                    .await
                    .map_err(|err| SentinelError::io(&dir, err))?;
                tokio::fs::write(&dest, rendered)
                    .await
                    .map_err(|err| SentinelError::io(&dest, err))?;
                tracing::info!(phase = %phase.phase, file = %dest.display(), "workflow written");
            }

            written.push(file_name);
        }

        Ok(written)
    }
}
