//! Interactive flow for the install command.
//!
//! Prompts for the phase selection and allowed paths when `-i` is passed, and
//! shows a summary with a confirmation before a real install.
//! Uses dialoguer for terminal UI prompts.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input, MultiSelect, theme::ColorfulTheme};

use sentinel_core::install::InstallConfig;
use sentinel_core::phase::{Phase, PhaseRegistry};

/// Values already fixed by flags or sentinel.toml; prompts are skipped for them.
#[derive(Debug, Clone, Default)]
pub struct PrefilledOptions {
    /// Phases fixed on the command line
    pub phases_fixed: bool,
    /// Allowed paths fixed on the command line or in config
    pub allowed_paths_fixed: bool,
    /// Skip all confirmations
    pub yes: bool,
}

pub struct InteractiveFlow<'r, W: Write = io::Stdout> {
    registry: &'r PhaseRegistry,
    prefilled: PrefilledOptions,
    /// Output writer (for testing)
    writer: W,
    theme: ColorfulTheme,
}

impl<'r> InteractiveFlow<'r, io::Stdout> {
    pub fn new(registry: &'r PhaseRegistry, prefilled: PrefilledOptions) -> Self {
        Self {
            registry,
            prefilled,
            writer: io::stdout(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl<'r, W: Write> InteractiveFlow<'r, W> {
    #[cfg(test)]
    pub fn with_writer(registry: &'r PhaseRegistry, prefilled: PrefilledOptions, writer: W) -> Self {
        Self {
            registry,
            prefilled,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    /// Fill in whatever the flags left open.
    pub fn collect(&mut self, mut config: InstallConfig) -> Result<InstallConfig> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("  Sentinel Install").bold().cyan())?;
        writeln!(self.writer)?;

        if !self.prefilled.phases_fixed {
            config.phases = self.prompt_phases(&config)?;
        }
        if !self.prefilled.allowed_paths_fixed {
            config.allowed_paths = self.prompt_allowed_paths()?;
        }
        Ok(config)
    }

    fn prompt_phases(&mut self, config: &InstallConfig) -> Result<Vec<Phase>> {
        let phases: Vec<_> = self.registry.all().collect();
        let items: Vec<String> = phases
            .iter()
            .map(|p| format!("{}. {}", p.phase, p.name))
            .collect();
        let selected = self.registry.select(&config.selection()).unwrap_or_default();
        let defaults: Vec<bool> = phases
            .iter()
            .map(|p| selected.iter().any(|s| s.phase == p.phase))
            .collect();

        let chosen = MultiSelect::with_theme(&self.theme)
            .with_prompt("Phases to install")
            .items(&items)
            .defaults(&defaults)
            .interact()?;

        if chosen.is_empty() {
            anyhow::bail!("No phases selected");
        }
        Ok(chosen.into_iter().map(|i| phases[i].phase).collect())
    }

    fn prompt_allowed_paths(&mut self) -> Result<Vec<String>> {
        let raw: String = Input::with_theme(&self.theme)
            .with_prompt("Paths agents may modify (comma separated, empty for any)")
            .allow_empty(true)
            .interact_text()?;

        Ok(split_paths(&raw))
    }

    /// Print what is about to happen and ask for confirmation.
    pub fn show_summary_and_confirm(&mut self, config: &InstallConfig) -> Result<bool> {
        writeln!(self.writer, "{}", style("  Summary").bold())?;
        writeln!(self.writer, "  ───────────────────────────")?;
        writeln!(
            self.writer,
            "  Target:   {}",
            style(config.target.display()).green()
        )?;
        writeln!(self.writer, "  Platform: {}", style(config.platform).green())?;

        let phases = self
            .registry
            .select(&config.selection())
            .map(|selected| {
                selected
                    .iter()
                    .map(|p| format!("{} ({})", p.phase, p.name))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_else(|err| err.to_string());
        writeln!(self.writer, "  Phases:   {}", style(phases).green())?;

        if !config.allowed_paths.is_empty() {
            writeln!(
                self.writer,
                "  Paths:    {}",
                style(config.allowed_paths.join(", ")).green()
            )?;
        }
        writeln!(self.writer)?;

        if self.prefilled.yes || config.dry_run {
            return Ok(true);
        }

        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt("Proceed with installation?")
            .default(true)
            .interact()?;

        Ok(confirmed)
    }
}

fn split_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
