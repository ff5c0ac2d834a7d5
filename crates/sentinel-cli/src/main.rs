//! Sentinel - automated remediation pipeline installer
//!
//! Usage:
//!   sentinel install --phase 2     # Install phases 1-2 into the current repo
//!   sentinel install --phases 1,3  # Install exactly phases 1 and 3
//!   sentinel phases                # List the phase catalog
//!   sentinel status                # Show what is installed

mod interactive;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentinel_core::config::{ConfigStore, SentinelConfig, merge_configs};
use sentinel_core::error::SentinelError;
use sentinel_core::install::{InstallResult, Installer};
use sentinel_core::phase::{Phase, PhaseRegistry};
use sentinel_core::platform::{PlatformKind, create_adapter};
use sentinel_core::status::{PolicyState, TargetStatus, collect_status};
use sentinel_core::template::LayeredTemplates;

use crate::interactive::{InteractiveFlow, PrefilledOptions};

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Install automated remediation pipelines into a repository", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install pipelines, labels and the CLAUDE.md policy block
    Install(Box<InstallArgs>),

    /// List the available phases
    Phases {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show validation results and installed pipeline files
    Status {
        /// Target repository (defaults to the current directory)
        #[arg(long)]
        target: Option<PathBuf>,

        /// Hosting platform
        #[arg(long)]
        platform: Option<PlatformKind>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Args)]
struct InstallArgs {
    /// Target repository (defaults to the current directory)
    #[arg(long)]
    target: Option<PathBuf>,
    /// Hosting platform
    #[arg(long)]
    platform: Option<PlatformKind>,
    /// Install every phase up to and including this one
    #[arg(long)]
    phase: Option<Phase>,
    /// Install exactly these phases (comma separated)
    #[arg(long, value_delimiter = ',', conflicts_with = "phase")]
    phases: Vec<Phase>,
    /// Show what would change without touching files or the platform
    #[arg(long)]
    dry_run: bool,
    /// Path automated agents may modify (repeatable)
    #[arg(long = "allowed-path", value_name = "PATH")]
    allowed_paths: Vec<String>,
    /// Template variable (KEY=VALUE)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    vars: Vec<(String, String)>,
    /// Directory with template overrides
    #[arg(long)]
    template_dir: Option<PathBuf>,
    /// Interactive mode - prompts for phases and allowed paths
    #[arg(short, long)]
    interactive: bool,
    /// Skip all confirmation prompts (for CI/CD)
    #[arg(short = 'y', long)]
    yes: bool,
    /// Output format
    #[arg(short = 'o', long, default_value = "table")]
    format: OutputFormat,
}

fn parse_var(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid variable '{raw}': expected KEY=VALUE"))?;
    Ok((key.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "sentinel=debug,info"
    } else {
        "sentinel=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Install(args) => run_install(*args).await,
        Commands::Phases { format } => run_phases(format),
        Commands::Status {
            target,
            platform,
            format,
        } => run_status(target, platform, format).await,
    }
}

fn resolve_target(target: Option<PathBuf>) -> Result<PathBuf> {
    match target {
        Some(path) => Ok(path),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

/// Command-line flags as the highest configuration layer.
fn flags_layer(args: &InstallArgs) -> SentinelConfig {
    SentinelConfig {
        platform: args.platform,
        phase: args.phase,
        phases: (!args.phases.is_empty()).then(|| args.phases.clone()),
        allowed_paths: (!args.allowed_paths.is_empty()).then(|| args.allowed_paths.clone()),
        template_dir: args.template_dir.clone(),
        variables: args.vars.iter().cloned().collect(),
    }
}

async fn run_install(args: InstallArgs) -> Result<()> {
    let target = resolve_target(args.target.clone())?;
    let store = ConfigStore::for_project(&target)?;
    let file_config = store.load()?;

    let prefilled = PrefilledOptions {
        phases_fixed: args.phase.is_some() || !args.phases.is_empty(),
        allowed_paths_fixed: !args.allowed_paths.is_empty()
            || file_config.allowed_paths.is_some(),
        yes: args.yes,
    };

    // A flag-level `--phase` must win over a `phases` list from sentinel.toml.
    let mut flags = flags_layer(&args);
    if args.phase.is_some() && flags.phases.is_none() {
        flags.phases = Some(Vec::new());
    }

    let merged = merge_configs(Some(file_config), Some(flags));
    merged.validate().context("Invalid install options")?;

    let mut config = merged.to_install_config(&target).with_dry_run(args.dry_run);

    let mut installer = Installer::for_config(&config);
    if let Some(dir) = merged.resolved_template_dir(&target) {
        tracing::debug!(dir = %dir.display(), "using template overrides");
        installer = installer.with_templates(Box::new(LayeredTemplates::new(dir)));
    }

    if matches!(args.format, OutputFormat::Table) {
        let mut flow = InteractiveFlow::new(installer.registry(), prefilled);
        if args.interactive {
            config = flow.collect(config)?;
        }
        if !flow.show_summary_and_confirm(&config)? {
            println!("Installation cancelled");
            return Ok(());
        }
    } else if !args.yes && !args.dry_run {
        anyhow::bail!("--format json needs --yes or --dry-run");
    }

    let result = match installer.install(&config).await {
        Ok(result) => result,
        Err(SentinelError::EnvironmentValidation { problems }) => {
            eprintln!("{} environment validation failed:", style("✗").red().bold());
            for problem in &problems {
                eprintln!("  - {problem}");
            }
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    print_install_result(args.format, &result)
}

fn print_install_result(format: OutputFormat, result: &InstallResult) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Table => {
            let phases = result
                .phases
                .iter()
                .map(Phase::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            if result.dry_run {
                println!("{} Dry run for phases {phases}; nothing was changed", style("•").cyan());
            } else {
                println!("{} Installed phases {phases}", style("✓").green());
            }

            println!("  Workflows:");
            for file in &result.workflows {
                println!("    {file}");
            }

            println!("  Labels:    {}", result.labels.join(", "));
            for (label, error) in &result.label_failures {
                println!("  {} label '{label}': {error}", style("⚠").yellow());
            }

            let policy = if result.claude_md_patched {
                style("updated").green()
            } else {
                style("unchanged").dim()
            };
            println!("  CLAUDE.md: {policy}");

            if result.secrets_ok {
                println!("  Secrets:   {}", style("ok").green());
            } else {
                println!("  Secrets:   {}", style("missing").yellow());
                for name in &result.missing.secrets {
                    println!("    {} secret {name}", style("⚠").yellow());
                }
                for name in &result.missing.variables {
                    println!("    {} variable {name}", style("⚠").yellow());
                }
            }

            if let Some(steps) = &result.post_install {
                println!();
                println!("{}", style("Next steps").bold());
                println!("{steps}");
            }
        }
    }
    Ok(())
}

fn run_phases(format: OutputFormat) -> Result<()> {
    let registry = PhaseRegistry::builtin();
    match format {
        OutputFormat::Json => {
            let phases: Vec<_> = registry.all().collect();
            println!("{}", serde_json::to_string_pretty(&phases)?);
        }
        OutputFormat::Table => {
            for phase in registry.all() {
                println!("{} {}", style(phase.phase).bold(), style(&phase.name).bold());
                println!("  workflows: {}", phase.workflows.join(", "));
                println!("  labels:    {}", phase.labels.join(", "));
                if !phase.secrets.is_empty() {
                    println!("  secrets:   {}", phase.secrets.join(", "));
                }
                if !phase.variables.is_empty() {
                    println!("  variables: {}", phase.variables.join(", "));
                }
            }
        }
    }
    Ok(())
}

async fn run_status(
    target: Option<PathBuf>,
    platform: Option<PlatformKind>,
    format: OutputFormat,
) -> Result<()> {
    let target = resolve_target(target)?;
    let file_config = ConfigStore::for_project(&target)?.load()?;
    let mut config = file_config.to_install_config(&target);
    if let Some(platform) = platform {
        config.platform = platform;
    }

    let adapter = create_adapter(config.platform);
    let status = collect_status(&config, adapter.as_ref()).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Table => print_status(&status),
    }
    Ok(())
}

fn print_status(status: &TargetStatus) {
    println!(
        "{} ({})",
        style(status.target.display()).bold(),
        status.platform
    );

    if status.validation.valid {
        println!("  {} environment ok", style("✓").green());
    } else {
        for error in &status.validation.errors {
            println!("  {} {error}", style("✗").red());
        }
    }

    println!(
        "  Pipelines: {}/{} installed",
        status.installed_count(),
        status.pipeline_files.len()
    );
    for file in &status.pipeline_files {
        match &file.error {
            Some(error) => println!("    {} {}: {error}", style("!").red(), file.name),
            None if file.installed => println!("    {} {}", style("✓").green(), file.name),
            None => println!("    {} {}", style("·").dim(), file.name),
        }
    }

    let policy = match &status.policy {
        PolicyState::Present => style("sentinel block present").green().to_string(),
        PolicyState::Absent => style("no sentinel block").dim().to_string(),
        PolicyState::Missing => style("no CLAUDE.md").dim().to_string(),
        PolicyState::Corrupted => style("markers corrupted, re-run install")
            .yellow()
            .to_string(),
        PolicyState::Unreadable { reason } => style(format!("unreadable ({reason})"))
            .red()
            .to_string(),
    };
    println!("  CLAUDE.md: {policy}");
}
