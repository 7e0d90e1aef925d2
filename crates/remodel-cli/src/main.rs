//! remodel CLI.
//!
//! ```bash
//! remodel run ./remodel.json
//! remodel run ./remodel.json --dry-run --verbose
//! remodel inspect ./remodel.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use remodel_core::plan::Materialize;
use remodel_core::{Config, RunReport};

#[derive(Parser)]
#[command(name = "remodel", about = "Legacy data-layer model migration engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct CommonArgs {
    /// Path to the JSON configuration file.
    config: PathBuf,

    /// Per-file progress output.
    #[arg(short, long)]
    verbose: bool,

    /// Resolver decisions and the resolved schedule.
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full migration pipeline.
    Run {
        #[command(flatten)]
        common: CommonArgs,

        /// Perform all work but write nothing.
        #[arg(long)]
        dry_run: bool,

        /// Skip symbols whose outputs already exist on disk.
        #[arg(long)]
        skip_processed: bool,

        /// Emit models only (conflicts with --mixins-only).
        #[arg(long, conflicts_with = "mixins_only")]
        models_only: bool,

        /// Emit mixins only (conflicts with --models-only).
        #[arg(long)]
        mixins_only: bool,
    },
    /// Index, classify, and plan without emitting; print the schedule.
    Inspect {
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            common,
            dry_run,
            skip_processed,
            models_only,
            mixins_only,
        } => {
            let mut config = load_config(&common)?;
            config.dry_run |= dry_run;
            config.skip_processed |= skip_processed;
            config.models_only |= models_only;
            config.mixins_only |= mixins_only;
            let dry = config.dry_run;

            let report = remodel_core::run(config)?;
            print_summary(&report, dry);
            Ok(())
        }
        Command::Inspect { common } => {
            let mut config = load_config(&common)?;
            config.dry_run = true;
            let report = remodel_core::run(config)?;
            print_schedule(&report);
            Ok(())
        }
    }
}

fn load_config(common: &CommonArgs) -> Result<Config> {
    let mut config = Config::from_file(&common.config)
        .with_context(|| format!("failed to load {}", common.config.display()))?;
    config.verbose |= common.verbose;
    config.debug |= common.debug;
    init_tracing(config.verbose, config.debug);
    Ok(config)
}

fn init_tracing(verbose: bool, debug: bool) {
    let default = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(report: &RunReport, dry_run: bool) {
    println!(
        "[remodel] indexed {} files ({} models, {} intermediate, {} mixins, {} ignored)",
        report.indexed,
        report.models,
        report.intermediate_models,
        report.mixins,
        report.ignored,
    );
    if dry_run {
        println!(
            "[remodel] dry run: {} plans resolved, nothing written",
            report.plans.len()
        );
    } else {
        println!(
            "[remodel] wrote {} artifacts across {} plans ({} skipped)",
            report.written.len(),
            report.plans.len(),
            report.skipped,
        );
    }
    if report.cancelled {
        println!("[remodel] cancelled before completion");
    }
    if !report.warnings.is_empty() {
        println!("[remodel] {} warnings (rerun with --verbose)", report.warnings.len());
    }
}

fn print_schedule(report: &RunReport) {
    println!("[remodel] schedule ({} plans):", report.plans.len());
    for plan in &report.plans {
        let materialize = match plan.materialize {
            Materialize::Resource => "resource",
            Materialize::Trait => "trait",
        };
        let extension = if plan.emit_extension { " +extension" } else { "" };
        println!(
            "  {:<10} {}{}  ← {}",
            materialize,
            plan.name,
            extension,
            plan.handle.import_path,
        );
    }
    for warning in &report.warnings {
        println!("  warning: {warning}");
    }
}
