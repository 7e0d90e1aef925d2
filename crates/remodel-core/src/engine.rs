//! The pipeline driver: index → classify → plan → emit.
//!
//! Single-threaded and deterministic by design: the planner needs global
//! visibility before emission, and stable output matters more than
//! throughput at the scale of one repository. The only process state read
//! is the working directory, captured once at entry.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classify::{classify_file, BaseLookup, FileKind, FileSummary};
use crate::config::{Config, Normalized};
use crate::emit::{EmitStatus, Emitter};
use crate::error::{CoreError, Warning};
use crate::index::SourceIndex;
use crate::plan::{plan, ArtifactPlan};
use crate::resolve::Resolver;

/// Cooperative cancellation signal, checked between artifact plans. A plan
/// is atomic with respect to its files — cancellation never leaves a
/// partial artifact set behind.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What one run did.
#[derive(Debug)]
pub struct RunReport {
    pub indexed: usize,
    pub models: usize,
    pub intermediate_models: usize,
    pub mixins: usize,
    pub ignored: usize,
    /// The resolved schedule, in emission order. Identical between dry and
    /// wet runs over the same inputs.
    pub plans: Vec<ArtifactPlan>,
    pub written: Vec<PathBuf>,
    pub skipped: usize,
    pub cancelled: bool,
    pub warnings: Vec<Warning>,
}

/// Run the engine with the working directory as root.
pub fn run(config: Config) -> Result<RunReport, CoreError> {
    run_with_cancel(config, &CancelFlag::new())
}

pub fn run_with_cancel(config: Config, cancel: &CancelFlag) -> Result<RunReport, CoreError> {
    let root = std::env::current_dir()?;
    run_in(config, &root, cancel)
}

/// Run the engine against an explicit root directory.
pub fn run_in(
    config: Config,
    root_dir: &Path,
    cancel: &CancelFlag,
) -> Result<RunReport, CoreError> {
    let (config, mut warnings) = config.normalize(root_dir)?;

    let mut index = SourceIndex::build(&config)?;
    let indexed = index.len();
    let resolver = Resolver::new(&config);

    classify_all(&mut index, &resolver, &config, &mut warnings);

    let plan = plan(&index, &resolver, &config, &mut warnings);
    if config.debug {
        for entry in &plan.plans {
            debug!(
                symbol = %entry.handle.import_path,
                materialize = ?entry.materialize,
                extension = entry.emit_extension,
                "scheduled"
            );
        }
    }

    let emitter = Emitter::new(&config, &resolver, &plan.targets);
    let mut written = Vec::new();
    let mut skipped = 0usize;
    let mut cancelled = false;
    for entry in &plan.plans {
        if cancel.is_cancelled() {
            info!("cancellation requested, stopping before next plan");
            cancelled = true;
            break;
        }
        match emitter.emit_plan(entry, &mut warnings)? {
            EmitStatus::Written(paths) => written.extend(paths),
            EmitStatus::DryRun(_) | EmitStatus::Skipped => skipped += 1,
        }
    }

    let mut models = 0;
    let mut intermediate_models = 0;
    let mut mixins = 0;
    let mut ignored = 0;
    for record in index.records() {
        match record.summary.as_ref().map(|s| s.kind) {
            Some(FileKind::Model) => models += 1,
            Some(FileKind::IntermediateModel) => intermediate_models += 1,
            Some(FileKind::Mixin) => mixins += 1,
            _ => ignored += 1,
        }
    }

    for warning in &warnings {
        warn!("{warning}");
    }
    info!(
        indexed,
        models,
        mixins,
        plans = plan.plans.len(),
        written = written.len(),
        "run complete"
    );

    Ok(RunReport {
        indexed,
        models,
        intermediate_models,
        mixins,
        ignored,
        plans: plan.plans,
        written,
        skipped,
        cancelled,
        warnings,
    })
}

/// Classify every indexed file. Records that fail to parse are dropped from
/// the index; models whose canonical import path is configured as
/// intermediate are upgraded here so downstream counts agree with the
/// planner.
fn classify_all(
    index: &mut SourceIndex,
    resolver: &Resolver,
    config: &Normalized,
    warnings: &mut Vec<Warning>,
) {
    let lookup = EngineLookup {
        resolver,
        index: &*index,
        config,
    };

    let mut outcomes: Vec<(PathBuf, Option<FileSummary>)> = Vec::new();
    for record in index.records() {
        let summary = classify_file(
            &record.path,
            &record.text,
            &config.legacy_source,
            &lookup,
            warnings,
        );
        let summary = summary.map(|mut s| {
            let canonical = resolver.canonical_name(&record.path);
            if s.kind == FileKind::Model
                && config.intermediate_model_paths.contains(&canonical.import_path)
            {
                s.kind = FileKind::IntermediateModel;
            }
            if config.verbose {
                info!(path = %record.path.display(), kind = ?s.kind, "classified");
            }
            s
        });
        outcomes.push((record.path.clone(), summary));
    }

    for (path, summary) in outcomes {
        match summary {
            Some(summary) => index.set_summary(&path, summary),
            None => index.remove(&path),
        }
    }
}

struct EngineLookup<'a> {
    resolver: &'a Resolver,
    index: &'a SourceIndex,
    config: &'a Normalized,
}

impl BaseLookup for EngineLookup<'_> {
    fn is_intermediate(&self, importer: &Path, specifier: &str) -> bool {
        if self.config.intermediate_model_paths.contains(specifier) {
            return true;
        }
        let dir = importer.parent().unwrap_or(importer);
        let Some(path) = self.resolver.resolve_specifier(dir, specifier, self.index) else {
            return false;
        };
        let canonical = self.resolver.canonical_name(&path);
        self.config
            .intermediate_model_paths
            .contains(&canonical.import_path)
    }
}
