//! C5 — the emitter.
//!
//! For each artifact plan, renders up to three artifacts (schema, types,
//! extension) into memory, then flushes them together: a plan is atomic with
//! respect to its files, and directories are created only when a write
//! actually lands in them.

pub mod extension;
pub mod schema;
pub mod types;

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::Normalized;
use crate::error::{CoreError, Warning};
use crate::plan::{ArtifactPlan, Materialize, TargetMap};
use crate::resolve::Resolver;

/// Outcome of emitting one plan.
#[derive(Debug)]
pub enum EmitStatus {
    Written(Vec<PathBuf>),
    /// `dry-run`: rendered but not written.
    DryRun(Vec<PathBuf>),
    /// `skip-processed`: every target already exists on disk.
    Skipped,
}

pub struct Emitter<'a> {
    config: &'a Normalized,
    resolver: &'a Resolver,
    targets: &'a TargetMap,
}

impl<'a> Emitter<'a> {
    pub fn new(config: &'a Normalized, resolver: &'a Resolver, targets: &'a TargetMap) -> Self {
        Self {
            config,
            resolver,
            targets,
        }
    }

    fn schema_dir(&self, plan: &ArtifactPlan) -> &PathBuf {
        match plan.materialize {
            Materialize::Resource => &self.config.resources_dir,
            Materialize::Trait => &self.config.traits_dir,
        }
    }

    /// The paths a plan writes, in emission order: schema, types, extension.
    pub fn target_paths(&self, plan: &ArtifactPlan) -> Vec<PathBuf> {
        let dir = self.schema_dir(plan);
        let mut paths = vec![
            dir.join(format!("{}.schema.{}", plan.name, plan.surface.ext())),
            dir.join(format!("{}.schema.types.ts", plan.name)),
        ];
        if plan.emit_extension {
            paths.push(
                self.config
                    .extensions_dir
                    .join(format!("{}.{}", plan.name, plan.surface.ext())),
            );
        }
        paths
    }

    /// Render all artifacts for one plan into memory, in emission order.
    pub fn render(
        &self,
        plan: &ArtifactPlan,
        warnings: &mut Vec<Warning>,
    ) -> Vec<(PathBuf, String)> {
        let dir = self.schema_dir(plan);
        let mut files = vec![
            (
                dir.join(format!("{}.schema.{}", plan.name, plan.surface.ext())),
                schema::render(plan),
            ),
            (
                dir.join(format!("{}.schema.types.ts", plan.name)),
                types::render(self.config, self.resolver, self.targets, plan, warnings),
            ),
        ];
        if plan.emit_extension {
            files.push((
                self.config
                    .extensions_dir
                    .join(format!("{}.{}", plan.name, plan.surface.ext())),
                extension::render(self.resolver, plan),
            ));
        }
        files
    }

    /// Render and flush one plan.
    pub fn emit_plan(
        &self,
        plan: &ArtifactPlan,
        warnings: &mut Vec<Warning>,
    ) -> Result<EmitStatus, CoreError> {
        if self.config.skip_processed {
            let paths = self.target_paths(plan);
            if paths.iter().all(|p| p.exists()) {
                debug!(symbol = %plan.handle.import_path, "all outputs exist, skipped");
                return Ok(EmitStatus::Skipped);
            }
        }

        let files = self.render(plan, warnings);
        if self.config.dry_run {
            return Ok(EmitStatus::DryRun(
                files.into_iter().map(|(path, _)| path).collect(),
            ));
        }

        let mut written = Vec::with_capacity(files.len());
        for (path, content) in files {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
            info!(path = %path.display(), "wrote");
            written.push(path);
        }
        Ok(EmitStatus::Written(written))
    }
}
