//! Run configuration: the user-facing option set and its normalized form.
//!
//! Options arrive as kebab-case JSON keys. `Config` mirrors that surface;
//! [`Config::normalize`] resolves every directory against an explicit root so
//! nothing downstream ever reads process state, and rejects contradictory
//! settings up front.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Warning, WarningKind};

/// An alias source: a package-style import pattern mapped onto an on-disk
/// directory pattern. Both halves may end in a single trailing `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePair {
    /// e.g. `"shared-models/*"`
    pub import: String,
    /// e.g. `"./lib/shared/addon/models/*"`
    pub dir: String,
}

/// User-facing configuration, deserialized from a JSON file.
///
/// Unrecognized keys are collected rather than rejected; the engine reports
/// them as warnings and continues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Root for relative resolution of all other directory options.
    pub input_dir: Option<PathBuf>,
    /// Fallback output directory when a more specific one is absent.
    pub output_dir: Option<PathBuf>,

    pub model_source_dir: Option<PathBuf>,
    pub mixin_source_dir: Option<PathBuf>,

    pub resources_dir: Option<PathBuf>,
    pub traits_dir: Option<PathBuf>,
    pub extensions_dir: Option<PathBuf>,

    pub resources_import: Option<String>,
    pub traits_import: Option<String>,
    pub extensions_import: Option<String>,

    /// Post-migration import prefix for the original model locations.
    pub model_import_source: Option<String>,
    /// Post-migration import prefix for the original mixin locations.
    pub mixin_import_source: Option<String>,

    /// The legacy framework's import specifier; also the base for deriving
    /// the `Type` brand path.
    pub ember_data_import_source: Option<String>,

    pub additional_model_sources: Vec<SourcePair>,
    pub additional_mixin_sources: Vec<SourcePair>,

    /// Canonical import paths whose models are materialized as traits.
    pub intermediate_model_paths: Vec<String>,

    /// Custom type-name → TypeScript type mappings.
    pub type_mapping: BTreeMap<String, String>,

    pub dry_run: bool,
    pub verbose: bool,
    pub debug: bool,
    pub skip_processed: bool,
    pub models_only: bool,
    pub mixins_only: bool,
    pub generate_external_resources: bool,

    /// Anything we did not recognize. Warned about, then ignored.
    #[serde(flatten)]
    pub unrecognized: BTreeMap<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: None,
            output_dir: None,
            model_source_dir: None,
            mixin_source_dir: None,
            resources_dir: None,
            traits_dir: None,
            extensions_dir: None,
            resources_import: None,
            traits_import: None,
            extensions_import: None,
            model_import_source: None,
            mixin_import_source: None,
            ember_data_import_source: None,
            additional_model_sources: Vec::new(),
            additional_mixin_sources: Vec::new(),
            intermediate_model_paths: Vec::new(),
            type_mapping: BTreeMap::new(),
            dry_run: false,
            verbose: false,
            debug: false,
            skip_processed: false,
            models_only: false,
            mixins_only: false,
            generate_external_resources: true,
            unrecognized: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load a config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Resolve every path against `root_dir`, apply defaults, and validate.
    ///
    /// `root_dir` is the caller's working directory, captured once at engine
    /// entry. `input-dir` is resolved against it and everything else against
    /// `input-dir`.
    pub fn normalize(self, root_dir: &Path) -> Result<(Normalized, Vec<Warning>), CoreError> {
        let mut warnings = Vec::new();

        if self.models_only && self.mixins_only {
            return Err(CoreError::Config(
                "`models-only` and `mixins-only` are mutually exclusive".into(),
            ));
        }

        for key in self.unrecognized.keys() {
            warnings.push(Warning::new(
                WarningKind::Config,
                format!("unrecognized option `{key}` ignored"),
            ));
        }

        let root = match &self.input_dir {
            Some(dir) => join_normalized(root_dir, dir),
            None => root_dir.to_path_buf(),
        };

        let resources_import = require(self.resources_import, "resources-import")?;
        let traits_import = require(self.traits_import, "traits-import")?;
        let extensions_import = require(self.extensions_import, "extensions-import")?;

        let output_dir = join_normalized(
            &root,
            self.output_dir.as_deref().unwrap_or(Path::new("app/data")),
        );
        let dir_or = |specific: Option<PathBuf>, fallback: &str| match specific {
            Some(dir) => join_normalized(&root, &dir),
            None => output_dir.join(fallback),
        };

        let resolve_pairs = |pairs: Vec<SourcePair>| -> Vec<(String, PathBuf)> {
            pairs
                .into_iter()
                .map(|p| (p.import, join_normalized(&root, Path::new(&p.dir))))
                .collect()
        };

        let normalized = Normalized {
            resources_dir: dir_or(self.resources_dir, "resources"),
            traits_dir: dir_or(self.traits_dir, "traits"),
            extensions_dir: dir_or(self.extensions_dir, "extensions"),
            model_source_dir: join_normalized(
                &root,
                self.model_source_dir
                    .as_deref()
                    .unwrap_or(Path::new("app/models")),
            ),
            mixin_source_dir: join_normalized(
                &root,
                self.mixin_source_dir
                    .as_deref()
                    .unwrap_or(Path::new("app/mixins")),
            ),
            resources_import,
            traits_import,
            extensions_import,
            model_import_source: self.model_import_source,
            mixin_import_source: self.mixin_import_source,
            legacy_source: self
                .ember_data_import_source
                .unwrap_or_else(|| "@ember-data/model".to_string()),
            additional_model_sources: resolve_pairs(self.additional_model_sources),
            additional_mixin_sources: resolve_pairs(self.additional_mixin_sources),
            intermediate_model_paths: self.intermediate_model_paths.into_iter().collect(),
            type_mapping: self.type_mapping,
            dry_run: self.dry_run,
            verbose: self.verbose,
            debug: self.debug,
            skip_processed: self.skip_processed,
            models_only: self.models_only,
            mixins_only: self.mixins_only,
            generate_external_resources: self.generate_external_resources,
            root,
        };

        Ok((normalized, warnings))
    }
}

fn require(value: Option<String>, key: &str) -> Result<String, CoreError> {
    value.ok_or_else(|| CoreError::Config(format!("missing required option `{key}`")))
}

/// Fully resolved configuration: every path absolute, every default applied.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub root: PathBuf,

    pub model_source_dir: PathBuf,
    pub mixin_source_dir: PathBuf,

    pub resources_dir: PathBuf,
    pub traits_dir: PathBuf,
    pub extensions_dir: PathBuf,

    pub resources_import: String,
    pub traits_import: String,
    pub extensions_import: String,

    pub model_import_source: Option<String>,
    pub mixin_import_source: Option<String>,
    pub legacy_source: String,

    pub additional_model_sources: Vec<(String, PathBuf)>,
    pub additional_mixin_sources: Vec<(String, PathBuf)>,

    pub intermediate_model_paths: BTreeSet<String>,
    pub type_mapping: BTreeMap<String, String>,

    pub dry_run: bool,
    pub verbose: bool,
    pub debug: bool,
    pub skip_processed: bool,
    pub models_only: bool,
    pub mixins_only: bool,
    pub generate_external_resources: bool,
}

impl Normalized {
    /// The import path of the `Type` brand symbol, derived from the legacy
    /// source by replacing its last segment with `core-types/symbols`.
    pub fn type_brand_import(&self) -> String {
        match self.legacy_source.rsplit_once('/') {
            Some((prefix, _)) => format!("{prefix}/core-types/symbols"),
            None => format!("{}/core-types/symbols", self.legacy_source),
        }
    }
}

/// Join `path` onto `base` (unless already absolute) and normalize `.`/`..`
/// components lexically, without touching the filesystem.
pub fn join_normalized(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    lexical_normalize(&joined)
}

/// Collapse `.` and `..` components without resolving symlinks.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
