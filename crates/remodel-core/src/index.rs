//! C1 — the source index.
//!
//! Enumerates candidate files from the primary roots and every alias source,
//! reads each exactly once, and records it by canonical path. Parse problems
//! are discovered later (the classifier owns the syntax tree); the index
//! drops such records on request and never sees them again.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::classify::FileSummary;
use crate::config::{lexical_normalize, Normalized};
use crate::error::CoreError;

/// Surface language of a source file, derived from its filename suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// `.ts`
    Typed,
    /// `.js`
    Untyped,
}

impl Surface {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") => Some(Surface::Typed),
            Some("js") => Some(Surface::Untyped),
            _ => None,
        }
    }

    /// The extension emitted artifacts inherit from this surface.
    pub fn ext(self) -> &'static str {
        match self {
            Surface::Typed => "ts",
            Surface::Untyped => "js",
        }
    }
}

/// Where a file was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    PrimaryModel,
    PrimaryMixin,
    /// Discovered through `additional-model-sources`.
    AliasModel,
    /// Discovered through `additional-mixin-sources`.
    AliasMixin,
}

impl SourceOrigin {
    /// True for alias-sourced files (`generate-external-resources` gates these).
    pub fn is_alias(self) -> bool {
        matches!(self, SourceOrigin::AliasModel | SourceOrigin::AliasMixin)
    }
}

/// One discovered file. Created once during indexing; the classification
/// outcome is attached later and the record is otherwise never mutated.
#[derive(Debug)]
pub struct FileRecord {
    pub path: PathBuf,
    pub surface: Surface,
    pub origin: SourceOrigin,
    pub text: String,
    pub summary: Option<FileSummary>,
}

/// The source index: canonical path → file record.
///
/// A `BTreeMap` keeps iteration order stable, which the determinism
/// guarantee leans on everywhere downstream.
#[derive(Debug, Default)]
pub struct SourceIndex {
    records: BTreeMap<PathBuf, FileRecord>,
}

impl SourceIndex {
    /// Enumerate and read every candidate file under the configured roots.
    ///
    /// Missing roots are tolerated (a project without mixins is fine); I/O
    /// failures on an individual file abort the run since they indicate an
    /// environment problem rather than a malformed input.
    pub fn build(config: &Normalized) -> Result<Self, CoreError> {
        let mut index = SourceIndex::default();

        index.scan_root(&config.model_source_dir, SourceOrigin::PrimaryModel)?;
        index.scan_root(&config.mixin_source_dir, SourceOrigin::PrimaryMixin)?;
        for (_, dir) in &config.additional_model_sources {
            index.scan_root(&strip_wildcard(dir), SourceOrigin::AliasModel)?;
        }
        for (_, dir) in &config.additional_mixin_sources {
            index.scan_root(&strip_wildcard(dir), SourceOrigin::AliasMixin)?;
        }

        info!(files = index.records.len(), "indexed source files");
        Ok(index)
    }

    fn scan_root(&mut self, root: &Path, origin: SourceOrigin) -> Result<(), CoreError> {
        if !root.is_dir() {
            debug!(root = %root.display(), "source root absent, skipped");
            return Ok(());
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                CoreError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other("walkdir loop")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = lexical_normalize(entry.path());
            let Some(surface) = Surface::from_path(&path) else {
                continue;
            };
            if self.records.contains_key(&path) {
                continue;
            }
            let text = fs::read_to_string(&path)?;
            debug!(path = %path.display(), "indexed");
            self.records.insert(
                path.clone(),
                FileRecord {
                    path,
                    surface,
                    origin,
                    text,
                    summary: None,
                },
            );
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.records.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.records.contains_key(path)
    }

    /// Attach the classification outcome to a record.
    pub fn set_summary(&mut self, path: &Path, summary: FileSummary) {
        if let Some(record) = self.records.get_mut(path) {
            record.summary = Some(summary);
        }
    }

    /// Drop a record (used when its content turned out to be unparseable).
    pub fn remove(&mut self, path: &Path) {
        self.records.remove(path);
    }

    /// All record paths, in canonical order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.records.keys().cloned().collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }
}

/// Directory patterns may end in a trailing `*`; the walkable base is
/// everything before it.
fn strip_wildcard(dir: &Path) -> PathBuf {
    match dir.file_name().and_then(|n| n.to_str()) {
        Some("*") => dir.parent().unwrap_or(dir).to_path_buf(),
        _ => dir.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn normalized(root: &Path) -> Normalized {
        let config = Config {
            resources_import: Some("app/data/resources".into()),
            traits_import: Some("app/data/traits".into()),
            extensions_import: Some("app/data/extensions".into()),
            ..Config::default()
        };
        config.normalize(root).unwrap().0
    }

    #[test]
    fn indexes_ts_and_js_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app/models/user.ts", "export default 1;");
        write(dir.path(), "app/models/post.js", "export default 1;");
        write(dir.path(), "app/models/notes.md", "# nope");
        let index = SourceIndex::build(&normalized(dir.path())).unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn surface_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app/models/user.ts", "");
        write(dir.path(), "app/models/post.js", "");
        let index = SourceIndex::build(&normalized(dir.path())).unwrap();
        let user = index
            .get(&lexical_normalize(&dir.path().join("app/models/user.ts")))
            .unwrap();
        assert_eq!(user.surface, Surface::Typed);
        let post = index
            .get(&lexical_normalize(&dir.path().join("app/models/post.js")))
            .unwrap();
        assert_eq!(post.surface, Surface::Untyped);
    }

    #[test]
    fn missing_roots_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let index = SourceIndex::build(&normalized(dir.path())).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn strip_wildcard_removes_trailing_star() {
        assert_eq!(
            strip_wildcard(Path::new("/lib/shared/models/*")),
            PathBuf::from("/lib/shared/models")
        );
        assert_eq!(
            strip_wildcard(Path::new("/lib/shared/models")),
            PathBuf::from("/lib/shared/models")
        );
    }
}
