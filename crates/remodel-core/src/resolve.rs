//! C3 — the resolver.
//!
//! Two directional mappings, both driven by configuration. Forwards: an
//! import specifier appearing in a classified file resolves to a canonical
//! file path in the source index. Backwards: a file path maps to the
//! canonical import specifier (and symbol name) that identifies its symbol
//! handle, and a materialized symbol maps to the post-migration specifier
//! emitted artifacts use to import it.
//!
//! Patterns are prefix pairs; a trailing `*` wildcard is allowed on either
//! half and implied when absent.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::classify::FileKind;
use crate::config::{lexical_normalize, Normalized};
use crate::index::SourceIndex;
use crate::names::{kebab_case, strip_source_ext};

/// The stable identity used across the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolHandle {
    pub kind: FileKind,
    pub import_path: String,
}

/// The identity a file contributes to its symbol handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalName {
    /// The import specifier that resolves to this file (or a root-relative
    /// pseudo-specifier when no import prefix covers it).
    pub import_path: String,
    /// Kebab-cased symbol name; keeps `/` separators for nested symbols.
    pub name: String,
    /// True when the file came from an alias source.
    pub external: bool,
}

#[derive(Debug)]
struct PatternPair {
    /// Import prefix with the wildcard stripped; `None` when the pattern
    /// has no import half (a primary root without an import source).
    import_prefix: Option<String>,
    dir_prefix: PathBuf,
    external: bool,
}

/// Bidirectional specifier/path mapper.
#[derive(Debug)]
pub struct Resolver {
    patterns: Vec<PatternPair>,
    root: PathBuf,
    resources_import: String,
    traits_import: String,
    extensions_import: String,
}

impl Resolver {
    pub fn new(config: &Normalized) -> Self {
        let mut patterns = Vec::new();
        patterns.push(PatternPair {
            import_prefix: config.model_import_source.clone(),
            dir_prefix: config.model_source_dir.clone(),
            external: false,
        });
        patterns.push(PatternPair {
            import_prefix: config.mixin_import_source.clone(),
            dir_prefix: config.mixin_source_dir.clone(),
            external: false,
        });
        for (import, dir) in &config.additional_model_sources {
            patterns.push(PatternPair {
                import_prefix: Some(strip_star(import).to_string()),
                dir_prefix: strip_dir_star(dir),
                external: true,
            });
        }
        for (import, dir) in &config.additional_mixin_sources {
            patterns.push(PatternPair {
                import_prefix: Some(strip_star(import).to_string()),
                dir_prefix: strip_dir_star(dir),
                external: true,
            });
        }
        Self {
            patterns,
            root: config.root.clone(),
            resources_import: config.resources_import.clone(),
            traits_import: config.traits_import.clone(),
            extensions_import: config.extensions_import.clone(),
        }
    }

    /// Map an import specifier to a canonical path present in the index.
    ///
    /// Relative specifiers resolve against the importing file's directory;
    /// package-style specifiers try each configured pattern in declaration
    /// order. `None` is not an error here — it becomes one only if the
    /// planner needs the symbol.
    pub fn resolve_specifier(
        &self,
        importer_dir: &Path,
        specifier: &str,
        index: &SourceIndex,
    ) -> Option<PathBuf> {
        if specifier.starts_with('.') {
            let base = lexical_normalize(&importer_dir.join(specifier));
            let found = self.try_candidates(&base, index);
            debug!(specifier, resolved = ?found, "relative specifier");
            return found;
        }
        for pattern in &self.patterns {
            let Some(prefix) = &pattern.import_prefix else {
                continue;
            };
            let Some(remainder) = match_prefix(specifier, prefix) else {
                continue;
            };
            let base = pattern.dir_prefix.join(remainder);
            if let Some(found) = self.try_candidates(&base, index) {
                debug!(specifier, resolved = %found.display(), "alias specifier");
                return Some(found);
            }
        }
        debug!(specifier, "unresolved specifier");
        None
    }

    fn try_candidates(&self, base: &Path, index: &SourceIndex) -> Option<PathBuf> {
        if index.contains(base) {
            return Some(base.to_path_buf());
        }
        // Append rather than `with_extension`: specifiers may carry inner
        // dots that are not extensions (`user.v2`).
        for ext in [".ts", ".js"] {
            let mut candidate = base.as_os_str().to_os_string();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            if index.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Map a file path back to its canonical import path and symbol name.
    ///
    /// Falls back to a root-relative pseudo-specifier when no configured
    /// import prefix covers the file, so every indexed file still has a
    /// stable handle.
    pub fn canonical_name(&self, path: &Path) -> CanonicalName {
        for pattern in &self.patterns {
            let Ok(rel) = path.strip_prefix(&pattern.dir_prefix) else {
                continue;
            };
            let remainder = strip_source_ext(&rel.to_string_lossy().replace('\\', "/")).to_string();
            let import_path = match &pattern.import_prefix {
                Some(prefix) => join_specifier(prefix, &remainder),
                None => {
                    let root_rel = path
                        .strip_prefix(&self.root)
                        .unwrap_or(path)
                        .to_string_lossy()
                        .replace('\\', "/");
                    strip_source_ext(&root_rel).to_string()
                }
            };
            return CanonicalName {
                import_path,
                name: kebab_case(&remainder),
                external: pattern.external,
            };
        }
        let root_rel = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let remainder = strip_source_ext(&root_rel).to_string();
        CanonicalName {
            name: kebab_case(
                remainder
                    .rsplit('/')
                    .next()
                    .unwrap_or(remainder.as_str()),
            ),
            import_path: remainder,
            external: false,
        }
    }

    // ── Post-migration import specifiers ───────────────────────────────

    pub fn resource_types_import(&self, name: &str) -> String {
        format!("{}/{}.schema.types", self.resources_import, name)
    }

    pub fn trait_types_import(&self, name: &str) -> String {
        format!("{}/{}.schema.types", self.traits_import, name)
    }

    pub fn extension_import(&self, name: &str) -> String {
        format!("{}/{}", self.extensions_import, name)
    }
}

fn strip_star(pattern: &str) -> &str {
    pattern
        .strip_suffix('*')
        .map(|p| p.trim_end_matches('/'))
        .unwrap_or(pattern)
}

fn strip_dir_star(dir: &Path) -> PathBuf {
    match dir.file_name().and_then(|n| n.to_str()) {
        Some("*") => dir.parent().unwrap_or(dir).to_path_buf(),
        _ => dir.to_path_buf(),
    }
}

fn match_prefix<'s>(specifier: &'s str, prefix: &str) -> Option<&'s str> {
    let rest = specifier.strip_prefix(prefix)?;
    rest.strip_prefix('/').or({
        // Exact match of a wildcard-less pattern.
        if rest.is_empty() {
            Some("")
        } else {
            None
        }
    })
}

fn join_specifier(prefix: &str, remainder: &str) -> String {
    if remainder.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}/{remainder}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;

    fn setup(root: &Path) -> (Normalized, SourceIndex) {
        for rel in [
            "app/models/user.ts",
            "app/models/admin/role.ts",
            "app/mixins/auditable.js",
            "lib/shared/models/billing-plan.ts",
        ] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "export default 1;\n").unwrap();
        }
        let config = Config {
            resources_import: Some("my-app/data/resources".into()),
            traits_import: Some("my-app/data/traits".into()),
            extensions_import: Some("my-app/data/extensions".into()),
            model_import_source: Some("my-app/models".into()),
            mixin_import_source: Some("my-app/mixins".into()),
            additional_model_sources: vec![crate::config::SourcePair {
                import: "shared-models/*".into(),
                dir: "lib/shared/models/*".into(),
            }],
            ..Config::default()
        };
        let (normalized, _) = config.normalize(root).unwrap();
        let index = SourceIndex::build(&normalized).unwrap();
        (normalized, index)
    }

    #[test]
    fn package_specifier_resolves_through_primary_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let (config, index) = setup(dir.path());
        let resolver = Resolver::new(&config);
        let found = resolver
            .resolve_specifier(dir.path(), "my-app/models/user", &index)
            .unwrap();
        assert!(found.ends_with("app/models/user.ts"));
    }

    #[test]
    fn alias_specifier_resolves_in_declaration_order() {
        let dir = tempfile::tempdir().unwrap();
        let (config, index) = setup(dir.path());
        let resolver = Resolver::new(&config);
        let found = resolver
            .resolve_specifier(dir.path(), "shared-models/billing-plan", &index)
            .unwrap();
        assert!(found.ends_with("lib/shared/models/billing-plan.ts"));
    }

    #[test]
    fn relative_specifier_resolves_against_importer() {
        let dir = tempfile::tempdir().unwrap();
        let (config, index) = setup(dir.path());
        let resolver = Resolver::new(&config);
        let importer_dir = lexical_normalize(&dir.path().join("app/models"));
        let found = resolver
            .resolve_specifier(&importer_dir, "../mixins/auditable", &index)
            .unwrap();
        assert!(found.ends_with("app/mixins/auditable.js"));
    }

    #[test]
    fn unresolved_specifier_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let (config, index) = setup(dir.path());
        let resolver = Resolver::new(&config);
        assert!(resolver
            .resolve_specifier(dir.path(), "my-app/models/ghost", &index)
            .is_none());
    }

    #[test]
    fn canonical_name_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let (config, index) = setup(dir.path());
        let resolver = Resolver::new(&config);
        let path = resolver
            .resolve_specifier(dir.path(), "my-app/models/admin/role", &index)
            .unwrap();
        let canonical = resolver.canonical_name(&path);
        assert_eq!(canonical.import_path, "my-app/models/admin/role");
        assert_eq!(canonical.name, "admin/role");
        assert!(!canonical.external);
    }

    #[test]
    fn alias_files_are_external() {
        let dir = tempfile::tempdir().unwrap();
        let (config, index) = setup(dir.path());
        let resolver = Resolver::new(&config);
        let path = resolver
            .resolve_specifier(dir.path(), "shared-models/billing-plan", &index)
            .unwrap();
        let canonical = resolver.canonical_name(&path);
        assert_eq!(canonical.import_path, "shared-models/billing-plan");
        assert!(canonical.external);
    }

    #[test]
    fn post_migration_imports() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = setup(dir.path());
        let resolver = Resolver::new(&config);
        assert_eq!(
            resolver.resource_types_import("user"),
            "my-app/data/resources/user.schema.types"
        );
        assert_eq!(
            resolver.trait_types_import("auditable"),
            "my-app/data/traits/auditable.schema.types"
        );
        assert_eq!(
            resolver.extension_import("user"),
            "my-app/data/extensions/user"
        );
    }
}
