//! C4 — the dependency planner.
//!
//! Consumes every classified summary and produces the processing schedule:
//! which mixins are connected, in what order symbols are emitted, and the
//! per-symbol materialization decision (resource, trait, or skip).

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::debug;

use crate::classify::{
    BaseRef, FieldDescriptor, FieldKind, FileKind, FileSummary, ResidualMember, TraitOrigin,
};
use crate::config::Normalized;
use crate::error::{Warning, WarningKind};
use crate::index::{SourceIndex, Surface};
use crate::names::pascal_case;
use crate::resolve::{Resolver, SymbolHandle};

/// The planner's verdict for a symbol that will be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialize {
    Resource,
    Trait,
}

/// The emitter's input unit: everything needed to render one symbol's
/// artifacts, fully resolved and ordered.
#[derive(Debug, Clone)]
pub struct ArtifactPlan {
    pub path: PathBuf,
    pub handle: SymbolHandle,
    /// Kebab-cased symbol name (may contain `/` for nested symbols).
    pub name: String,
    pub pascal: String,
    pub surface: Surface,
    pub external: bool,
    pub materialize: Materialize,
    pub fields: Vec<FieldDescriptor>,
    /// Kebab names for the schema `traits` array, source order, deduplicated.
    pub traits: Vec<String>,
    /// Kebab name of the intermediate base whose extension this symbol's
    /// extension must extend, when that base emits one.
    pub base_extension: Option<String>,
    pub residual: Vec<ResidualMember>,
    pub emit_extension: bool,
}

/// Where a relationship target name lands after migration. Used by the
/// emitter to type `belongsTo`/`hasMany` fields.
#[derive(Debug, Default)]
pub struct TargetMap {
    map: BTreeMap<String, Materialize>,
}

impl TargetMap {
    pub fn get(&self, name: &str) -> Option<Materialize> {
        self.map.get(name).copied()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, materialize: Materialize) {
        self.map.insert(name.into(), materialize);
    }
}

/// The full schedule plus the cross-symbol target map.
#[derive(Debug)]
pub struct Plan {
    pub plans: Vec<ArtifactPlan>,
    pub targets: TargetMap,
}

struct Symbol {
    path: PathBuf,
    surface: Surface,
    external: bool,
    kind: FileKind,
    name: String,
    import_path: String,
    summary: FileSummary,
    /// Resolved trait references: (target import path, origin), source order.
    refs: Vec<(String, TraitOrigin)>,
    /// Resolved intermediate base, by import path.
    base: Option<String>,
}

/// Build the processing schedule from all classified summaries.
pub fn plan(
    index: &SourceIndex,
    resolver: &Resolver,
    config: &Normalized,
    warnings: &mut Vec<Warning>,
) -> Plan {
    let mut symbols = collect_symbols(index, resolver, config, warnings);
    resolve_references(&mut symbols, index, resolver, warnings);
    add_polymorphic_refs(&mut symbols);

    let connected = connected_mixins(&symbols);
    break_mixin_cycles(&mut symbols, &connected, warnings);

    // Materialization decisions, pre-filter: the target map reflects the
    // whole migration even when this run emits a subset.
    let mut targets = TargetMap::default();
    for symbol in &symbols {
        if symbol.kind == FileKind::Model {
            targets.map.insert(symbol.name.clone(), Materialize::Resource);
        }
    }
    for symbol in &symbols {
        match symbol.kind {
            FileKind::IntermediateModel => {
                targets.map.insert(symbol.name.clone(), Materialize::Trait);
            }
            // A polymorphic target can match both a resource and a trait;
            // traits win, so they are inserted last.
            FileKind::Mixin if connected.contains(&symbol.import_path) => {
                targets.map.insert(symbol.name.clone(), Materialize::Trait);
            }
            _ => {}
        }
    }

    let by_import: BTreeMap<String, usize> = symbols
        .iter()
        .enumerate()
        .map(|(i, s)| (s.import_path.clone(), i))
        .collect();

    // Extension decisions. Intermediates and mixins depend only on their
    // own residual set; models additionally inherit the obligation from an
    // extension-bearing intermediate base.
    let mut has_extension: BTreeMap<String, bool> = BTreeMap::new();
    for symbol in &symbols {
        if matches!(symbol.kind, FileKind::IntermediateModel | FileKind::Mixin) {
            has_extension.insert(symbol.import_path.clone(), !symbol.summary.residual.is_empty());
        }
    }

    let mut schedule: Vec<&Symbol> = symbols
        .iter()
        .filter(|s| match s.kind {
            FileKind::Model | FileKind::IntermediateModel => true,
            FileKind::Mixin => connected.contains(&s.import_path),
            FileKind::Ignored => false,
        })
        .collect();
    schedule.sort_by_key(|s| (layer(s.kind), s.import_path.clone()));

    let mut plans = Vec::new();
    for symbol in schedule {
        let materialize = match symbol.kind {
            FileKind::Model => Materialize::Resource,
            _ => Materialize::Trait,
        };

        // Emission filters. Materialization decisions above are unaffected.
        if config.models_only && symbol.kind == FileKind::Mixin {
            debug!(symbol = %symbol.import_path, "suppressed by models-only");
            continue;
        }
        if config.mixins_only && symbol.kind != FileKind::Mixin {
            debug!(symbol = %symbol.import_path, "suppressed by mixins-only");
            continue;
        }
        if symbol.external && !config.generate_external_resources {
            debug!(symbol = %symbol.import_path, "suppressed external symbol");
            continue;
        }

        let mut fields = symbol.summary.fields.clone();
        if symbol.kind == FileKind::IntermediateModel
            && !fields.iter().any(|f| f.name == "id")
        {
            // Extension code referencing `this.id` must type-check against
            // the trait.
            fields.insert(0, synthetic_id_field());
        }

        let mut traits = Vec::new();
        if let Some(base) = &symbol.base {
            if let Some(&i) = by_import.get(base) {
                traits.push(symbols[i].name.clone());
            }
        }
        for (target, origin) in &symbol.refs {
            if *origin == TraitOrigin::Direct || *origin == TraitOrigin::TypeOnly {
                if let Some(&i) = by_import.get(target) {
                    let name = symbols[i].name.clone();
                    if !traits.contains(&name) {
                        traits.push(name);
                    }
                }
            }
        }

        let base_extension = symbol.base.as_ref().and_then(|base| {
            let i = *by_import.get(base)?;
            if has_extension.get(base).copied().unwrap_or(false) {
                Some(symbols[i].name.clone())
            } else {
                None
            }
        });
        let emit_extension = !symbol.summary.residual.is_empty() || base_extension.is_some();

        plans.push(ArtifactPlan {
            path: symbol.path.clone(),
            handle: SymbolHandle {
                kind: symbol.kind,
                import_path: symbol.import_path.clone(),
            },
            name: symbol.name.clone(),
            pascal: pascal_case(&symbol.name),
            surface: symbol.surface,
            external: symbol.external,
            materialize,
            fields,
            traits,
            base_extension,
            residual: symbol.summary.residual.clone(),
            emit_extension,
        });
    }

    Plan { plans, targets }
}

fn layer(kind: FileKind) -> u8 {
    match kind {
        FileKind::IntermediateModel => 0,
        FileKind::Mixin => 1,
        _ => 2,
    }
}

fn synthetic_id_field() -> FieldDescriptor {
    FieldDescriptor {
        name: "id".into(),
        kind: FieldKind::Attribute,
        type_name: "string".into(),
        options: Default::default(),
    }
}

fn collect_symbols(
    index: &SourceIndex,
    resolver: &Resolver,
    config: &Normalized,
    warnings: &mut Vec<Warning>,
) -> Vec<Symbol> {
    let mut seen_handles: BTreeSet<String> = BTreeSet::new();
    let mut symbols = Vec::new();
    for record in index.records() {
        let Some(summary) = &record.summary else {
            continue;
        };
        if summary.kind == FileKind::Ignored {
            continue;
        }
        let canonical = resolver.canonical_name(&record.path);
        let kind = if summary.kind == FileKind::Model
            && config.intermediate_model_paths.contains(&canonical.import_path)
        {
            FileKind::IntermediateModel
        } else {
            summary.kind
        };
        if !seen_handles.insert(canonical.import_path.clone()) {
            warnings.push(Warning::new(
                WarningKind::Resolution,
                format!(
                    "{}: symbol `{}` already defined by another file, skipped",
                    record.path.display(),
                    canonical.import_path
                ),
            ));
            continue;
        }
        symbols.push(Symbol {
            path: record.path.clone(),
            surface: record.surface,
            external: canonical.external || record.origin.is_alias(),
            kind,
            name: canonical.name,
            import_path: canonical.import_path,
            summary: summary.clone(),
            refs: Vec::new(),
            base: None,
        });
    }
    symbols
}

fn resolve_references(
    symbols: &mut Vec<Symbol>,
    index: &SourceIndex,
    resolver: &Resolver,
    warnings: &mut Vec<Warning>,
) {
    let by_path: BTreeMap<PathBuf, (String, FileKind)> = symbols
        .iter()
        .map(|s| (s.path.clone(), (s.import_path.clone(), s.kind)))
        .collect();

    for symbol in symbols.iter_mut() {
        let dir = symbol
            .path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default();

        for mixin in &symbol.summary.mixins {
            let target = resolver
                .resolve_specifier(&dir, &mixin.specifier, index)
                .and_then(|path| by_path.get(&path).cloned());
            match target {
                Some((import_path, kind))
                    if matches!(kind, FileKind::Mixin | FileKind::IntermediateModel) =>
                {
                    symbol.refs.push((import_path, mixin.origin));
                }
                _ if mixin.origin == TraitOrigin::Direct => {
                    warnings.push(Warning::new(
                        WarningKind::Resolution,
                        format!(
                            "{}: mixin reference `{}` ({}) does not resolve to a mixin, omitted",
                            symbol.path.display(),
                            mixin.local,
                            mixin.specifier
                        ),
                    ));
                }
                // Type-only candidates that turn out not to be mixins are
                // ordinary type imports; nothing to report.
                _ => {}
            }
        }

        if let Some(BaseRef::Intermediate { specifier }) = &symbol.summary.base {
            let target = resolver
                .resolve_specifier(&dir, specifier, index)
                .and_then(|path| by_path.get(&path).cloned());
            match target {
                Some((import_path, FileKind::IntermediateModel)) => {
                    symbol.base = Some(import_path);
                }
                _ => warnings.push(Warning::new(
                    WarningKind::Resolution,
                    format!(
                        "{}: intermediate base `{}` does not resolve, treated as legacy base",
                        symbol.path.display(),
                        specifier
                    ),
                )),
            }
        }
    }
}

/// Bridge polymorphic relationships to mixins: a `belongsTo` with
/// `polymorphic: true` whose type name equals a mixin's canonical name
/// connects that mixin even without composition.
fn add_polymorphic_refs(symbols: &mut Vec<Symbol>) {
    let mixin_names: BTreeMap<String, String> = symbols
        .iter()
        .filter(|s| s.kind == FileKind::Mixin)
        .map(|s| (s.name.clone(), s.import_path.clone()))
        .collect();

    for symbol in symbols.iter_mut() {
        let mut extra = Vec::new();
        for field in &symbol.summary.fields {
            if field.kind == FieldKind::BelongsTo && field.options.is_polymorphic() {
                if let Some(import_path) = mixin_names.get(&field.type_name) {
                    extra.push((import_path.clone(), TraitOrigin::Polymorphic));
                }
            }
        }
        symbol.refs.extend(extra);
    }
}

/// Least fixed point of the connectivity rule: a mixin is connected iff it
/// is referenced from a model, an intermediate model, another connected
/// mixin, or a polymorphic relationship.
fn connected_mixins(symbols: &[Symbol]) -> BTreeSet<String> {
    let by_import: BTreeMap<&str, &Symbol> = symbols
        .iter()
        .map(|s| (s.import_path.as_str(), s))
        .collect();

    let mut connected: BTreeSet<String> = BTreeSet::new();
    let mut worklist: Vec<&str> = Vec::new();

    for symbol in symbols {
        if matches!(symbol.kind, FileKind::Model | FileKind::IntermediateModel) {
            for (target, _) in &symbol.refs {
                if let Some(t) = by_import.get(target.as_str()) {
                    if t.kind == FileKind::Mixin && connected.insert(target.clone()) {
                        worklist.push(t.import_path.as_str());
                    }
                }
            }
        }
    }

    while let Some(current) = worklist.pop() {
        let Some(symbol) = by_import.get(current) else {
            continue;
        };
        for (target, _) in &symbol.refs {
            if let Some(t) = by_import.get(target.as_str()) {
                if t.kind == FileKind::Mixin && connected.insert(target.clone()) {
                    worklist.push(t.import_path.as_str());
                }
            }
        }
    }

    connected
}

/// Cycles among mixin→mixin base references are permitted in source; the
/// schedule breaks each at its lexicographically largest edge and drops the
/// corresponding trait reference from that side.
fn break_mixin_cycles(
    symbols: &mut Vec<Symbol>,
    connected: &BTreeSet<String>,
    warnings: &mut Vec<Warning>,
) {
    let mixin_set: BTreeSet<String> = symbols
        .iter()
        .filter(|s| s.kind == FileKind::Mixin && connected.contains(&s.import_path))
        .map(|s| s.import_path.clone())
        .collect();

    let mut adj: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for symbol in symbols.iter() {
        if !mixin_set.contains(&symbol.import_path) {
            continue;
        }
        let targets: Vec<String> = symbol
            .refs
            .iter()
            .filter(|(t, o)| *o == TraitOrigin::Direct && mixin_set.contains(t))
            .map(|(t, _)| t.clone())
            .collect();
        adj.insert(symbol.import_path.clone(), targets);
    }

    let mut dropped: Vec<(String, String)> = Vec::new();
    while let Some(cycle) = find_cycle(&adj) {
        let Some((from, to)) = cycle.into_iter().max() else {
            break;
        };
        warnings.push(Warning::new(
            WarningKind::Cycle,
            format!("mixin cycle broken at edge `{from}` → `{to}`"),
        ));
        if let Some(targets) = adj.get_mut(&from) {
            targets.retain(|t| t != &to);
        }
        dropped.push((from, to));
    }

    for (from, to) in dropped {
        if let Some(symbol) = symbols.iter_mut().find(|s| s.import_path == from) {
            symbol.refs.retain(|(t, o)| {
                !(*o == TraitOrigin::Direct && t == &to)
            });
        }
    }
}

/// Find one cycle in the adjacency map, returned as its edge list.
fn find_cycle(adj: &BTreeMap<String, Vec<String>>) -> Option<Vec<(String, String)>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    fn visit(
        node: &str,
        adj: &BTreeMap<String, Vec<String>>,
        colors: &mut BTreeMap<String, Color>,
        stack: &mut Vec<String>,
    ) -> Option<Vec<(String, String)>> {
        colors.insert(node.to_string(), Color::Gray);
        stack.push(node.to_string());
        for next in adj.get(node).into_iter().flatten() {
            match colors.get(next.as_str()).copied().unwrap_or(Color::White) {
                Color::Gray => {
                    // Reconstruct the cycle from the gray stack.
                    let start = stack.iter().position(|n| n == next).unwrap_or(0);
                    let nodes = &stack[start..];
                    let mut edges: Vec<(String, String)> = nodes
                        .windows(2)
                        .map(|w| (w[0].clone(), w[1].clone()))
                        .collect();
                    edges.push((node.to_string(), next.clone()));
                    return Some(edges);
                }
                Color::White => {
                    if let Some(cycle) = visit(next, adj, colors, stack) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }
        stack.pop();
        colors.insert(node.to_string(), Color::Black);
        None
    }

    let mut colors: BTreeMap<String, Color> = BTreeMap::new();
    for node in adj.keys() {
        if colors.get(node.as_str()).copied().unwrap_or(Color::White) == Color::White {
            let mut stack = Vec::new();
            if let Some(cycle) = visit(node, adj, &mut colors, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adj(edges: &[(&str, &str)]) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (from, to) in edges {
            map.entry(from.to_string())
                .or_default()
                .push(to.to_string());
            map.entry(to.to_string()).or_default();
        }
        map
    }

    #[test]
    fn find_cycle_none_in_dag() {
        let graph = adj(&[("a", "b"), ("b", "c"), ("a", "c")]);
        assert!(find_cycle(&graph).is_none());
    }

    #[test]
    fn find_cycle_reports_edges() {
        let graph = adj(&[("a", "b"), ("b", "a")]);
        let cycle = find_cycle(&graph).unwrap();
        assert_eq!(cycle.len(), 2);
        let max = cycle.into_iter().max().unwrap();
        assert_eq!(max, ("b".to_string(), "a".to_string()));
    }

    #[test]
    fn find_cycle_self_loop() {
        let graph = adj(&[("a", "a")]);
        let cycle = find_cycle(&graph).unwrap();
        assert_eq!(cycle, vec![("a".to_string(), "a".to_string())]);
    }

    #[test]
    fn synthetic_id_shape() {
        let field = synthetic_id_field();
        assert_eq!(field.name, "id");
        assert_eq!(field.kind, FieldKind::Attribute);
        assert_eq!(field.type_name, "string");
        assert!(field.options.is_empty());
    }

    #[test]
    fn layers_order_intermediates_first() {
        assert!(layer(FileKind::IntermediateModel) < layer(FileKind::Mixin));
        assert!(layer(FileKind::Mixin) < layer(FileKind::Model));
    }
}
