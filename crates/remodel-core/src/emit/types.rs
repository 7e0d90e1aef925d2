//! Types artifact rendering: the compile-time shape of a migrated symbol.
//!
//! Always TypeScript regardless of the origin surface. The interface
//! extends each referenced trait, then the extension signature when one is
//! emitted; the body carries one `readonly` member per field plus the
//! `[Type]` brand for resources.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::classify::{FieldKind, FieldOptions};
use crate::config::Normalized;
use crate::error::{Warning, WarningKind};
use crate::names::pascal_case;
use crate::plan::{ArtifactPlan, Materialize, TargetMap};
use crate::resolve::Resolver;

pub fn render(
    config: &Normalized,
    resolver: &Resolver,
    targets: &TargetMap,
    plan: &ArtifactPlan,
    warnings: &mut Vec<Warning>,
) -> String {
    let mut type_imports: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut helpers: BTreeSet<&'static str> = BTreeSet::new();

    // Pre-resolve relationship targets so imports are known before the body
    // is written.
    let mut field_types: Vec<String> = Vec::new();
    for field in &plan.fields {
        let rendered = match field.kind {
            FieldKind::Attribute => {
                format!("{} | null", attribute_ts_type(&field.type_name, config))
            }
            FieldKind::BelongsTo => {
                let target = target_type(
                    &field.type_name,
                    plan,
                    resolver,
                    targets,
                    &mut type_imports,
                    warnings,
                );
                format!("{target} | null")
            }
            FieldKind::HasMany => {
                let target = target_type(
                    &field.type_name,
                    plan,
                    resolver,
                    targets,
                    &mut type_imports,
                    warnings,
                );
                let helper = has_many_helper(&field.options);
                helpers.insert(helper);
                format!("{helper}<{target}>")
            }
        };
        field_types.push(rendered);
    }

    let mut extends: Vec<String> = Vec::new();
    for trait_name in &plan.traits {
        let pascal = pascal_case(trait_name);
        type_imports
            .entry(resolver.trait_types_import(trait_name))
            .or_default()
            .insert(pascal.clone());
        extends.push(pascal);
    }
    if plan.emit_extension {
        let signature = format!("{}ExtensionSignature", plan.pascal);
        type_imports
            .entry(resolver.extension_import(&plan.name))
            .or_default()
            .insert(signature.clone());
        extends.push(signature);
    }

    // Import grouping, stable: the `Type` brand value import, the legacy
    // relationship helpers, then every type import sorted by specifier.
    let mut out = String::new();
    let is_resource = plan.materialize == Materialize::Resource;
    if is_resource {
        let _ = writeln!(
            out,
            "import {{ Type }} from '{}';",
            config.type_brand_import()
        );
    }
    if !helpers.is_empty() {
        let names: Vec<&str> = helpers.iter().copied().collect();
        let _ = writeln!(
            out,
            "import type {{ {} }} from '{}';",
            names.join(", "),
            config.legacy_source
        );
    }
    for (specifier, names) in &type_imports {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let _ = writeln!(
            out,
            "import type {{ {} }} from '{}';",
            names.join(", "),
            specifier
        );
    }
    if !out.is_empty() {
        out.push('\n');
    }

    if extends.is_empty() {
        let _ = writeln!(out, "export interface {} {{", plan.pascal);
    } else {
        let _ = writeln!(
            out,
            "export interface {} extends {} {{",
            plan.pascal,
            extends.join(", ")
        );
    }
    for (field, rendered) in plan.fields.iter().zip(&field_types) {
        let _ = writeln!(out, "  readonly {}: {};", field.name, rendered);
    }
    if is_resource {
        let _ = writeln!(out, "  readonly [Type]: '{}';", plan.name);
    }
    out.push_str("}\n");
    out
}

/// The async flag changes only the `hasMany` helper; `belongsTo` keeps the
/// same TypeScript shape either way.
fn has_many_helper(options: &FieldOptions) -> &'static str {
    if options.is_async() {
        "AsyncHasMany"
    } else {
        "HasMany"
    }
}

fn attribute_ts_type(type_name: &str, config: &Normalized) -> String {
    match type_name {
        "string" => "string".to_string(),
        "number" => "number".to_string(),
        "boolean" => "boolean".to_string(),
        "date" => "Date".to_string(),
        other => config
            .type_mapping
            .get(other)
            .cloned()
            .unwrap_or_else(|| pascal_case(other)),
    }
}

/// Resolve a relationship target to its post-migration interface, recording
/// the import it needs. Traits win over resources when both match; an
/// unmaterialized target renders as `unknown` with a resolution warning and
/// no import, so emitted specifiers only ever point at artifacts this
/// migration produces.
fn target_type(
    type_name: &str,
    plan: &ArtifactPlan,
    resolver: &Resolver,
    targets: &TargetMap,
    type_imports: &mut BTreeMap<String, BTreeSet<String>>,
    warnings: &mut Vec<Warning>,
) -> String {
    let pascal = pascal_case(type_name);
    if type_name == plan.name {
        return pascal;
    }
    match targets.get(type_name) {
        Some(Materialize::Trait) => {
            type_imports
                .entry(resolver.trait_types_import(type_name))
                .or_default()
                .insert(pascal.clone());
            pascal
        }
        Some(Materialize::Resource) => {
            type_imports
                .entry(resolver.resource_types_import(type_name))
                .or_default()
                .insert(pascal.clone());
            pascal
        }
        None => {
            warnings.push(Warning::new(
                WarningKind::Resolution,
                format!(
                    "{}: relationship target `{}` has no migrated symbol, typed as unknown",
                    plan.handle.import_path, type_name
                ),
            ));
            "unknown".to_string()
        }
    }
}
