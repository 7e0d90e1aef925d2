//! Extension artifact rendering: the residual behavior lifted out of a
//! model or mixin.
//!
//! The typed surface declaration-merges an interface with a class so
//! `this` inside relocated members sees the migrated shape; the untyped
//! surface reaches the same place with a JSDoc-typed base class. Residual
//! member bodies are relocated as written — the emitter only wraps them in
//! the envelope.

use std::fmt::Write;

use crate::plan::{ArtifactPlan, Materialize};
use crate::resolve::Resolver;

pub fn render(resolver: &Resolver, plan: &ArtifactPlan) -> String {
    let self_types_import = match plan.materialize {
        Materialize::Resource => resolver.resource_types_import(&plan.name),
        Materialize::Trait => resolver.trait_types_import(&plan.name),
    };
    match plan.surface.ext() {
        "ts" => render_typed(resolver, plan, &self_types_import),
        _ => render_untyped(resolver, plan, &self_types_import),
    }
}

fn render_typed(resolver: &Resolver, plan: &ArtifactPlan, self_types_import: &str) -> String {
    let name = &plan.pascal;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "import type {{ {name} }} from '{self_types_import}';"
    );
    if let Some(base) = &plan.base_extension {
        let _ = writeln!(
            out,
            "import {{ {}Extension }} from '{}';",
            crate::names::pascal_case(base),
            resolver.extension_import(base)
        );
    }
    out.push('\n');

    let _ = writeln!(out, "export interface {name}Extension extends {name} {{}}");
    let head = match &plan.base_extension {
        Some(base) => format!(
            "export class {name}Extension extends {}Extension {{",
            crate::names::pascal_case(base)
        ),
        None => format!("export class {name}Extension {{"),
    };
    if plan.residual.is_empty() {
        let _ = writeln!(out, "{head}}}");
    } else {
        let _ = writeln!(out, "{head}");
        write_members(&mut out, plan);
        out.push_str("}\n");
    }
    let _ = writeln!(
        out,
        "export type {name}ExtensionSignature = typeof {name}Extension;"
    );
    out
}

fn render_untyped(resolver: &Resolver, plan: &ArtifactPlan, self_types_import: &str) -> String {
    let name = &plan.pascal;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "/** @typedef {{import('{self_types_import}').{name}}} {name} */"
    );
    out.push('\n');
    if let Some(base) = &plan.base_extension {
        let base_name = crate::names::pascal_case(base);
        let _ = writeln!(
            out,
            "import {{ {base_name}Extension }} from '{}';",
            resolver.extension_import(base)
        );
        out.push('\n');
        let _ = writeln!(out, "/** @type {{{{ new(): {name} }}}} */");
        let _ = writeln!(out, "const Base = {base_name}Extension;");
    } else {
        let _ = writeln!(out, "/** @type {{{{ new(): {name} }}}} */");
        let _ = writeln!(out, "const Base = class {{}};");
    }
    out.push('\n');

    if plan.residual.is_empty() {
        let _ = writeln!(out, "export class {name}Extension extends Base {{}}");
    } else {
        let _ = writeln!(out, "export class {name}Extension extends Base {{");
        write_members(&mut out, plan);
        out.push_str("}\n");
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "/** @typedef {{typeof {name}Extension}} {name}ExtensionSignature */"
    );
    out
}

/// Relocate each residual member at class-body indentation, blank lines
/// between members.
fn write_members(out: &mut String, plan: &ArtifactPlan) {
    for (i, member) in plan.residual.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for line in member.text.lines() {
            if line.trim().is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, "  {line}");
            }
        }
    }
}
