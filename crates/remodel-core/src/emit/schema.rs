//! Schema artifact rendering: the runtime descriptor object literal.

use std::fmt::Write;

use crate::classify::{FieldDescriptor, FieldOptions};
use crate::plan::{ArtifactPlan, Materialize};

/// Render the schema artifact for a plan.
///
/// Resources carry `type`/`legacy: true`/`identity`; traits carry
/// `name`/`mode: 'legacy'` and never an identity entry. The output is valid
/// in both surface languages, so the same rendering serves `.ts` and `.js`.
pub fn render(plan: &ArtifactPlan) -> String {
    let mut out = String::new();
    match plan.materialize {
        Materialize::Resource => {
            let _ = writeln!(out, "export const {}Schema = {{", plan.pascal);
            let _ = writeln!(out, "  type: '{}',", plan.name);
            let _ = writeln!(out, "  legacy: true,");
            let _ = writeln!(out, "  identity: {{ kind: '@id', name: 'id' }},");
        }
        Materialize::Trait => {
            let _ = writeln!(out, "export const {}Trait = {{", plan.pascal);
            let _ = writeln!(out, "  name: '{}',", plan.name);
            let _ = writeln!(out, "  mode: 'legacy',");
        }
    }

    if plan.fields.is_empty() {
        let _ = writeln!(out, "  fields: [],");
    } else {
        let _ = writeln!(out, "  fields: [");
        for field in &plan.fields {
            let _ = writeln!(out, "    {},", field_entry(field));
        }
        let _ = writeln!(out, "  ],");
    }

    if !plan.traits.is_empty() {
        let names: Vec<String> = plan.traits.iter().map(|t| format!("'{t}'")).collect();
        let _ = writeln!(out, "  traits: [{}],", names.join(", "));
    }

    if plan.emit_extension && plan.materialize == Materialize::Resource {
        let _ = writeln!(out, "  objectExtensions: ['{}Extension'],", plan.pascal);
    }

    out.push_str("};\n");
    out
}

fn field_entry(field: &FieldDescriptor) -> String {
    let mut entry = format!(
        "{{ name: '{}', kind: '{}', type: '{}'",
        field.name,
        field.kind.schema_name(),
        field.type_name
    );
    if !field.options.is_empty() {
        entry.push_str(&format!(", options: {{ {} }}", options_body(&field.options)));
    }
    entry.push_str(" }");
    entry
}

/// Stable option order: `async`, `inverse`, `polymorphic`, then everything
/// else alphabetically. Values are the author's own literals.
fn options_body(options: &FieldOptions) -> String {
    let mut parts = Vec::new();
    if let Some(value) = &options.r#async {
        parts.push(format!("async: {value}"));
    }
    if let Some(value) = &options.inverse {
        parts.push(format!("inverse: {value}"));
    }
    if let Some(value) = &options.polymorphic {
        parts.push(format!("polymorphic: {value}"));
    }
    let mut rest = options.rest.clone();
    rest.sort_by(|a, b| a.0.cmp(&b.0));
    for (key, value) in rest {
        parts.push(format!("{key}: {value}"));
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{FieldKind, FileKind};
    use crate::index::Surface;
    use crate::resolve::SymbolHandle;

    fn resource_plan(fields: Vec<FieldDescriptor>, traits: Vec<String>) -> ArtifactPlan {
        ArtifactPlan {
            path: "/app/models/user.ts".into(),
            handle: SymbolHandle {
                kind: FileKind::Model,
                import_path: "my-app/models/user".into(),
            },
            name: "user".into(),
            pascal: "User".into(),
            surface: Surface::Typed,
            external: false,
            materialize: Materialize::Resource,
            fields,
            traits,
            base_extension: None,
            residual: Vec::new(),
            emit_extension: false,
        }
    }

    fn field(name: &str, kind: FieldKind, type_name: &str) -> FieldDescriptor {
        FieldDescriptor {
            name: name.into(),
            kind,
            type_name: type_name.into(),
            options: Default::default(),
        }
    }

    #[test]
    fn resource_schema_shape() {
        let out = render(&resource_plan(
            vec![field("name", FieldKind::Attribute, "string")],
            vec![],
        ));
        assert!(out.starts_with("export const UserSchema = {"));
        assert!(out.contains("  type: 'user',"));
        assert!(out.contains("  legacy: true,"));
        assert!(out.contains("  identity: { kind: '@id', name: 'id' },"));
        assert!(out.contains("{ name: 'name', kind: 'attribute', type: 'string' },"));
        assert!(!out.contains("mode:"));
    }

    #[test]
    fn trait_schema_shape() {
        let mut plan = resource_plan(vec![], vec![]);
        plan.materialize = Materialize::Trait;
        plan.name = "auditable".into();
        plan.pascal = "Auditable".into();
        let out = render(&plan);
        assert!(out.starts_with("export const AuditableTrait = {"));
        assert!(out.contains("  name: 'auditable',"));
        assert!(out.contains("  mode: 'legacy',"));
        assert!(!out.contains("identity"));
        assert!(!out.contains("legacy: true"));
    }

    #[test]
    fn options_order_is_stable() {
        let mut f = field("company", FieldKind::BelongsTo, "company");
        f.options.polymorphic = Some("true".into());
        f.options.r#async = Some("false".into());
        f.options.rest.push(("zeta".into(), "1".into()));
        f.options.rest.push(("alpha".into(), "'x'".into()));
        f.options.inverse = Some("null".into());
        let out = render(&resource_plan(vec![f], vec![]));
        assert!(out.contains(
            "options: { async: false, inverse: null, polymorphic: true, alpha: 'x', zeta: 1 }"
        ));
    }

    #[test]
    fn traits_and_extension_arrays() {
        let mut plan = resource_plan(vec![], vec!["auditable".into(), "taggable".into()]);
        plan.emit_extension = true;
        let out = render(&plan);
        assert!(out.contains("  traits: ['auditable', 'taggable'],"));
        assert!(out.contains("  objectExtensions: ['UserExtension'],"));
    }

    #[test]
    fn trait_schema_never_lists_object_extensions() {
        let mut plan = resource_plan(vec![], vec![]);
        plan.materialize = Materialize::Trait;
        plan.emit_extension = true;
        let out = render(&plan);
        assert!(!out.contains("objectExtensions"));
    }
}
