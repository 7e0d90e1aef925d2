//! C2 — the classifier.
//!
//! Walks the top of a file's syntax tree once and produces a structural
//! summary: is this a model, a mixin, or neither, and what fields, mixin
//! references, and residual members does it carry. Decorators are treated as
//! pattern matches over the tree, never as language semantics.
//!
//! Trees are parsed inside a per-file allocator scope; everything returned
//! from here is owned. All sources are parsed with the TypeScript grammar so
//! decorators in `.js` inputs survive — the surface language of the file is
//! tracked separately by the index.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast as js;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};

use crate::error::{Warning, WarningKind};

/// Import source of the legacy mixin constructor.
pub const MIXIN_IMPORT_SOURCE: &str = "@ember/object/mixin";

/// Classification outcome for one file.
///
/// `IntermediateModel` is never produced here: the classifier reports the
/// structural kind and the engine upgrades models whose canonical import
/// path is configured as intermediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Model,
    IntermediateModel,
    Mixin,
    Ignored,
}

/// Field category, matching the legacy decorator names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Attribute,
    BelongsTo,
    HasMany,
}

impl FieldKind {
    fn from_decorator(name: &str) -> Option<Self> {
        match name {
            "attr" => Some(FieldKind::Attribute),
            "belongsTo" => Some(FieldKind::BelongsTo),
            "hasMany" => Some(FieldKind::HasMany),
            _ => None,
        }
    }

    /// The `kind` string used in schema artifacts.
    pub fn schema_name(self) -> &'static str {
        match self {
            FieldKind::Attribute => "attribute",
            FieldKind::BelongsTo => "belongsTo",
            FieldKind::HasMany => "hasMany",
        }
    }
}

/// Recognized and pass-through field options. Values are kept as raw source
/// text so emission reproduces the author's literals exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOptions {
    pub r#async: Option<String>,
    pub inverse: Option<String>,
    pub polymorphic: Option<String>,
    /// Unrecognized keys in source order; the emitter sorts them.
    pub rest: Vec<(String, String)>,
}

impl FieldOptions {
    pub fn is_empty(&self) -> bool {
        self.r#async.is_none()
            && self.inverse.is_none()
            && self.polymorphic.is_none()
            && self.rest.is_empty()
    }

    /// The legacy framework defaults relationships to async when the option
    /// is absent.
    pub fn is_async(&self) -> bool {
        self.r#async.as_deref() != Some("false")
    }

    pub fn is_polymorphic(&self) -> bool {
        self.polymorphic.as_deref() == Some("true")
    }
}

/// The semantic content of a single declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub type_name: String,
    pub options: FieldOptions,
}

/// A class-body (or mixin-body) member that is not a recognized field
/// declaration, preserved for relocation to the extension artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidualMember {
    pub name: String,
    /// Verbatim source, comments and decorators included, common
    /// indentation stripped.
    pub text: String,
}

/// How a mixin reference reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraitOrigin {
    /// Mentioned in a base-mixing expression (`.extend(...)` argument or a
    /// `createWithMixins` base).
    Direct,
    /// A type-only import of the mixin in a model file.
    TypeOnly,
    /// Connected via a polymorphic `belongsTo` relationship whose type name
    /// matches the mixin's canonical name.
    Polymorphic,
}

/// The mention of a (potential) mixin by one of its consumers. The planner
/// resolves the specifier and keeps only references that land on mixins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixinRef {
    pub local: String,
    pub specifier: String,
    pub origin: TraitOrigin,
}

/// What the extends clause bottomed out at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseRef {
    /// The legacy `Model` default import.
    LegacyModel,
    /// A configured intermediate model, by import specifier.
    Intermediate { specifier: String },
}

/// How an imported name was bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Default,
    Named(String),
    Namespace,
}

/// One local binding introduced by an import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub local: String,
    pub imported: ImportedName,
    pub source: String,
    pub type_only: bool,
}

/// The structural summary the classifier hands downstream.
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub kind: FileKind,
    pub default_export: Option<String>,
    pub fields: Vec<FieldDescriptor>,
    pub residual: Vec<ResidualMember>,
    /// Direct references in source order, then type-only candidates.
    pub mixins: Vec<MixinRef>,
    pub base: Option<BaseRef>,
}

impl FileSummary {
    fn ignored() -> Self {
        Self {
            kind: FileKind::Ignored,
            default_export: None,
            fields: Vec::new(),
            residual: Vec::new(),
            mixins: Vec::new(),
            base: None,
        }
    }
}

/// Lookup service the classifier uses to interpret extends-clause
/// identifiers. Implemented over the resolver + config by the engine.
pub trait BaseLookup {
    /// Whether `specifier`, imported from the file at `importer`, names a
    /// configured intermediate model.
    fn is_intermediate(&self, importer: &Path, specifier: &str) -> bool;
}

/// A lookup that knows no intermediate models (useful in tests and for
/// mixin-only trees).
pub struct NoIntermediates;

impl BaseLookup for NoIntermediates {
    fn is_intermediate(&self, _importer: &Path, _specifier: &str) -> bool {
        false
    }
}

/// Classify one file. Returns `None` on a parse failure (the caller drops
/// the record from the index); otherwise always returns a summary, falling
/// back to `Ignored` for content matching neither template.
pub fn classify_file(
    path: &Path,
    text: &str,
    legacy_source: &str,
    lookup: &dyn BaseLookup,
    warnings: &mut Vec<Warning>,
) -> Option<FileSummary> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, text, SourceType::ts()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        warnings.push(Warning::new(
            WarningKind::Parse,
            format!("{}: syntax error, file dropped", path.display()),
        ));
        return None;
    }
    let program = ret.program;

    let mut comment_spans: Vec<Span> = program.comments.iter().map(|c| c.span).collect();
    comment_spans.sort_by_key(|s| s.start);

    let mut ctx = Ctx {
        path,
        text,
        legacy_source,
        imports: collect_imports(&program),
        comment_spans,
        warnings,
    };

    for stmt in &program.body {
        if let js::Statement::ExportDefaultDeclaration(decl) = stmt {
            return Some(ctx.classify_default_export(&decl.declaration, lookup));
        }
    }
    Some(FileSummary::ignored())
}

fn collect_imports(program: &js::Program) -> Vec<ImportBinding> {
    let mut imports = Vec::new();
    for stmt in &program.body {
        let js::Statement::ImportDeclaration(decl) = stmt else {
            continue;
        };
        let source = decl.source.value.to_string();
        let decl_type_only = decl.import_kind.is_type();
        for spec in decl.specifiers.iter().flatten() {
            match spec {
                js::ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    imports.push(ImportBinding {
                        local: s.local.name.to_string(),
                        imported: ImportedName::Default,
                        source: source.clone(),
                        type_only: decl_type_only,
                    });
                }
                js::ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    let imported = match &s.imported {
                        js::ModuleExportName::IdentifierName(id) => id.name.to_string(),
                        js::ModuleExportName::IdentifierReference(id) => id.name.to_string(),
                        js::ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
                    };
                    imports.push(ImportBinding {
                        local: s.local.name.to_string(),
                        imported: ImportedName::Named(imported),
                        source: source.clone(),
                        type_only: decl_type_only || s.import_kind.is_type(),
                    });
                }
                js::ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                    imports.push(ImportBinding {
                        local: s.local.name.to_string(),
                        imported: ImportedName::Namespace,
                        source: source.clone(),
                        type_only: decl_type_only,
                    });
                }
            }
        }
    }
    imports
}

struct Ctx<'a> {
    path: &'a Path,
    text: &'a str,
    legacy_source: &'a str,
    imports: Vec<ImportBinding>,
    comment_spans: Vec<Span>,
    warnings: &'a mut Vec<Warning>,
}

impl<'a> Ctx<'a> {
    fn warn(&mut self, message: String) {
        self.warnings
            .push(Warning::new(WarningKind::Classify, message));
    }

    fn binding(&self, local: &str) -> Option<&ImportBinding> {
        self.imports.iter().find(|b| b.local == local)
    }

    /// Resolve an identifier through the imports to a legacy field decorator.
    fn field_kind_of(&self, local: &str) -> Option<FieldKind> {
        let binding = self.binding(local)?;
        if binding.source != self.legacy_source {
            return None;
        }
        match &binding.imported {
            ImportedName::Named(name) => FieldKind::from_decorator(name),
            _ => None,
        }
    }

    fn slice(&self, span: Span) -> &'a str {
        &self.text[span.start as usize..span.end as usize]
    }

    // ── Default export dispatch ────────────────────────────────────────

    fn classify_default_export(
        &mut self,
        decl: &js::ExportDefaultDeclarationKind,
        lookup: &dyn BaseLookup,
    ) -> FileSummary {
        if let js::ExportDefaultDeclarationKind::ClassDeclaration(class) = decl {
            return self.classify_class(class, lookup);
        }
        if let Some(js::Expression::CallExpression(call)) = decl.as_expression() {
            return self.classify_mixin_call(call);
        }
        FileSummary::ignored()
    }

    // ── Model classification ───────────────────────────────────────────

    fn classify_class(&mut self, class: &js::Class, lookup: &dyn BaseLookup) -> FileSummary {
        let Some(super_class) = &class.super_class else {
            return FileSummary::ignored();
        };
        let Some((base, mut mixins)) = self.analyze_super(super_class, lookup) else {
            return FileSummary::ignored();
        };

        let mut fields: Vec<FieldDescriptor> = Vec::new();
        let mut residual: Vec<ResidualMember> = Vec::new();

        for element in &class.body.body {
            match element {
                js::ClassElement::PropertyDefinition(p) => {
                    let start = p
                        .decorators
                        .iter()
                        .map(|d| d.span.start)
                        .min()
                        .unwrap_or(p.span.start)
                        .min(p.span.start);
                    match self.try_class_field(p) {
                        Some(field) => {
                            if fields.iter().any(|f| f.name == field.name) {
                                self.warn(format!(
                                    "{}: duplicate field `{}`, first declaration kept",
                                    self.path.display(),
                                    field.name
                                ));
                            } else {
                                fields.push(field);
                            }
                        }
                        None => {
                            residual.push(self.residual_member(
                                self.property_key_text(&p.key),
                                start,
                                p.span.end,
                            ));
                        }
                    }
                }
                js::ClassElement::MethodDefinition(m) => {
                    let start = m
                        .decorators
                        .iter()
                        .map(|d| d.span.start)
                        .min()
                        .unwrap_or(m.span.start)
                        .min(m.span.start);
                    residual.push(self.residual_member(
                        self.property_key_text(&m.key),
                        start,
                        m.span.end,
                    ));
                }
                js::ClassElement::AccessorProperty(a) => {
                    let span = a.span();
                    residual.push(self.residual_member(
                        self.property_key_text(&a.key),
                        span.start,
                        span.end,
                    ));
                }
                js::ClassElement::StaticBlock(b) => {
                    let span = b.span();
                    residual.push(self.residual_member(
                        "static".to_string(),
                        span.start,
                        span.end,
                    ));
                }
                js::ClassElement::TSIndexSignature(sig) => {
                    let span = sig.span();
                    residual.push(self.residual_member(
                        "[index]".to_string(),
                        span.start,
                        span.end,
                    ));
                }
            }
        }

        self.warn_field_shadows(&fields, &residual);
        self.push_type_only_refs(&mut mixins);

        FileSummary {
            kind: FileKind::Model,
            default_export: class.id.as_ref().map(|id| id.name.to_string()),
            fields,
            residual,
            mixins: dedup_mixins(mixins),
            base: Some(base),
        }
    }

    /// Unwrap `Base.extend(A, B).extend(C)` chains down to the base
    /// identifier. Returns `None` when the shape is not a model extends
    /// clause; mixin arguments come back in source order.
    fn analyze_super(
        &mut self,
        expr: &js::Expression,
        lookup: &dyn BaseLookup,
    ) -> Option<(BaseRef, Vec<MixinRef>)> {
        let mut levels: Vec<Vec<MixinRef>> = Vec::new();
        let mut current = expr;
        loop {
            match current {
                js::Expression::CallExpression(call) => {
                    let js::Expression::StaticMemberExpression(member) = &call.callee else {
                        return None;
                    };
                    if member.property.name != "extend" {
                        return None;
                    }
                    levels.push(self.extend_args_to_refs(call));
                    current = &member.object;
                }
                js::Expression::Identifier(ident) => {
                    let base = self.base_from_ident(&ident.name, lookup)?;
                    let mixins = levels.into_iter().rev().flatten().collect();
                    return Some((base, mixins));
                }
                _ => return None,
            }
        }
    }

    fn base_from_ident(&mut self, name: &str, lookup: &dyn BaseLookup) -> Option<BaseRef> {
        let binding = self.binding(name)?;
        if binding.type_only {
            return None;
        }
        if binding.imported == ImportedName::Default && binding.source == self.legacy_source {
            return Some(BaseRef::LegacyModel);
        }
        let importer = self.path;
        let specifier = binding.source.clone();
        if lookup.is_intermediate(importer, &specifier) {
            return Some(BaseRef::Intermediate { specifier });
        }
        None
    }

    fn extend_args_to_refs(&mut self, call: &js::CallExpression) -> Vec<MixinRef> {
        let mut refs = Vec::new();
        for arg in &call.arguments {
            match arg.as_expression() {
                Some(js::Expression::Identifier(ident)) => {
                    let name = ident.name.to_string();
                    match self.binding(&name) {
                        Some(binding) if !binding.type_only => refs.push(MixinRef {
                            local: name,
                            specifier: binding.source.clone(),
                            origin: TraitOrigin::Direct,
                        }),
                        _ => self.warn(format!(
                            "{}: `{}` in extends expression is not an imported mixin, skipped",
                            self.path.display(),
                            name
                        )),
                    }
                }
                _ => self.warn(format!(
                    "{}: non-identifier argument in extends expression, skipped",
                    self.path.display()
                )),
            }
        }
        refs
    }

    /// Type-only default imports become trait-reference candidates: the
    /// mixin is connected through the model's type signature even when
    /// runtime composition happens elsewhere.
    fn push_type_only_refs(&self, mixins: &mut Vec<MixinRef>) {
        for binding in &self.imports {
            if binding.type_only && binding.imported == ImportedName::Default {
                mixins.push(MixinRef {
                    local: binding.local.clone(),
                    specifier: binding.source.clone(),
                    origin: TraitOrigin::TypeOnly,
                });
            }
        }
    }

    /// Try to read a class property as a field declaration. `None` means
    /// "keep as residual" (a warning has been pushed when appropriate).
    fn try_class_field(&mut self, p: &js::PropertyDefinition) -> Option<FieldDescriptor> {
        let mut recognized: Option<(FieldKind, Option<&js::CallExpression>)> = None;
        for decorator in &p.decorators {
            match &decorator.expression {
                js::Expression::CallExpression(call) => {
                    if let js::Expression::Identifier(ident) = &call.callee {
                        if let Some(kind) = self.field_kind_of(&ident.name) {
                            recognized = Some((kind, Some(&**call)));
                            break;
                        }
                    }
                }
                js::Expression::Identifier(ident) => {
                    if let Some(kind) = self.field_kind_of(&ident.name) {
                        recognized = Some((kind, None));
                        break;
                    }
                }
                _ => {}
            }
        }
        let (kind, call) = recognized?;
        let name = self.static_property_key(&p.key)?;
        let Some(call) = call else {
            self.warn(format!(
                "{}: `{}` uses a field decorator without a type argument, kept as residual member",
                self.path.display(),
                name
            ));
            return None;
        };
        self.field_from_call(&name, kind, call)
    }

    /// Shared argument handling for `@attr('string', {...})` decorators and
    /// `attr('string', {...})` mixin property calls.
    fn field_from_call(
        &mut self,
        name: &str,
        kind: FieldKind,
        call: &js::CallExpression,
    ) -> Option<FieldDescriptor> {
        let first = call.arguments.first().and_then(|a| a.as_expression());
        let Some(js::Expression::StringLiteral(type_name)) = first else {
            self.warn(format!(
                "{}: `{}` has a non-string type argument, kept as residual member",
                self.path.display(),
                name
            ));
            return None;
        };
        let options = match call.arguments.get(1).map(|a| a.as_expression()) {
            None => FieldOptions::default(),
            Some(Some(js::Expression::ObjectExpression(obj))) => self.parse_options(name, obj),
            Some(_) => {
                self.warn(format!(
                    "{}: `{}` has a non-object options argument, kept as residual member",
                    self.path.display(),
                    name
                ));
                return None;
            }
        };
        if call.arguments.len() > 2 {
            self.warn(format!(
                "{}: `{}` has extra field arguments, ignored",
                self.path.display(),
                name
            ));
        }
        Some(FieldDescriptor {
            name: name.to_string(),
            kind,
            type_name: type_name.value.to_string(),
            options,
        })
    }

    fn parse_options(&mut self, field: &str, obj: &js::ObjectExpression) -> FieldOptions {
        let mut options = FieldOptions::default();
        for prop in &obj.properties {
            let js::ObjectPropertyKind::ObjectProperty(p) = prop else {
                self.warn(format!(
                    "{}: spread in options of `{}`, ignored",
                    self.path.display(),
                    field
                ));
                continue;
            };
            if !matches!(p.kind, js::PropertyKind::Init) || p.computed {
                self.warn(format!(
                    "{}: non-literal option key in `{}`, ignored",
                    self.path.display(),
                    field
                ));
                continue;
            }
            let Some(key) = self.static_property_key(&p.key) else {
                continue;
            };
            let value = self.slice(p.value.span()).to_string();
            match key.as_str() {
                "async" => options.r#async = Some(value),
                "inverse" => options.inverse = Some(value),
                "polymorphic" => options.polymorphic = Some(value),
                _ => options.rest.push((key, value)),
            }
        }
        options
    }

    // ── Mixin classification ───────────────────────────────────────────

    fn classify_mixin_call(&mut self, call: &js::CallExpression) -> FileSummary {
        let js::Expression::StaticMemberExpression(member) = &call.callee else {
            return FileSummary::ignored();
        };
        let method = member.property.name.as_str();
        if method != "create" && method != "createWithMixins" {
            return FileSummary::ignored();
        }
        let js::Expression::Identifier(ctor) = &member.object else {
            return FileSummary::ignored();
        };
        match self.binding(&ctor.name) {
            Some(binding)
                if binding.imported == ImportedName::Default
                    && binding.source == MIXIN_IMPORT_SOURCE => {}
            _ => return FileSummary::ignored(),
        }

        let mut bases: Vec<MixinRef> = Vec::new();
        let mut body: Option<&js::ObjectExpression> = None;
        for arg in &call.arguments {
            match arg.as_expression() {
                Some(js::Expression::Identifier(ident)) => {
                    let name = ident.name.to_string();
                    match self.binding(&name) {
                        Some(binding) if !binding.type_only => bases.push(MixinRef {
                            local: name,
                            specifier: binding.source.clone(),
                            origin: TraitOrigin::Direct,
                        }),
                        _ => self.warn(format!(
                            "{}: mixin base `{}` is not an imported mixin, skipped",
                            self.path.display(),
                            name
                        )),
                    }
                }
                Some(js::Expression::ObjectExpression(obj)) => body = Some(obj),
                _ => self.warn(format!(
                    "{}: unsupported mixin argument shape, skipped",
                    self.path.display()
                )),
            }
        }

        let mut fields: Vec<FieldDescriptor> = Vec::new();
        let mut residual: Vec<ResidualMember> = Vec::new();
        if let Some(body) = body {
            self.mixin_body(body, &mut fields, &mut residual);
        }
        self.warn_field_shadows(&fields, &residual);

        FileSummary {
            kind: FileKind::Mixin,
            default_export: None,
            fields,
            residual,
            mixins: dedup_mixins(bases),
            base: None,
        }
    }

    fn mixin_body(
        &mut self,
        body: &js::ObjectExpression,
        fields: &mut Vec<FieldDescriptor>,
        residual: &mut Vec<ResidualMember>,
    ) {
        for prop in &body.properties {
            let js::ObjectPropertyKind::ObjectProperty(p) = prop else {
                let span = prop.span();
                residual.push(self.residual_member(
                    "...".to_string(),
                    span.start,
                    span.end,
                ));
                continue;
            };
            let name = self.property_key_text(&p.key);

            // Field-shaped property: `name: attr('string', {...})`.
            if matches!(p.kind, js::PropertyKind::Init) && !p.method {
                if let js::Expression::CallExpression(call) = &p.value {
                    if let js::Expression::Identifier(callee) = &call.callee {
                        if let Some(kind) = self.field_kind_of(&callee.name) {
                            match self.field_from_call(&name, kind, call) {
                                Some(field) => {
                                    if fields.iter().any(|f| f.name == field.name) {
                                        self.warn(format!(
                                            "{}: duplicate field `{}`, first declaration kept",
                                            self.path.display(),
                                            field.name
                                        ));
                                    } else {
                                        fields.push(field);
                                    }
                                }
                                None => {
                                    let span = p.span();
                                    residual.push(
                                        self.residual_member(name, span.start, span.end),
                                    );
                                }
                            }
                            continue;
                        }
                    }
                }
            }

            // Methods, getters, and setters relocate verbatim; plain
            // `key: value` properties normalize to class initializer form.
            let span = p.span();
            if p.method || !matches!(p.kind, js::PropertyKind::Init) {
                residual.push(self.residual_member(name, span.start, span.end));
            } else {
                let value = reindent_tail(self.slice(p.value.span()));
                let text = format!("{name} = {value};");
                residual.push(ResidualMember { name, text });
            }
        }
    }

    // ── Shared extraction helpers ──────────────────────────────────────

    fn warn_field_shadows(&mut self, fields: &[FieldDescriptor], residual: &[ResidualMember]) {
        for member in residual {
            if fields.iter().any(|f| f.name == member.name) {
                self.warn(format!(
                    "{}: residual member `{}` shadows a schema field of the same name",
                    self.path.display(),
                    member.name
                ));
            }
        }
    }

    fn static_property_key(&self, key: &js::PropertyKey) -> Option<String> {
        match key {
            js::PropertyKey::StaticIdentifier(id) => Some(id.name.to_string()),
            js::PropertyKey::StringLiteral(lit) => Some(lit.value.to_string()),
            _ => None,
        }
    }

    fn property_key_text(&self, key: &js::PropertyKey) -> String {
        self.static_property_key(key)
            .unwrap_or_else(|| self.slice(key.span()).to_string())
    }

    /// Capture a member verbatim: preceding attached comments, the member
    /// itself, common indentation stripped.
    fn residual_member(&self, name: String, start: u32, end: u32) -> ResidualMember {
        let start = self.extend_over_comments(start);
        let start = line_start_if_blank_prefix(self.text, start);
        let text = dedent(&self.text[start as usize..end as usize]);
        ResidualMember { name, text }
    }

    /// Walk backwards over comments separated from `start` by whitespace
    /// containing at most one newline, so attached doc comments relocate
    /// with their member but detached banners stay behind.
    fn extend_over_comments(&self, mut start: u32) -> u32 {
        loop {
            let mut extended = false;
            for span in self.comment_spans.iter().rev() {
                if span.end > start {
                    continue;
                }
                let gap = &self.text[span.end as usize..start as usize];
                if gap.trim().is_empty() && gap.matches('\n').count() <= 1 {
                    start = span.start;
                    extended = true;
                }
                break;
            }
            if !extended {
                return start;
            }
        }
    }
}

fn dedup_mixins(mixins: Vec<MixinRef>) -> Vec<MixinRef> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for m in mixins {
        if seen.contains(&m.specifier) {
            continue;
        }
        seen.push(m.specifier.clone());
        out.push(m);
    }
    out
}

/// If only whitespace precedes `pos` on its line, back up to the line start
/// so the first captured line carries its indentation into dedenting.
fn line_start_if_blank_prefix(text: &str, pos: u32) -> u32 {
    let bytes = text.as_bytes();
    let mut i = pos as usize;
    while i > 0 && bytes[i - 1] != b'\n' {
        if !bytes[i - 1].is_ascii_whitespace() {
            return pos;
        }
        i -= 1;
    }
    i as u32
}

/// Strip the common leading whitespace of all non-empty lines.
pub fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if line.len() >= indent {
            out.push_str(&line[indent..]);
        } else {
            out.push_str(line.trim_start());
        }
    }
    out
}

/// Dedent every line after the first, preserving relative indentation —
/// used when a value expression is re-homed into a new first line.
fn reindent_tail(text: &str) -> String {
    let mut lines = text.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };
    let rest: Vec<&str> = lines.collect();
    if rest.is_empty() {
        return first.to_string();
    }
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out = String::from(first);
    for line in rest {
        out.push('\n');
        if line.len() >= indent {
            out.push_str(&line[indent..]);
        } else {
            out.push_str(line.trim_start());
        }
    }
    out
}
