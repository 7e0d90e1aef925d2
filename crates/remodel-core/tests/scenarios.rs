//! End-to-end scenarios: full pipeline runs over synthetic project trees.

use std::fs;
use std::path::Path;

use remodel_core::config::SourcePair;
use remodel_core::engine::CancelFlag;
use remodel_core::{Config, RunReport, WarningKind};

fn base_config() -> Config {
    Config {
        resources_import: Some("my-app/data/resources".into()),
        traits_import: Some("my-app/data/traits".into()),
        extensions_import: Some("my-app/data/extensions".into()),
        model_import_source: Some("my-app/models".into()),
        mixin_import_source: Some("my-app/mixins".into()),
        ..Config::default()
    }
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel))
        .unwrap_or_else(|e| panic!("failed to read {rel}: {e}"))
}

fn run(root: &Path, config: Config) -> RunReport {
    remodel_core::run_in(config, root, &CancelFlag::new()).expect("run failed")
}

const USER_MODEL: &str = r#"import Model, { attr, belongsTo } from '@ember-data/model';

export default class User extends Model {
  @attr('string') name;
  @attr('string') email;
  @belongsTo('company', { async: false }) company;

  get displayName() {
    return this.name;
  }
}
"#;

#[test]
fn s1_minimal_model() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "app/models/user.ts", USER_MODEL);
    write(
        root,
        "app/models/company.ts",
        "import Model, { attr } from '@ember-data/model';\n\nexport default class Company extends Model {\n  @attr('string') name;\n}\n",
    );

    let report = run(root, base_config());
    assert_eq!(report.models, 2);
    assert_eq!(report.plans.len(), 2);

    let schema = read(root, "app/data/resources/user.schema.ts");
    assert_eq!(
        schema,
        "export const UserSchema = {
  type: 'user',
  legacy: true,
  identity: { kind: '@id', name: 'id' },
  fields: [
    { name: 'name', kind: 'attribute', type: 'string' },
    { name: 'email', kind: 'attribute', type: 'string' },
    { name: 'company', kind: 'belongsTo', type: 'company', options: { async: false } },
  ],
  objectExtensions: ['UserExtension'],
};
"
    );

    let types = read(root, "app/data/resources/user.schema.types.ts");
    assert!(types.contains("import { Type } from '@ember-data/core-types/symbols';"));
    assert!(types.contains(
        "import type { Company } from 'my-app/data/resources/company.schema.types';"
    ));
    assert!(types.contains(
        "import type { UserExtensionSignature } from 'my-app/data/extensions/user';"
    ));
    assert!(types.contains("export interface User extends UserExtensionSignature {"));
    assert!(types.contains("  readonly name: string | null;"));
    assert!(types.contains("  readonly email: string | null;"));
    assert!(types.contains("  readonly company: Company | null;"));
    assert!(types.contains("  readonly [Type]: 'user';"));

    let extension = read(root, "app/data/extensions/user.ts");
    assert!(extension.contains("export interface UserExtension extends User {}"));
    assert!(extension.contains("export class UserExtension {"));
    assert!(extension.contains("  get displayName() {"));
    assert!(extension.contains("    return this.name;"));
    assert!(extension.contains("export type UserExtensionSignature = typeof UserExtension;"));

    // Company has no residual members: no extension artifact, no
    // objectExtensions entry.
    assert!(!root.join("app/data/extensions/company.ts").exists());
    assert!(!read(root, "app/data/resources/company.schema.ts").contains("objectExtensions"));
}

#[test]
fn s2_disconnected_mixin_is_not_emitted() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "app/mixins/unused.ts",
        "import Mixin from '@ember/object/mixin';\n\nexport default Mixin.create({\n  commonMethod() {\n    return 1;\n  },\n});\n",
    );

    let report = run(root, base_config());
    assert_eq!(report.mixins, 1);
    assert!(report.plans.is_empty());
    // Directories are created lazily; an empty traits/ is never produced.
    assert!(!root.join("app/data/traits").exists());
    assert!(!root.join("app/data").exists());
}

#[test]
fn s3_mixed_surface_language() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "app/models/js-model.js",
        "import Model, { attr } from '@ember-data/model';\n\nexport default class JsModel extends Model {\n  @attr('string') name;\n}\n",
    );
    write(
        root,
        "app/models/ts-model.ts",
        "import Model, { attr } from '@ember-data/model';\n\nexport default class TsModel extends Model {\n  @attr('string') name;\n}\n",
    );

    run(root, base_config());
    assert!(root.join("app/data/resources/js-model.schema.js").exists());
    assert!(root.join("app/data/resources/ts-model.schema.ts").exists());
    // Types artifacts are always TypeScript.
    assert!(root.join("app/data/resources/js-model.schema.types.ts").exists());
    assert!(root.join("app/data/resources/ts-model.schema.types.ts").exists());
    assert!(!root.join("app/data/resources/js-model.schema.ts").exists());
}

#[test]
fn s4_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "app/models/user.ts", USER_MODEL);

    let mut config = base_config();
    config.dry_run = true;
    let report = run(root, config);

    assert!(!root.join("app/data").exists());
    assert!(report.written.is_empty());
    // The plan set is unchanged relative to a wet run.
    assert_eq!(report.plans.len(), 1);
    assert_eq!(report.plans[0].name, "user");
    assert!(report.plans[0].emit_extension);
}

#[test]
fn s5_intermediate_model_chain() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "app/core/base-model.ts",
        r#"import Model, { attr } from '@ember-data/model';

export default class BaseModel extends Model {
  @attr('date') createdAt;

  touch() {
    return this.id;
  }
}
"#,
    );
    write(
        root,
        "app/models/custom.ts",
        r#"import BaseModel from 'my-app/core/base-model';
import { attr } from '@ember-data/model';

export default class Custom extends BaseModel {
  @attr('string') title;
}
"#,
    );

    let mut config = base_config();
    config.additional_model_sources = vec![SourcePair {
        import: "my-app/core/*".into(),
        dir: "app/core/*".into(),
    }];
    config.intermediate_model_paths = vec!["my-app/core/base-model".into()];
    let report = run(root, config);
    assert_eq!(report.intermediate_models, 1);
    assert_eq!(report.models, 1);

    let trait_schema = read(root, "app/data/traits/base-model.schema.ts");
    assert!(trait_schema.starts_with("export const BaseModelTrait = {"));
    assert!(trait_schema.contains("  name: 'base-model',"));
    assert!(trait_schema.contains("  mode: 'legacy',"));
    // The synthetic id field sits at position 0 so extension code reading
    // `this.id` type-checks.
    let fields_at = trait_schema.find("fields: [").unwrap();
    let first_field = &trait_schema[fields_at..];
    assert!(
        first_field.trim_start_matches("fields: [\n    ")
            .starts_with("{ name: 'id', kind: 'attribute', type: 'string' }"),
        "{trait_schema}"
    );
    assert!(trait_schema.contains("{ name: 'createdAt', kind: 'attribute', type: 'date' }"));

    let resource = read(root, "app/data/resources/custom.schema.ts");
    assert!(resource.contains("  traits: ['base-model'],"));
    assert!(resource.contains("{ name: 'title', kind: 'attribute', type: 'string' }"));

    let types = read(root, "app/data/resources/custom.schema.types.ts");
    assert!(types.contains(
        "import type { BaseModel } from 'my-app/data/traits/base-model.schema.types';"
    ));
    assert!(types.contains("export interface Custom extends BaseModel, CustomExtensionSignature {"));

    // The base emits an extension (it has residual members), so the derived
    // model inherits the obligation even without residuals of its own.
    let base_extension = read(root, "app/data/extensions/base-model.ts");
    assert!(base_extension.contains("export class BaseModelExtension {"));
    assert!(base_extension.contains("  touch() {"));
    let custom_extension = read(root, "app/data/extensions/custom.ts");
    assert!(custom_extension.contains(
        "import { BaseModelExtension } from 'my-app/data/extensions/base-model';"
    ));
    assert!(custom_extension.contains("export class CustomExtension extends BaseModelExtension {}"));
    assert!(resource.contains("objectExtensions: ['CustomExtension']"));
}

#[test]
fn s6_polymorphic_relationship_connects_mixin() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "app/models/comment.ts",
        r#"import Model, { attr, belongsTo } from '@ember-data/model';

export default class Comment extends Model {
  @attr('string') body;
  @belongsTo('commentable', { polymorphic: true }) subject;
}
"#,
    );
    write(
        root,
        "app/mixins/commentable.ts",
        r#"import Mixin from '@ember/object/mixin';
import { hasMany } from '@ember-data/model';

export default Mixin.create({
  comments: hasMany('comment', { async: true }),
});
"#,
    );

    let report = run(root, base_config());
    assert_eq!(report.mixins, 1);

    // Connectivity includes polymorphic targets even without composition.
    let trait_schema = read(root, "app/data/traits/commentable.schema.ts");
    assert!(trait_schema.contains("  name: 'commentable',"));
    assert!(trait_schema.contains(
        "{ name: 'comments', kind: 'hasMany', type: 'comment', options: { async: true } }"
    ));

    let schema = read(root, "app/data/resources/comment.schema.ts");
    assert!(schema.contains(
        "{ name: 'subject', kind: 'belongsTo', type: 'commentable', options: { polymorphic: true } }"
    ));
    // Polymorphic targets drive connectivity, not composition.
    assert!(!schema.contains("traits:"));

    // The relationship types against the trait interface.
    let types = read(root, "app/data/resources/comment.schema.types.ts");
    assert!(types.contains(
        "import type { Commentable } from 'my-app/data/traits/commentable.schema.types';"
    ));
    assert!(types.contains("  readonly subject: Commentable | null;"));
}

#[test]
fn mixin_composition_and_transitive_chain() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "app/models/post.ts",
        r#"import Model, { attr } from '@ember-data/model';
import Auditable from 'my-app/mixins/auditable';

export default class Post extends Model.extend(Auditable) {
  @attr('string') title;
}
"#,
    );
    write(
        root,
        "app/mixins/auditable.ts",
        r#"import Mixin from '@ember/object/mixin';
import Stamped from 'my-app/mixins/stamped';
import { attr } from '@ember-data/model';

export default Mixin.createWithMixins(Stamped, {
  auditedBy: attr('string'),
});
"#,
    );
    write(
        root,
        "app/mixins/stamped.ts",
        r#"import Mixin from '@ember/object/mixin';
import { attr } from '@ember-data/model';

export default Mixin.create({
  stampedAt: attr('date'),
});
"#,
    );

    let report = run(root, base_config());
    assert_eq!(report.plans.len(), 3);
    // Schedule layering: traits before models, alphabetical within a layer.
    let names: Vec<&str> = report.plans.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["auditable", "stamped", "post"]);

    let post = read(root, "app/data/resources/post.schema.ts");
    assert!(post.contains("  traits: ['auditable'],"));
    let auditable = read(root, "app/data/traits/auditable.schema.ts");
    assert!(auditable.contains("  traits: ['stamped'],"));
    assert!(root.join("app/data/traits/stamped.schema.ts").exists());
}

#[test]
fn mixin_cycle_is_broken_deterministically() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "app/models/doc.ts",
        r#"import Model from '@ember-data/model';
import Alpha from 'my-app/mixins/alpha';

export default class Doc extends Model.extend(Alpha) {
}
"#,
    );
    write(
        root,
        "app/mixins/alpha.ts",
        r#"import Mixin from '@ember/object/mixin';
import Beta from 'my-app/mixins/beta';

export default Mixin.createWithMixins(Beta, {
  a: 1,
});
"#,
    );
    write(
        root,
        "app/mixins/beta.ts",
        r#"import Mixin from '@ember/object/mixin';
import Alpha from 'my-app/mixins/alpha';

export default Mixin.createWithMixins(Alpha, {
  b: 2,
});
"#,
    );

    let report = run(root, base_config());
    assert!(report
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::Cycle));

    // The lexicographically largest edge (beta → alpha) is dropped; the
    // other side keeps its reference.
    let alpha = read(root, "app/data/traits/alpha.schema.ts");
    assert!(alpha.contains("  traits: ['beta'],"));
    let beta = read(root, "app/data/traits/beta.schema.ts");
    assert!(!beta.contains("traits:"));
}

#[test]
fn reruns_are_byte_identical_and_skip_processed_skips() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "app/models/user.ts", USER_MODEL);
    write(
        root,
        "app/models/company.ts",
        "import Model, { attr } from '@ember-data/model';\n\nexport default class Company extends Model {\n  @attr('string') name;\n}\n",
    );

    let first = run(root, base_config());
    let snapshot: Vec<(String, String)> = first
        .written
        .iter()
        .map(|p| (p.display().to_string(), fs::read_to_string(p).unwrap()))
        .collect();

    let second = run(root, base_config());
    assert_eq!(first.written, second.written);
    for (path, content) in &snapshot {
        assert_eq!(&fs::read_to_string(path).unwrap(), content, "{path} changed");
    }

    let mut config = base_config();
    config.skip_processed = true;
    let third = run(root, config);
    assert!(third.written.is_empty());
    assert_eq!(third.skipped, third.plans.len());
}

#[test]
fn filters_suppress_emission_without_losing_references() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "app/models/post.ts",
        r#"import Model, { attr } from '@ember-data/model';
import Auditable from 'my-app/mixins/auditable';

export default class Post extends Model.extend(Auditable) {
  @attr('string') title;
}
"#,
    );
    write(
        root,
        "app/mixins/auditable.ts",
        r#"import Mixin from '@ember/object/mixin';
import { attr } from '@ember-data/model';

export default Mixin.create({
  auditedBy: attr('string'),
});
"#,
    );

    let mut config = base_config();
    config.models_only = true;
    let report = run(root, config);
    assert_eq!(report.plans.len(), 1);
    assert!(!root.join("app/data/traits").exists());
    // The model still lists the trait: materialization decisions are
    // unaffected by emission filters.
    let post = read(root, "app/data/resources/post.schema.ts");
    assert!(post.contains("  traits: ['auditable'],"));

    let dir2 = tempfile::tempdir().unwrap();
    let root2 = dir2.path();
    write(root2, "app/models/post.ts", &read(root, "app/models/post.ts"));
    write(
        root2,
        "app/mixins/auditable.ts",
        &read(root, "app/mixins/auditable.ts"),
    );
    let mut config = base_config();
    config.mixins_only = true;
    let report = run(root2, config);
    assert_eq!(report.plans.len(), 1);
    assert!(root2.join("app/data/traits/auditable.schema.ts").exists());
    assert!(!root2.join("app/data/resources").exists());
}

#[test]
fn parse_failure_drops_file_but_run_continues() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "app/models/broken.ts", "export default class {{{\n");
    write(root, "app/models/user.ts", USER_MODEL);

    let report = run(root, base_config());
    assert!(report
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::Parse));
    assert!(report.plans.iter().any(|p| p.name == "user"));
    assert!(!report.plans.iter().any(|p| p.name == "broken"));
}

#[test]
fn cancellation_stops_between_plans() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "app/models/user.ts", USER_MODEL);

    let cancel = CancelFlag::new();
    cancel.cancel();
    let report = remodel_core::run_in(base_config(), root, &cancel).unwrap();
    assert!(report.cancelled);
    assert!(report.written.is_empty());
    assert!(!root.join("app/data").exists());
}

#[test]
fn config_error_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config();
    config.models_only = true;
    config.mixins_only = true;
    let err = remodel_core::run_in(config, dir.path(), &CancelFlag::new()).unwrap_err();
    assert!(err.to_string().contains("mutually exclusive"));
}
