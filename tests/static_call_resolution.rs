mod common;

use common::{
    analyze, call, class, create_analyzer, create_project, create_project_with, instance_method, issue_kinds,
    static_method, trait_, type_string,
};
use phpantom_analyzer::Fatal;
use phpantom_analyzer::config::AnalyzerConfig;
use phpantom_analyzer::context::FileSource;
use phpantom_analyzer::issue::{IssueKind, IssueSettings};
use phpantom_analyzer::ttype::{Union, parse_union};
use phpantom_analyzer::{Analyzer, Project};
use std::sync::Arc;

fn shapes_project() -> Arc<Project> {
    create_project(vec![
        class("Shape").with_method(static_method("make", Some("static"))),
        class("Circle").with_parent("Shape"),
        class("Square")
            .with_parent("Shape")
            .with_method(static_method("sides", Some("int"))),
    ])
}

// ─── Late static binding ────────────────────────────────────────────────────

/// Test: a `static` return type binds to the class named in the call, not
/// the declaring class.
#[test]
fn test_static_return_binds_to_called_class() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);

    let result = analyze(&mut analyzer, "Circle::make()", &mut ctx).expect("not fatal");

    assert_eq!(type_string(&result).as_deref(), Some("Circle"));
    assert_eq!(result.method_id.map(|id| id.to_string()).as_deref(), Some("Circle::make"));
    assert!(issue_kinds(&analyzer).is_empty());
}

/// Test: `parent::make()` keeps the caller as the late-bound class.
#[test]
fn test_parent_call_keeps_caller_as_static() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(Some("Square"));
    ctx.is_static = true;

    let result = analyze(&mut analyzer, "parent::make()", &mut ctx).expect("not fatal");

    assert_eq!(type_string(&result).as_deref(), Some("Square"));
    assert!(issue_kinds(&analyzer).is_empty());
}

/// Test: `self::` resolves to the enclosing class.
#[test]
fn test_self_resolves_to_enclosing_class() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(Some("Square"));
    ctx.is_static = true;

    let result = analyze(&mut analyzer, "self::sides()", &mut ctx).expect("not fatal");
    assert_eq!(type_string(&result).as_deref(), Some("int"));
}

/// Test: `static::` inside an instance method uses the type of `$this`.
#[test]
fn test_static_keyword_uses_this_type() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(Some("Shape"));
    ctx.set_var("$this", Union::named("Circle"));

    let result = analyze(&mut analyzer, "static::make()", &mut ctx).expect("not fatal");
    assert_eq!(type_string(&result).as_deref(), Some("Circle"));
}

// ─── parent:: without a parent ──────────────────────────────────────────────

/// Test: `parent::` in a class without a parent is fatal and stops before
/// any method lookup.
#[test]
fn test_parent_without_parent_is_fatal() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(Some("Shape"));

    let result = analyze(&mut analyzer, "parent::missing()", &mut ctx);

    assert_eq!(result, Err(Fatal));
    assert_eq!(issue_kinds(&analyzer), vec![IssueKind::ParentNotFound]);
}

/// Test: with ParentNotFound downgraded to info, resolution stops quietly
/// with no type.
#[test]
fn test_parent_without_parent_downgraded_stops() {
    let project = shapes_project();
    let mut settings = IssueSettings::default();
    settings.info.insert(IssueKind::ParentNotFound);
    let mut analyzer = Analyzer::new(Arc::clone(&project), FileSource::new("test.php"), settings);
    let mut ctx = project.context(Some("Shape"));

    let result = analyze(&mut analyzer, "parent::missing()", &mut ctx).expect("recoverable");

    assert!(result.inferred_type.is_none());
    assert!(result.method_id.is_none());
    assert_eq!(issue_kinds(&analyzer), vec![IssueKind::ParentNotFound]);
}

// ─── Named classes ──────────────────────────────────────────────────────────

/// Test: an unknown class is reported as UndefinedClass.
#[test]
fn test_unknown_class_is_reported() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);

    let result = analyze(&mut analyzer, "Triangle::make()", &mut ctx);

    assert_eq!(result, Err(Fatal));
    assert_eq!(issue_kinds(&analyzer), vec![IssueKind::UndefinedClass]);
    assert!(analyzer.issues().issues()[0].message.contains("Triangle"));
}

/// Test: with class checks off, an unknown class only has its arguments
/// analyzed.
#[test]
fn test_unknown_class_without_class_checks() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.check_classes = false;

    let result = analyze(&mut analyzer, "Triangle::make(Nope::build())", &mut ctx).expect("not fatal");

    assert!(result.inferred_type.is_none());
    assert!(issue_kinds(&analyzer).is_empty());
}

/// Test: names are qualified against the file's namespace and imports.
#[test]
fn test_names_resolve_through_imports() {
    let project = create_project(vec![
        class("Lib\\Geometry\\Point").with_method(static_method("origin", Some("static"))),
    ]);
    let source = FileSource::new("src/App.php")
        .with_namespace("App")
        .with_use("Point", "Lib\\Geometry\\Point");
    let mut analyzer = Analyzer::new(Arc::clone(&project), source, IssueSettings::default());
    let mut ctx = project.context(None);

    let result = analyze(&mut analyzer, "Point::origin()", &mut ctx).expect("not fatal");
    assert_eq!(type_string(&result).as_deref(), Some("Lib\\Geometry\\Point"));
}

/// Test: a call through a class still being built is a no-op.
#[test]
fn test_phantom_class_is_indeterminate() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.add_phantom_class("Ghost");

    let result = analyze(&mut analyzer, "Ghost::appear(Missing::x())", &mut ctx).expect("not fatal");

    assert!(result.inferred_type.is_none());
    assert!(result.method_id.is_none());
    assert!(issue_kinds(&analyzer).is_empty(), "arguments are not analyzed either");
}

/// Test: naming a trait used by the enclosing class calls through the
/// using class.
#[test]
fn test_trait_name_rebinds_to_using_class() {
    let project = create_project(vec![
        trait_("Creates").with_method(static_method("create", Some("static"))),
        class("Invoice").with_trait("Creates"),
    ]);
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(Some("Invoice"));
    ctx.is_static = true;

    let result = analyze(&mut analyzer, "Creates::create()", &mut ctx).expect("not fatal");

    assert_eq!(type_string(&result).as_deref(), Some("Invoice"));
    assert_eq!(result.method_id.map(|id| id.to_string()).as_deref(), Some("Invoice::create"));
}

// ─── Receiver unions ────────────────────────────────────────────────────────

/// Test: each receiver atomic contributes its return type.
#[test]
fn test_union_receiver_combines_types() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$cls", parse_union("Circle|Square"));

    let result = analyze(&mut analyzer, "$cls::make()", &mut ctx).expect("not fatal");

    assert_eq!(type_string(&result).as_deref(), Some("Circle|Square"));
    assert!(issue_kinds(&analyzer).is_empty());
}

/// Test: class-string receivers resolve like the class they name.
#[test]
fn test_class_string_receivers() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$cls", parse_union("class-string<Square>"));

    let result = analyze(&mut analyzer, "$cls::make()", &mut ctx).expect("not fatal");
    assert_eq!(type_string(&result).as_deref(), Some("Square"));

    ctx.set_var("$cls", Union::from_atomic(phpantom_analyzer::ttype::Atomic::LiteralClassString("Circle".into())));
    let result = analyze(&mut analyzer, "$cls::make()", &mut ctx).expect("not fatal");
    assert_eq!(type_string(&result).as_deref(), Some("Circle"));
}

/// Test: a receiver with no resolvable atomic yields no type at all.
#[test]
fn test_union_with_no_resolvable_atomic_has_no_type() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$cls", parse_union("int|bool"));

    let result = analyze(&mut analyzer, "$cls::make()", &mut ctx).expect("not fatal");

    assert!(result.inferred_type.is_none());
    assert_eq!(
        issue_kinds(&analyzer),
        vec![IssueKind::UndefinedClass, IssueKind::UndefinedClass]
    );
}

/// Test: a partially resolvable union keeps the resolvable part.
#[test]
fn test_union_with_one_bad_atomic() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$cls", parse_union("Circle|int"));

    let result = analyze(&mut analyzer, "$cls::make()", &mut ctx).expect("not fatal");

    assert_eq!(type_string(&result).as_deref(), Some("Circle"));
    assert_eq!(issue_kinds(&analyzer), vec![IssueKind::UndefinedClass]);
}

/// Test: a nullable receiver skips null quietly when nullable issues are
/// ignored for it.
#[test]
fn test_ignored_nullable_receiver() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    let mut ty = parse_union("Circle|null");
    ty.ignore_nullable_issues = true;
    ctx.set_var("$cls", ty);

    let result = analyze(&mut analyzer, "$cls::make()", &mut ctx).expect("not fatal");

    assert_eq!(type_string(&result).as_deref(), Some("Circle"));
    assert!(issue_kinds(&analyzer).is_empty());
}

/// Test: a mixed receiver is reported and skipped.
#[test]
fn test_mixed_receiver() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$cls", Union::mixed());

    let result = analyze(&mut analyzer, "$cls::make()", &mut ctx).expect("not fatal");

    assert!(result.inferred_type.is_none());
    assert_eq!(issue_kinds(&analyzer), vec![IssueKind::MixedMethodCall]);
}

/// Test: an unknown variable receiver only analyzes the arguments.
#[test]
fn test_unknown_variable_receiver() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);

    let result = analyze(&mut analyzer, "$nobody::make(Circle::make())", &mut ctx).expect("not fatal");

    assert!(result.inferred_type.is_none());
    assert!(issue_kinds(&analyzer).is_empty());
}

// ─── String receivers ───────────────────────────────────────────────────────

/// Test: a plain string receiver is fatal unless stand-ins are allowed.
#[test]
fn test_string_receiver() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$cls", parse_union("string"));

    assert_eq!(analyze(&mut analyzer, "$cls::make()", &mut ctx), Err(Fatal));
    assert_eq!(issue_kinds(&analyzer), vec![IssueKind::InvalidStringClass]);

    let config = AnalyzerConfig {
        allow_string_standin_for_class: true,
        ..AnalyzerConfig::default()
    };
    let project = create_project_with(vec![class("Shape")], config);
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$cls", parse_union("string"));

    let result = analyze(&mut analyzer, "$cls::make()", &mut ctx).expect("skipped quietly");
    assert!(result.inferred_type.is_none());
    assert!(issue_kinds(&analyzer).is_empty());
}

/// Test: numeric strings are never class names, stand-ins or not.
#[test]
fn test_numeric_string_receiver_always_reported() {
    let config = AnalyzerConfig {
        allow_string_standin_for_class: true,
        ..AnalyzerConfig::default()
    };
    let project = create_project_with(vec![class("Shape")], config);
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$cls", parse_union("numeric-string"));

    assert_eq!(analyze(&mut analyzer, "$cls::make()", &mut ctx), Err(Fatal));
    assert_eq!(issue_kinds(&analyzer), vec![IssueKind::InvalidStringClass]);
}

// ─── Intersections ──────────────────────────────────────────────────────────

/// Test: a method missing on the first intersection member is looked up
/// on the others.
#[test]
fn test_intersection_member_provides_method() {
    let project = create_project(vec![
        class("Model"),
        class("SoftDeletes").with_method(static_method("withTrashed", Some("int"))),
    ]);
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$model", parse_union("Model&SoftDeletes"));

    let result = analyze(&mut analyzer, "$model::withTrashed()", &mut ctx).expect("not fatal");

    assert_eq!(type_string(&result).as_deref(), Some("int"));
    assert_eq!(
        result.method_id.map(|id| id.to_string()).as_deref(),
        Some("SoftDeletes::withTrashed")
    );
}

// ─── After the call ─────────────────────────────────────────────────────────

/// Test: property types are forgotten after a resolved call.
#[test]
fn test_property_types_forgotten_after_call() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$this->radius", parse_union("int"));
    ctx.set_var("$local", parse_union("int"));

    analyze(&mut analyzer, "Circle::make()", &mut ctx).expect("not fatal");

    assert!(!ctx.has_var("$this->radius"));
    assert!(ctx.has_var("$local"));
}

/// Test: property types survive when the configuration asks for it.
#[test]
fn test_property_types_remembered_when_configured() {
    let config = AnalyzerConfig {
        remember_property_assignments_after_call: true,
        ..AnalyzerConfig::default()
    };
    let project = create_project_with(vec![class("Circle").with_method(static_method("make", None))], config);
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$this->radius", parse_union("int"));

    analyze(&mut analyzer, "Circle::make()", &mut ctx).expect("not fatal");

    assert!(ctx.has_var("$this->radius"));
}

/// Test: resolved classes, methods and call types are recorded per
/// position when node recording is on.
#[test]
fn test_node_data_records_references_and_types() {
    let config = AnalyzerConfig {
        record_node_types: true,
        ..AnalyzerConfig::default()
    };
    let project = create_project_with(
        vec![
            class("Shape").with_method(static_method("make", Some("static"))),
            class("Circle").with_parent("Shape"),
        ],
        config,
    );
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    let the_call = call("Circle::make()");

    analyzer.analyze_static_call(&the_call, &mut ctx).expect("not fatal");

    let nodes = analyzer.node_data();
    assert_eq!(nodes.reference_at(the_call.method_span()), Some("Circle::make()"));
    assert_eq!(nodes.type_at(the_call.span).map(ToString::to_string).as_deref(), Some("Circle"));
}

/// Test: an undefined method is fatal and names the class.
#[test]
fn test_undefined_method() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);

    assert_eq!(analyze(&mut analyzer, "Circle::area()", &mut ctx), Err(Fatal));
    assert_eq!(issue_kinds(&analyzer), vec![IssueKind::UndefinedMethod]);
    assert_eq!(analyzer.issues().issues()[0].message, "Method Circle::area does not exist");
}

/// Test: with method checks off, an undefined method is silent.
#[test]
fn test_undefined_method_without_method_checks() {
    let project = shapes_project();
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.check_methods = false;

    let result = analyze(&mut analyzer, "Circle::area()", &mut ctx).expect("not fatal");

    assert!(result.inferred_type.is_none());
    assert!(issue_kinds(&analyzer).is_empty());
}

/// Test: a dynamic method name analyzes the arguments and gives up.
#[test]
fn test_dynamic_method_name() {
    let project = create_project(vec![class("Circle").with_method(instance_method("area", Some("float")))]);
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$method", parse_union("string"));

    let result = analyze(&mut analyzer, "Circle::$method()", &mut ctx).expect("not fatal");

    assert!(result.inferred_type.is_none());
    assert!(issue_kinds(&analyzer).is_empty());
}

/// Test: with a dynamic method name on a union receiver, the arguments are
/// evaluated once and no method is selected.
#[test]
fn test_dynamic_method_name_on_union_evaluates_arguments_once() {
    let project = create_project(vec![
        class("Circle"),
        class("Square"),
        class("Old").with_method({
            let mut m = static_method("value", Some("int"));
            m.is_deprecated = true;
            m
        }),
    ]);
    let mut analyzer = create_analyzer(&project);
    let mut ctx = project.context(None);
    ctx.set_var("$cls", parse_union("Circle|Square"));
    ctx.set_var("$method", parse_union("string"));

    let result = analyze(&mut analyzer, "$cls::$method(Old::value())", &mut ctx).expect("not fatal");

    assert!(result.method_id.is_none());
    assert!(result.inferred_type.is_none());
    assert_eq!(issue_kinds(&analyzer), vec![IssueKind::DeprecatedMethod]);
}
