#![allow(dead_code)]

use std::sync::Arc;

use phpantom_analyzer::ast::StaticCall;
use phpantom_analyzer::codebase::Codebase;
use phpantom_analyzer::config::AnalyzerConfig;
use phpantom_analyzer::context::{Context, FileSource};
use phpantom_analyzer::issue::{IssueKind, IssueSettings};
use phpantom_analyzer::scenario::{Scenario, ScenarioReport, parse_statement, parse_static_call};
use phpantom_analyzer::ttype::parse_union;
use phpantom_analyzer::types::{ClassInfo, ClassKind, MethodInfo, ParameterInfo, Visibility};
use phpantom_analyzer::{AnalysisResult, Analyzer, CallResult, Project};

/// Helper: a project over `classes` with the default configuration.
pub fn create_project(classes: Vec<ClassInfo>) -> Arc<Project> {
    create_project_with(classes, AnalyzerConfig::default())
}

pub fn create_project_with(classes: Vec<ClassInfo>, config: AnalyzerConfig) -> Arc<Project> {
    Arc::new(Project::new(codebase(classes), config))
}

pub fn codebase(classes: Vec<ClassInfo>) -> Codebase {
    let codebase = Codebase::new();
    for class in classes {
        codebase.add_class(class);
    }
    codebase
}

/// Helper: an analyzer for `test.php` with no namespace or imports.
pub fn create_analyzer(project: &Arc<Project>) -> Analyzer {
    Analyzer::new(Arc::clone(project), FileSource::new("test.php"), IssueSettings::default())
}

pub fn class(name: &str) -> ClassInfo {
    ClassInfo::new(name, ClassKind::Class)
}

pub fn trait_(name: &str) -> ClassInfo {
    ClassInfo::new(name, ClassKind::Trait)
}

/// A public static method with the given return type string.
pub fn static_method(name: &str, return_type: Option<&str>) -> MethodInfo {
    let method = MethodInfo::new(name).with_static(true);
    match return_type {
        Some(ty) => method.with_return_type(parse_union(ty)),
        None => method,
    }
}

/// A public instance method with the given return type string.
pub fn instance_method(name: &str, return_type: Option<&str>) -> MethodInfo {
    static_method(name, return_type).with_static(false)
}

pub fn private_static_method(name: &str, return_type: Option<&str>) -> MethodInfo {
    static_method(name, return_type).with_visibility(Visibility::Private)
}

pub fn param(name: &str, ty: &str) -> ParameterInfo {
    ParameterInfo::new(name, Some(parse_union(ty)))
}

/// Parse a call snippet, panicking on malformed test input.
pub fn call(src: &str) -> StaticCall {
    parse_static_call(src).unwrap_or_else(|err| panic!("bad test call `{src}`: {err}"))
}

/// Analyze `src` as a static call in `ctx`.
pub fn analyze(analyzer: &mut Analyzer, src: &str, ctx: &mut Context) -> AnalysisResult<CallResult> {
    analyzer.analyze_static_call(&call(src), ctx)
}

/// Analyze `src` as a statement in `ctx`.
pub fn run_statement(analyzer: &mut Analyzer, src: &str, ctx: &mut Context) -> AnalysisResult<()> {
    let stmt = parse_statement(src).unwrap_or_else(|err| panic!("bad test statement `{src}`: {err}"));
    analyzer.analyze_statement(&stmt, ctx)
}

/// Issue kinds reported so far, in order.
pub fn issue_kinds(analyzer: &Analyzer) -> Vec<IssueKind> {
    analyzer.issues().issues().iter().map(|i| i.kind).collect()
}

pub fn type_string(result: &CallResult) -> Option<String> {
    result.inferred_type_string()
}

/// Helper: load and run an inline scenario with the default config.
pub fn run_scenario(toml: &str) -> ScenarioReport {
    let scenario = Scenario::from_toml_str(toml, "inline.toml").expect("scenario should parse");
    scenario
        .run(&phpantom_analyzer::config::Config::default())
        .expect("scenario should run")
}
