//! Scenario snapshots.
//!
//! A scenario is a TOML file describing a small codebase, the file and
//! context a sequence of calls is analyzed in, and optionally what each
//! call is expected to produce.  It drives the command-line tool and the
//! fixture tests.
//!
//! ```toml
//! [file]
//! namespace = 'App'
//! uses = { Helper = 'Lib\Helper' }
//!
//! [context]
//! self = 'App\Child'
//! vars = { '$this' = 'App\Child' }
//!
//! [[class]]
//! name = 'App\Base'
//!
//! [[class.method]]
//! name = 'make'
//! static = true
//! return = 'static'
//!
//! [[class]]
//! name = 'App\Child'
//! parent = 'App\Base'
//!
//! [[call]]
//! code = 'Child::make()'
//! expect = { type = 'App\Child', issues = [] }
//! ```
//!
//! Class and type names in a scenario are fully qualified; only the call
//! snippets are resolved against `[file]`.

mod parser;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use parser::{parse_statement, parse_static_call};

use crate::ast::{Expression, Statement};
use crate::codebase::Codebase;
use crate::config::Config;
use crate::context::{Context, FileSource};
use crate::docblock::{apply_class_docblock, apply_method_docblock};
use crate::issue::{Issue, IssueKind, Severity};
use crate::plugin::FileManipulation;
use crate::ttype::{parse_union, parse_union_with_templates};
use crate::types::{ClassInfo, ClassKind, MethodInfo, ParameterInfo, Visibility};
use crate::{Analyzer, CallResult, Project};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario {path}: {message}")]
    Toml { path: String, message: String },
    #[error("invalid code `{code}`: {message}")]
    Code { code: String, message: String },
}

// ─── Scenario file ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Overrides the discovered configuration when present.
    pub config: Option<Config>,
    #[serde(default)]
    pub file: FileScope,
    #[serde(default)]
    pub context: ContextDecl,
    #[serde(default, rename = "class")]
    pub classes: Vec<ClassDecl>,
    #[serde(default, rename = "call")]
    pub calls: Vec<CallEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileScope {
    pub path: String,
    pub namespace: Option<String>,
    /// Name of the file's own class, used for calls outside any class.
    pub class: Option<String>,
    pub uses: BTreeMap<String, String>,
}

impl Default for FileScope {
    fn default() -> Self {
        Self {
            path: "scenario.php".to_string(),
            namespace: None,
            class: None,
            uses: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextDecl {
    #[serde(rename = "self")]
    pub self_class: Option<String>,
    #[serde(rename = "static")]
    pub is_static: bool,
    /// Variable id → type string.
    pub vars: BTreeMap<String, String>,
    pub phantom: Vec<String>,
    pub check_classes: Option<bool>,
    pub check_methods: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: ClassKind,
    pub parent: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub traits: Vec<String>,
    pub docblock: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub internal: bool,
    #[serde(default = "default_true")]
    pub user_defined: bool,
    #[serde(default, rename = "method")]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(rename = "return")]
    pub return_type: Option<String>,
    /// The return type comes from outside the project's sources.
    #[serde(default)]
    pub external: bool,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    pub docblock: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub internal: bool,
    /// Statements replayed for property passes, one snippet each.
    #[serde(default)]
    pub body: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_hint: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub by_ref: bool,
}

/// Which property pass a call runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    Mutations,
    Initializations,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallEntry {
    pub code: String,
    pub pass: Option<Pass>,
    pub expect: Option<Expectation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Expectation {
    /// Expected inferred type.  `untyped = true` expects none.
    #[serde(rename = "type")]
    pub inferred_type: Option<String>,
    pub untyped: bool,
    /// Expected issue kinds, in report order.
    pub issues: Option<Vec<IssueKind>>,
    pub fatal: Option<bool>,
    /// Variable types expected after the call.
    pub vars: BTreeMap<String, String>,
    /// Variables expected not to be in scope after the call.
    pub absent: Vec<String>,
    /// Methods expected to be replayed by the call, in order.
    pub replayed: Option<Vec<String>>,
}

fn default_kind() -> ClassKind {
    ClassKind::Class
}

fn default_true() -> bool {
    true
}

// ─── Reports ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CallReport {
    pub code: String,
    pub inferred_type: Option<String>,
    pub method_id: Option<String>,
    pub fatal: bool,
    pub issues: Vec<Issue>,
    /// Unmet expectations.
    pub failures: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub file: String,
    pub calls: Vec<CallReport>,
    pub manipulations: Vec<FileManipulation>,
}

impl ScenarioReport {
    pub fn has_errors(&self) -> bool {
        self.calls
            .iter()
            .any(|c| c.issues.iter().any(|i| i.severity == Severity::Error))
    }

    /// Every unmet expectation, prefixed with its call.
    pub fn failures(&self) -> Vec<String> {
        self.calls
            .iter()
            .flat_map(|c| c.failures.iter().map(move |f| format!("{}: {f}", c.code)))
            .collect()
    }
}

// ─── Loading ────────────────────────────────────────────────────────────────

impl Scenario {
    pub fn from_toml_str(text: &str, path: &str) -> Result<Self, ScenarioError> {
        toml::from_str(text).map_err(|err| ScenarioError::Toml {
            path: path.to_string(),
            message: err.message().to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    /// The class repository described by `[[class]]`.
    pub fn codebase(&self) -> Result<Codebase, ScenarioError> {
        let codebase = Codebase::new();
        for decl in &self.classes {
            codebase.add_class(build_class(decl)?);
        }
        tracing::debug!(classes = codebase.len(), "scenario codebase built");
        Ok(codebase)
    }

    pub fn file_source(&self) -> FileSource {
        let mut source = FileSource::new(self.file.path.clone());
        source.namespace = self.file.namespace.clone();
        source.class_name = self.file.class.clone();
        for (alias, fqcn) in &self.file.uses {
            source = source.with_use(alias.clone(), fqcn.clone());
        }
        source
    }

    pub fn context(&self, project: &Project) -> Context {
        let scope = &self.context;
        let mut ctx = project.context(scope.self_class.as_deref());
        ctx.is_static = scope.is_static;
        if let Some(check) = scope.check_classes {
            ctx.check_classes = check;
        }
        if let Some(check) = scope.check_methods {
            ctx.check_methods = check;
        }
        for class in &scope.phantom {
            ctx.add_phantom_class(class);
        }
        for (var_id, ty) in &scope.vars {
            ctx.set_var(var_id.clone(), parse_union(ty));
        }
        ctx
    }

    /// Run every call in order against one shared context.
    ///
    /// `fallback` is used when the scenario has no `[config]` of its own.
    pub fn run(&self, fallback: &Config) -> Result<ScenarioReport, ScenarioError> {
        let config = self.config.clone().unwrap_or_else(|| fallback.clone());
        let project = Arc::new(Project::new(self.codebase()?, config.analysis.clone()));
        let mut analyzer = Analyzer::new(Arc::clone(&project), self.file_source(), config.issues.settings());
        let mut ctx = self.context(&project);

        let mut calls = Vec::with_capacity(self.calls.len());
        for entry in &self.calls {
            let stmt = parse_statement(&entry.code).map_err(|message| ScenarioError::Code {
                code: entry.code.clone(),
                message,
            })?;
            let replayed_before = analyzer.replayed_methods().len();

            let outcome = match entry.pass {
                Some(Pass::Initializations) => {
                    ctx.collect_initializations_with(|ctx| run_statement(&mut analyzer, &stmt, ctx))
                }
                Some(Pass::Mutations) => {
                    ctx.collect_mutations = true;
                    let outcome = run_statement(&mut analyzer, &stmt, &mut ctx);
                    ctx.collect_mutations = false;
                    outcome
                }
                None => run_statement(&mut analyzer, &stmt, &mut ctx),
            };

            let issues = analyzer.take_issues();
            let replayed: Vec<String> = analyzer.replayed_methods()[replayed_before..]
                .iter()
                .map(ToString::to_string)
                .collect();
            let (result, fatal) = match outcome {
                Ok(result) => (result, false),
                Err(crate::Fatal) => (CallResult::default(), true),
            };

            let mut report = CallReport {
                code: entry.code.clone(),
                inferred_type: result.inferred_type_string(),
                method_id: result.method_id.map(|id| id.to_string()),
                fatal,
                issues,
                failures: Vec::new(),
            };
            if let Some(expect) = &entry.expect {
                report.failures = check_expectation(expect, &report, &replayed, &ctx);
            }
            calls.push(report);
        }

        Ok(ScenarioReport {
            file: self.file.path.clone(),
            calls,
            manipulations: analyzer.manipulations().manipulations().to_vec(),
        })
    }
}

/// Analyze one scenario statement, returning the call result of its
/// static call when it has one.
fn run_statement(
    analyzer: &mut Analyzer,
    stmt: &Statement,
    ctx: &mut Context,
) -> crate::AnalysisResult<CallResult> {
    match stmt {
        Statement::Expression(Expression::StaticCall(call)) => analyzer.analyze_static_call(call, ctx),
        Statement::Assign {
            target,
            value: Expression::StaticCall(call),
        } => {
            let result = analyzer.analyze_static_call(call, ctx)?;
            let ty = result.inferred_type.clone().unwrap_or_else(crate::ttype::Union::mixed);
            ctx.set_var(target.clone(), ty);
            Ok(result)
        }
        other => {
            analyzer.analyze_statement(other, ctx)?;
            Ok(CallResult::default())
        }
    }
}

fn check_expectation(expect: &Expectation, report: &CallReport, replayed: &[String], ctx: &Context) -> Vec<String> {
    let mut failures = Vec::new();

    if let Some(expected) = &expect.inferred_type
        && report.inferred_type.as_deref() != Some(expected.as_str())
    {
        failures.push(format!("expected type {expected}, got {:?}", report.inferred_type));
    }
    if expect.untyped && report.inferred_type.is_some() {
        failures.push(format!("expected no type, got {:?}", report.inferred_type));
    }
    if let Some(expected) = &expect.issues {
        let actual: Vec<IssueKind> = report.issues.iter().map(|i| i.kind).collect();
        if &actual != expected {
            failures.push(format!("expected issues {expected:?}, got {actual:?}"));
        }
    }
    if let Some(fatal) = expect.fatal
        && fatal != report.fatal
    {
        failures.push(format!("expected fatal = {fatal}, got {}", report.fatal));
    }
    for (var_id, expected) in &expect.vars {
        let actual = ctx.get_var(var_id).map(ToString::to_string);
        if actual.as_deref() != Some(expected.as_str()) {
            failures.push(format!("expected {var_id} to be {expected}, got {actual:?}"));
        }
    }
    for var_id in &expect.absent {
        if ctx.has_var(var_id) {
            failures.push(format!("expected {var_id} to be out of scope"));
        }
    }
    if let Some(expected) = &expect.replayed
        && expected.as_slice() != replayed
    {
        failures.push(format!("expected replay of {expected:?}, got {replayed:?}"));
    }

    failures
}

// ─── Storage building ───────────────────────────────────────────────────────

fn build_class(decl: &ClassDecl) -> Result<ClassInfo, ScenarioError> {
    let mut class = ClassInfo::new(decl.name.clone(), decl.kind);
    class.parent_class = decl.parent.clone();
    class.interfaces = decl.interfaces.clone();
    class.used_traits = decl.traits.clone();
    class.is_deprecated = decl.deprecated;
    class.is_internal = decl.internal;
    class.user_defined = decl.user_defined;
    if let Some(doc) = &decl.docblock {
        apply_class_docblock(&mut class, doc);
    }

    for method in &decl.methods {
        let built = build_method(method, &class)?;
        class.methods.push(built);
    }
    Ok(class)
}

fn build_method(decl: &MethodDecl, class: &ClassInfo) -> Result<MethodInfo, ScenarioError> {
    let parameters = decl
        .params
        .iter()
        .map(|p| ParameterInfo {
            name: if p.name.starts_with('$') {
                p.name.clone()
            } else {
                format!("${}", p.name)
            },
            is_required: !p.optional && !p.variadic,
            type_hint: None,
            is_variadic: p.variadic,
            is_reference: p.by_ref,
        })
        .collect();

    let body = decl
        .body
        .iter()
        .map(|code| {
            parse_statement(code).map_err(|message| ScenarioError::Code {
                code: code.clone(),
                message,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut method = MethodInfo::new(decl.name.clone())
        .with_static(decl.is_static)
        .with_visibility(decl.visibility)
        .with_parameters(parameters)
        .with_body(body);
    method.is_abstract = decl.is_abstract;
    method.is_deprecated = decl.deprecated;
    method.is_internal = decl.internal;
    method.return_type_is_external = decl.external;

    if let Some(doc) = &decl.docblock {
        apply_method_docblock(&mut method, doc, &class.name, &class.template_params);
    }

    // Native hints fill whatever the docblock left open.
    let mut in_scope = class.template_params.clone();
    in_scope.extend(method.template_params.iter().cloned());
    if method.return_type.is_none()
        && let Some(raw) = &decl.return_type
    {
        method.return_type = Some(parse_union_with_templates(raw, &in_scope));
    }
    for (param, param_decl) in method.parameters.iter_mut().zip(&decl.params) {
        if param.type_hint.is_none()
            && let Some(raw) = &param_decl.type_hint
        {
            param.type_hint = Some(parse_union_with_templates(raw, &in_scope));
        }
    }

    Ok(method)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
[file]
namespace = 'App'

[[class]]
name = 'App\Base'

[[class.method]]
name = 'make'
static = true
return = 'static'

[[class]]
name = 'App\Child'
parent = 'App\Base'

[[call]]
code = 'Child::make()'
expect = { type = 'App\Child', issues = [] }
"#;

    #[test]
    fn loads_and_runs() {
        let scenario = Scenario::from_toml_str(SCENARIO, "inline.toml").expect("parse");
        assert_eq!(scenario.classes.len(), 2);
        let report = scenario.run(&Config::default()).expect("run");
        assert_eq!(report.calls[0].inferred_type.as_deref(), Some("App\\Child"));
        assert!(report.failures().is_empty(), "{:?}", report.failures());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Scenario::from_toml_str("[[class]]\nname = 'A'\ncolour = 'red'\n", "bad.toml")
            .expect_err("should fail");
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn method_docblock_wins_over_native_hint() {
        let decl = ClassDecl {
            name: "A".into(),
            kind: ClassKind::Class,
            parent: None,
            interfaces: vec![],
            traits: vec![],
            docblock: None,
            deprecated: false,
            internal: false,
            user_defined: true,
            methods: vec![MethodDecl {
                name: "ids".into(),
                is_static: true,
                visibility: Visibility::Public,
                params: vec![],
                return_type: Some("array".into()),
                external: false,
                is_abstract: false,
                docblock: Some("/** @return list<int> */".into()),
                deprecated: false,
                internal: false,
                body: vec![],
            }],
        };
        let class = build_class(&decl).expect("build");
        let ty = class.method("ids").and_then(|m| m.return_type.clone());
        assert_eq!(ty.map(|t| t.to_string()).as_deref(), Some("list<int>"));
    }
}
