//! PHPantom static-call analyzer.
//!
//! Resolves static method calls (`Foo::bar()`, `self::make()`,
//! `parent::__construct()`, `$class::create()`) the way a gradual PHP type
//! checker does: it works out which class the call targets, which method
//! it lands on, whether that is allowed, and what type the call produces.
//! Problems are reported as [`issue::Issue`]s through a
//! [`issue::DiagnosticSink`] that decides whether they abort the statement.
//!
//! The crate is organised as follows:
//!
//! - **`ast`** – the call / expression / statement model handed in by the
//!   caller (no PHP parsing happens here).
//! - **`ttype`** – union and atomic types, templates and type strings.
//! - **`types`** – class and method storage, method ids and assertions.
//! - **`codebase`** / **`inheritance`** – the shared class repository and
//!   method table.
//! - **`docblock`** – PHPDoc tag extraction used when building storage.
//! - **`call`** – the static-call resolution core.
//! - **`analysis`** – expression typing, argument checking, instance calls,
//!   assertion narrowing and method-body replay used by the core.
//! - **`scenario`** – TOML scenario snapshots driving the CLI and fixture
//!   tests.
//! - **`config`**, **`logging`**, **`issue`**, **`plugin`**,
//!   **`node_data`** – ambient pieces.

use std::sync::Arc;

pub mod analysis;
pub mod ast;
pub mod call;
pub mod codebase;
pub mod config;
pub mod context;
pub mod docblock;
pub mod inheritance;
pub mod issue;
pub mod logging;
pub mod node_data;
pub mod plugin;
pub mod resolution;
pub mod scenario;
pub mod ttype;
pub mod types;

pub use call::CallResult;

use crate::ast::Span;
use crate::codebase::Codebase;
use crate::config::AnalyzerConfig;
use crate::context::{Context, FileSource};
use crate::issue::{DiagnosticSink, Issue, IssueBuffer, IssueKind, IssueSettings, Verdict};
use crate::node_data::NodeData;
use crate::plugin::{FileManipulationBuffer, PluginRegistry, ReturnTypeProviders};
use crate::types::MethodId;

/// Marker for a fatal diagnostic: the enclosing statement stops being
/// analyzed.  The diagnostic itself is already in the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fatal;

pub type AnalysisResult<T> = Result<T, Fatal>;

/// Everything shared by the analyzers of one project.
///
/// Built once and handed to every [`Analyzer`] through an `Arc`; nothing
/// in here is mutated during analysis.
#[derive(Debug, Default)]
pub struct Project {
    pub codebase: Codebase,
    pub config: AnalyzerConfig,
    pub providers: ReturnTypeProviders,
    pub plugins: PluginRegistry,
}

impl Project {
    pub fn new(codebase: Codebase, config: AnalyzerConfig) -> Self {
        Self {
            codebase,
            config,
            providers: ReturnTypeProviders::new(),
            plugins: PluginRegistry::with_builtin(),
        }
    }

    pub fn with_providers(mut self, providers: ReturnTypeProviders) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    /// A fresh context for code in `self_class`, with the existence checks
    /// switched on or off as configured.
    pub fn context(&self, self_class: Option<&str>) -> Context {
        let mut ctx = Context::new(self_class);
        ctx.check_classes = self.config.enforce_class_existence;
        ctx.check_methods = self.config.enforce_method_existence;
        ctx
    }
}

/// Per-file analysis state.
///
/// One `Analyzer` is used for one file at a time.  The resolver methods
/// live in [`call`] and [`analysis`] as further `impl Analyzer` blocks.
#[derive(Debug)]
pub struct Analyzer {
    project: Arc<Project>,
    source: FileSource,
    issues: IssueBuffer,
    node_data: NodeData,
    manipulations: FileManipulationBuffer,
    /// Method bodies replayed so far, in order.
    replayed: Vec<MethodId>,
}

impl Analyzer {
    pub fn new(project: Arc<Project>, source: FileSource, settings: IssueSettings) -> Self {
        let node_data = NodeData::new(project.config.record_node_types);
        Self {
            project,
            source,
            issues: IssueBuffer::new(settings),
            node_data,
            manipulations: FileManipulationBuffer::default(),
            replayed: Vec::new(),
        }
    }

    pub fn project(&self) -> &Arc<Project> {
        &self.project
    }

    pub fn codebase(&self) -> &Codebase {
        &self.project.codebase
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.project.config
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    pub fn issues(&self) -> &IssueBuffer {
        &self.issues
    }

    pub fn take_issues(&mut self) -> Vec<Issue> {
        self.issues.take()
    }

    pub fn node_data(&self) -> &NodeData {
        &self.node_data
    }

    pub fn manipulations(&self) -> &FileManipulationBuffer {
        &self.manipulations
    }

    /// Methods whose bodies were replayed, in replay order.
    pub fn replayed_methods(&self) -> &[MethodId] {
        &self.replayed
    }

    /// Report an issue at `span`.  While a callee is being replayed the
    /// issue is reported at the call that triggered the replay instead.
    pub(crate) fn report(
        &mut self,
        kind: IssueKind,
        message: impl Into<String>,
        span: Span,
        ctx: &Context,
    ) -> Verdict {
        let span = ctx.include_location.unwrap_or(span);
        let issue = Issue::new(kind, message, self.source.file_path.clone(), span);
        self.issues.report(issue)
    }

    /// [`Analyzer::report`], turning a fatal verdict into `Err(Fatal)`.
    pub(crate) fn report_or_fatal(
        &mut self,
        kind: IssueKind,
        message: impl Into<String>,
        span: Span,
        ctx: &Context,
    ) -> AnalysisResult<()> {
        if self.report(kind, message, span, ctx).is_fatal() {
            return Err(Fatal);
        }
        Ok(())
    }
}
