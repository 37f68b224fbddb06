//! Extension points around static calls.
//!
//! - [`ReturnTypeProvider`]s override the declared return type of methods
//!   on the classes they register for.
//! - [`AfterCallPlugin`]s see every resolved static call and may replace
//!   its inferred type or suggest source edits ([`FileManipulation`]).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::ast::{Argument, Span, StaticCall};
use crate::codebase::Codebase;
use crate::context::{Context, FileSource};
use crate::ttype::Union;
use crate::types::{MethodId, fqcn_key};

// ─── Return-type providers ──────────────────────────────────────────────────

/// What a provider sees about the call it is asked about.
pub struct ProviderEvent<'a> {
    /// Class the provider was looked up for.
    pub fq_classlike_name: &'a str,
    pub method_name_lowercase: &'a str,
    pub args: &'a [Argument],
    /// Inferred type of each argument, `None` where unknown.
    pub arg_types: &'a [Option<Union>],
    pub context: &'a Context,
    pub location: Span,
    /// Generic arguments of the receiver, when it has any.
    pub template_type_parameters: &'a [Union],
    /// The class the call was written against, when the provider was found
    /// through the declaring class instead.
    pub called_fq_classlike_name: Option<&'a str>,
}

pub trait ReturnTypeProvider: Send + Sync {
    /// Classes this provider answers for.
    fn class_names(&self) -> Vec<String>;

    /// The return type of the call, or `None` to fall through to the
    /// declared type.
    fn infer(&self, event: &ProviderEvent<'_>) -> Option<Union>;
}

#[derive(Default)]
pub struct ReturnTypeProviders {
    by_class: HashMap<String, Vec<Arc<dyn ReturnTypeProvider>>>,
}

impl ReturnTypeProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn ReturnTypeProvider>) {
        for class in provider.class_names() {
            self.by_class
                .entry(fqcn_key(&class))
                .or_default()
                .push(Arc::clone(&provider));
        }
    }

    pub fn has(&self, class: &str) -> bool {
        self.by_class.contains_key(&fqcn_key(class))
    }

    /// First non-`None` answer of the providers registered for `class`.
    pub fn infer(&self, class: &str, event: &ProviderEvent<'_>) -> Option<Union> {
        self.by_class
            .get(&fqcn_key(class))?
            .iter()
            .find_map(|provider| provider.infer(event))
    }
}

impl std::fmt::Debug for ReturnTypeProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReturnTypeProviders")
            .field("classes", &self.by_class.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ─── After-call plugins ─────────────────────────────────────────────────────

/// A suggested source edit: replace `start..end` with `insertion_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileManipulation {
    pub start: u32,
    pub end: u32,
    pub insertion_text: String,
}

/// Edits collected for one analyzed file.
#[derive(Debug, Default)]
pub struct FileManipulationBuffer {
    manipulations: Vec<FileManipulation>,
}

impl FileManipulationBuffer {
    pub fn add_many(&mut self, manipulations: Vec<FileManipulation>) {
        self.manipulations.extend(manipulations);
    }

    pub fn manipulations(&self) -> &[FileManipulation] {
        &self.manipulations
    }

    pub fn take(&mut self) -> Vec<FileManipulation> {
        std::mem::take(&mut self.manipulations)
    }
}

pub struct AfterCallEvent<'a> {
    pub call: &'a StaticCall,
    /// The id the call resolved to.
    pub method_id: MethodId,
    pub appearing_method_id: MethodId,
    pub declaring_method_id: MethodId,
    pub context: &'a Context,
    pub source: &'a FileSource,
    pub codebase: &'a Codebase,
}

pub trait AfterCallPlugin: Send + Sync {
    /// Name used in `after_call_plugins` to enable the plugin.
    fn name(&self) -> &str;

    fn after_static_call(
        &self,
        event: &AfterCallEvent<'_>,
        manipulations: &mut Vec<FileManipulation>,
        return_type: &mut Option<Union>,
    );
}

#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn AfterCallPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the plugins shipped with the crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CallLogger));
        registry
    }

    pub fn register(&mut self, plugin: Arc<dyn AfterCallPlugin>) {
        self.plugins.push(plugin);
    }

    /// Registered plugins whose names appear in `enabled`, in registration
    /// order.
    pub fn enabled<'a>(&'a self, enabled: &'a [String]) -> impl Iterator<Item = &'a Arc<dyn AfterCallPlugin>> {
        self.plugins
            .iter()
            .filter(move |plugin| enabled.iter().any(|name| name == plugin.name()))
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.name().to_string()))
            .finish()
    }
}

/// Logs every resolved static call at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallLogger;

impl AfterCallPlugin for CallLogger {
    fn name(&self) -> &str {
        "static-call-logger"
    }

    fn after_static_call(
        &self,
        event: &AfterCallEvent<'_>,
        _manipulations: &mut Vec<FileManipulation>,
        return_type: &mut Option<Union>,
    ) {
        tracing::info!(
            file = %event.source.file_path,
            start = event.call.span.start,
            method = %event.method_id,
            declaring = %event.declaring_method_id,
            return_type = %return_type.as_ref().map(ToString::to_string).unwrap_or_default(),
            "resolved static call"
        );
    }
}
