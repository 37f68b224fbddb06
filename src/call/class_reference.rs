//! Class reference resolution: the part before `::`.

use std::sync::Arc;

use crate::ast::{ClassKeyword, ClassRef, Name, Span, StaticCall};
use crate::context::Context;
use crate::issue::IssueKind;
use crate::resolution::{file_container_name, resolve_class_name};
use crate::ttype::Union;
use crate::{AnalysisResult, Analyzer};

/// What the class reference of a static call resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassResolution {
    /// The receiver type to fan out over.
    Receiver(Union),
    /// The class is still being built; the call is a no-op.
    Indeterminate,
    /// Nothing is known about the receiver; only the arguments are
    /// analyzed.
    Unknown,
    /// Resolution stopped after a recoverable issue.
    Stopped,
}

impl Analyzer {
    pub(crate) fn resolve_class_reference(
        &mut self,
        call: &StaticCall,
        ctx: &mut Context,
    ) -> AnalysisResult<ClassResolution> {
        match &call.class {
            ClassRef::Expr(expr) => Ok(match self.analyze_expression(expr, ctx)? {
                Some(ty) => ClassResolution::Receiver(ty),
                None => ClassResolution::Unknown,
            }),
            ClassRef::Name(name) => match name.keyword() {
                Some(keyword) => self.resolve_keyword(keyword, name.span, ctx),
                None if ctx.check_classes => self.resolve_named_class(name, ctx),
                None => Ok(ClassResolution::Unknown),
            },
        }
    }

    fn resolve_keyword(
        &mut self,
        keyword: ClassKeyword,
        span: Span,
        ctx: &mut Context,
    ) -> AnalysisResult<ClassResolution> {
        let project = Arc::clone(self.project());
        let codebase = &project.codebase;

        let (fq_class_name, receiver) = match (keyword, ctx.self_class.clone()) {
            (ClassKeyword::Parent, self_class) => {
                let parent = self_class
                    .as_deref()
                    .and_then(|s| codebase.get_class(s).ok())
                    .and_then(|storage| storage.parent_class.clone());
                let Some(parent) = parent else {
                    self.report_or_fatal(
                        IssueKind::ParentNotFound,
                        "Cannot call method on parent as this class does not extend another",
                        span,
                        ctx,
                    )?;
                    return Ok(ClassResolution::Stopped);
                };
                (codebase.cased_name(&parent), None)
            }
            (ClassKeyword::Static, Some(_)) if ctx.has_var("$this") => {
                let this = ctx.get_var("$this").cloned().unwrap_or_else(Union::mixed);
                (this.to_string(), Some(this))
            }
            (_, Some(self_class)) => (self_class, None),
            (_, None) => (file_container_name(self.source()), None),
        };

        if ctx.is_phantom_class(&fq_class_name) {
            tracing::trace!(class = %fq_class_name, "phantom class, skipping call");
            return Ok(ClassResolution::Indeterminate);
        }

        self.node_data.add_reference(span, fq_class_name.clone());
        Ok(ClassResolution::Receiver(
            receiver.unwrap_or_else(|| Union::named(fq_class_name)),
        ))
    }

    fn resolve_named_class(&mut self, name: &Name, ctx: &mut Context) -> AnalysisResult<ClassResolution> {
        let mut fq_class_name = resolve_class_name(&name.value, self.source());

        if ctx.is_phantom_class(&fq_class_name) {
            tracing::trace!(class = %fq_class_name, "phantom class, skipping call");
            return Ok(ClassResolution::Indeterminate);
        }

        let uses_trait = ctx
            .self_class
            .as_deref()
            .is_some_and(|self_class| self.codebase().class_uses_trait(self_class, &fq_class_name));
        if uses_trait && let Some(self_class) = ctx.self_class.clone() {
            tracing::trace!(r#trait = %fq_class_name, class = %self_class, "trait call rebound to using class");
            fq_class_name = self_class;
        } else if !self.check_class_exists(&fq_class_name, name.span, ctx)? {
            return Ok(ClassResolution::Stopped);
        } else {
            fq_class_name = self.codebase().cased_name(&fq_class_name);
        }

        self.node_data.add_reference(name.span, fq_class_name.clone());
        Ok(ClassResolution::Receiver(Union::named(fq_class_name)))
    }

    /// Report `UndefinedClass` for a class that is neither known nor
    /// phantom.  `Ok(false)` means the issue was recoverable.
    pub(crate) fn check_class_exists(&mut self, fq_class_name: &str, span: Span, ctx: &Context) -> AnalysisResult<bool> {
        if !self.config().enforce_class_existence
            || ctx.is_phantom_class(fq_class_name)
            || self.codebase().class_exists(fq_class_name)
        {
            return Ok(true);
        }
        self.report_or_fatal(
            IssueKind::UndefinedClass,
            format!("Class {fq_class_name} does not exist"),
            span,
            ctx,
        )?;
        Ok(false)
    }
}
