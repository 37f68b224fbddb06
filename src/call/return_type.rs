//! Return-type inference for a resolved static call.
//!
//! Priority: a provider registered for the receiver class, then one
//! registered for the declaring class, then the declared return type with
//! the call's generic bindings substituted and `self` / `static` /
//! `parent` fleshed out.

use std::sync::Arc;

use crate::analysis::CallArgs;
use crate::ast::StaticCall;
use crate::context::Context;
use crate::issue::IssueKind;
use crate::plugin::ProviderEvent;
use crate::ttype::{NamedObject, TemplateResult, Union};
use crate::types::MethodId;
use crate::{AnalysisResult, Analyzer};

/// The pieces of a resolved call return-type inference needs.
pub(crate) struct ReturnTypeRequest<'a> {
    pub call: &'a StaticCall,
    pub method_id: &'a MethodId,
    pub declaring_method_id: &'a MethodId,
    /// Receiver class the call was resolved through.
    pub fq_class_name: &'a str,
    /// Class `static` refers to in the declared type.
    pub static_class: &'a str,
    pub receiver: &'a NamedObject,
    pub templates: &'a TemplateResult,
}

impl Analyzer {
    pub(crate) fn infer_return_type(
        &mut self,
        request: &ReturnTypeRequest<'_>,
        args: &mut CallArgs,
        ctx: &mut Context,
    ) -> AnalysisResult<Option<Union>> {
        let project = Arc::clone(self.project());
        let providers = &project.providers;
        let codebase = &project.codebase;

        let receiver_has_provider = providers.has(request.fq_class_name);
        let declaring_class = request.declaring_method_id.class();
        let declaring_has_provider =
            request.declaring_method_id != request.method_id && providers.has(declaring_class);

        if receiver_has_provider || declaring_has_provider {
            self.arg_types(args, ctx)?;
            let (arg_exprs, arg_types) = args.parts();
            let mut event = ProviderEvent {
                fq_classlike_name: request.fq_class_name,
                method_name_lowercase: request.method_id.method_key(),
                args: arg_exprs,
                arg_types,
                context: ctx,
                location: request.call.span,
                template_type_parameters: &request.receiver.type_params,
                called_fq_classlike_name: None,
            };

            if receiver_has_provider
                && let Some(ty) = providers.infer(request.fq_class_name, &event)
            {
                tracing::debug!(class = %request.fq_class_name, "return type from provider");
                return Ok(Some(ty));
            }

            event.fq_classlike_name = declaring_class;
            event.called_fq_classlike_name = Some(request.fq_class_name);
            if declaring_has_provider
                && let Some(ty) = providers.infer(declaring_class, &event)
            {
                tracing::debug!(class = %declaring_class, "return type from declaring-class provider");
                return Ok(Some(ty));
            }
        }

        let Some(declared) = codebase.method_return_type(request.method_id) else {
            return Ok(None);
        };
        let parent = codebase
            .get_class(&declared.self_class)
            .ok()
            .and_then(|c| c.parent_class.clone())
            .map(|p| codebase.cased_name(&p));
        let ty = declared
            .ty
            .replace_template_types(request.templates)
            .flesh_out(&declared.self_class, request.static_class, parent.as_deref());

        if declared.is_external {
            for class in ty.referenced_classes() {
                if !codebase.class_exists(&class) && !ctx.is_phantom_class(&class) {
                    let _ = self.report(
                        IssueKind::UndefinedClass,
                        format!("Class {class} does not exist"),
                        request.call.span,
                        ctx,
                    );
                }
            }
        }

        Ok(Some(ty))
    }
}
