//! Receiver fan-out and per-atomic orchestration.

use std::sync::Arc;

use super::class_reference::ClassResolution;
use super::lifecycle::Dispatch;
use super::method_lookup::MethodResolution;
use super::return_type::ReturnTypeRequest;
use super::{AtomicOutcome, CallResult};
use crate::analysis::CallArgs;
use crate::ast::{ClassKeyword, InstanceCall, StaticCall};
use crate::context::Context;
use crate::issue::IssueKind;
use crate::ttype::{Atomic, NamedObject, Union};
use crate::types::MethodId;
use crate::{AnalysisResult, Analyzer};

/// The class a receiver atomic resolves the call against.
struct ReceiverTarget {
    fq_class_name: String,
    intersection_types: Vec<NamedObject>,
    /// The receiver as written, generic arguments included.  Generic
    /// binding uses this even when the method is found on an
    /// intersection type.
    object: NamedObject,
}

impl ReceiverTarget {
    fn new(object: &NamedObject) -> Self {
        Self {
            fq_class_name: object.name.clone(),
            intersection_types: object.extra_types.clone(),
            object: object.clone(),
        }
    }
}

impl Analyzer {
    /// Resolve a static call and infer its type.
    ///
    /// Issues go to the analyzer's issue buffer.  `Err(Fatal)` means one
    /// of them was fatal and the enclosing statement should be abandoned.
    pub fn analyze_static_call(&mut self, call: &StaticCall, ctx: &mut Context) -> AnalysisResult<CallResult> {
        let mut args = CallArgs::new(&call.args);
        let mut result = CallResult::default();

        let receiver = match self.resolve_class_reference(call, ctx)? {
            ClassResolution::Receiver(ty) => ty,
            ClassResolution::Indeterminate | ClassResolution::Stopped => return Ok(result),
            ClassResolution::Unknown => {
                self.analyze_call_args(&mut args, ctx)?;
                return Ok(result);
            }
        };
        tracing::trace!(receiver = %receiver, method = ?call.method_name(), "resolving static call");

        for atomic in receiver.types() {
            match self.resolve_for_atomic(call, atomic, &receiver, &mut args, &mut result, ctx)? {
                AtomicOutcome::Success(Some(ty)) => {
                    result.inferred_type = Some(Union::combine_into(result.inferred_type.take(), &ty));
                }
                AtomicOutcome::Success(None) => {}
                AtomicOutcome::Skip => tracing::trace!(%atomic, "receiver atomic skipped"),
            }
        }

        self.finish_static_call(call, &mut args, &result, ctx)?;
        Ok(result)
    }

    fn resolve_for_atomic(
        &mut self,
        call: &StaticCall,
        atomic: &Atomic,
        receiver: &Union,
        args: &mut CallArgs,
        result: &mut CallResult,
        ctx: &mut Context,
    ) -> AnalysisResult<AtomicOutcome> {
        let Some(target) = self.receiver_target(call, atomic, receiver, ctx)? else {
            return Ok(AtomicOutcome::Skip);
        };

        // Dynamic method names leave `method_id` unset; the arguments are
        // evaluated once the fan-out is done.
        let Some(method_name) = call.method_name() else {
            return Ok(AtomicOutcome::Skip);
        };
        result.method_id = Some(MethodId::new(&target.fq_class_name, method_name));

        let resolution = self.lookup_static_method(
            call,
            &target.fq_class_name,
            method_name,
            &target.intersection_types,
            args,
            ctx,
        )?;
        let (method_id, fq_class_name, mut rewritten_args) = match resolution {
            MethodResolution::Found {
                method_id,
                class,
                rewritten_args,
            } => (method_id, class, rewritten_args),
            MethodResolution::Pseudo { method_id, return_type } => {
                result.method_id = Some(method_id);
                return Ok(AtomicOutcome::Success(Some(return_type)));
            }
            MethodResolution::Missing => return Ok(AtomicOutcome::Skip),
        };
        result.method_id = Some(method_id);
        let call_args = rewritten_args.as_mut().unwrap_or(args);

        let project = Arc::clone(self.project());
        let codebase = &project.codebase;
        let Ok(class_storage) = codebase.get_class(&fq_class_name) else {
            return Ok(AtomicOutcome::Skip);
        };

        if class_storage.user_defined
            && ctx.self_class.is_some()
            && ctx.is_collecting()
            && !self.replay_self_call(call, &method_id, ctx)
        {
            return Ok(AtomicOutcome::Skip);
        }

        self.check_class_lifecycle(&class_storage, call, ctx);
        self.check_method_visibility(&method_id, call, ctx)?;

        if self.check_static_context(&method_id, &fq_class_name, call, ctx) == Dispatch::DynamicThis {
            tracing::debug!(method = %method_id, "static-looking call dispatched on $this");
            let instance_call = InstanceCall {
                var_id: "$this".to_string(),
                method: method_id.method().to_string(),
                args: call_args.args().to_vec(),
                span: call.span,
            };
            let ty = self.analyze_instance_call_with(&instance_call, call_args, ctx)?;
            return Ok(AtomicOutcome::Success(ty));
        }

        self.check_method_lifecycle(&method_id, call, ctx);

        let declaring_method_id = codebase.declaring_method_id(&method_id).unwrap_or(method_id);
        let mut templates = codebase.bind_receiver_templates(&target.object, declaring_method_id.class());
        self.check_method_args(&method_id, call_args, &mut templates, call.span, ctx)?;

        // `parent::` calls keep the caller as the late-bound class.
        let static_class = match (call.class.keyword(), ctx.self_class.as_deref()) {
            (Some(ClassKeyword::Parent), Some(self_class)) => self_class.to_string(),
            _ => fq_class_name.clone(),
        };
        let request = ReturnTypeRequest {
            call,
            method_id: &method_id,
            declaring_method_id: &declaring_method_id,
            fq_class_name: &fq_class_name,
            static_class: &static_class,
            receiver: &target.object,
            templates: &templates,
        };
        let mut return_type = self.infer_return_type(&request, call_args, ctx)?;

        self.apply_call_assertions(&method_id, call_args, &templates, result, ctx);
        self.run_after_call_plugins(call, &method_id, &mut return_type, ctx);
        self.node_data.add_reference(call.method_span(), format!("{method_id}()"));

        Ok(AtomicOutcome::Success(return_type))
    }

    /// Map one receiver atomic to the class the call targets.  `None`
    /// skips the atomic; the reason has been reported where one applies.
    fn receiver_target(
        &mut self,
        call: &StaticCall,
        atomic: &Atomic,
        receiver: &Union,
        ctx: &mut Context,
    ) -> AnalysisResult<Option<ReceiverTarget>> {
        let span = call.span;
        match atomic {
            Atomic::NamedObject(object) => {
                if !self.check_class_exists(&object.name, span, ctx)? {
                    return Ok(None);
                }
                Ok(Some(ReceiverTarget::new(object)))
            }
            Atomic::ClassString { as_type: Some(bound) } => {
                if !self.check_class_exists(&bound.name, span, ctx)? {
                    return Ok(None);
                }
                Ok(Some(ReceiverTarget::new(bound)))
            }
            Atomic::LiteralClassString(name) => {
                if !self.check_class_exists(name, span, ctx)? {
                    return Ok(None);
                }
                Ok(Some(ReceiverTarget::new(&NamedObject::new(name.clone()))))
            }
            Atomic::TemplateParam { as_type, .. }
                if !as_type.is_mixed() && !as_type.types().iter().any(|t| matches!(t, Atomic::Object)) =>
            {
                match as_type.types().first() {
                    Some(Atomic::NamedObject(object)) => Ok(Some(ReceiverTarget::new(object))),
                    Some(_) => Ok(None),
                    None => {
                        let _ = self.report(
                            IssueKind::UndefinedClass,
                            format!("Type {as_type} cannot be called as a class"),
                            span,
                            ctx,
                        );
                        Ok(None)
                    }
                }
            }
            Atomic::Mixed | Atomic::TemplateParam { .. } | Atomic::ClassString { as_type: None } => {
                let _ = self.report(
                    IssueKind::MixedMethodCall,
                    "Cannot call method on an unknown class",
                    span,
                    ctx,
                );
                Ok(None)
            }
            Atomic::String | Atomic::LiteralString(_) | Atomic::NumericString => {
                if self.config().allow_string_standin_for_class && !matches!(atomic, Atomic::NumericString) {
                    return Ok(None);
                }
                self.report_or_fatal(
                    IssueKind::InvalidStringClass,
                    "String cannot be used as a class",
                    span,
                    ctx,
                )?;
                Ok(None)
            }
            Atomic::Null if receiver.ignore_nullable_issues => Ok(None),
            other => {
                let _ = self.report(
                    IssueKind::UndefinedClass,
                    format!("Type {other} cannot be called as a class"),
                    span,
                    ctx,
                );
                Ok(None)
            }
        }
    }
}
