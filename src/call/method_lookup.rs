//! Method lookup for one receiver class, with the `__callStatic`
//! fallback.

use std::sync::Arc;

use crate::analysis::CallArgs;
use crate::ast::{Argument, Expression, StaticCall};
use crate::context::Context;
use crate::issue::IssueKind;
use crate::ttype::{Atomic, NamedObject, TemplateResult, Union};
use crate::types::MethodId;
use crate::{AnalysisResult, Analyzer, Fatal};

const MAGIC_STATIC_METHOD: &str = "__callStatic";

/// Where a method name landed.
#[derive(Debug)]
pub(crate) enum MethodResolution {
    /// A real method, possibly not visible from the caller.
    ///
    /// `class` is the receiver class after intersection rebinding.  When
    /// the call was redirected to `__callStatic`, `rewritten_args` holds
    /// the `(name, [args])` pair it receives.
    Found {
        method_id: MethodId,
        class: String,
        rewritten_args: Option<CallArgs>,
    },
    /// Served by a `@method static` signature that declares a return
    /// type.  Nothing else is checked.  `method_id` is the `__callStatic`
    /// that backs the signature, since the pseudo method has no storage
    /// in the method table.
    Pseudo { method_id: MethodId, return_type: Union },
    /// Not found.  Any issue has been reported.
    Missing,
}

impl Analyzer {
    pub(crate) fn lookup_static_method(
        &mut self,
        call: &StaticCall,
        fq_class_name: &str,
        method_name: &str,
        intersection_types: &[NamedObject],
        args: &mut CallArgs,
        ctx: &mut Context,
    ) -> AnalysisResult<MethodResolution> {
        let project = Arc::clone(self.project());
        let codebase = &project.codebase;

        let mut class = fq_class_name.to_string();
        let mut method_id = MethodId::new(&class, method_name);

        if !intersection_types.is_empty() && !codebase.method_exists(&method_id) {
            if let Some(other) = intersection_types
                .iter()
                .find(|t| codebase.method_exists(&MethodId::new(&t.name, method_name)))
            {
                tracing::trace!(from = %class, to = %other.name, "method found on intersection type");
                class = other.name.clone();
                method_id = MethodId::new(&class, method_name);
            }
        }

        let lookup = codebase.find_method(&class, method_name);
        let visible = lookup
            .as_ref()
            .is_some_and(|l| codebase.is_method_visible(l, ctx.self_class.as_deref()));
        if let Some(lookup) = &lookup
            && visible
        {
            return Ok(MethodResolution::Found {
                method_id: MethodId::new(&class, lookup.appearing.method()),
                class,
                rewritten_args: None,
            });
        }

        if let Some(magic) = codebase.find_method(&class, MAGIC_STATIC_METHOD) {
            let magic_id = MethodId::new(&class, magic.appearing.method());
            if let Some(pseudo) = codebase.pseudo_static_method(&class, method_name) {
                let mut templates = TemplateResult::new();
                self.check_arguments_against(
                    &pseudo.parameters,
                    args,
                    &mut templates,
                    &method_id.to_string(),
                    call.span,
                    ctx,
                )?;
                if let Some(return_type) = pseudo.return_type {
                    tracing::debug!(method = %method_id, "resolved through @method static");
                    return Ok(MethodResolution::Pseudo {
                        method_id: magic_id,
                        return_type: return_type
                            .replace_template_types(&templates)
                            .flesh_out(&class, &class, None),
                    });
                }
            }

            tracing::debug!(method = %method_id, "redirecting to __callStatic");
            let rewritten_args = self.magic_call_args(&method_id, args, ctx)?;
            return Ok(MethodResolution::Found {
                method_id: magic_id,
                class,
                rewritten_args: Some(rewritten_args),
            });
        }

        if !ctx.check_methods {
            self.analyze_call_args(args, ctx)?;
            return Ok(MethodResolution::Missing);
        }

        match lookup {
            // Exists but is not visible; the visibility check reports it.
            Some(lookup) => Ok(MethodResolution::Found {
                method_id: MethodId::new(&class, lookup.appearing.method()),
                class,
                rewritten_args: None,
            }),
            None => {
                let verdict = self.report(
                    IssueKind::UndefinedMethod,
                    format!("Method {method_id} does not exist"),
                    call.method_span(),
                    ctx,
                );
                self.analyze_call_args(args, ctx)?;
                if verdict.is_fatal() {
                    return Err(Fatal);
                }
                Ok(MethodResolution::Missing)
            }
        }
    }

    /// The arguments `__callStatic` receives for a call to `method_id`:
    /// the `Class::method` string and the list of the original values.
    fn magic_call_args(
        &mut self,
        method_id: &MethodId,
        args: &mut CallArgs,
        ctx: &mut Context,
    ) -> AnalysisResult<CallArgs> {
        let types = self.arg_types(args, ctx)?;
        let mut values: Option<Union> = None;
        for ty in types {
            values = Some(Union::combine_into(values, ty.as_ref().unwrap_or(&Union::mixed())));
        }
        let list_type = match values {
            Some(values) => Union::from_atomic(Atomic::List(Box::new(values))),
            None => Union::from_atomic(Atomic::Array {
                key: Box::new(Union::mixed()),
                value: Box::new(Union::mixed()),
            }),
        };

        let name = Union::from_atomic(Atomic::LiteralString(method_id.to_string()));
        let items = args.args().iter().map(|a| a.value.clone()).collect();
        Ok(CallArgs::with_types(
            vec![
                Argument::positional(Expression::Literal(name.clone())),
                Argument::positional(Expression::Array(items)),
            ],
            vec![Some(name), Some(list_type)],
        ))
    }
}
