//! Argument typing and checking.
//!
//! [`CallArgs`] caches the inferred argument types of one call so a call
//! fanned out over several receiver classes evaluates each argument
//! expression (and reports its issues) only once.
//!
//! The checker covers arity and a structural subtype test
//! ([`is_contained_by`]) that is good enough for the types in
//! [`crate::ttype`].  Template parameters of the callee that the receiver
//! did not bind are inferred from the arguments.

use std::collections::HashSet;

use crate::ast::{Argument, Span};
use crate::codebase::Codebase;
use crate::context::Context;
use crate::issue::IssueKind;
use crate::ttype::{Atomic, NamedObject, TemplateResult, Union};
use crate::types::{MethodId, ParameterInfo};
use crate::{AnalysisResult, Analyzer};

/// The arguments of one call plus their types once evaluated.
#[derive(Debug, Clone)]
pub struct CallArgs {
    args: Vec<Argument>,
    types: Option<Vec<Option<Union>>>,
}

impl CallArgs {
    pub fn new(args: &[Argument]) -> Self {
        Self {
            args: args.to_vec(),
            types: None,
        }
    }

    /// Arguments whose types are already known.
    pub(crate) fn with_types(args: Vec<Argument>, types: Vec<Option<Union>>) -> Self {
        Self {
            args,
            types: Some(types),
        }
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    pub fn is_evaluated(&self) -> bool {
        self.types.is_some()
    }

    /// Arguments and their types; the types are empty until evaluated.
    pub(crate) fn parts(&self) -> (&[Argument], &[Option<Union>]) {
        (&self.args, self.types.as_deref().unwrap_or_default())
    }
}

impl Analyzer {
    /// Types of the call's arguments, evaluating them on first use.
    pub(crate) fn arg_types<'a>(
        &mut self,
        args: &'a mut CallArgs,
        ctx: &mut Context,
    ) -> AnalysisResult<&'a [Option<Union>]> {
        if args.types.is_none() {
            let mut types = Vec::with_capacity(args.args.len());
            for arg in &args.args {
                types.push(self.analyze_expression(&arg.value, ctx)?);
            }
            args.types = Some(types);
        }
        Ok(args.types.as_deref().unwrap_or_default())
    }

    /// Evaluate the argument expressions for their own issues, without a
    /// signature to check them against.
    pub(crate) fn analyze_call_args(&mut self, args: &mut CallArgs, ctx: &mut Context) -> AnalysisResult<()> {
        self.arg_types(args, ctx).map(|_| ())
    }

    /// Check `args` against the parameters of `method_id`.
    pub(crate) fn check_method_args(
        &mut self,
        method_id: &MethodId,
        args: &mut CallArgs,
        templates: &mut TemplateResult,
        span: Span,
        ctx: &mut Context,
    ) -> AnalysisResult<()> {
        let Some(storage) = self.codebase().method_storage(method_id) else {
            return self.analyze_call_args(args, ctx);
        };
        self.check_arguments_against(&storage.parameters, args, templates, &method_id.to_string(), span, ctx)
    }

    /// Check `args` against `params`.
    ///
    /// Templates already present in `templates` are treated as fixed;
    /// other templates appearing in parameter types are bound from the
    /// argument types.  Type mismatches are reported but never fatal;
    /// arity problems are fatal when the sink says so.
    pub(crate) fn check_arguments_against(
        &mut self,
        params: &[ParameterInfo],
        args: &mut CallArgs,
        templates: &mut TemplateResult,
        callee: &str,
        span: Span,
        ctx: &mut Context,
    ) -> AnalysisResult<()> {
        let arg_types = self.arg_types(args, ctx)?.to_vec();
        let fixed: HashSet<String> = templates.iter().map(|(name, _)| name.to_string()).collect();
        let has_unpack = args.args.iter().any(|a| a.unpack);
        let variadic = params.last().filter(|p| p.is_variadic);

        let mut too_many = false;
        for (offset, arg) in args.args.iter().enumerate() {
            let param = match &arg.name {
                Some(label) => params.iter().find(|p| p.name.trim_start_matches('$') == label),
                None => params.get(offset).or(variadic),
            };
            let Some(param) = param else {
                too_many |= !has_unpack;
                continue;
            };
            if arg.unpack {
                continue;
            }
            let (Some(expected), Some(Some(actual))) = (&param.type_hint, arg_types.get(offset)) else {
                continue;
            };

            infer_templates(expected, actual, &fixed, templates);
            let expected = expected.replace_template_types(templates);
            if !is_contained_by(actual, &expected, self.codebase()) {
                // Argument type mismatches never abort the statement.
                let _ = self.report(
                    IssueKind::InvalidArgument,
                    format!("Argument {} of {callee} expects {expected}, {actual} provided", offset + 1),
                    arg.value.span().unwrap_or(span),
                    ctx,
                );
            }
        }

        if too_many {
            self.report_or_fatal(
                IssueKind::TooManyArguments,
                format!(
                    "Too many arguments for method {callee} - expecting {} but saw {}",
                    params.len(),
                    args.args.len()
                ),
                span,
                ctx,
            )?;
        }

        if !has_unpack {
            let positional = args.args.iter().filter(|a| a.name.is_none()).count();
            let missing = params.iter().enumerate().any(|(i, p)| {
                p.is_required
                    && i >= positional
                    && !args
                        .args
                        .iter()
                        .any(|a| a.name.as_deref() == Some(p.name.trim_start_matches('$')))
            });
            if missing {
                let required = params.iter().filter(|p| p.is_required).count();
                self.report_or_fatal(
                    IssueKind::TooFewArguments,
                    format!(
                        "Too few arguments for method {callee} - expecting {required} but saw {}",
                        args.args.len()
                    ),
                    span,
                    ctx,
                )?;
            }
        }

        Ok(())
    }
}

/// Bind templates in `expected` that are not in `fixed` from the matching
/// parts of `actual`.
fn infer_templates(expected: &Union, actual: &Union, fixed: &HashSet<String>, out: &mut TemplateResult) {
    for atomic in expected.types() {
        match atomic {
            Atomic::TemplateParam { name, .. } if !fixed.contains(name) => {
                let bound = if expected.is_nullable() {
                    actual.filter(|a| !matches!(a, Atomic::Null))
                } else {
                    Some(actual.clone())
                };
                if let Some(bound) = bound {
                    out.bind(name, bound);
                }
            }
            Atomic::List(inner) => {
                for candidate in actual.types() {
                    if let Atomic::List(value) | Atomic::Array { value, .. } = candidate {
                        infer_templates(inner, value, fixed, out);
                    }
                }
            }
            Atomic::Array { key, value } => {
                for candidate in actual.types() {
                    match candidate {
                        Atomic::Array {
                            key: actual_key,
                            value: actual_value,
                        } => {
                            infer_templates(key, actual_key, fixed, out);
                            infer_templates(value, actual_value, fixed, out);
                        }
                        Atomic::List(actual_value) => infer_templates(value, actual_value, fixed, out),
                        _ => {}
                    }
                }
            }
            Atomic::NamedObject(object) if !object.type_params.is_empty() => {
                for candidate in actual.named_objects() {
                    if candidate.name.eq_ignore_ascii_case(&object.name) {
                        for (param, actual_param) in object.type_params.iter().zip(&candidate.type_params) {
                            infer_templates(param, actual_param, fixed, out);
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Whether every value of `input` is also a value of `container`.
///
/// `mixed` on either side is accepted; the checker does not try to prove
/// anything about values it knows nothing about.
pub fn is_contained_by(input: &Union, container: &Union, codebase: &Codebase) -> bool {
    if input.is_mixed() || container.is_mixed() {
        return true;
    }
    input.types().iter().all(|atomic| {
        container
            .types()
            .iter()
            .any(|candidate| atomic_is_contained_by(atomic, candidate, codebase))
    })
}

fn atomic_is_contained_by(input: &Atomic, container: &Atomic, codebase: &Codebase) -> bool {
    if input == container {
        return true;
    }
    match (input, container) {
        (_, Atomic::Mixed) | (Atomic::Never, _) => true,
        (Atomic::TemplateParam { as_type, .. }, _) => {
            is_contained_by(as_type, &Union::from_atomic(container.clone()), codebase)
        }
        (_, Atomic::TemplateParam { as_type, .. }) => {
            is_contained_by(&Union::from_atomic(input.clone()), as_type, codebase)
        }
        (Atomic::LiteralInt(_), Atomic::Int | Atomic::Float) | (Atomic::Int, Atomic::Float) => true,
        (
            Atomic::LiteralString(_)
            | Atomic::NumericString
            | Atomic::ClassString { .. }
            | Atomic::LiteralClassString(_),
            Atomic::String,
        ) => true,
        (Atomic::True | Atomic::False, Atomic::Bool) => true,
        (Atomic::LiteralClassString(_) | Atomic::ClassString { .. }, Atomic::ClassString { as_type: None }) => true,
        (Atomic::LiteralClassString(name), Atomic::ClassString { as_type: Some(bound) }) => {
            codebase.is_subclass_or_same(name, &bound.name)
        }
        (
            Atomic::ClassString { as_type: Some(object) },
            Atomic::ClassString { as_type: Some(bound) },
        ) => codebase.is_subclass_or_same(&object.name, &bound.name),
        (Atomic::NamedObject(_), Atomic::Object) => true,
        (Atomic::NamedObject(object), Atomic::NamedObject(bound)) => object_is_contained_by(object, bound, codebase),
        (Atomic::List(value), Atomic::List(bound)) => is_contained_by(value, bound, codebase),
        (Atomic::List(value), Atomic::Array { key, value: bound }) => {
            is_contained_by(&Union::from_atomic(Atomic::Int), key, codebase)
                && is_contained_by(value, bound, codebase)
        }
        (
            Atomic::Array { key, value },
            Atomic::Array {
                key: bound_key,
                value: bound_value,
            },
        ) => is_contained_by(key, bound_key, codebase) && is_contained_by(value, bound_value, codebase),
        _ => false,
    }
}

fn object_is_contained_by(object: &NamedObject, bound: &NamedObject, codebase: &Codebase) -> bool {
    let own_match = codebase.is_subclass_or_same(&object.name, &bound.name)
        || object
            .extra_types
            .iter()
            .any(|extra| codebase.is_subclass_or_same(&extra.name, &bound.name));
    if !own_match {
        return false;
    }
    bound.extra_types.iter().all(|required| {
        codebase.is_subclass_or_same(&object.name, &required.name)
            || object
                .extra_types
                .iter()
                .any(|extra| codebase.is_subclass_or_same(&extra.name, &required.name))
    })
}
