//! Applying method assertions to the caller's context.
//!
//! An assertion names its target either by parameter (`$value`), which is
//! mapped to the argument passed in that position, or by a `$this`
//! property path, which is narrowed directly.  Only arguments that are
//! plain variables can be narrowed.

use crate::ast::{Argument, Expression};
use crate::codebase::Codebase;
use crate::context::Context;
use crate::ttype::{Atomic, TemplateResult, Union};
use crate::types::{Assertion, AssertionRule, ParameterInfo};

/// Narrow `ctx` with `assertions` made by a call with `args` to a method
/// taking `params`.
pub fn apply_assertions(
    assertions: &[Assertion],
    params: &[ParameterInfo],
    args: &[Argument],
    templates: &TemplateResult,
    codebase: &Codebase,
    ctx: &mut Context,
) {
    for assertion in assertions {
        let assertion = assertion.untemplated_copy(templates);
        let Some(target) = assertion_target(&assertion.var_id, params, args) else {
            tracing::trace!(%assertion, "assertion target is not a variable");
            continue;
        };

        match &assertion.rule {
            AssertionRule::IsType(ty) => {
                tracing::trace!(var = %target, ty = %ty, "narrowing by assertion");
                ctx.set_var(target, ty.clone());
            }
            AssertionRule::IsNotType(ty) => {
                let Some(existing) = ctx.get_var(&target) else {
                    continue;
                };
                if let Some(narrowed) = remove_type(existing, ty, codebase) {
                    ctx.set_var(target, narrowed);
                }
            }
        }
    }
}

/// The context variable an assertion is about.
fn assertion_target(var_id: &str, params: &[ParameterInfo], args: &[Argument]) -> Option<String> {
    if var_id == "$this" || var_id.starts_with("$this->") {
        return Some(var_id.to_string());
    }
    let name = var_id.trim_start_matches('$');
    let offset = params.iter().position(|p| p.name.trim_start_matches('$') == name)?;
    let arg = args
        .iter()
        .find(|a| a.name.as_deref() == Some(name))
        .or_else(|| args.get(offset).filter(|a| a.name.is_none() && !a.unpack))?;
    match &arg.value {
        Expression::Variable { name, .. } => Some(name.clone()),
        _ => None,
    }
}

/// `existing` without the parts covered by `removed`.  `None` when
/// nothing would be left, in which case the variable is kept as is.
fn remove_type(existing: &Union, removed: &Union, codebase: &Codebase) -> Option<Union> {
    existing.filter(|atomic| {
        !removed.types().iter().any(|r| match (atomic, r) {
            (Atomic::NamedObject(object), Atomic::NamedObject(bound)) => {
                codebase.is_subclass_or_same(&object.name, &bound.name)
            }
            _ => atomic == r,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ttype::parse_union;

    fn params() -> Vec<ParameterInfo> {
        vec![ParameterInfo::new("$value", None)]
    }

    #[test]
    fn positive_assertion_sets_argument_variable() {
        let mut ctx = Context::new(None);
        let args = vec![Argument::positional(Expression::variable("$x"))];
        apply_assertions(
            &[Assertion::is_type("$value", parse_union("int"))],
            &params(),
            &args,
            &TemplateResult::new(),
            &Codebase::new(),
            &mut ctx,
        );
        assert_eq!(ctx.get_var("$x").map(ToString::to_string).as_deref(), Some("int"));
    }

    #[test]
    fn negative_assertion_removes_null() {
        let mut ctx = Context::new(None);
        ctx.set_var("$x", parse_union("string|null"));
        let args = vec![Argument::positional(Expression::variable("$x"))];
        apply_assertions(
            &[Assertion::is_not_type("$value", parse_union("null"))],
            &params(),
            &args,
            &TemplateResult::new(),
            &Codebase::new(),
            &mut ctx,
        );
        assert_eq!(ctx.get_var("$x").map(ToString::to_string).as_deref(), Some("string"));
    }

    #[test]
    fn literal_arguments_are_not_narrowed() {
        let mut ctx = Context::new(None);
        let args = vec![Argument::positional(Expression::Literal(parse_union("1")))];
        apply_assertions(
            &[Assertion::is_type("$value", parse_union("int"))],
            &params(),
            &args,
            &TemplateResult::new(),
            &Codebase::new(),
            &mut ctx,
        );
        assert!(ctx.vars_in_scope.is_empty());
    }
}
