//! PHPDoc block parsing.
//!
//! This module reads class and method docblocks (`/** ... */`) and turns
//! them into the typed pieces of class and method storage: `@template`
//! parameters, `@extends` bindings, `@method static` pseudo methods,
//! `@return` / `@param` types, `@psalm-assert*` assertions and the
//! `@deprecated` / `@internal` flags.
//!
//! # Submodules
//!
//! - [`tags`]: `@return`, `@param`, `@deprecated`, `@internal` and
//!   assertion tags.
//! - [`templates`]: `@template` and `@extends` / `@implements` / `@use`.
//! - [`virtual_members`]: `@method` tags.
//! - [`types`]: line splitting and type-token helpers.

mod tags;
mod templates;
pub(crate) mod types;
mod virtual_members;

use crate::ttype::{Union, parse_union_with_templates};
use crate::types::{Assertion, ClassInfo, MethodInfo, ParameterInfo, TemplateParamInfo, Visibility};

// ─── Re-exports ─────────────────────────────────────────────────────────────

pub use tags::{
    AssertionKind, TypeAssertionTag, extract_param_raw_type, extract_return_type,
    extract_type_assertions, has_deprecated_tag, has_internal_tag,
};
pub use templates::{TemplateTag, extract_generics_tag, extract_template_params};
pub use virtual_members::{MethodTag, MethodTagParam, extract_method_tags};

/// Apply a class-level docblock to `class`.
///
/// Template parameters are read first so the `@extends` arguments and
/// `@method` signatures that mention them resolve to template types.
pub fn apply_class_docblock(class: &mut ClassInfo, docblock: &str) {
    class.template_params = template_params(docblock, &class.name, &[]);

    for tag in ["@extends", "@implements", "@use"] {
        for (ancestor, args) in extract_generics_tag(docblock, tag) {
            let args = args
                .iter()
                .map(|a| parse_doc_type(a, &class.template_params))
                .collect();
            class.extends_generics.push((ancestor, args));
        }
    }

    for tag in extract_method_tags(docblock).into_iter().filter(|t| t.is_static) {
        let method = pseudo_method(tag, &class.template_params);
        if class.pseudo_static_method(&method.name).is_none() {
            class.pseudo_static_methods.push(method);
        }
    }

    class.is_deprecated |= has_deprecated_tag(docblock);
    class.is_internal |= has_internal_tag(docblock);
}

/// Apply a method docblock to `method`, declared on `class_name` whose
/// own templates are `class_templates`.
///
/// A docblock `@return` / `@param` type replaces the native hint.
pub fn apply_method_docblock(
    method: &mut MethodInfo,
    docblock: &str,
    class_name: &str,
    class_templates: &[TemplateParamInfo],
) {
    let defining_entity = format!("{class_name}::{}", method.name);
    method.template_params = template_params(docblock, &defining_entity, class_templates);

    let mut in_scope = class_templates.to_vec();
    in_scope.extend(method.template_params.iter().cloned());

    if let Some(raw) = extract_return_type(docblock) {
        method.return_type = Some(parse_doc_type(&raw, &in_scope));
    }

    for param in &mut method.parameters {
        if let Some(raw) = extract_param_raw_type(docblock, &param.name) {
            param.type_hint = Some(parse_doc_type(&raw, &in_scope));
        }
    }

    for tag in extract_type_assertions(docblock) {
        let ty = parse_doc_type(&tag.type_str, &in_scope);
        let assertion = if tag.negated {
            Assertion::is_not_type(tag.var_id, ty)
        } else {
            Assertion::is_type(tag.var_id, ty)
        };
        match tag.kind {
            AssertionKind::Always => method.assertions.push(assertion),
            AssertionKind::IfTrue => method.if_true_assertions.push(assertion),
            AssertionKind::IfFalse => method.if_false_assertions.push(assertion),
        }
    }

    method.is_deprecated |= has_deprecated_tag(docblock);
    method.is_internal |= has_internal_tag(docblock);
}

fn template_params(
    docblock: &str,
    defining_entity: &str,
    outer: &[TemplateParamInfo],
) -> Vec<TemplateParamInfo> {
    extract_template_params(docblock)
        .into_iter()
        .map(|tag| {
            let template = TemplateParamInfo::new(tag.name, defining_entity);
            match tag.bound {
                Some(bound) => template.with_bound(parse_doc_type(&bound, outer)),
                None => template,
            }
        })
        .collect()
}

fn pseudo_method(tag: MethodTag, templates: &[TemplateParamInfo]) -> MethodInfo {
    let parameters = tag
        .params
        .into_iter()
        .map(|p| ParameterInfo {
            name: p.name,
            is_required: p.is_required,
            type_hint: p.type_str.map(|t| parse_doc_type(&t, templates)),
            is_variadic: p.is_variadic,
            is_reference: p.is_reference,
        })
        .collect();

    let mut method = MethodInfo::new(tag.name)
        .with_static(true)
        .with_visibility(Visibility::Public)
        .with_parameters(parameters);
    method.return_type = tag.return_type.map(|t| parse_doc_type(&t, templates));
    method
}

fn parse_doc_type(raw: &str, templates: &[TemplateParamInfo]) -> Union {
    let mut ty = parse_union_with_templates(raw, templates);
    ty.from_docblock = true;
    ty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClassKind;

    #[test]
    fn class_docblock_feeds_storage() {
        let mut class = ClassInfo::new("App\\UserCollection", ClassKind::Class);
        apply_class_docblock(
            &mut class,
            "/**\n * @template T of Model\n * @extends Collection<int, T>\n * @method static T first(int $id)\n * @deprecated\n */",
        );

        assert_eq!(class.template_params.len(), 1);
        assert_eq!(class.template_params[0].as_type.to_string(), "Model");
        let args = class.generics_for("Collection").expect("extends args");
        assert!(args[1].has_template());

        let first = class.pseudo_static_method("FIRST").expect("pseudo method");
        assert!(first.return_type.as_ref().is_some_and(Union::has_template));
        assert_eq!(first.parameters[0].name, "$id");
        assert!(class.is_deprecated);
        assert!(!class.is_internal);
    }

    #[test]
    fn method_docblock_overrides_native_types() {
        let mut method = MethodInfo::new("check")
            .with_static(true)
            .with_parameters(vec![ParameterInfo::new("$value", Some(Union::mixed()))])
            .with_return_type(Union::from(crate::ttype::Atomic::Bool));
        apply_method_docblock(
            &mut method,
            "/**\n * @template T\n * @param T $value\n * @psalm-assert-if-true User $value\n * @return T|null\n */",
            "Checker",
            &[],
        );

        assert_eq!(method.template_params[0].defining_entity, "Checker::check");
        assert!(method.parameters[0].type_hint.as_ref().is_some_and(Union::has_template));
        assert_eq!(method.return_type.as_ref().map(ToString::to_string).as_deref(), Some("T|null"));
        assert_eq!(method.if_true_assertions.len(), 1);
        assert!(method.assertions.is_empty());
    }
}
