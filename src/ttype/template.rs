//! Template bindings and placeholder substitution.
//!
//! A [`TemplateResult`] is built fresh for every resolved call from the
//! receiver's generic arguments and thrown away afterwards.  It is used to
//! substitute `T` in declared return types and assertions, while
//! [`Union::flesh_out`] replaces the late-bound `self` / `static` /
//! `parent` placeholders with concrete class names.

use std::collections::BTreeMap;

use super::{Atomic, NamedObject, Union};

/// Template parameter name → bound type for a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateResult {
    bindings: BTreeMap<String, Union>,
}

impl TemplateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `ty`.  A template bound twice (e.g. by two
    /// arguments) widens to the combination of both.
    pub fn bind(&mut self, name: &str, ty: Union) {
        let combined = match self.bindings.remove(name) {
            Some(existing) => Union::combine(&existing, &ty),
            None => ty,
        };
        self.bindings.insert(name.to_string(), combined);
    }

    pub fn get(&self, name: &str) -> Option<&Union> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Union)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Union {
    /// Substitute bound template parameters.  Unbound templates are left
    /// in place.
    pub fn replace_template_types(&self, result: &TemplateResult) -> Union {
        if result.is_empty() {
            return self.clone();
        }
        self.map_atomics(|atomic| replace_in_atomic(atomic, result))
    }

    /// Replace `self`, `static`/`$this` and `parent` placeholders.
    ///
    /// `self_class` is the class whose declaration the type came from,
    /// `static_class` the class the call was made through.
    pub fn flesh_out(&self, self_class: &str, static_class: &str, parent_class: Option<&str>) -> Union {
        self.map_atomics(|atomic| vec![flesh_out_atomic(atomic, self_class, static_class, parent_class)])
    }
}

fn replace_in_atomic(atomic: &Atomic, result: &TemplateResult) -> Vec<Atomic> {
    match atomic {
        Atomic::TemplateParam { name, .. } => match result.get(name) {
            Some(bound) => bound.types().to_vec(),
            None => vec![atomic.clone()],
        },
        Atomic::NamedObject(object) => vec![Atomic::NamedObject(replace_in_object(object, result))],
        Atomic::ClassString { as_type: Some(object) } => vec![Atomic::ClassString {
            as_type: Some(Box::new(replace_in_object(object, result))),
        }],
        Atomic::Array { key, value } => vec![Atomic::Array {
            key: Box::new(key.replace_template_types(result)),
            value: Box::new(value.replace_template_types(result)),
        }],
        Atomic::List(value) => vec![Atomic::List(Box::new(value.replace_template_types(result)))],
        other => vec![other.clone()],
    }
}

fn replace_in_object(object: &NamedObject, result: &TemplateResult) -> NamedObject {
    NamedObject {
        name: object.name.clone(),
        type_params: object
            .type_params
            .iter()
            .map(|param| param.replace_template_types(result))
            .collect(),
        extra_types: object
            .extra_types
            .iter()
            .map(|extra| replace_in_object(extra, result))
            .collect(),
    }
}

fn flesh_out_atomic(atomic: &Atomic, self_class: &str, static_class: &str, parent_class: Option<&str>) -> Atomic {
    match atomic {
        Atomic::NamedObject(object) => {
            Atomic::NamedObject(flesh_out_object(object, self_class, static_class, parent_class))
        }
        Atomic::ClassString { as_type: Some(object) } => Atomic::ClassString {
            as_type: Some(Box::new(flesh_out_object(object, self_class, static_class, parent_class))),
        },
        Atomic::LiteralClassString(name) => {
            Atomic::LiteralClassString(flesh_out_name(name, self_class, static_class, parent_class))
        }
        Atomic::Array { key, value } => Atomic::Array {
            key: Box::new(key.flesh_out(self_class, static_class, parent_class)),
            value: Box::new(value.flesh_out(self_class, static_class, parent_class)),
        },
        Atomic::List(value) => Atomic::List(Box::new(value.flesh_out(self_class, static_class, parent_class))),
        Atomic::TemplateParam {
            name,
            defining_entity,
            as_type,
        } => Atomic::TemplateParam {
            name: name.clone(),
            defining_entity: defining_entity.clone(),
            as_type: Box::new(as_type.flesh_out(self_class, static_class, parent_class)),
        },
        other => other.clone(),
    }
}

fn flesh_out_object(
    object: &NamedObject,
    self_class: &str,
    static_class: &str,
    parent_class: Option<&str>,
) -> NamedObject {
    NamedObject {
        name: flesh_out_name(&object.name, self_class, static_class, parent_class),
        type_params: object
            .type_params
            .iter()
            .map(|param| param.flesh_out(self_class, static_class, parent_class))
            .collect(),
        extra_types: object
            .extra_types
            .iter()
            .map(|extra| flesh_out_object(extra, self_class, static_class, parent_class))
            .collect(),
    }
}

fn flesh_out_name(name: &str, self_class: &str, static_class: &str, parent_class: Option<&str>) -> String {
    match name.to_ascii_lowercase().as_str() {
        "self" => self_class.to_string(),
        "static" | "$this" => static_class.to_string(),
        "parent" => parent_class.unwrap_or(name).to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ttype::parse_union;

    fn template(name: &str) -> Atomic {
        Atomic::TemplateParam {
            name: name.to_string(),
            defining_entity: "Box".to_string(),
            as_type: Box::new(Union::mixed()),
        }
    }

    #[test]
    fn replaces_nested_templates() {
        let ty = Union::new(vec![
            Atomic::List(Box::new(Union::from(template("T")))),
            Atomic::Null,
        ]);
        let mut result = TemplateResult::new();
        result.bind("T", Union::named("User"));
        assert_eq!(ty.replace_template_types(&result).to_string(), "list<User>|null");
    }

    #[test]
    fn unbound_template_is_kept() {
        let ty = Union::from(template("U"));
        let mut result = TemplateResult::new();
        result.bind("T", Union::named("User"));
        assert_eq!(ty.replace_template_types(&result).to_string(), "U");
    }

    #[test]
    fn binding_twice_widens() {
        let mut result = TemplateResult::new();
        result.bind("T", Union::from(Atomic::Int));
        result.bind("T", Union::from(Atomic::String));
        assert_eq!(result.get("T").map(ToString::to_string).as_deref(), Some("int|string"));
    }

    #[test]
    fn flesh_out_distinguishes_self_and_static() {
        let ty = parse_union("self|static|Box<static>");
        let fleshed = ty.flesh_out("Base", "Child", None);
        assert_eq!(fleshed.to_string(), "Base|Child|Box<Child>");
    }

    #[test]
    fn flesh_out_parent_without_parent_keeps_placeholder() {
        let ty = parse_union("parent");
        assert_eq!(ty.flesh_out("A", "A", None).to_string(), "parent");
        assert_eq!(ty.flesh_out("A", "A", Some("Base")).to_string(), "Base");
    }
}
