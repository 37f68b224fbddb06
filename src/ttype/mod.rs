//! Union and atomic types.
//!
//! This is the small type engine the resolver works with: a receiver or
//! return type is a [`Union`] of [`Atomic`] variants.  Only the variants
//! the static-call core needs to tell apart are modelled; everything the
//! core does not care about collapses to `Mixed`.
//!
//! # Submodules
//!
//! - [`parse`]: PHPDoc-style type strings (`Collection<int, User>|null`)
//!   to [`Union`].
//! - [`template`]: template bindings ([`TemplateResult`]), template
//!   substitution and `self` / `static` / `parent` flesh-out.

mod parse;
mod template;

use std::fmt;

pub use parse::{parse_union, parse_union_with_templates};
pub use template::TemplateResult;

use crate::types::fqcn_key;

/// A class type, optionally carrying generic arguments and intersection
/// constraints (`Foo<int>&Bar`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedObject {
    /// Case-preserved class name without a leading `\`.  The placeholders
    /// `self`, `static`, `parent` and `$this` are stored verbatim until
    /// [`Union::flesh_out`] replaces them.
    pub name: String,
    /// Generic arguments, in declaration order of the class templates.
    pub type_params: Vec<Union>,
    /// Intersection types attached to the same value.
    pub extra_types: Vec<NamedObject>,
}

impl NamedObject {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.strip_prefix('\\').map(str::to_string).unwrap_or(name);
        Self {
            name,
            type_params: Vec::new(),
            extra_types: Vec::new(),
        }
    }

    pub fn with_type_params(mut self, type_params: Vec<Union>) -> Self {
        self.type_params = type_params;
        self
    }

    pub fn with_extra_types(mut self, extra_types: Vec<NamedObject>) -> Self {
        self.extra_types = extra_types;
        self
    }

    /// Whether this is one of the late-bound placeholders.
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self.name.to_ascii_lowercase().as_str(),
            "self" | "static" | "parent" | "$this"
        )
    }
}

/// One disjunct of a [`Union`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Atomic {
    NamedObject(NamedObject),
    /// `class-string` or `class-string<Foo>`.
    ClassString { as_type: Option<Box<NamedObject>> },
    /// `Foo::class`.
    LiteralClassString(String),
    /// A template parameter `T`, declared on `defining_entity`, bounded by
    /// `as_type` (mixed when unbounded).
    TemplateParam {
        name: String,
        defining_entity: String,
        as_type: Box<Union>,
    },
    Mixed,
    Object,
    String,
    NumericString,
    LiteralString(String),
    Int,
    LiteralInt(i64),
    Float,
    Bool,
    True,
    False,
    Null,
    Void,
    Never,
    Array { key: Box<Union>, value: Box<Union> },
    List(Box<Union>),
}

impl Atomic {
    pub fn named(name: impl Into<String>) -> Self {
        Atomic::NamedObject(NamedObject::new(name))
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Atomic::Mixed)
    }

    pub fn is_object_like(&self) -> bool {
        matches!(self, Atomic::NamedObject(_) | Atomic::Object)
    }

    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            Atomic::String
                | Atomic::NumericString
                | Atomic::LiteralString(_)
                | Atomic::ClassString { .. }
                | Atomic::LiteralClassString(_)
        )
    }
}

impl fmt::Display for NamedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.type_params.is_empty() {
            f.write_str("<")?;
            for (i, param) in self.type_params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{param}")?;
            }
            f.write_str(">")?;
        }
        for extra in &self.extra_types {
            write!(f, "&{extra}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Atomic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atomic::NamedObject(object) => write!(f, "{object}"),
            Atomic::ClassString { as_type: None } => f.write_str("class-string"),
            Atomic::ClassString { as_type: Some(object) } => write!(f, "class-string<{object}>"),
            Atomic::LiteralClassString(name) => write!(f, "{name}::class"),
            Atomic::TemplateParam { name, .. } => f.write_str(name),
            Atomic::Mixed => f.write_str("mixed"),
            Atomic::Object => f.write_str("object"),
            Atomic::String => f.write_str("string"),
            Atomic::NumericString => f.write_str("numeric-string"),
            Atomic::LiteralString(value) => write!(f, "'{value}'"),
            Atomic::Int => f.write_str("int"),
            Atomic::LiteralInt(value) => write!(f, "{value}"),
            Atomic::Float => f.write_str("float"),
            Atomic::Bool => f.write_str("bool"),
            Atomic::True => f.write_str("true"),
            Atomic::False => f.write_str("false"),
            Atomic::Null => f.write_str("null"),
            Atomic::Void => f.write_str("void"),
            Atomic::Never => f.write_str("never"),
            Atomic::Array { key, value } => write!(f, "array<{key}, {value}>"),
            Atomic::List(value) => write!(f, "list<{value}>"),
        }
    }
}

/// A union of atomic types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Union {
    types: Vec<Atomic>,
    /// Set when nullable-receiver diagnostics are suppressed for this value
    /// (e.g. after a `@psalm-ignore-nullable-return` source).
    pub ignore_nullable_issues: bool,
    /// Whether the type came from a docblock rather than a native hint.
    pub from_docblock: bool,
}

impl Union {
    pub fn new(types: Vec<Atomic>) -> Self {
        let mut union = Self {
            types: Vec::with_capacity(types.len()),
            ignore_nullable_issues: false,
            from_docblock: false,
        };
        for atomic in types {
            union.push(atomic);
        }
        if union.types.is_empty() {
            union.types.push(Atomic::Mixed);
        }
        union
    }

    pub fn from_atomic(atomic: Atomic) -> Self {
        Self::new(vec![atomic])
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::from_atomic(Atomic::named(name))
    }

    pub fn mixed() -> Self {
        Self::from_atomic(Atomic::Mixed)
    }

    pub fn with_ignore_nullable_issues(mut self, ignore: bool) -> Self {
        self.ignore_nullable_issues = ignore;
        self
    }

    pub fn types(&self) -> &[Atomic] {
        &self.types
    }

    fn push(&mut self, atomic: Atomic) {
        if !self.types.contains(&atomic) {
            self.types.push(atomic);
        }
    }

    pub fn is_mixed(&self) -> bool {
        self.types.iter().any(Atomic::is_mixed)
    }

    /// Whether any atomic is an object type.
    pub fn has_object(&self) -> bool {
        self.types.iter().any(Atomic::is_object_like)
    }

    pub fn is_nullable(&self) -> bool {
        self.types.iter().any(|t| matches!(t, Atomic::Null))
    }

    pub fn is_single(&self) -> bool {
        self.types.len() == 1
    }

    /// Whether any atomic (recursively) is a template parameter.
    pub fn has_template(&self) -> bool {
        self.types.iter().any(|atomic| match atomic {
            Atomic::TemplateParam { .. } => true,
            Atomic::NamedObject(object) => object.type_params.iter().any(Union::has_template),
            Atomic::Array { key, value } => key.has_template() || value.has_template(),
            Atomic::List(value) => value.has_template(),
            _ => false,
        })
    }

    /// The named-object atomics of this union, in order.
    pub fn named_objects(&self) -> impl Iterator<Item = &NamedObject> {
        self.types.iter().filter_map(|t| match t {
            Atomic::NamedObject(object) => Some(object),
            _ => None,
        })
    }

    /// Every class name referenced anywhere in this type, including
    /// generic arguments and intersection parts.
    pub fn referenced_classes(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_referenced_classes(&mut out);
        out
    }

    fn collect_referenced_classes(&self, out: &mut Vec<String>) {
        fn from_object(object: &NamedObject, out: &mut Vec<String>) {
            if !object.is_placeholder() {
                out.push(object.name.clone());
            }
            for param in &object.type_params {
                param.collect_referenced_classes(out);
            }
            for extra in &object.extra_types {
                from_object(extra, out);
            }
        }

        for atomic in &self.types {
            match atomic {
                Atomic::NamedObject(object) => from_object(object, out),
                Atomic::ClassString { as_type: Some(object) } => from_object(object, out),
                Atomic::LiteralClassString(name) => out.push(name.clone()),
                Atomic::Array { key, value } => {
                    key.collect_referenced_classes(out);
                    value.collect_referenced_classes(out);
                }
                Atomic::List(value) => value.collect_referenced_classes(out),
                _ => {}
            }
        }
    }

    /// Union-combine two types.  `mixed` absorbs everything; otherwise the
    /// atomics of both sides are merged with duplicates removed.
    pub fn combine(a: &Union, b: &Union) -> Union {
        if a.is_mixed() || b.is_mixed() {
            return Union::mixed();
        }
        let mut combined = a.clone();
        for atomic in &b.types {
            combined.push(atomic.clone());
        }
        combined.ignore_nullable_issues = a.ignore_nullable_issues && b.ignore_nullable_issues;
        combined.from_docblock = a.from_docblock || b.from_docblock;
        combined
    }

    /// Same as [`Union::combine`] for an optional accumulator.
    pub fn combine_into(acc: Option<Union>, next: &Union) -> Union {
        match acc {
            Some(acc) => Union::combine(&acc, next),
            None => next.clone(),
        }
    }

    /// Return a copy with every atomic passed through `f`.
    pub(crate) fn map_atomics(&self, mut f: impl FnMut(&Atomic) -> Vec<Atomic>) -> Union {
        let mut types = Vec::with_capacity(self.types.len());
        for atomic in &self.types {
            types.extend(f(atomic));
        }
        Union {
            ignore_nullable_issues: self.ignore_nullable_issues,
            from_docblock: self.from_docblock,
            ..Union::new(types)
        }
    }

    /// Remove atomics for which `keep` returns `false`.  Returns `None`
    /// when nothing survives.
    pub fn filter(&self, keep: impl Fn(&Atomic) -> bool) -> Option<Union> {
        let types: Vec<Atomic> = self.types.iter().filter(|t| keep(t)).cloned().collect();
        if types.is_empty() {
            return None;
        }
        Some(Union {
            ignore_nullable_issues: self.ignore_nullable_issues,
            from_docblock: self.from_docblock,
            ..Union::new(types)
        })
    }

    /// Whether the union mentions `class_name` (case-insensitive) as a
    /// top-level named object.
    pub fn has_named(&self, class_name: &str) -> bool {
        let key = fqcn_key(class_name);
        self.named_objects().any(|o| fqcn_key(&o.name) == key)
    }
}

impl From<Atomic> for Union {
    fn from(atomic: Atomic) -> Self {
        Union::from_atomic(atomic)
    }
}

impl fmt::Display for Union {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, atomic) in self.types.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{atomic}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_dedupes_and_keeps_order() {
        let a = Union::new(vec![Atomic::Int, Atomic::Null]);
        let b = Union::new(vec![Atomic::String, Atomic::Int]);
        assert_eq!(Union::combine(&a, &b).to_string(), "int|null|string");
    }

    #[test]
    fn combine_with_mixed_is_mixed() {
        let a = Union::named("Foo");
        assert!(Union::combine(&a, &Union::mixed()).is_mixed());
    }

    #[test]
    fn display_generic_and_intersection() {
        let object = NamedObject::new("\\App\\Collection")
            .with_type_params(vec![Union::from(Atomic::Int), Union::named("User")])
            .with_extra_types(vec![NamedObject::new("Countable")]);
        assert_eq!(
            Union::from(Atomic::NamedObject(object)).to_string(),
            "App\\Collection<int, User>&Countable"
        );
    }

    #[test]
    fn referenced_classes_skip_placeholders() {
        let object = NamedObject::new("Box").with_type_params(vec![Union::named("static")]);
        let union = Union::new(vec![Atomic::NamedObject(object), Atomic::LiteralClassString("Foo".into())]);
        assert_eq!(union.referenced_classes(), vec!["Box".to_string(), "Foo".to_string()]);
    }
}
