//! Data types used throughout the analyzer.
//!
//! This module contains the "model" structs and enums that describe class
//! and method storage (what the class repository hands out), the method
//! identifiers the resolver tracks, and the narrowing assertions attached
//! to methods.

use std::fmt;

use serde::Deserialize;
use ustr::{Ustr, ustr};

use crate::ast::Statement;
use crate::ttype::{TemplateResult, Union};

/// Normalise a class name into its lookup key: lowercase, no leading `\`.
///
/// Two FQCNs name the same class iff their keys are equal.
pub fn fqcn_key(name: &str) -> String {
    name.strip_prefix('\\').unwrap_or(name).to_ascii_lowercase()
}

/// The first namespace segment of a class name (`App` for `App\Models\User`,
/// the class itself for a global class).
pub fn top_namespace_segment(name: &str) -> &str {
    let name = name.strip_prefix('\\').unwrap_or(name);
    name.split('\\').next().unwrap_or(name)
}

/// Visibility of a class member.
///
/// In PHP, members without an explicit visibility modifier default to `Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// What kind of class-like a [`ClassInfo`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Trait,
    Enum,
}

/// A method parameter.
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    /// The parameter name including the `$` prefix (e.g. "$text").
    pub name: String,
    /// Whether this parameter is required (no default value and not variadic).
    pub is_required: bool,
    /// Declared type, if any.
    pub type_hint: Option<Union>,
    /// Whether this parameter is variadic (has `...`).
    pub is_variadic: bool,
    /// Whether this parameter is passed by reference (has `&`).
    pub is_reference: bool,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, type_hint: Option<Union>) -> Self {
        Self {
            name: name.into(),
            is_required: true,
            type_hint,
            is_variadic: false,
            is_reference: false,
        }
    }
}

/// A `@template` parameter declared on a class or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParamInfo {
    pub name: String,
    /// Class (or `Class::method`) that declares the template.
    pub defining_entity: String,
    /// Upper bound from `@template T of Bound`; `mixed` when unbounded.
    pub as_type: Union,
}

impl TemplateParamInfo {
    pub fn new(name: impl Into<String>, defining_entity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defining_entity: defining_entity.into(),
            as_type: Union::mixed(),
        }
    }

    pub fn with_bound(mut self, as_type: Union) -> Self {
        self.as_type = as_type;
        self
    }
}

/// What an [`Assertion`] says about its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionRule {
    IsType(Union),
    IsNotType(Union),
}

/// A narrowing fact declared by `@psalm-assert` and friends.
///
/// `var_id` is either a parameter name (`$value`) or a property path on
/// `$this` (`$this->items`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub var_id: String,
    pub rule: AssertionRule,
}

impl Assertion {
    pub fn is_type(var_id: impl Into<String>, ty: Union) -> Self {
        Self {
            var_id: var_id.into(),
            rule: AssertionRule::IsType(ty),
        }
    }

    pub fn is_not_type(var_id: impl Into<String>, ty: Union) -> Self {
        Self {
            var_id: var_id.into(),
            rule: AssertionRule::IsNotType(ty),
        }
    }

    /// Copy of this assertion with generic bindings substituted.
    pub fn untemplated_copy(&self, templates: &TemplateResult) -> Assertion {
        let rule = match &self.rule {
            AssertionRule::IsType(ty) => AssertionRule::IsType(ty.replace_template_types(templates)),
            AssertionRule::IsNotType(ty) => {
                AssertionRule::IsNotType(ty.replace_template_types(templates))
            }
        };
        Assertion {
            var_id: self.var_id.clone(),
            rule,
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            AssertionRule::IsType(ty) => write!(f, "{} is {ty}", self.var_id),
            AssertionRule::IsNotType(ty) => write!(f, "{} is not {ty}", self.var_id),
        }
    }
}

/// Method storage.
#[derive(Debug, Clone, Default)]
pub struct MethodInfo {
    /// The method name as declared (e.g. "updateText").
    pub name: String,
    pub parameters: Vec<ParameterInfo>,
    /// Declared return type (docblock type wins over the native hint).
    pub return_type: Option<Union>,
    /// The declaration lives outside the project's own sources.
    pub return_type_is_external: bool,
    pub is_static: bool,
    pub visibility: Visibility,
    pub is_abstract: bool,
    pub is_deprecated: bool,
    pub is_internal: bool,
    pub template_params: Vec<TemplateParamInfo>,
    /// Unconditional `@psalm-assert` facts.
    pub assertions: Vec<Assertion>,
    pub if_true_assertions: Vec<Assertion>,
    pub if_false_assertions: Vec<Assertion>,
    /// Statements replayed when the method is analyzed for its effects on
    /// `$this` properties.
    pub body: Vec<Statement>,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_return_type(mut self, return_type: Union) -> Self {
        self.return_type = Some(return_type);
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<ParameterInfo>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_body(mut self, body: Vec<Statement>) -> Self {
        self.body = body;
        self
    }

    /// Number of parameters a call must supply.
    pub fn required_param_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.is_required).count()
    }
}

/// Class storage.
///
/// All names are stored fully qualified without a leading `\`.
#[derive(Debug, Clone, Default)]
pub struct ClassInfo {
    pub name: String,
    pub kind: ClassKind,
    /// The parent class from the `extends` clause.  Interfaces record their
    /// parent interfaces in `interfaces` instead.
    pub parent_class: Option<String>,
    pub interfaces: Vec<String>,
    pub used_traits: Vec<String>,
    /// Methods declared directly in this class-like.
    pub methods: Vec<MethodInfo>,
    /// `@method static` signatures served by `__callStatic`.
    pub pseudo_static_methods: Vec<MethodInfo>,
    pub template_params: Vec<TemplateParamInfo>,
    /// Generic arguments from `@extends`, `@implements` and `@use`, keyed
    /// by the ancestor they apply to.
    pub extends_generics: Vec<(String, Vec<Union>)>,
    pub is_deprecated: bool,
    pub is_internal: bool,
    /// Declared in the project's own sources rather than a dependency or
    /// stub.
    pub user_defined: bool,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        let name = name.into();
        let name = name.strip_prefix('\\').map(str::to_string).unwrap_or(name);
        Self {
            name,
            kind,
            user_defined: true,
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_class = Some(parent.into());
        self
    }

    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_trait(mut self, trait_name: impl Into<String>) -> Self {
        self.used_traits.push(trait_name.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// A method declared directly on this class-like, by case-insensitive
    /// name.
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn pseudo_static_method(&self, name: &str) -> Option<&MethodInfo> {
        self.pseudo_static_methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// The `@extends`-style generic arguments recorded for `ancestor`.
    pub fn generics_for(&self, ancestor: &str) -> Option<&[Union]> {
        let key = fqcn_key(ancestor);
        self.extends_generics
            .iter()
            .find(|(name, _)| fqcn_key(name) == key)
            .map(|(_, args)| args.as_slice())
    }

    pub fn is_trait(&self) -> bool {
        self.kind == ClassKind::Trait
    }
}

/// A `(class, method)` pair.
///
/// Equality and hashing use the lowercase forms; the cased forms are kept
/// for diagnostics.  Strings are interned so ids are cheap to copy into the
/// visited sets used during replay.
#[derive(Debug, Clone, Copy)]
pub struct MethodId {
    class: Ustr,
    method: Ustr,
    class_key: Ustr,
    method_key: Ustr,
}

impl MethodId {
    pub fn new(class: &str, method: &str) -> Self {
        let class = class.strip_prefix('\\').unwrap_or(class);
        Self {
            class: ustr(class),
            method: ustr(method),
            class_key: ustr(&class.to_ascii_lowercase()),
            method_key: ustr(&method.to_ascii_lowercase()),
        }
    }

    /// Cased class name.
    pub fn class(&self) -> &str {
        self.class.as_str()
    }

    /// Cased method name.
    pub fn method(&self) -> &str {
        self.method.as_str()
    }

    pub fn class_key(&self) -> &str {
        self.class_key.as_str()
    }

    pub fn method_key(&self) -> &str {
        self.method_key.as_str()
    }

    /// Same method name on another class.
    pub fn with_class(&self, class: &str) -> Self {
        Self::new(class, self.method())
    }
}

impl PartialEq for MethodId {
    fn eq(&self, other: &Self) -> bool {
        self.class_key == other.class_key && self.method_key == other.method_key
    }
}

impl Eq for MethodId {}

impl std::hash::Hash for MethodId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.class_key.hash(state);
        self.method_key.hash(state);
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class, self.method)
    }
}
