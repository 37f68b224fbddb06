/// Method table: where a method comes from.
///
/// A method name looked up on a class resolves to two ids:
///
///   - the **appearing** id, the class through which the method is
///     visible (a class that uses a trait is where the trait's methods
///     appear), and
///   - the **declaring** id, the class-like whose body defines it.
///
/// Lookup precedence follows PHP:
///
///   class own > traits > parent chain > interfaces
///
/// Private parent methods are still found here; whether the caller may see
/// them is answered separately by [`Codebase::is_method_visible`].
use std::sync::Arc;

use crate::codebase::{Codebase, MAX_DEPTH};
use crate::ttype::{NamedObject, TemplateResult, Union};
use crate::types::{ClassInfo, MethodId, MethodInfo, Visibility, fqcn_key};

/// Result of a method-table walk.
#[derive(Debug, Clone)]
pub struct MethodLookup {
    pub appearing: MethodId,
    pub declaring: MethodId,
    pub declaring_class: Arc<ClassInfo>,
}

impl MethodLookup {
    pub fn storage(&self) -> Option<&MethodInfo> {
        self.declaring_class.method(self.declaring.method())
    }
}

/// A declared return type together with the class it was declared on.
#[derive(Debug, Clone)]
pub struct DeclaredReturnType {
    pub ty: Union,
    /// Class the `self` placeholder refers to.
    pub self_class: String,
    /// The declaration comes from outside the project's own sources.
    pub is_external: bool,
}

impl Codebase {
    /// Walk the hierarchy of `class` for `method`.
    pub fn find_method(&self, class: &str, method: &str) -> Option<MethodLookup> {
        self.find_method_at_depth(class, method, 0)
    }

    fn find_method_at_depth(&self, class: &str, method: &str, depth: u32) -> Option<MethodLookup> {
        if depth > MAX_DEPTH {
            return None;
        }
        let storage = self.get_class(class).ok()?;

        // 1. Own declaration.
        if let Some(own) = storage.method(method) {
            let id = MethodId::new(&storage.name, &own.name);
            return Some(MethodLookup {
                appearing: id,
                declaring: id,
                declaring_class: storage,
            });
        }

        // 2. Traits.  The using class is where trait methods appear.
        for trait_name in &storage.used_traits {
            if let Some(found) = self.find_method_at_depth(trait_name, method, depth + 1) {
                return Some(MethodLookup {
                    appearing: found.appearing.with_class(&storage.name),
                    ..found
                });
            }
        }

        // 3. Parent chain.
        if let Some(parent) = &storage.parent_class
            && let Some(found) = self.find_method_at_depth(parent, method, depth + 1)
        {
            return Some(found);
        }

        // 4. Interfaces (abstract signatures).
        storage
            .interfaces
            .iter()
            .find_map(|interface| self.find_method_at_depth(interface, method, depth + 1))
    }

    pub fn method_exists(&self, id: &MethodId) -> bool {
        self.find_method(id.class(), id.method()).is_some()
    }

    pub fn declaring_method_id(&self, id: &MethodId) -> Option<MethodId> {
        self.find_method(id.class(), id.method()).map(|l| l.declaring)
    }

    pub fn appearing_method_id(&self, id: &MethodId) -> Option<MethodId> {
        self.find_method(id.class(), id.method()).map(|l| l.appearing)
    }

    /// Storage of the declaration `id` resolves to.
    pub fn method_storage(&self, id: &MethodId) -> Option<MethodInfo> {
        let lookup = self.find_method(id.class(), id.method())?;
        lookup.storage().cloned()
    }

    /// Like [`Codebase::method_storage`], but only for methods declared in
    /// user-defined classes.
    pub fn user_method_storage(&self, id: &MethodId) -> Option<MethodInfo> {
        let lookup = self.find_method(id.class(), id.method())?;
        if !lookup.declaring_class.user_defined {
            return None;
        }
        lookup.storage().cloned()
    }

    /// The declared return type of `id`.
    ///
    /// A declaration without a return type inherits the type of the
    /// method it overrides (parent chain first, then interfaces).
    pub fn method_return_type(&self, id: &MethodId) -> Option<DeclaredReturnType> {
        let lookup = self.find_method(id.class(), id.method())?;
        if let Some(storage) = lookup.storage()
            && let Some(ty) = &storage.return_type
        {
            return Some(DeclaredReturnType {
                ty: ty.clone(),
                self_class: lookup.declaring_class.name.clone(),
                is_external: storage.return_type_is_external || !lookup.declaring_class.user_defined,
            });
        }

        self.overridden_method_ids(&lookup.declaring)
            .into_iter()
            .find_map(|overridden| {
                let class = self.get_class(overridden.class()).ok()?;
                let storage = class.method(overridden.method())?;
                let ty = storage.return_type.clone()?;
                Some(DeclaredReturnType {
                    ty,
                    self_class: class.name.clone(),
                    is_external: storage.return_type_is_external || !class.user_defined,
                })
            })
    }

    /// Declarations that `id` overrides, nearest first.
    pub fn overridden_method_ids(&self, id: &MethodId) -> Vec<MethodId> {
        let Ok(storage) = self.get_class(id.class()) else {
            return Vec::new();
        };
        let mut ancestors = Vec::new();
        if let Some(parent) = &storage.parent_class {
            ancestors.push(parent.clone());
        }
        ancestors.extend(storage.interfaces.iter().cloned());

        ancestors
            .iter()
            .filter_map(|ancestor| self.declaring_method_id(&MethodId::new(ancestor, id.method())))
            .collect()
    }

    /// A `@method static` signature for `method`, declared on `class` or
    /// inherited from its parents.
    pub fn pseudo_static_method(&self, class: &str, method: &str) -> Option<MethodInfo> {
        let mut current = self.get_class(class).ok();
        let mut depth = 0;
        while let Some(storage) = current {
            depth += 1;
            if depth > MAX_DEPTH {
                break;
            }
            if let Some(found) = storage.pseudo_static_method(method) {
                return Some(found.clone());
            }
            current = storage
                .parent_class
                .as_deref()
                .and_then(|p| self.get_class(p).ok());
        }
        None
    }

    /// Whether code running in `calling_class` may call the method.
    ///
    /// Protected methods are visible anywhere in the hierarchy of the
    /// appearing class; private ones only inside the class they appear
    /// on.
    pub fn is_method_visible(&self, lookup: &MethodLookup, calling_class: Option<&str>) -> bool {
        let Some(storage) = lookup.storage() else {
            return true;
        };
        match storage.visibility {
            Visibility::Public => true,
            Visibility::Private => calling_class.is_some_and(|caller| {
                let caller = fqcn_key(caller);
                caller == lookup.appearing.class_key() || caller == lookup.declaring.class_key()
            }),
            Visibility::Protected => calling_class.is_some_and(|caller| {
                let appearing = lookup.appearing.class();
                let declaring = lookup.declaring.class();
                self.is_subclass_or_same(caller, appearing)
                    || self.is_subclass_or_same(appearing, caller)
                    || self.is_subclass_or_same(caller, declaring)
            }),
        }
    }

    /// Bind the template parameters of `declaring_class` from the generic
    /// arguments of a receiver type.
    ///
    /// The receiver's `type_params` bind its own templates positionally.
    /// When the method is declared on an ancestor, the bindings are carried
    /// through each `@extends` / `@implements` / `@use` step.  Templates
    /// left without an argument fall back to their bound.
    pub fn bind_receiver_templates(&self, receiver: &NamedObject, declaring_class: &str) -> TemplateResult {
        let mut result = TemplateResult::new();
        let Ok(mut current) = self.get_class(&receiver.name) else {
            return result;
        };
        let mut args: Vec<Union> = current
            .template_params
            .iter()
            .enumerate()
            .map(|(i, t)| receiver.type_params.get(i).cloned().unwrap_or_else(|| t.as_type.clone()))
            .collect();
        let target = fqcn_key(declaring_class);

        for _ in 0..MAX_DEPTH {
            if fqcn_key(&current.name) == target {
                for (template, bound) in current.template_params.iter().zip(args) {
                    result.bind(&template.name, bound);
                }
                return result;
            }

            let mut bindings = TemplateResult::new();
            for (template, bound) in current.template_params.iter().zip(&args) {
                bindings.bind(&template.name, bound.clone());
            }

            let next = current
                .parent_class
                .iter()
                .chain(&current.used_traits)
                .chain(&current.interfaces)
                .find(|ancestor| self.reaches(ancestor, &target, 0))
                .cloned();
            let Some(next) = next else {
                break;
            };
            let Ok(next_storage) = self.get_class(&next) else {
                break;
            };

            args = match current.generics_for(&next) {
                Some(extended) => extended
                    .iter()
                    .map(|ty| ty.replace_template_types(&bindings))
                    .collect(),
                None => next_storage
                    .template_params
                    .iter()
                    .map(|t| t.as_type.clone())
                    .collect(),
            };
            current = next_storage;
        }

        result
    }

    /// Whether the hierarchy of `from` (itself included) contains the class
    /// with key `target`.
    fn reaches(&self, from: &str, target: &str, depth: u32) -> bool {
        if depth > MAX_DEPTH {
            return false;
        }
        if fqcn_key(from) == target {
            return true;
        }
        let Ok(storage) = self.get_class(from) else {
            return false;
        };
        storage
            .parent_class
            .iter()
            .chain(&storage.used_traits)
            .chain(&storage.interfaces)
            .any(|ancestor| self.reaches(ancestor, target, depth + 1))
    }
}
