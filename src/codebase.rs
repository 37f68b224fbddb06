//! Class repository.
//!
//! [`Codebase`] owns the class storage shared by every file analysis.  It
//! is safe to read from several threads: storage sits behind a
//! `parking_lot::RwLock` and misses are filled lazily through an optional
//! loader.  Population of one slot happens under the write lock after a
//! re-check, so every entry has a single writer.
//!
//! Method-table queries (`declaring_method_id`, `method_return_type`, …)
//! live in [`crate::inheritance`].

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::{ClassInfo, ClassKind, fqcn_key};

/// Lazily supplies class storage on a repository miss.
///
/// The loader is called while the repository's write lock is held and
/// must not query the same [`Codebase`].
pub type ClassLoader = dyn Fn(&str) -> Option<ClassInfo> + Send + Sync;

/// The class is not in the repository and the loader does not know it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("class {0} does not exist")]
pub struct NotFound(pub String);

/// Depth limit for every walk over the class hierarchy.
pub(crate) const MAX_DEPTH: u32 = 20;

#[derive(Default)]
pub struct Codebase {
    classes: RwLock<HashMap<String, Arc<ClassInfo>>>,
    /// Keys the loader already failed to produce.
    misses: RwLock<HashSet<String>>,
    loader: Option<Box<ClassLoader>>,
}

impl std::fmt::Debug for Codebase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codebase")
            .field("classes", &self.classes.read().len())
            .field("has_loader", &self.loader.is_some())
            .finish()
    }
}

impl Codebase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loader(loader: impl Fn(&str) -> Option<ClassInfo> + Send + Sync + 'static) -> Self {
        Self {
            loader: Some(Box::new(loader)),
            ..Self::default()
        }
    }

    /// Insert class storage, replacing any previous entry with the same
    /// name.
    ///
    /// Method names are unique per class ignoring case; a later
    /// declaration that collides with an earlier one is dropped.
    pub fn add_class(&self, class: ClassInfo) -> Arc<ClassInfo> {
        let class = Arc::new(dedupe_methods(class));
        let key = fqcn_key(&class.name);
        self.misses.write().remove(&key);
        self.classes.write().insert(key, Arc::clone(&class));
        class
    }

    /// Fetch class storage, consulting the loader on a miss.
    pub fn get_class(&self, name: &str) -> Result<Arc<ClassInfo>, NotFound> {
        let key = fqcn_key(name);
        if let Some(class) = self.classes.read().get(&key) {
            return Ok(Arc::clone(class));
        }

        let Some(loader) = self.loader.as_ref() else {
            return Err(NotFound(name.to_string()));
        };
        if self.misses.read().contains(&key) {
            return Err(NotFound(name.to_string()));
        }

        let mut classes = self.classes.write();
        // Another reader may have filled the slot while we waited.
        if let Some(class) = classes.get(&key) {
            return Ok(Arc::clone(class));
        }
        match loader(name.strip_prefix('\\').unwrap_or(name)) {
            Some(class) => {
                tracing::trace!(class = %class.name, "loaded class storage");
                let class = Arc::new(dedupe_methods(class));
                classes.insert(key, Arc::clone(&class));
                Ok(class)
            }
            None => {
                drop(classes);
                self.misses.write().insert(key);
                Err(NotFound(name.to_string()))
            }
        }
    }

    pub fn class_exists(&self, name: &str) -> bool {
        self.get_class(name).is_ok()
    }

    /// Number of classes currently held.
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// Whether `child` has `ancestor` somewhere in its `extends` chain.
    /// A class does not extend itself.
    pub fn class_extends(&self, child: &str, ancestor: &str) -> bool {
        let target = fqcn_key(ancestor);
        let mut current = self.get_class(child).ok();
        let mut depth = 0;
        while let Some(class) = current {
            depth += 1;
            if depth > MAX_DEPTH {
                break;
            }
            let Some(parent) = class.parent_class.as_deref() else {
                break;
            };
            if fqcn_key(parent) == target {
                return true;
            }
            current = self.get_class(parent).ok();
        }
        false
    }

    /// Whether `class` or one of its ancestors implements `interface`,
    /// directly or through interface inheritance.
    pub fn class_implements(&self, class: &str, interface: &str) -> bool {
        let target = fqcn_key(interface);
        let mut stack = vec![(class.to_string(), 0u32)];
        let mut seen = HashSet::new();
        while let Some((name, depth)) = stack.pop() {
            if depth > MAX_DEPTH || !seen.insert(fqcn_key(&name)) {
                continue;
            }
            let Ok(storage) = self.get_class(&name) else {
                continue;
            };
            for parent_interface in &storage.interfaces {
                if fqcn_key(parent_interface) == target {
                    return true;
                }
                stack.push((parent_interface.clone(), depth + 1));
            }
            if let Some(parent) = &storage.parent_class {
                stack.push((parent.clone(), depth + 1));
            }
        }
        false
    }

    /// Whether `class` directly uses the trait `trait_name`.
    pub fn class_uses_trait(&self, class: &str, trait_name: &str) -> bool {
        let target = fqcn_key(trait_name);
        self.get_class(class)
            .map(|c| c.used_traits.iter().any(|t| fqcn_key(t) == target))
            .unwrap_or(false)
    }

    pub fn trait_exists(&self, name: &str) -> bool {
        self.get_class(name)
            .map(|c| c.kind == ClassKind::Trait)
            .unwrap_or(false)
    }

    /// `child` is `ancestor`, extends it, or implements it.
    pub fn is_subclass_or_same(&self, child: &str, ancestor: &str) -> bool {
        fqcn_key(child) == fqcn_key(ancestor)
            || self.class_extends(child, ancestor)
            || self.class_implements(child, ancestor)
    }

    /// The stored (cased) name of a class, or `name` unchanged when the
    /// class is unknown.
    pub fn cased_name(&self, name: &str) -> String {
        self.get_class(name)
            .map(|c| c.name.clone())
            .unwrap_or_else(|_| name.strip_prefix('\\').unwrap_or(name).to_string())
    }
}

fn dedupe_methods(mut class: ClassInfo) -> ClassInfo {
    let mut seen = HashSet::new();
    let class_name = class.name.clone();
    class.methods.retain(|method| {
        let fresh = seen.insert(method.name.to_ascii_lowercase());
        if !fresh {
            tracing::warn!(
                class = %class_name,
                method = %method.name,
                "duplicate method declaration ignored"
            );
        }
        fresh
    });
    class
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MethodInfo;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn lookups_are_case_insensitive() {
        let codebase = Codebase::new();
        codebase.add_class(ClassInfo::new("App\\Base", ClassKind::Class));
        codebase.add_class(ClassInfo::new("App\\Child", ClassKind::Class).with_parent("App\\Base"));
        assert!(codebase.class_exists("\\APP\\child"));
        assert!(codebase.class_extends("app\\child", "App\\BASE"));
        assert!(!codebase.class_extends("App\\Base", "App\\Base"));
    }

    #[test]
    fn duplicate_methods_are_dropped() {
        let codebase = Codebase::new();
        let class = ClassInfo::new("Foo", ClassKind::Class)
            .with_method(MethodInfo::new("run").with_static(true))
            .with_method(MethodInfo::new("RUN"));
        let stored = codebase.add_class(class);
        assert_eq!(stored.methods.len(), 1);
        assert!(stored.methods[0].is_static);
    }

    #[test]
    fn loader_fills_misses_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let codebase = Codebase::with_loader(move |name| {
            counter.fetch_add(1, Ordering::SeqCst);
            (name == "Lazy").then(|| ClassInfo::new("Lazy", ClassKind::Class))
        });
        assert!(codebase.class_exists("Lazy"));
        assert!(codebase.class_exists("lazy"));
        assert!(!codebase.class_exists("Missing"));
        assert!(!codebase.class_exists("Missing"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn implements_through_parent_and_interface_inheritance() {
        let codebase = Codebase::new();
        codebase.add_class(ClassInfo::new("Countable", ClassKind::Interface));
        codebase.add_class(ClassInfo::new("Sized", ClassKind::Interface).with_interface("Countable"));
        codebase.add_class(ClassInfo::new("Base", ClassKind::Class).with_interface("Sized"));
        codebase.add_class(ClassInfo::new("Child", ClassKind::Class).with_parent("Base"));
        assert!(codebase.class_implements("Child", "Countable"));
        assert!(codebase.is_subclass_or_same("Child", "Base"));
    }
}
