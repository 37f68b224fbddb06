//! Analysis context.
//!
//! A [`Context`] is the mutable, call-site scoped state the resolver reads
//! and updates: the enclosing class, variable types, which special pass is
//! running, and the visited set used while replaying method bodies.
//! [`FileSource`] is the per-file scope (namespace and imports) that stays
//! fixed while a file is analyzed.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::ast::Span;
use crate::ttype::Union;
use crate::types::{MethodId, fqcn_key};

#[derive(Debug, Clone)]
pub struct Context {
    /// Lexically enclosing class.
    pub self_class: Option<String>,
    /// Known variable types, keyed by variable id (`$x`, `$this->items`).
    pub vars_in_scope: BTreeMap<String, Union>,
    pub vars_possibly_in_scope: BTreeSet<String>,
    /// The method whose body is being analyzed.
    pub calling_method_id: Option<MethodId>,
    /// Collecting property mutations made by called methods.
    pub collect_mutations: bool,
    /// Collecting which properties the constructor initializes.
    pub collect_initializations: bool,
    /// Methods already replayed during the current initialization pass.
    /// Only `Some` inside [`Context::collect_initializations_with`].
    pub initialized_methods: Option<HashSet<MethodId>>,
    /// Lowercase names of classes that are not finalized yet.
    pub phantom_classes: HashSet<String>,
    pub check_classes: bool,
    pub check_methods: bool,
    /// Location reported for issues raised while replaying a callee.
    pub include_location: Option<Span>,
    /// Nesting of mutation replays.
    pub replay_depth: u32,
    /// The enclosing method is static.
    pub is_static: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            self_class: None,
            vars_in_scope: BTreeMap::new(),
            vars_possibly_in_scope: BTreeSet::new(),
            calling_method_id: None,
            collect_mutations: false,
            collect_initializations: false,
            initialized_methods: None,
            phantom_classes: HashSet::new(),
            check_classes: true,
            check_methods: true,
            include_location: None,
            replay_depth: 0,
            is_static: false,
        }
    }
}

impl Context {
    pub fn new(self_class: Option<&str>) -> Self {
        Self {
            self_class: self_class.map(|c| c.strip_prefix('\\').unwrap_or(c).to_string()),
            ..Self::default()
        }
    }

    pub fn get_var(&self, var_id: &str) -> Option<&Union> {
        self.vars_in_scope.get(var_id)
    }

    pub fn has_var(&self, var_id: &str) -> bool {
        self.vars_in_scope.contains_key(var_id)
    }

    pub fn set_var(&mut self, var_id: impl Into<String>, ty: Union) {
        let var_id = var_id.into();
        self.vars_possibly_in_scope.insert(var_id.clone());
        self.vars_in_scope.insert(var_id, ty);
    }

    pub fn remove_var(&mut self, var_id: &str) -> Option<Union> {
        self.vars_in_scope.remove(var_id)
    }

    /// Forget every property-derived variable type (`$a->b`, `Foo::$c`).
    pub fn remove_all_object_vars(&mut self) {
        self.vars_in_scope.retain(|var_id, _| !is_property_var(var_id));
    }

    /// Remove and return every local (non-property) variable except
    /// `$this`.
    pub fn take_local_vars(&mut self) -> BTreeMap<String, Union> {
        let (locals, kept): (BTreeMap<_, _>, BTreeMap<_, _>) = std::mem::take(&mut self.vars_in_scope)
            .into_iter()
            .partition(|(var_id, _)| var_id != "$this" && !is_property_var(var_id));
        self.vars_in_scope = kept;
        locals
    }

    /// Drop the current locals and put `locals` back.  Property variables
    /// keep whatever the replay left in them.
    pub fn restore_local_vars(&mut self, locals: BTreeMap<String, Union>) {
        self.vars_in_scope
            .retain(|var_id, _| var_id == "$this" || is_property_var(var_id));
        self.vars_in_scope.extend(locals);
    }

    /// Run `f` as one initialization-collection pass.
    ///
    /// The visited set lives exactly as long as `f`; previous pass flags are
    /// restored afterwards.
    pub fn collect_initializations_with<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let was_collecting = std::mem::replace(&mut self.collect_initializations, true);
        let previous_visited = self.initialized_methods.replace(HashSet::new());
        let result = f(self);
        self.collect_initializations = was_collecting;
        self.initialized_methods = previous_visited;
        result
    }

    pub fn add_phantom_class(&mut self, name: &str) {
        self.phantom_classes.insert(fqcn_key(name));
    }

    pub fn is_phantom_class(&self, name: &str) -> bool {
        !self.phantom_classes.is_empty() && self.phantom_classes.contains(&fqcn_key(name))
    }

    /// Whether a special property-tracking pass is running.
    pub fn is_collecting(&self) -> bool {
        self.collect_mutations || self.collect_initializations
    }
}

pub(crate) fn is_property_var(var_id: &str) -> bool {
    var_id.contains("->") || var_id.contains("::")
}

/// File-level scope: where the analyzed code lives.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    pub file_path: String,
    pub namespace: Option<String>,
    /// Import table: alias → FQCN.
    pub uses: HashMap<String, String>,
    /// Name of the file's own class-like, used as the container for calls
    /// made outside any class.
    pub class_name: Option<String>,
}

impl FileSource {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_use(mut self, alias: impl Into<String>, fqcn: impl Into<String>) -> Self {
        let fqcn = fqcn.into();
        let fqcn = fqcn.strip_prefix('\\').map(str::to_string).unwrap_or(fqcn);
        self.uses.insert(alias.into(), fqcn);
        self
    }
}
