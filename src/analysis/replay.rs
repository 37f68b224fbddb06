//! Method-body replay.
//!
//! Replaying runs a callee's body in a context that shares the caller's
//! `$this` property state, then copies whatever the body left behind back
//! into the caller.  Locals of the callee start empty and only property
//! variables are merged back, so callee locals never reach the caller.

use crate::context::{Context, is_property_var};
use crate::types::MethodId;
use crate::Analyzer;

impl Analyzer {
    /// Replay the body of `method_id` against `ctx`.
    ///
    /// Methods not declared in user code have no body and are ignored.
    /// Statements aborted by a fatal issue do not stop the replay.
    pub(crate) fn replay_method_body(&mut self, method_id: &MethodId, ctx: &mut Context) {
        let Some(storage) = self.codebase().user_method_storage(method_id) else {
            tracing::trace!(method = %method_id, "no user body to replay");
            return;
        };
        tracing::debug!(method = %method_id, statements = storage.body.len(), "replaying method body");
        self.replayed.push(*method_id);

        let mut call_ctx = Context {
            self_class: ctx.self_class.clone(),
            calling_method_id: Some(*method_id),
            collect_mutations: ctx.collect_mutations,
            collect_initializations: ctx.collect_initializations,
            initialized_methods: ctx.initialized_methods.take(),
            phantom_classes: ctx.phantom_classes.clone(),
            check_classes: ctx.check_classes,
            check_methods: ctx.check_methods,
            include_location: ctx.include_location,
            replay_depth: ctx.replay_depth,
            is_static: storage.is_static,
            ..Context::default()
        };
        for var_id in ctx.vars_possibly_in_scope.iter().filter(|v| v.starts_with("$this->")) {
            call_ctx.vars_possibly_in_scope.insert(var_id.clone());
        }
        for (var_id, ty) in ctx.vars_in_scope.iter().filter(|(v, _)| v.starts_with("$this->")) {
            call_ctx.vars_in_scope.insert(var_id.clone(), ty.clone());
        }
        if let Some(this) = ctx.get_var("$this") {
            call_ctx.set_var("$this", this.clone());
        }

        self.analyze_statements(&storage.body, &mut call_ctx);

        ctx.initialized_methods = call_ctx.initialized_methods.take();
        ctx.vars_possibly_in_scope
            .extend(call_ctx.vars_possibly_in_scope.into_iter().filter(|v| is_property_var(v)));
        ctx.vars_in_scope
            .extend(call_ctx.vars_in_scope.into_iter().filter(|(v, _)| is_property_var(v)));
    }
}
