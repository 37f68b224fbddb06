//! Replay of `self`-relative callees during property passes.
//!
//! While collecting mutations or constructor initializations, a call into
//! a method of the enclosing class (or one it inherits) runs that method's
//! body so its effects on `$this` properties are seen by the caller.
//! Initialization passes replay each method at most once per pass and keep
//! the caller's locals intact; mutation passes are bounded by depth.

use std::collections::HashSet;
use std::sync::Arc;

use crate::ast::StaticCall;
use crate::context::Context;
use crate::issue::IssueKind;
use crate::ttype::Union;
use crate::types::{MethodId, fqcn_key};
use crate::Analyzer;

/// Nesting limit for mutation replays.
const MAX_REPLAY_DEPTH: u32 = 8;

impl Analyzer {
    /// Replay `method_id` if the call qualifies.  Returns `false` when the
    /// method has no appearing declaration, in which case the receiver
    /// atomic is skipped.
    pub(crate) fn replay_self_call(&mut self, call: &StaticCall, method_id: &MethodId, ctx: &mut Context) -> bool {
        let project = Arc::clone(self.project());
        let codebase = &project.codebase;

        let Some(appearing) = codebase.appearing_method_id(method_id) else {
            let _ = self.report(
                IssueKind::UndefinedMethod,
                format!("Method {method_id} does not exist"),
                call.method_span(),
                ctx,
            );
            return false;
        };
        let Some(old_self) = ctx.self_class.clone() else {
            return true;
        };
        let is_self_relative = fqcn_key(&old_self) == appearing.class_key()
            || codebase.class_extends(&old_self, appearing.class());
        if !is_self_relative {
            return true;
        }

        let old_include = ctx.include_location.replace(call.span);
        ctx.self_class = Some(appearing.class().to_string());

        if ctx.collect_mutations {
            if ctx.replay_depth < MAX_REPLAY_DEPTH {
                ctx.replay_depth += 1;
                self.replay_method_body(method_id, ctx);
                ctx.replay_depth -= 1;
            } else {
                tracing::debug!(method = %method_id, "mutation replay depth reached");
            }
        } else {
            let first_visit = ctx
                .initialized_methods
                .get_or_insert_with(HashSet::new)
                .insert(*method_id);
            if first_visit {
                let locals = ctx.take_local_vars();
                self.replay_method_body(method_id, ctx);
                ctx.restore_local_vars(locals);
            } else {
                tracing::trace!(method = %method_id, "already initialized in this pass");
            }
        }

        ctx.include_location = old_include;
        ctx.self_class = Some(old_self.clone());
        if ctx.has_var("$this") {
            ctx.set_var("$this", Union::named(old_self));
        }
        true
    }
}
