//! Work done after a receiver atomic resolved, and once the whole call is
//! through.

use std::sync::Arc;

use super::CallResult;
use crate::analysis::CallArgs;
use crate::analysis::assertions::apply_assertions;
use crate::ast::StaticCall;
use crate::context::Context;
use crate::plugin::AfterCallEvent;
use crate::ttype::{TemplateResult, Union};
use crate::types::MethodId;
use crate::{AnalysisResult, Analyzer};

impl Analyzer {
    /// Narrow the caller's context with the method's assertions and
    /// attach its conditional assertions to `result`.
    pub(crate) fn apply_call_assertions(
        &mut self,
        method_id: &MethodId,
        args: &CallArgs,
        templates: &TemplateResult,
        result: &mut CallResult,
        ctx: &mut Context,
    ) {
        let Some(storage) = self.codebase().method_storage(method_id) else {
            return;
        };

        if !storage.assertions.is_empty() {
            apply_assertions(
                &storage.assertions,
                &storage.parameters,
                args.args(),
                templates,
                self.codebase(),
                ctx,
            );
        }
        if !storage.if_true_assertions.is_empty() {
            result.if_true_assertions = storage
                .if_true_assertions
                .iter()
                .map(|a| a.untemplated_copy(templates))
                .collect();
        }
        if !storage.if_false_assertions.is_empty() {
            result.if_false_assertions = storage
                .if_false_assertions
                .iter()
                .map(|a| a.untemplated_copy(templates))
                .collect();
        }
    }

    /// Run the enabled after-call plugins.  They may replace
    /// `return_type`; their file edits are queued on the analyzer.
    pub(crate) fn run_after_call_plugins(
        &mut self,
        call: &StaticCall,
        method_id: &MethodId,
        return_type: &mut Option<Union>,
        ctx: &Context,
    ) {
        let project = Arc::clone(self.project());
        let enabled = &project.config.after_call_plugins;
        if enabled.is_empty() {
            return;
        }
        let codebase = &project.codebase;
        let Some(lookup) = codebase.find_method(method_id.class(), method_id.method()) else {
            return;
        };

        let event = AfterCallEvent {
            call,
            method_id: *method_id,
            appearing_method_id: lookup.appearing,
            declaring_method_id: lookup.declaring,
            context: ctx,
            source: &self.source,
            codebase,
        };
        let mut manipulations = Vec::new();
        for plugin in project.plugins.enabled(enabled) {
            tracing::trace!(plugin = plugin.name(), method = %method_id, "running after-call plugin");
            plugin.after_static_call(&event, &mut manipulations, return_type);
        }
        if !manipulations.is_empty() {
            self.manipulations.add_many(manipulations);
        }
    }

    /// Once every receiver atomic has been visited.
    pub(crate) fn finish_static_call(
        &mut self,
        call: &StaticCall,
        args: &mut CallArgs,
        result: &CallResult,
        ctx: &mut Context,
    ) -> AnalysisResult<()> {
        if result.method_id.is_none() {
            self.analyze_call_args(args, ctx)?;
        } else if !self.config().remember_property_assignments_after_call && !ctx.collect_initializations {
            ctx.remove_all_object_vars();
        }

        if !ctx.is_collecting()
            && let Some(ty) = &result.inferred_type
        {
            self.node_data.set_type(call.span, ty.clone());
        }
        Ok(())
    }
}
