//! Instance-call resolution.
//!
//! Only used when a static-looking call such as `self::format()` from a
//! non-static method actually dispatches on `$this`.  The receiver type is
//! read from the context; each named object in it is looked up in the
//! method table, its arguments are checked and its declared return type is
//! bound and fleshed out with the object as `static`.

use crate::analysis::CallArgs;
use crate::ast::InstanceCall;
use crate::context::Context;
use crate::issue::IssueKind;
use crate::ttype::Union;
use crate::types::MethodId;
use crate::{AnalysisResult, Analyzer};

impl Analyzer {
    pub fn analyze_instance_call(&mut self, call: &InstanceCall, ctx: &mut Context) -> AnalysisResult<Option<Union>> {
        let mut args = CallArgs::new(&call.args);
        self.analyze_instance_call_with(call, &mut args, ctx)
    }

    /// Same as [`Analyzer::analyze_instance_call`], reusing argument types
    /// already evaluated for `args`.
    pub(crate) fn analyze_instance_call_with(
        &mut self,
        call: &InstanceCall,
        args: &mut CallArgs,
        ctx: &mut Context,
    ) -> AnalysisResult<Option<Union>> {
        let receiver = match ctx.get_var(&call.var_id) {
            Some(ty) => Some(ty.clone()),
            None if call.var_id == "$this" => ctx.self_class.as_deref().map(Union::named),
            None => None,
        };
        let Some(receiver) = receiver else {
            self.analyze_call_args(args, ctx)?;
            return Ok(None);
        };

        let project = std::sync::Arc::clone(self.project());
        let codebase = &project.codebase;
        let mut inferred: Option<Union> = None;

        for object in receiver.named_objects() {
            let method_id = MethodId::new(&object.name, &call.method);
            let Some(lookup) = codebase.find_method(&object.name, &call.method) else {
                let verdict = self.report(
                    IssueKind::UndefinedMethod,
                    format!("Method {method_id} does not exist"),
                    call.span,
                    ctx,
                );
                self.analyze_call_args(args, ctx)?;
                if verdict.is_fatal() {
                    return Err(crate::Fatal);
                }
                continue;
            };

            let mut templates = codebase.bind_receiver_templates(object, lookup.declaring.class());
            self.check_method_args(&method_id, args, &mut templates, call.span, ctx)?;

            if let Some(declared) = codebase.method_return_type(&method_id) {
                let parent = codebase
                    .get_class(&declared.self_class)
                    .ok()
                    .and_then(|c| c.parent_class.clone());
                let ty = declared
                    .ty
                    .replace_template_types(&templates)
                    .flesh_out(&declared.self_class, &object.name, parent.as_deref());
                inferred = Some(Union::combine_into(inferred, &ty));
            }
        }

        Ok(inferred)
    }
}
