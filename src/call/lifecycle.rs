//! Deprecation, `@internal`, visibility and static-context checks.

use std::sync::Arc;

use crate::ast::{ClassKeyword, StaticCall};
use crate::context::Context;
use crate::issue::IssueKind;
use crate::types::{ClassInfo, MethodId, fqcn_key, top_namespace_segment};
use crate::{AnalysisResult, Analyzer};

/// How a call that passed the static-context check is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dispatch {
    Static,
    /// A non-static method reached through `self::` / `static::` from an
    /// instance method: the call runs on `$this`.
    DynamicThis,
}

impl Analyzer {
    /// `DeprecatedClass` and `InternalClass`.  Both are informational and
    /// never stop resolution.
    pub(crate) fn check_class_lifecycle(&mut self, class: &ClassInfo, call: &StaticCall, ctx: &Context) {
        if class.is_deprecated {
            let _ = self.report(
                IssueKind::DeprecatedClass,
                format!("{} is marked deprecated", class.name),
                call.span,
                ctx,
            );
        }

        if class.is_internal
            && !ctx.is_collecting()
            && let Some(self_class) = ctx.self_class.as_deref()
            && !same_root_namespace(self_class, &class.name)
        {
            let _ = self.report(
                IssueKind::InternalClass,
                format!("{} is marked internal", class.name),
                call.span,
                ctx,
            );
        }
    }

    /// `InaccessibleMethod` when the caller may not see the method.
    pub(crate) fn check_method_visibility(
        &mut self,
        method_id: &MethodId,
        call: &StaticCall,
        ctx: &Context,
    ) -> AnalysisResult<()> {
        let project = Arc::clone(self.project());
        let codebase = &project.codebase;
        let Some(lookup) = codebase.find_method(method_id.class(), method_id.method()) else {
            return Ok(());
        };
        if codebase.is_method_visible(&lookup, ctx.self_class.as_deref()) {
            return Ok(());
        }
        let visibility = lookup
            .storage()
            .map(|m| format!("{:?}", m.visibility).to_ascii_lowercase())
            .unwrap_or_default();
        let from = ctx.self_class.as_deref().unwrap_or("global scope");
        self.report_or_fatal(
            IssueKind::InaccessibleMethod,
            format!("Cannot access {visibility} method {} from context {from}", lookup.declaring),
            call.method_span(),
            ctx,
        )
    }

    /// Decide whether a static-looking call is really a call on `$this`,
    /// reporting calls to instance methods from a static context.
    pub(crate) fn check_static_context(
        &mut self,
        method_id: &MethodId,
        fq_class_name: &str,
        call: &StaticCall,
        ctx: &Context,
    ) -> Dispatch {
        let project = Arc::clone(self.project());
        let codebase = &project.codebase;
        let keyword = call.class.keyword();

        let applies = (keyword != Some(ClassKeyword::Parent) || ctx.is_static)
            && match ctx.self_class.as_deref() {
                None => true,
                Some(self_class) => ctx.is_static || !codebase.class_extends(self_class, fq_class_name),
            };
        if !applies {
            return Dispatch::Static;
        }

        let Some(storage) = codebase.method_storage(method_id) else {
            return Dispatch::Static;
        };
        if storage.is_static {
            return Dispatch::Static;
        }

        let self_call = matches!(keyword, Some(ClassKeyword::SelfClass | ClassKeyword::Static))
            || ctx
                .self_class
                .as_deref()
                .is_some_and(|s| fqcn_key(s) == fqcn_key(fq_class_name));
        let message = format!("Method {method_id} is not static");
        if self_call {
            if !ctx.is_static {
                return Dispatch::DynamicThis;
            }
            let _ = self.report(IssueKind::NonStaticSelfCall, message, call.span, ctx);
        } else {
            let _ = self.report(IssueKind::InvalidStaticInvocation, message, call.span, ctx);
        }
        Dispatch::Static
    }

    /// `DeprecatedMethod` and `InternalMethod` for the declaration the call
    /// lands on.
    pub(crate) fn check_method_lifecycle(&mut self, method_id: &MethodId, call: &StaticCall, ctx: &Context) {
        let project = Arc::clone(self.project());
        let codebase = &project.codebase;
        let Some(lookup) = codebase.find_method(method_id.class(), method_id.method()) else {
            return;
        };
        let Some(storage) = lookup.storage() else {
            return;
        };

        if storage.is_deprecated {
            let _ = self.report(
                IssueKind::DeprecatedMethod,
                format!("The method {} has been marked as deprecated", lookup.declaring),
                call.method_span(),
                ctx,
            );
        }

        if storage.is_internal
            && !ctx.is_collecting()
            && let Some(self_class) = ctx.self_class.as_deref()
            && !same_root_namespace(self_class, lookup.declaring.class())
        {
            let _ = self.report(
                IssueKind::InternalMethod,
                format!("The method {} has been marked as internal", lookup.declaring),
                call.method_span(),
                ctx,
            );
        }
    }
}

fn same_root_namespace(a: &str, b: &str) -> bool {
    top_namespace_segment(a).eq_ignore_ascii_case(top_namespace_segment(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_namespace_comparison_ignores_case() {
        assert!(same_root_namespace("App\\Http\\Controller", "app\\Models\\User"));
        assert!(!same_root_namespace("Vendor\\Lib", "App\\Lib"));
        assert!(same_root_namespace("Foo", "Foo"));
    }
}
