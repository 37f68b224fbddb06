//! Collaborators of the static-call resolver.
//!
//! These are deliberately small reference implementations of the pieces a
//! full checker would provide: typing of the few expression forms in
//! [`crate::ast`], argument checking against a signature, instance-call
//! resolution for calls rewritten onto `$this`, assertion narrowing and
//! method-body replay.
//!
//! - [`arguments`]: argument typing, arity and type checks, template
//!   inference from arguments.
//! - [`assertions`]: applying `@psalm-assert` facts to the context.
//! - [`instance_call`]: `$var->method()` resolution.
//! - [`replay`]: running a callee's body for its effects on `$this`.

pub mod arguments;
pub mod assertions;
pub mod instance_call;
pub mod replay;

pub use arguments::{CallArgs, is_contained_by};

use crate::ast::{ClassKeyword, Expression, Name, Statement};
use crate::context::Context;
use crate::resolution::resolve_class_name;
use crate::ttype::{Atomic, Union};
use crate::{AnalysisResult, Analyzer};

impl Analyzer {
    /// Type of `expr`, or `None` when nothing is known about it.
    pub fn analyze_expression(&mut self, expr: &Expression, ctx: &mut Context) -> AnalysisResult<Option<Union>> {
        match expr {
            Expression::Variable { name, .. } => Ok(self.variable_type(name, ctx)),
            Expression::Literal(ty) => Ok(Some(ty.clone())),
            Expression::ClassConstant(name) => Ok(self
                .class_constant_name(name, ctx)
                .map(|fq| Union::from_atomic(Atomic::LiteralClassString(fq)))),
            Expression::Array(items) => {
                let mut value: Option<Union> = None;
                for item in items {
                    let item_type = self.analyze_expression(item, ctx)?.unwrap_or_else(Union::mixed);
                    value = Some(Union::combine_into(value, &item_type));
                }
                Ok(Some(match value {
                    Some(value) => Union::from_atomic(Atomic::List(Box::new(value))),
                    None => Union::from_atomic(Atomic::Array {
                        key: Box::new(Union::mixed()),
                        value: Box::new(Union::mixed()),
                    }),
                }))
            }
            Expression::StaticCall(call) => Ok(self.analyze_static_call(call, ctx)?.inferred_type),
        }
    }

    /// Analyze one statement.  A fatal diagnostic aborts the statement and
    /// is returned to the caller, which moves on to the next statement.
    pub fn analyze_statement(&mut self, stmt: &Statement, ctx: &mut Context) -> AnalysisResult<()> {
        match stmt {
            Statement::Assign { target, value } => {
                let ty = self.analyze_expression(value, ctx)?.unwrap_or_else(Union::mixed);
                ctx.set_var(target.clone(), ty);
            }
            Statement::Expression(expr) => {
                self.analyze_expression(expr, ctx)?;
            }
        }
        Ok(())
    }

    /// Analyze a list of statements, continuing past statements that were
    /// aborted by a fatal diagnostic.  Returns how many were aborted.
    pub fn analyze_statements(&mut self, stmts: &[Statement], ctx: &mut Context) -> usize {
        let mut aborted = 0;
        for stmt in stmts {
            if self.analyze_statement(stmt, ctx).is_err() {
                tracing::debug!("statement aborted by a fatal issue");
                aborted += 1;
            }
        }
        aborted
    }

    fn variable_type(&self, name: &str, ctx: &Context) -> Option<Union> {
        if let Some(ty) = ctx.get_var(name) {
            return Some(ty.clone());
        }
        if name == "$this" {
            return ctx.self_class.as_deref().map(Union::named);
        }
        None
    }

    /// The class named by `Foo::class`, `self::class` and friends.
    fn class_constant_name(&self, name: &Name, ctx: &Context) -> Option<String> {
        match name.keyword() {
            Some(ClassKeyword::SelfClass | ClassKeyword::Static) => ctx.self_class.clone(),
            Some(ClassKeyword::Parent) => {
                let self_class = ctx.self_class.as_deref()?;
                let storage = self.codebase().get_class(self_class).ok()?;
                storage
                    .parent_class
                    .as_deref()
                    .map(|parent| self.codebase().cased_name(parent))
            }
            None => Some(resolve_class_name(&name.value, self.source())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::Project;
    use crate::ast::{Span, Statement};
    use crate::codebase::Codebase;
    use crate::config::AnalyzerConfig;
    use crate::context::FileSource;
    use crate::issue::IssueSettings;

    fn analyzer() -> Analyzer {
        let project = Project::new(Codebase::new(), AnalyzerConfig::default());
        Analyzer::new(
            Arc::new(project),
            FileSource::new("test.php").with_namespace("App"),
            IssueSettings::default(),
        )
    }

    #[test]
    fn array_literal_becomes_list() {
        let mut analyzer = analyzer();
        let mut ctx = Context::new(None);
        let expr = Expression::Array(vec![
            Expression::Literal(Union::from_atomic(Atomic::LiteralInt(1))),
            Expression::Literal(Union::from_atomic(Atomic::LiteralString("a".into()))),
        ]);
        let ty = analyzer.analyze_expression(&expr, &mut ctx).expect("not fatal");
        assert_eq!(ty.map(|t| t.to_string()).as_deref(), Some("list<1|'a'>"));
    }

    #[test]
    fn class_constant_is_qualified() {
        let mut analyzer = analyzer();
        let mut ctx = Context::new(None);
        let expr = Expression::ClassConstant(Name::new("Foo", Span::default()));
        let ty = analyzer.analyze_expression(&expr, &mut ctx).expect("not fatal");
        assert_eq!(ty.map(|t| t.to_string()).as_deref(), Some("App\\Foo::class"));
    }

    #[test]
    fn assignment_sets_variable() {
        let mut analyzer = analyzer();
        let mut ctx = Context::new(None);
        let stmt = Statement::Assign {
            target: "$x".into(),
            value: Expression::Literal(Union::from_atomic(Atomic::Int)),
        };
        analyzer.analyze_statement(&stmt, &mut ctx).expect("not fatal");
        assert_eq!(ctx.get_var("$x").map(ToString::to_string).as_deref(), Some("int"));
    }
}
