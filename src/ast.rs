//! Static-call request model.
//!
//! The analyzer does not parse PHP.  Callers hand it an already-built
//! [`StaticCall`] plus the small expression / statement model below, which
//! covers what argument checking and method-body replay need to look at.

use serde::Serialize;

use crate::ttype::Union;

/// Byte range in the analyzed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

/// A class name as written in source.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    /// Raw text, possibly with a leading `\` (`\App\Foo`, `Foo`, `self`).
    pub value: String,
    pub span: Span,
}

impl Name {
    pub fn new(value: impl Into<String>, span: Span) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }

    pub fn is_fully_qualified(&self) -> bool {
        self.value.starts_with('\\')
    }

    /// The `self` / `static` / `parent` keyword this name spells, if any.
    pub fn keyword(&self) -> Option<ClassKeyword> {
        match self.value.to_ascii_lowercase().as_str() {
            "self" => Some(ClassKeyword::SelfClass),
            "static" => Some(ClassKeyword::Static),
            "parent" => Some(ClassKeyword::Parent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKeyword {
    SelfClass,
    Static,
    Parent,
}

/// The part before `::`.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassRef {
    Name(Name),
    /// `$cls::make()`, `(getClass())::make()`.
    Expr(Box<Expression>),
}

impl ClassRef {
    pub fn keyword(&self) -> Option<ClassKeyword> {
        match self {
            ClassRef::Name(name) => name.keyword(),
            ClassRef::Expr(_) => None,
        }
    }
}

/// The part after `::`.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodName {
    Identifier { value: String, span: Span },
    /// `Foo::$method()`, `Foo::{'bar'}()`.
    Dynamic(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub value: Expression,
    /// `...$args`
    pub unpack: bool,
    /// Named argument label without the colon.
    pub name: Option<String>,
}

impl Argument {
    pub fn positional(value: Expression) -> Self {
        Self {
            value,
            unpack: false,
            name: None,
        }
    }
}

/// `Class::method(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticCall {
    pub class: ClassRef,
    pub method: MethodName,
    pub args: Vec<Argument>,
    pub span: Span,
}

impl StaticCall {
    pub fn method_name(&self) -> Option<&str> {
        match &self.method {
            MethodName::Identifier { value, .. } => Some(value),
            MethodName::Dynamic(_) => None,
        }
    }

    pub fn method_span(&self) -> Span {
        match &self.method {
            MethodName::Identifier { span, .. } => *span,
            MethodName::Dynamic(expr) => expr.span().unwrap_or(self.span),
        }
    }
}

/// `$var->method(args)`, built by the resolver when a static-looking call
/// is really dispatched on the bound instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceCall {
    pub var_id: String,
    pub method: String,
    pub args: Vec<Argument>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `$x`, `$this`, or a property path such as `$this->items`.
    Variable { name: String, span: Span },
    /// A literal (`'abc'`, `42`, `null`, `true`) carried as its type.
    Literal(Union),
    /// `Foo::class`
    ClassConstant(Name),
    /// `[a, b, c]`
    Array(Vec<Expression>),
    StaticCall(Box<StaticCall>),
}

impl Expression {
    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable {
            name: name.into(),
            span: Span::default(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Expression::Variable { span, .. } => Some(*span),
            Expression::ClassConstant(name) => Some(name.span),
            Expression::StaticCall(call) => Some(call.span),
            Expression::Literal(_) | Expression::Array(_) => None,
        }
    }
}

/// Statements replayed from a method body.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `$target = value;` where `target` is a variable id
    /// (`$x`, `$this->prop`).
    Assign { target: String, value: Expression },
    Expression(Expression),
}
