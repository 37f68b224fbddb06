//! Parser for the PHP-like call snippets used in scenarios.
//!
//! Accepted forms:
//!
//! ```text
//! statement := variable '=' expr | expr
//! expr      := class '::' method '(' args ')'
//!            | variable | string | int | null | true | false
//!            | Name '::class' | '[' expr, ... ']'
//! class     := Name | variable
//! method    := identifier | variable
//! arg       := ['...'] [identifier ':'] expr
//! ```
//!
//! Variables may carry a property path (`$this->items`).  Spans are byte
//! offsets into the snippet.

use crate::ast::{Argument, ClassRef, Expression, MethodName, Name, Span, Statement, StaticCall};
use crate::ttype::{Atomic, Union};

/// Parse one statement.  A trailing `;` is allowed.
pub fn parse_statement(src: &str) -> Result<Statement, String> {
    let mut parser = Parser { src, pos: 0 };
    let stmt = parser.statement()?;
    parser.skip_ws();
    parser.eat(";");
    parser.skip_ws();
    if parser.pos < src.len() {
        return Err(format!("unexpected input at offset {}: `{}`", parser.pos, &src[parser.pos..]));
    }
    Ok(stmt)
}

/// Parse a snippet that must be a static call.
pub fn parse_static_call(src: &str) -> Result<StaticCall, String> {
    match parse_statement(src)? {
        Statement::Expression(Expression::StaticCall(call)) => Ok(*call),
        _ => Err(format!("`{src}` is not a static call")),
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn statement(&mut self) -> Result<Statement, String> {
        self.skip_ws();
        let start = self.pos;
        if let Some(target) = self.variable() {
            self.skip_ws();
            if self.peek() == Some('=') && !self.rest().starts_with("==") {
                self.pos += 1;
                let value = self.expr()?;
                return Ok(Statement::Assign { target, value });
            }
        }
        self.pos = start;
        Ok(Statement::Expression(self.expr()?))
    }

    fn expr(&mut self) -> Result<Expression, String> {
        self.skip_ws();
        let start = self.pos as u32;
        match self.peek() {
            Some('$') => {
                let name = self.variable().ok_or_else(|| self.error("expected a variable"))?;
                let variable = Expression::Variable {
                    name,
                    span: Span::new(start, self.pos as u32),
                };
                if self.eat("::") {
                    return self.static_call(ClassRef::Expr(Box::new(variable)), start);
                }
                Ok(variable)
            }
            Some(quote @ ('\'' | '"')) => self.string(quote),
            Some(c) if c.is_ascii_digit() || c == '-' => self.int(),
            Some('[') => self.array(),
            Some(c) if is_name_start(c) => {
                let value = self.name();
                let name_span = Span::new(start, self.pos as u32);
                self.skip_ws();
                if !self.rest().starts_with("::") {
                    return keyword_literal(&value).ok_or_else(|| self.error("expected `::` after class name"));
                }
                self.pos += 2;
                let name = Name::new(value, name_span);
                self.skip_ws();
                if self.rest_starts_with_word("class") {
                    let after = self.pos + "class".len();
                    let mut probe = Parser { src: self.src, pos: after };
                    probe.skip_ws();
                    if probe.peek() != Some('(') {
                        self.pos = after;
                        return Ok(Expression::ClassConstant(name));
                    }
                }
                self.static_call(ClassRef::Name(name), start)
            }
            _ => Err(self.error("expected an expression")),
        }
    }

    fn static_call(&mut self, class: ClassRef, start: u32) -> Result<Expression, String> {
        self.skip_ws();
        let method_start = self.pos as u32;
        let method = match self.peek() {
            Some('$') => {
                let name = self.variable().ok_or_else(|| self.error("expected a method name"))?;
                MethodName::Dynamic(Box::new(Expression::Variable {
                    name,
                    span: Span::new(method_start, self.pos as u32),
                }))
            }
            Some(c) if is_ident_start(c) => {
                let value = self.ident();
                MethodName::Identifier {
                    value,
                    span: Span::new(method_start, self.pos as u32),
                }
            }
            _ => return Err(self.error("expected a method name")),
        };
        self.skip_ws();
        if !self.eat("(") {
            return Err(self.error("expected `(`"));
        }
        let args = self.args()?;
        Ok(Expression::StaticCall(Box::new(StaticCall {
            class,
            method,
            args,
            span: Span::new(start, self.pos as u32),
        })))
    }

    fn args(&mut self) -> Result<Vec<Argument>, String> {
        let mut args = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(")") {
                return Ok(args);
            }
            if !args.is_empty() && !self.eat(",") {
                return Err(self.error("expected `,` or `)`"));
            }
            self.skip_ws();
            if self.eat(")") {
                return Ok(args);
            }
            let unpack = self.eat("...");
            self.skip_ws();
            let name = self.named_arg_label();
            let value = self.expr()?;
            args.push(Argument { value, unpack, name });
        }
    }

    /// `label:` in front of a named argument, but not `Foo::`.
    fn named_arg_label(&mut self) -> Option<String> {
        let start = self.pos;
        if !self.peek().is_some_and(is_ident_start) {
            return None;
        }
        let label = self.ident();
        self.skip_ws();
        if self.peek() == Some(':') && !self.rest().starts_with("::") {
            self.pos += 1;
            return Some(label);
        }
        self.pos = start;
        None
    }

    fn array(&mut self) -> Result<Expression, String> {
        self.eat("[");
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat("]") {
                return Ok(Expression::Array(items));
            }
            if !items.is_empty() {
                if !self.eat(",") {
                    return Err(self.error("expected `,` or `]`"));
                }
                self.skip_ws();
                if self.eat("]") {
                    return Ok(Expression::Array(items));
                }
            }
            items.push(self.expr()?);
        }
    }

    fn string(&mut self, quote: char) -> Result<Expression, String> {
        self.pos += 1;
        let body_start = self.pos;
        let Some(len) = self.rest().find(quote) else {
            return Err(self.error("unterminated string"));
        };
        let value = self.src[body_start..body_start + len].to_string();
        self.pos = body_start + len + 1;
        Ok(Expression::Literal(Union::from_atomic(Atomic::LiteralString(value))))
    }

    fn int(&mut self) -> Result<Expression, String> {
        let start = self.pos;
        self.eat("-");
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.src[start..self.pos]
            .parse::<i64>()
            .map(|value| Expression::Literal(Union::from_atomic(Atomic::LiteralInt(value))))
            .map_err(|_| self.error("invalid integer"))
    }

    /// `$name` with an optional `->prop` path.
    fn variable(&mut self) -> Option<String> {
        let start = self.pos;
        if !self.eat("$") || !self.peek().is_some_and(is_ident_start) {
            self.pos = start;
            return None;
        }
        self.ident();
        while self.rest().starts_with("->") {
            let before = self.pos;
            self.pos += 2;
            if !self.peek().is_some_and(is_ident_start) {
                self.pos = before;
                break;
            }
            self.ident();
        }
        Some(self.src[start..self.pos].to_string())
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        self.src[start..self.pos].to_string()
    }

    /// A possibly qualified class name (`\App\Foo`).
    fn name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '\\')
        {
            self.pos += 1;
        }
        self.src[start..self.pos].to_string()
    }

    fn rest_starts_with_word(&self, word: &str) -> bool {
        let rest = self.rest();
        rest.len() >= word.len()
            && rest[..word.len()].eq_ignore_ascii_case(word)
            && !rest[word.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += self.peek().map_or(1, char::len_utf8);
        }
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn error(&self, message: &str) -> String {
        format!("{message} at offset {} in `{}`", self.pos, self.src)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_start(c: char) -> bool {
    is_ident_start(c) || c == '\\'
}

fn keyword_literal(word: &str) -> Option<Expression> {
    let atomic = match word.to_ascii_lowercase().as_str() {
        "null" => Atomic::Null,
        "true" => Atomic::True,
        "false" => Atomic::False,
        _ => return None,
    };
    Some(Expression::Literal(Union::from_atomic(atomic)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_static_call() {
        let call = parse_static_call("Child::make()").expect("parse");
        assert!(matches!(&call.class, ClassRef::Name(n) if n.value == "Child"));
        assert_eq!(call.method_name(), Some("make"));
        assert!(call.args.is_empty());
        assert_eq!(call.span, Span::new(0, 13));
        assert_eq!(call.method_span(), Span::new(7, 11));
    }

    #[test]
    fn arguments_of_every_kind() {
        let call = parse_static_call(r"\App\Foo::bar(1, 'x', $y->z, Baz::class, [1, 2], null, ...$rest)").expect("parse");
        assert_eq!(call.args.len(), 7);
        assert!(matches!(&call.args[3].value, Expression::ClassConstant(n) if n.value == "Baz"));
        assert!(matches!(&call.args[4].value, Expression::Array(items) if items.len() == 2));
        assert!(call.args[6].unpack);
        assert!(matches!(&call.args[2].value, Expression::Variable { name, .. } if name == "$y->z"));
    }

    #[test]
    fn named_arguments() {
        let call = parse_static_call("Foo::bar(count: 3)").expect("parse");
        assert_eq!(call.args[0].name.as_deref(), Some("count"));
    }

    #[test]
    fn variable_class_and_dynamic_method() {
        let call = parse_static_call("$cls::$method()").expect("parse");
        assert!(matches!(call.class, ClassRef::Expr(_)));
        assert!(call.method_name().is_none());
    }

    #[test]
    fn nested_call_argument() {
        let call = parse_static_call("Outer::wrap(Inner::make())").expect("parse");
        assert!(matches!(&call.args[0].value, Expression::StaticCall(inner) if inner.method_name() == Some("make")));
    }

    #[test]
    fn assignment_statement() {
        let stmt = parse_statement("$this->count = Counter::start();").expect("parse");
        assert!(matches!(stmt, Statement::Assign { ref target, .. } if target == "$this->count"));
    }

    #[test]
    fn errors_point_at_the_problem() {
        let err = parse_statement("Foo::bar(1").expect_err("unterminated");
        assert!(err.contains("expected"), "{err}");
        assert!(parse_statement("Foo").is_err());
    }
}
