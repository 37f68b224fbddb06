//! `@method` tag extraction.
//!
//! PHPDoc `@method` tags declare magic methods served by `__call` /
//! `__callStatic`.  Only the raw strings are extracted here.

use super::types::{doc_lines, split_params, strip_tag};

/// A parameter of a `@method` signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodTagParam {
    /// Name including `$`.
    pub name: String,
    pub type_str: Option<String>,
    pub is_required: bool,
    pub is_variadic: bool,
    pub is_reference: bool,
}

/// A raw `@method` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodTag {
    pub name: String,
    pub is_static: bool,
    pub return_type: Option<String>,
    pub params: Vec<MethodTagParam>,
}

/// Extract all `@method` tags from a class-level docblock.
///
/// The format is:
///
///   - `@method ReturnType methodName(ParamType $param, ...)`
///   - `@method static ReturnType methodName(ParamType $param, ...)`
///   - `@method methodName(ParamType $param, ...)`  (no return type)
pub fn extract_method_tags(docblock: &str) -> Vec<MethodTag> {
    let mut results = Vec::new();

    for line in doc_lines(docblock) {
        let Some(rest) = strip_tag(line, "@psalm-method").or_else(|| strip_tag(line, "@method")) else {
            continue;
        };

        // `static` must be followed by whitespace so a method literally
        // named `staticFoo` is not mistaken for a static one.
        let (is_static, rest) = match rest.strip_prefix("static") {
            Some(after) if after.starts_with(char::is_whitespace) => (true, after.trim_start()),
            _ => (false, rest),
        };

        // The method name is the token immediately before `(`.
        let Some(paren_pos) = rest.find('(') else {
            continue;
        };
        let before_paren = rest[..paren_pos].trim();
        let after_paren = &rest[paren_pos + 1..];
        if before_paren.is_empty() {
            continue;
        }

        let (return_type, method_name) = match before_paren.rfind(char::is_whitespace) {
            Some(last_space) => (
                Some(before_paren[..last_space].trim().to_string()),
                before_paren[last_space..].trim(),
            ),
            None => (None, before_paren),
        };
        if method_name.is_empty() {
            continue;
        }

        let params_str = match after_paren.rfind(')') {
            Some(close) => after_paren[..close].trim(),
            None => after_paren.trim(),
        };

        results.push(MethodTag {
            name: method_name.to_string(),
            is_static,
            return_type: return_type.filter(|t| !t.is_empty()),
            params: parse_method_tag_params(params_str),
        });
    }

    results
}

/// Parse the parameter list from a `@method` tag.
///
/// Handles formats like:
///   - `string $abstract, callable():mixed $mockDefinition = null`
///   - `array<string, mixed> $data, string ...$rest`
fn parse_method_tag_params(params_str: &str) -> Vec<MethodTagParam> {
    let mut result = Vec::new();

    for part in split_params(params_str) {
        // A parameter without a `$name` is malformed; skip it.
        let Some(dollar_pos) = part.rfind('$') else {
            continue;
        };
        let name_and_rest = &part[dollar_pos..];
        let name_end = name_and_rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == ')')
            .unwrap_or(name_and_rest.len());
        let name = &name_and_rest[..name_end];

        let has_default = name_and_rest[name_end..].contains('=');
        let before = part[..dollar_pos].trim();
        let is_variadic = before.ends_with("...");
        let before = before.trim_end_matches("...").trim_end();
        let is_reference = before.ends_with('&');
        let before = before.trim_end_matches('&').trim_end();

        result.push(MethodTagParam {
            name: name.to_string(),
            type_str: (!before.is_empty()).then(|| before.to_string()),
            is_required: !has_default && !is_variadic,
            is_variadic,
            is_reference,
        });
    }

    result
}
