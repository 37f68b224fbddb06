//! PHPDoc tag extraction.
//!
//! Raw (string-level) extraction of `@return`, `@param`, `@deprecated`,
//! `@internal` and the `@psalm-assert` / `@phpstan-assert` families.
//! Turning the raw type strings into [`crate::ttype::Union`]s happens in
//! the parent module, where the templates in scope are known.

use super::types::{doc_lines, split_type_token, strip_tag};

/// Which branch an assertion applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionKind {
    Always,
    IfTrue,
    IfFalse,
}

/// A raw `@psalm-assert` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAssertionTag {
    pub kind: AssertionKind,
    /// `$param` or `$this->prop`.
    pub var_id: String,
    pub type_str: String,
    pub negated: bool,
}

/// Extract the type from a `@return` tag, preferring the
/// `@psalm-return` / `@phpstan-return` variants when present.
///
/// Handles common formats:
///   - `@return TypeName`
///   - `@return TypeName Some description text`
///   - `@return ?TypeName`
///   - `@return Collection<int, User>|null`
pub fn extract_return_type(docblock: &str) -> Option<String> {
    extract_tag_type(docblock, "@psalm-return")
        .or_else(|| extract_tag_type(docblock, "@phpstan-return"))
        .or_else(|| extract_tag_type(docblock, "@return"))
}

/// The raw type of `@param Type $var_name`.
pub fn extract_param_raw_type(docblock: &str, var_name: &str) -> Option<String> {
    for tag in ["@psalm-param", "@phpstan-param", "@param"] {
        for line in doc_lines(docblock) {
            let Some(rest) = strip_tag(line, tag) else {
                continue;
            };
            let (type_token, remainder) = split_type_token(rest);
            if let Some(name) = remainder.split_whitespace().next()
                && name.trim_start_matches("...").trim_start_matches('&') == var_name
            {
                return Some(type_token.to_string());
            }
        }
    }
    None
}

/// Whether the docblock carries `@deprecated`.
pub fn has_deprecated_tag(docblock: &str) -> bool {
    has_flag_tag(docblock, "@deprecated")
}

/// Whether the docblock carries `@internal` (or `@psalm-internal`).
pub fn has_internal_tag(docblock: &str) -> bool {
    has_flag_tag(docblock, "@internal") || has_flag_tag(docblock, "@psalm-internal")
}

fn has_flag_tag(docblock: &str, tag: &str) -> bool {
    doc_lines(docblock).any(|line| {
        line.strip_prefix(tag)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

/// Extract `@psalm-assert` / `@phpstan-assert` annotations, including the
/// `-if-true` / `-if-false` variants and negated types (`!Type`).
pub fn extract_type_assertions(docblock: &str) -> Vec<TypeAssertionTag> {
    // Longest first so `-if-true` is not eaten by the bare tag.
    const TAGS: &[(&str, AssertionKind)] = &[
        ("@phpstan-assert-if-true", AssertionKind::IfTrue),
        ("@phpstan-assert-if-false", AssertionKind::IfFalse),
        ("@phpstan-assert", AssertionKind::Always),
        ("@psalm-assert-if-true", AssertionKind::IfTrue),
        ("@psalm-assert-if-false", AssertionKind::IfFalse),
        ("@psalm-assert", AssertionKind::Always),
    ];

    let mut results = Vec::new();
    for line in doc_lines(docblock) {
        let Some((rest, kind)) = TAGS
            .iter()
            .find_map(|&(tag, kind)| strip_tag(line, tag).map(|rest| (rest, kind)))
        else {
            continue;
        };

        let (negated, rest) = match rest.strip_prefix('!') {
            Some(r) => (true, r.trim_start()),
            None => (false, rest),
        };
        let (type_token, remainder) = split_type_token(rest);
        let Some(var_id) = remainder.split_whitespace().next().filter(|v| v.starts_with('$')) else {
            continue;
        };

        results.push(TypeAssertionTag {
            kind,
            var_id: var_id.to_string(),
            type_str: type_token.to_string(),
            negated,
        });
    }
    results
}

// ─── Internals ──────────────────────────────────────────────────────────────

/// Find `@tag TypeName` and return the type token.  Conditional return
/// types (starting with `(`) are not understood and yield `None`.
fn extract_tag_type(docblock: &str, tag: &str) -> Option<String> {
    let rest = doc_lines(docblock).find_map(|line| strip_tag(line, tag))?;
    if rest.starts_with('(') {
        return None;
    }
    let (type_str, _remainder) = split_type_token(rest);
    Some(type_str.to_string())
}
