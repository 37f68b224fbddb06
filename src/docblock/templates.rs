//! Template and generics tag extraction.
//!
//! This submodule handles `@template` (including `-covariant` /
//! `-contravariant` variants and `of` bounds) and the `@extends` /
//! `@implements` / `@use` generic binding tags.

use super::types::{doc_lines, split_params, split_type_token};

/// A raw `@template` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateTag {
    pub name: String,
    /// Raw bound from `@template T of Bound`.
    pub bound: Option<String>,
}

/// Extract template parameters from `@template` tags.
///
/// Handles the common PHPStan / Psalm variants:
///   - `@template T`
///   - `@template TKey of array-key`
///   - `@template-covariant TValue`
///   - `@psalm-template T`, `@phpstan-template T`
pub fn extract_template_params(docblock: &str) -> Vec<TemplateTag> {
    let mut results: Vec<TemplateTag> = Vec::new();

    for line in doc_lines(docblock) {
        let rest = line
            .strip_prefix("@phpstan-template")
            .or_else(|| line.strip_prefix("@psalm-template"))
            .or_else(|| line.strip_prefix("@template"));
        let Some(rest) = rest else {
            continue;
        };
        let rest = rest
            .strip_prefix("-covariant")
            .or_else(|| rest.strip_prefix("-contravariant"))
            .unwrap_or(rest);
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }

        let mut tokens = rest.split_whitespace();
        let Some(name) = tokens.next() else {
            continue;
        };
        // Template names are identifiers.
        if !name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            continue;
        }
        if results.iter().any(|t| t.name == name) {
            continue;
        }

        let bound = match tokens.next() {
            Some("of" | "as") => {
                let after_keyword = rest
                    .trim_start()
                    .get(name.len()..)
                    .unwrap_or("")
                    .trim_start()
                    .get(2..)
                    .unwrap_or("")
                    .trim_start();
                let (bound, _) = split_type_token(after_keyword);
                (!bound.is_empty()).then(|| bound.to_string())
            }
            _ => None,
        };

        results.push(TemplateTag {
            name: name.to_string(),
            bound,
        });
    }

    results
}

/// Extract generic type arguments from `@extends`, `@implements` or `@use`
/// tags (and their `@phpstan-` / `@psalm-` prefixed variants).
///
/// For example, given `@extends Collection<int, Language>`, returns
/// `[("Collection", ["int", "Language"])]`.  A tag without `<…>` carries
/// no bindings and is skipped.
pub fn extract_generics_tag(docblock: &str, tag: &str) -> Vec<(String, Vec<String>)> {
    let bare_tag = tag.strip_prefix('@').unwrap_or(tag);
    let phpstan_tag = format!("@phpstan-{bare_tag}");
    let psalm_tag = format!("@psalm-{bare_tag}");
    // `@template-extends` is the older Psalm spelling.
    let template_tag = format!("@template-{bare_tag}");

    let mut results = Vec::new();

    for line in doc_lines(docblock) {
        let rest = [phpstan_tag.as_str(), psalm_tag.as_str(), template_tag.as_str(), tag]
            .iter()
            .find_map(|t| line.strip_prefix(t));
        let Some(rest) = rest.filter(|r| r.starts_with(char::is_whitespace)) else {
            continue;
        };

        let (type_token, _remainder) = split_type_token(rest.trim_start());
        let Some(angle_pos) = type_token.find('<') else {
            continue;
        };
        let base_name = type_token[..angle_pos].trim();
        let base_name = base_name.strip_prefix('\\').unwrap_or(base_name);
        if base_name.is_empty() {
            continue;
        }

        let inner = &type_token[angle_pos + 1..];
        let inner = inner.strip_suffix('>').unwrap_or(inner).trim();
        let args: Vec<String> = split_params(inner).into_iter().map(str::to_string).collect();
        if !args.is_empty() {
            results.push((base_name.to_string(), args));
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_with_bounds() {
        let doc = "/**\n * @template TKey of array-key\n * @template-covariant TValue\n * @template TModel of \\App\\Model\n */";
        let templates = extract_template_params(doc);
        assert_eq!(templates.len(), 3);
        assert_eq!(templates[0].bound.as_deref(), Some("array-key"));
        assert_eq!(templates[1].name, "TValue");
        assert_eq!(templates[1].bound, None);
        assert_eq!(templates[2].bound.as_deref(), Some("\\App\\Model"));
    }

    #[test]
    fn generics_tag_with_nesting() {
        let doc = "/**\n * @extends Base<array<int, string>, User>\n * @phpstan-implements \\ArrayAccess<int, User>\n */";
        assert_eq!(
            extract_generics_tag(doc, "@extends"),
            vec![("Base".to_string(), vec!["array<int, string>".to_string(), "User".to_string()])]
        );
        assert_eq!(
            extract_generics_tag(doc, "@implements"),
            vec![("ArrayAccess".to_string(), vec!["int".to_string(), "User".to_string()])]
        );
    }

    #[test]
    fn extends_without_arguments_is_skipped() {
        assert!(extract_generics_tag("/** @extends Base */", "@extends").is_empty());
    }
}
