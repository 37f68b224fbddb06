//! Type-string parsing.
//!
//! Turns the type strings found in signatures and docblocks
//! (`?Foo`, `Collection<int, User>|null`, `class-string<Model>`,
//! `Foo&Countable`, `list<T>`) into [`Union`]s.  The splitting helpers
//! respect `<…>` and `(…)` nesting so generic arguments are never split
//! in the middle.

use super::{Atomic, NamedObject, Union};
use crate::types::TemplateParamInfo;

/// Parse a type string with no template parameters in scope.
pub fn parse_union(raw: &str) -> Union {
    parse_union_with_templates(raw, &[])
}

/// Parse a type string, resolving bare names that match one of
/// `templates` to template parameters.
pub fn parse_union_with_templates(raw: &str, templates: &[TemplateParamInfo]) -> Union {
    let s = raw.trim();
    if s.is_empty() {
        return Union::mixed();
    }

    let mut atomics = Vec::new();
    for part in split_depth0(s, '|') {
        parse_part(part.trim(), templates, &mut atomics);
    }
    Union::new(atomics)
}

fn parse_part(part: &str, templates: &[TemplateParamInfo], out: &mut Vec<Atomic>) {
    if part.is_empty() {
        return;
    }

    if let Some(inner) = part.strip_prefix('(').and_then(|p| p.strip_suffix(')')) {
        out.extend(parse_union_with_templates(inner, templates).types().iter().cloned());
        return;
    }

    if let Some(inner) = part.strip_prefix('?') {
        out.push(Atomic::Null);
        parse_part(inner.trim(), templates, out);
        return;
    }

    let intersection = split_depth0(part, '&');
    if intersection.len() > 1 {
        let mut objects = intersection
            .iter()
            .flat_map(|p| parse_atomic(p.trim(), templates))
            .filter_map(|atomic| match atomic {
                Atomic::NamedObject(object) => Some(object),
                _ => None,
            });
        match objects.next() {
            Some(first) => {
                let rest: Vec<NamedObject> = objects.collect();
                out.push(Atomic::NamedObject(first.with_extra_types(rest)));
            }
            None => out.push(Atomic::Mixed),
        }
        return;
    }

    out.extend(parse_atomic(part, templates));
}

fn parse_atomic(part: &str, templates: &[TemplateParamInfo]) -> Vec<Atomic> {
    // ── `Type[]` shorthand ──
    if let Some(base) = part.strip_suffix("[]") {
        return vec![Atomic::Array {
            key: Box::new(array_key()),
            value: Box::new(parse_union_with_templates(base, templates)),
        }];
    }

    // ── Literals ──
    if let Some(value) = strip_quotes(part) {
        return vec![Atomic::LiteralString(value.to_string())];
    }
    if let Ok(value) = part.parse::<i64>() {
        return vec![Atomic::LiteralInt(value)];
    }
    if let Some(class) = part.strip_suffix("::class") {
        let class = class.strip_prefix('\\').unwrap_or(class);
        return vec![Atomic::LiteralClassString(class.to_string())];
    }

    // ── Split off generic arguments ──
    let (base, args) = match part.find('<') {
        Some(angle) if part.ends_with('>') => {
            let inner = &part[angle + 1..part.len() - 1];
            (part[..angle].trim(), split_depth0(inner, ','))
        }
        _ => (part, Vec::new()),
    };
    let base = base.strip_prefix('\\').unwrap_or(base);
    let arg = |i: usize| -> Union {
        args.get(i)
            .map(|a| parse_union_with_templates(a, templates))
            .unwrap_or_else(Union::mixed)
    };

    let atomic = match base.to_ascii_lowercase().as_str() {
        "int" | "integer" | "positive-int" | "negative-int" | "non-negative-int" => Atomic::Int,
        "string" | "non-empty-string" | "lowercase-string" => Atomic::String,
        "numeric-string" => Atomic::NumericString,
        "float" | "double" => Atomic::Float,
        "bool" | "boolean" => Atomic::Bool,
        "true" => Atomic::True,
        "false" => Atomic::False,
        "null" => Atomic::Null,
        "void" => Atomic::Void,
        "never" | "never-return" | "no-return" => Atomic::Never,
        "mixed" | "callable" | "resource" | "scalar" => Atomic::Mixed,
        "object" => Atomic::Object,
        "array-key" => return array_key().types().to_vec(),
        "array" | "non-empty-array" | "iterable" => match args.len() {
            0 => Atomic::Array {
                key: Box::new(array_key()),
                value: Box::new(Union::mixed()),
            },
            1 => Atomic::Array {
                key: Box::new(array_key()),
                value: Box::new(arg(0)),
            },
            _ => Atomic::Array {
                key: Box::new(arg(0)),
                value: Box::new(arg(1)),
            },
        },
        "list" | "non-empty-list" => Atomic::List(Box::new(arg(0))),
        "class-string" => {
            let bound = args
                .first()
                .map(|a| parse_union_with_templates(a, templates))
                .and_then(|u| class_string_bound(&u));
            Atomic::ClassString { as_type: bound.map(Box::new) }
        }
        _ => {
            if let Some(template) = templates.iter().find(|t| t.name == base) {
                Atomic::TemplateParam {
                    name: template.name.clone(),
                    defining_entity: template.defining_entity.clone(),
                    as_type: Box::new(template.as_type.clone()),
                }
            } else {
                let params = args
                    .iter()
                    .map(|a| parse_union_with_templates(a, templates))
                    .collect();
                Atomic::NamedObject(NamedObject::new(base).with_type_params(params))
            }
        }
    };
    vec![atomic]
}

/// `class-string<T>` keeps only a named-object bound; a template bound
/// contributes its own upper bound.
fn class_string_bound(bound: &Union) -> Option<NamedObject> {
    bound.types().iter().find_map(|atomic| match atomic {
        Atomic::NamedObject(object) => Some(object.clone()),
        Atomic::TemplateParam { as_type, .. } => as_type.named_objects().next().cloned(),
        _ => None,
    })
}

fn array_key() -> Union {
    Union::new(vec![Atomic::Int, Atomic::String])
}

fn strip_quotes(s: &str) -> Option<&str> {
    s.strip_prefix('\'')
        .and_then(|r| r.strip_suffix('\''))
        .or_else(|| s.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
}

/// Split `s` on `sep` at nesting depth zero, respecting `<…>`, `(…)`,
/// `{…}` and quotes.
pub(crate) fn split_depth0(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in s.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '<' | '(' | '{' | '[' => depth += 1,
            '>' | ')' | '}' | ']' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    let last = s[start..].trim();
    if !last.is_empty() || parts.is_empty() {
        parts.push(last);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_generic() {
        let ty = parse_union("?\\App\\Collection<int, User>");
        assert_eq!(ty.to_string(), "null|App\\Collection<int, User>");
        assert!(ty.is_nullable());
    }

    #[test]
    fn intersection_becomes_extra_types() {
        let ty = parse_union("Foo&Countable&Bar");
        let object = ty.named_objects().next().expect("named object");
        assert_eq!(object.name, "Foo");
        assert_eq!(object.extra_types.len(), 2);
    }

    #[test]
    fn class_string_keeps_named_bound() {
        let ty = parse_union("class-string<Model>");
        assert_eq!(ty.to_string(), "class-string<Model>");
        assert_eq!(parse_union("class-string").to_string(), "class-string");
    }

    #[test]
    fn template_names_resolve_when_in_scope() {
        let templates = vec![TemplateParamInfo::new("T", "Box")];
        let ty = parse_union_with_templates("list<T>|T", &templates);
        assert!(ty.has_template());
        assert!(!parse_union("list<T>").has_template());
    }

    #[test]
    fn literals() {
        assert_eq!(parse_union("'abc'|5|Foo::class").to_string(), "'abc'|5|Foo::class");
    }

    #[test]
    fn split_respects_nesting() {
        assert_eq!(
            split_depth0("array<int, string>, Foo", ','),
            vec!["array<int, string>", "Foo"]
        );
    }
}
