//! Low-level helpers shared by the tag extractors.

/// The tag lines of a docblock: `/**` / `*/` delimiters and the `*` gutter
/// stripped, blank lines skipped.
pub(crate) fn doc_lines(docblock: &str) -> impl Iterator<Item = &str> {
    let trimmed = docblock.trim();
    let inner = trimmed.strip_prefix("/**").unwrap_or(trimmed);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);
    inner
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
}

/// If `line` starts with `tag` followed by whitespace, return the rest.
///
/// `@return` does not match `@returns`, and a bare `@return` with nothing
/// after it yields `None`.
pub(crate) fn strip_tag<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(tag)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    (!rest.is_empty()).then_some(rest)
}

/// Split off the first type token from `s`, respecting `<…>` and `(…)`
/// nesting.
///
/// Returns `(type_token, remainder)` where `type_token` is the full type
/// (e.g. `Collection<int, User>`) and `remainder` is whatever follows.
pub(crate) fn split_type_token(s: &str) -> (&str, &str) {
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' | '{' => depth += 1,
            '>' | ')' | '}' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => {
                // `Foo | null` style unions keep going across the spaces.
                let rest = s[i..].trim_start();
                if rest.starts_with('|') || s[..i].ends_with('|') {
                    continue;
                }
                return (&s[..i], &s[i..]);
            }
            _ => {}
        }
    }
    (s, "")
}

/// Split `s` on top-level commas so `array<string, mixed> $a, int $b` is
/// split only once.
pub(crate) fn split_params(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, ch) in s.char_indices() {
        match ch {
            '<' | '(' | '{' | '[' => depth += 1,
            '>' | ')' | '}' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = s[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_type_token_keeps_generics_together() {
        assert_eq!(
            split_type_token("Collection<int, User> $users the users"),
            ("Collection<int, User>", " $users the users")
        );
        assert_eq!(split_type_token("Foo | null $x"), ("Foo | null", " $x"));
    }

    #[test]
    fn strip_tag_requires_whitespace() {
        assert_eq!(strip_tag("@return Foo", "@return"), Some("Foo"));
        assert_eq!(strip_tag("@returns Foo", "@return"), None);
        assert_eq!(strip_tag("@return", "@return"), None);
    }

    #[test]
    fn doc_lines_strip_gutter() {
        let lines: Vec<_> = doc_lines("/**\n * @internal\n *\n * @deprecated use X\n */").collect();
        assert_eq!(lines, vec!["@internal", "@deprecated use X"]);
    }
}
