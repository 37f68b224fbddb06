/// Class-name qualification.
///
/// Takes a class name as it appears in source and turns it into a fully
/// qualified name using the file's `use` imports and namespace:
///
///   - Fully-qualified names (`\PDO`, `\Couchbase\Cluster`) lose the
///     leading `\` and are otherwise kept.
///   - Unqualified names are looked up in the import table, then prefixed
///     with the current namespace.  Class names do NOT fall back to the
///     global scope, unlike functions and constants.
///   - Qualified names expand a leading alias segment
///     (`OA\Endpoint` with `use Swagger\OpenAPI as OA;`) and are otherwise
///     prefixed with the current namespace.
use crate::context::FileSource;

pub fn resolve_class_name(name: &str, source: &FileSource) -> String {
    // ── Fully qualified name (leading `\`) ──────────────
    if let Some(stripped) = name.strip_prefix('\\') {
        return stripped.to_string();
    }

    // ── Unqualified name (no `\` at all) ────────────────
    if !name.contains('\\') {
        if let Some(fqn) = lookup_alias(source, name) {
            return fqn.to_string();
        }
        return match &source.namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}\\{name}"),
            _ => name.to_string(),
        };
    }

    // ── Qualified name (contains `\`, no leading `\`) ───
    let first_segment = name.split('\\').next().unwrap_or(name);
    if let Some(fqn_prefix) = lookup_alias(source, first_segment) {
        let rest = &name[first_segment.len()..];
        return format!("{fqn_prefix}{rest}");
    }
    match &source.namespace {
        Some(ns) if !ns.is_empty() => format!("{ns}\\{name}"),
        _ => name.to_string(),
    }
}

/// Import aliases are case-insensitive in PHP.
fn lookup_alias<'a>(source: &'a FileSource, alias: &str) -> Option<&'a str> {
    source
        .uses
        .get(alias)
        .or_else(|| {
            source
                .uses
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(alias))
                .map(|(_, fqn)| fqn)
        })
        .map(String::as_str)
}

/// The synthetic container a call outside any class is attributed to:
/// `<namespace>\<file class name>`.
pub fn file_container_name(source: &FileSource) -> String {
    let class_name = source.class_name.as_deref().unwrap_or("");
    match &source.namespace {
        Some(ns) if !ns.is_empty() => format!("{ns}\\{class_name}"),
        _ => class_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> FileSource {
        FileSource::new("src/Controller.php")
            .with_namespace("App\\Http")
            .with_use("Model", "App\\Models\\Model")
            .with_use("OA", "\\Swagger\\OpenAPI")
    }

    #[test]
    fn fully_qualified_names_are_kept() {
        assert_eq!(resolve_class_name("\\PDO", &source()), "PDO");
    }

    #[test]
    fn unqualified_names_use_imports_then_namespace() {
        assert_eq!(resolve_class_name("Model", &source()), "App\\Models\\Model");
        assert_eq!(resolve_class_name("model", &source()), "App\\Models\\Model");
        assert_eq!(resolve_class_name("Request", &source()), "App\\Http\\Request");
    }

    #[test]
    fn qualified_names_expand_leading_alias() {
        assert_eq!(resolve_class_name("OA\\Endpoint", &source()), "Swagger\\OpenAPI\\Endpoint");
        assert_eq!(resolve_class_name("Sub\\Thing", &source()), "App\\Http\\Sub\\Thing");
    }

    #[test]
    fn global_scope_names_are_unchanged() {
        let global = FileSource::new("a.php");
        assert_eq!(resolve_class_name("Foo\\Bar", &global), "Foo\\Bar");
    }

    #[test]
    fn container_name() {
        let mut source = source();
        source.class_name = Some("Controller".into());
        assert_eq!(file_container_name(&source), "App\\Http\\Controller");
    }
}
