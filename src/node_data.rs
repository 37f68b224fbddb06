//! Per-position records of what the resolver found, for external tooling
//! (hover, go-to-definition).  Only filled when `record_node_types` is on.

use std::collections::BTreeMap;

use crate::ast::Span;
use crate::ttype::Union;

#[derive(Debug, Default)]
pub struct NodeData {
    enabled: bool,
    /// Resolved class or method reference text, e.g. `App\Foo` or
    /// `App\Foo::bar()`.
    references: BTreeMap<Span, String>,
    types: BTreeMap<Span, Union>,
}

impl NodeData {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn add_reference(&mut self, span: Span, reference: impl Into<String>) {
        if self.enabled {
            self.references.insert(span, reference.into());
        }
    }

    pub fn set_type(&mut self, span: Span, ty: Union) {
        if self.enabled {
            self.types.insert(span, ty);
        }
    }

    pub fn reference_at(&self, span: Span) -> Option<&str> {
        self.references.get(&span).map(String::as_str)
    }

    pub fn type_at(&self, span: Span) -> Option<&Union> {
        self.types.get(&span)
    }

    pub fn references(&self) -> impl Iterator<Item = (&Span, &String)> {
        self.references.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_recorder_ignores_writes() {
        let mut data = NodeData::new(false);
        data.add_reference(Span::new(0, 3), "Foo");
        assert!(data.reference_at(Span::new(0, 3)).is_none());
    }

    #[test]
    fn enabled_recorder_keeps_latest() {
        let mut data = NodeData::new(true);
        data.set_type(Span::new(0, 9), Union::named("A"));
        data.set_type(Span::new(0, 9), Union::named("B"));
        assert_eq!(data.type_at(Span::new(0, 9)).map(ToString::to_string).as_deref(), Some("B"));
    }
}
