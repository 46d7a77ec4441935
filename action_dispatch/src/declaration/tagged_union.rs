//! Read-only view of the nested `Action` enum, built once per generation pass.

use super::{AggregateDecl, DeclTree, PayloadSlot, Span};
use crate::resolver::{nested_type_names, NestedTypeNames};

/// One case of the tagged union.
#[derive(Clone, PartialEq, Eq, Debug, new)]
pub struct Variant {
    name: String,
    slots: Vec<PayloadSlot>,
    excluded: bool,
    #[new(default)]
    span: Span,
}

impl Variant {
    /// Gets the tag name. It is never renamed nor escaped.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> &[PayloadSlot] {
        &self.slots
    }

    /// Whether the case carries the exclusion attribute.
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[derive(Clone, PartialEq, Eq, Debug, new)]
pub struct TaggedUnion {
    name: String,
    variants: Vec<Variant>,
    nested_type_names: NestedTypeNames,
}

impl TaggedUnion {
    /// Collects the cases of `union` in declaration order, any other member is ignored.
    pub fn from_decl(tree: &DeclTree, union: &AggregateDecl, exclusion_attribute: &str) -> Self {
        let variants = tree
            .members(union)
            .filter_map(|decl| {
                decl.as_case().map(|case| Variant {
                    name: case.name().to_owned(),
                    slots: case.slots().to_vec(),
                    excluded: decl.attribute(exclusion_attribute).is_some(),
                    span: decl.span(),
                })
            })
            .collect();
        Self {
            name: union.name().to_owned(),
            variants,
            nested_type_names: nested_type_names(tree, union),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn nested_type_names(&self) -> &NestedTypeNames {
        &self.nested_type_names
    }
}
