//! Parameter names, argument labels and type qualification for the cases of a tagged union.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    declaration::{AggregateDecl, DeclTree, PathSegment, PayloadSlot, TypeRef, Variant},
    diagnostic::{Diagnostic, DiagnosticKind},
};

/// Strategy used to name a payload slot declared without any name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterNaming {
    /// Lowercased simple name of the slot type: `Child.Action` gives `action`.
    #[default]
    TypeDerived,
    /// Position of the slot in the case: `value0`, `value1`...
    Positional,
}

/// How a payload is passed to its handler.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ArgumentLabel {
    /// Positional argument, `_ name: T` in the handler.
    Unlabeled,
    /// The label is the parameter name, `name: T` in the handler.
    Named,
    /// External label distinct from the parameter name, `label name: T` in the handler.
    Relabeled(String),
}

impl ArgumentLabel {
    /// Gets the label to use at the call site for an argument named `name`.
    pub fn call_label<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        match self {
            Self::Unlabeled => None,
            Self::Named => Some(name),
            Self::Relabeled(label) => Some(label),
        }
    }
}

/// Qualified names of the types declared inside a tagged union, at any depth.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct NestedTypeNames(Vec<String>);

impl NestedTypeNames {
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|nested| nested == name)
    }

    /// Gets the names in breadth-first discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for NestedTypeNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Lists the aggregates nested in `union`, each qualified by its chain of enclosing nested
/// types (`Alert.Button`).
pub fn nested_type_names(tree: &DeclTree, union: &AggregateDecl) -> NestedTypeNames {
    let mut names = Vec::new();
    let mut queue = VecDeque::from([(None::<String>, union.members())]);
    while let Some((parent, members)) = queue.pop_front() {
        for aggregate in members.iter().filter_map(|&id| tree[id].as_aggregate()) {
            let name = match &parent {
                Some(parent) => format!("{}.{}", parent, aggregate.name()),
                None => aggregate.name().to_owned(),
            };
            trace!(nested_type = %name, "nested type");
            queue.push_back((Some(name.clone()), aggregate.members()));
            names.push(name);
        }
    }
    NestedTypeNames(names)
}

pub fn lowercase_first(identifier: &str) -> String {
    let mut chars = identifier.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn explicit_name(slot: &PayloadSlot) -> Option<&str> {
    slot.bind().or_else(|| slot.label())
}

/// Derives the parameter name of one slot.
///
/// The bind name wins over the label, which wins over the `naming` strategy. `None` means the
/// slot cannot be named: it has no name and its type has no simple identifier.
pub fn derive_parameter_name(
    slot: &PayloadSlot,
    index: usize,
    naming: ParameterNaming,
) -> Option<String> {
    if let Some(name) = explicit_name(slot) {
        return Some(name.to_owned());
    }
    match naming {
        ParameterNaming::TypeDerived => slot.ty().simple_name().map(lowercase_first),
        ParameterNaming::Positional => Some(format!("value{}", index)),
    }
}

/// Derives the parameter names of all the slots of `variant`, in declaration order.
///
/// Names never collide with each other nor with the `reserved` ones (the trailing state
/// parameter, the handler field): the slot index is appended to a colliding name
/// (`case pair(String, String)` gives `string` and `string1`). An explicit name is only
/// renamed when it is reserved.
pub fn derive_parameter_names(
    variant: &Variant,
    naming: ParameterNaming,
    reserved: &[&str],
) -> Result<Vec<String>, Diagnostic> {
    let explicit = variant
        .slots()
        .iter()
        .filter_map(explicit_name)
        .filter(|name| !reserved.contains(name))
        .collect::<HashSet<_>>();
    let mut taken = reserved
        .iter()
        .map(|name| name.to_string())
        .collect::<HashSet<_>>();
    let mut names = Vec::with_capacity(variant.slots().len());
    for (index, slot) in variant.slots().iter().enumerate() {
        let name = match explicit_name(slot) {
            Some(name) if !reserved.contains(&name) => name.to_owned(),
            explicit_reserved => {
                let base = match explicit_reserved {
                    Some(name) => name.to_owned(),
                    None => derive_parameter_name(slot, index, naming).ok_or_else(|| {
                        Diagnostic::new(
                            DiagnosticKind::UnsupportedParameter {
                                case: variant.name().to_owned(),
                                index,
                            },
                            slot.span(),
                        )
                    })?,
                };
                let mut name = base.clone();
                let mut suffix = index;
                while explicit.contains(name.as_str()) || taken.contains(&name) {
                    name = format!("{}{}", base, suffix);
                    suffix += 1;
                }
                name
            }
        };
        taken.insert(name.clone());
        names.push(name);
    }
    Ok(names)
}

pub fn derive_external_label(slot: &PayloadSlot) -> ArgumentLabel {
    match (slot.label(), slot.bind()) {
        (None, _) => ArgumentLabel::Unlabeled,
        (Some(_), None) => ArgumentLabel::Named,
        (Some(label), Some(_)) => ArgumentLabel::Relabeled(label.to_owned()),
    }
}

/// Gets the label of a slot once its parameter is named `name`.
///
/// A labeled slot whose parameter had to be renamed keeps its label as an external one.
pub fn derive_argument_label(slot: &PayloadSlot, name: &str) -> ArgumentLabel {
    match (derive_external_label(slot), slot.label()) {
        (ArgumentLabel::Named, Some(label)) if label != name => {
            ArgumentLabel::Relabeled(label.to_owned())
        }
        (label, _) => label,
    }
}

/// Routes references to types nested in the tagged union through `namespace`.
///
/// Generic arguments, tuple elements and the wrapped types of optionals, arrays and
/// dictionaries are qualified one by one. Anything which does not name a nested type is left
/// untouched.
pub fn qualify_type(ty: &TypeRef, nested: &NestedTypeNames, namespace: &str) -> TypeRef {
    match ty {
        TypeRef::Path(segments) => {
            let mut qualified = segments
                .iter()
                .map(|segment| {
                    PathSegment::new(
                        segment.name.clone(),
                        segment
                            .generics
                            .iter()
                            .map(|generic| qualify_type(generic, nested, namespace))
                            .collect(),
                    )
                })
                .collect::<Vec<_>>();
            if ty
                .dotted_name()
                .map_or(false, |dotted| nested.contains(&dotted))
            {
                qualified.insert(0, PathSegment::plain(namespace));
            }
            TypeRef::Path(qualified)
        }
        TypeRef::Tuple(elements) => TypeRef::Tuple(
            elements
                .iter()
                .map(|element| qualify_type(element, nested, namespace))
                .collect(),
        ),
        TypeRef::Optional(wrapped) => {
            TypeRef::Optional(Box::new(qualify_type(wrapped, nested, namespace)))
        }
        TypeRef::Array(element) => {
            TypeRef::Array(Box::new(qualify_type(element, nested, namespace)))
        }
        TypeRef::Dictionary(key, value) => TypeRef::Dictionary(
            Box::new(qualify_type(key, nested, namespace)),
            Box::new(qualify_type(value, nested, namespace)),
        ),
        TypeRef::Other(_) => ty.clone(),
    }
}
