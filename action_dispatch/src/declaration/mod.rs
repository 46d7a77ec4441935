//! Declaration related structures.
//!
//! The host front-end describes the annotated aggregate with a tree of [DeclNode]s, which is
//! then flattened into a [DeclTree] arena where every declaration is addressed by [DeclId].

use std::{collections::VecDeque, ops::Index};

use serde::{Deserialize, Serialize};

pub use self::{
    tagged_union::{TaggedUnion, Variant},
    type_ref::{PathSegment, TypeRef},
};

pub mod tagged_union;
pub mod type_ref;

/// Opaque host location, only used to attach diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize, new)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Annotation attached to a declaration.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, new)]
pub struct Attribute {
    name: String,
    #[serde(default)]
    span: Span,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

impl From<&str> for Attribute {
    fn from(name: &str) -> Self {
        Self::new(name.to_owned(), Span::default())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    #[display(fmt = "struct")]
    Struct,
    #[display(fmt = "enum")]
    Enum,
    #[display(fmt = "class")]
    Class,
    #[display(fmt = "actor")]
    Actor,
}

/// One payload slot of an enum case.
///
/// `label` is the first name of the slot, `bind` the second one, used when the slot has both
/// an external label and an internal name.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, new)]
pub struct PayloadSlot {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    bind: Option<String>,
    #[serde(rename = "type")]
    ty: TypeRef,
    #[serde(default)]
    span: Span,
}

impl PayloadSlot {
    /// Positional slot, `case child(Child.Action)`.
    pub fn unnamed<T: Into<TypeRef>>(ty: T) -> Self {
        Self::new(None, None, ty.into(), Span::default())
    }

    /// Labeled slot, `case child(id: UUID)`.
    pub fn labeled<L: Into<String>, T: Into<TypeRef>>(label: L, ty: T) -> Self {
        Self::new(Some(label.into()), None, ty.into(), Span::default())
    }

    /// Slot with both a label and a bind name, `case child(id identifier: UUID)`.
    pub fn relabeled<L: Into<String>, B: Into<String>, T: Into<TypeRef>>(
        label: L,
        bind: B,
        ty: T,
    ) -> Self {
        Self::new(
            Some(label.into()),
            Some(bind.into()),
            ty.into(),
            Span::default(),
        )
    }

    /// Unlabeled slot with a bind name, `case child(_ identifier: UUID)`.
    pub fn bound<B: Into<String>, T: Into<TypeRef>>(bind: B, ty: T) -> Self {
        Self::new(None, Some(bind.into()), ty.into(), Span::default())
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn bind(&self) -> Option<&str> {
        self.bind.as_deref()
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Owned description of a declaration, as handed over by the host.
///
/// It is convenient to write by hand (or in JSON) and is turned into a [DeclTree] before any
/// generation.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DeclNode {
    #[serde(default)]
    pub span: Span,
    /// Rendered source text of the declaration.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(flatten)]
    pub kind: DeclNodeKind,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum DeclNodeKind {
    Aggregate {
        kind: AggregateKind,
        name: String,
        #[serde(default)]
        name_span: Span,
        #[serde(default)]
        modifiers: Vec<String>,
        #[serde(default)]
        inherited_types: Vec<TypeRef>,
        #[serde(default)]
        members: Vec<DeclNode>,
    },
    Case {
        name: String,
        #[serde(default)]
        slots: Vec<PayloadSlot>,
    },
    Other,
}

impl DeclNode {
    pub fn aggregate<N: Into<String>>(kind: AggregateKind, name: N) -> Self {
        let name = name.into();
        Self {
            span: Span::default(),
            text: format!("{} {} {{}}", kind, name),
            attributes: Vec::new(),
            kind: DeclNodeKind::Aggregate {
                kind,
                name,
                name_span: Span::default(),
                modifiers: Vec::new(),
                inherited_types: Vec::new(),
                members: Vec::new(),
            },
        }
    }

    pub fn structure<N: Into<String>>(name: N) -> Self {
        Self::aggregate(AggregateKind::Struct, name)
    }

    pub fn enumeration<N: Into<String>>(name: N) -> Self {
        Self::aggregate(AggregateKind::Enum, name)
    }

    pub fn class<N: Into<String>>(name: N) -> Self {
        Self::aggregate(AggregateKind::Class, name)
    }

    pub fn case<N: Into<String>>(name: N) -> Self {
        let name = name.into();
        Self {
            span: Span::default(),
            text: format!("case {}", name),
            attributes: Vec::new(),
            kind: DeclNodeKind::Case {
                name,
                slots: Vec::new(),
            },
        }
    }

    /// Any declaration the generator does not need to inspect, e.g. a property or a type
    /// alias.
    pub fn other<T: Into<String>>(text: T) -> Self {
        Self {
            span: Span::default(),
            text: text.into(),
            attributes: Vec::new(),
            kind: DeclNodeKind::Other,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_text<T: Into<String>>(mut self, text: T) -> Self {
        self.text = text.into();
        self
    }

    pub fn attribute<A: Into<Attribute>>(mut self, attribute: A) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    /// Sets the location of the aggregate name.
    ///
    /// It panics if the node is not an aggregate.
    pub fn with_name_span(mut self, span: Span) -> Self {
        match &mut self.kind {
            DeclNodeKind::Aggregate { name_span, .. } => *name_span = span,
            _ => panic!("Only aggregates have a name span"),
        }
        self
    }

    /// Adds a modifier (e.g. visibility) to the aggregate.
    ///
    /// It panics if the node is not an aggregate.
    pub fn modifier<M: Into<String>>(mut self, modifier: M) -> Self {
        match &mut self.kind {
            DeclNodeKind::Aggregate { modifiers, .. } => modifiers.push(modifier.into()),
            _ => panic!("Only aggregates have modifiers"),
        }
        self
    }

    /// Adds an inherited (or conformed) type to the aggregate.
    ///
    /// It panics if the node is not an aggregate.
    pub fn inherits<T: Into<TypeRef>>(mut self, ty: T) -> Self {
        match &mut self.kind {
            DeclNodeKind::Aggregate {
                inherited_types, ..
            } => inherited_types.push(ty.into()),
            _ => panic!("Only aggregates inherit types"),
        }
        self
    }

    /// Adds a member declaration to the aggregate.
    ///
    /// It panics if the node is not an aggregate.
    pub fn member(mut self, member: DeclNode) -> Self {
        match &mut self.kind {
            DeclNodeKind::Aggregate { members, .. } => members.push(member),
            _ => panic!("Only aggregates have members"),
        }
        self
    }

    /// Adds a payload slot to the case.
    ///
    /// It panics if the node is not a case.
    pub fn slot(mut self, slot: PayloadSlot) -> Self {
        match &mut self.kind {
            DeclNodeKind::Case { slots, .. } => slots.push(slot),
            _ => panic!("Only cases have payload slots"),
        }
        self
    }
}

/// Identifier of a declaration in a [DeclTree].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, From)]
pub struct DeclId(usize);

#[derive(PartialEq, Eq, Debug)]
pub struct Decl {
    id: DeclId,
    span: Span,
    text: String,
    attributes: Vec<Attribute>,
    kind: DeclKind,
}

#[derive(PartialEq, Eq, Debug)]
pub enum DeclKind {
    Aggregate(AggregateDecl),
    Case(CaseDecl),
    Other,
}

impl Decl {
    pub fn id(&self) -> DeclId {
        self.id
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Gets the first attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name() == name)
    }

    pub fn kind(&self) -> &DeclKind {
        &self.kind
    }

    pub fn as_aggregate(&self) -> Option<&AggregateDecl> {
        match &self.kind {
            DeclKind::Aggregate(aggregate) => Some(aggregate),
            DeclKind::Case(_) | DeclKind::Other => None,
        }
    }

    pub fn as_case(&self) -> Option<&CaseDecl> {
        match &self.kind {
            DeclKind::Case(case) => Some(case),
            DeclKind::Aggregate(_) | DeclKind::Other => None,
        }
    }
}

#[derive(PartialEq, Eq, Debug)]
pub struct AggregateDecl {
    kind: AggregateKind,
    name: String,
    name_span: Span,
    modifiers: Vec<String>,
    inherited_types: Vec<TypeRef>,
    members: Vec<DeclId>,
}

impl AggregateDecl {
    pub fn kind(&self) -> AggregateKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_span(&self) -> Span {
        self.name_span
    }

    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }

    pub fn inherited_types(&self) -> &[TypeRef] {
        &self.inherited_types
    }

    /// Gets the member identifiers in declaration order.
    pub fn members(&self) -> &[DeclId] {
        &self.members
    }
}

#[derive(PartialEq, Eq, Debug)]
pub struct CaseDecl {
    name: String,
    slots: Vec<PayloadSlot>,
}

impl CaseDecl {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> &[PayloadSlot] {
        &self.slots
    }
}

/// Arena of declarations.
///
/// The root declaration is always [DeclTree::root], the other identifiers are assigned in
/// breadth-first order.
#[derive(Debug)]
pub struct DeclTree {
    decls: Vec<Decl>,
}

impl DeclTree {
    /// Flattens a declaration description into an arena.
    pub fn from_root(root: DeclNode) -> Self {
        let mut decls = Vec::new();
        let mut queue = VecDeque::from([root]);
        // Members get their identifiers when their parent is visited, which matches the order
        // they are popped from the queue.
        let mut next_id = 1;
        while let Some(node) = queue.pop_front() {
            let DeclNode {
                span,
                text,
                attributes,
                kind,
            } = node;
            let kind = match kind {
                DeclNodeKind::Aggregate {
                    kind,
                    name,
                    name_span,
                    modifiers,
                    inherited_types,
                    members,
                } => {
                    let member_ids = (next_id..next_id + members.len())
                        .map(DeclId::from)
                        .collect();
                    next_id += members.len();
                    queue.extend(members);
                    DeclKind::Aggregate(AggregateDecl {
                        kind,
                        name,
                        name_span,
                        modifiers,
                        inherited_types,
                        members: member_ids,
                    })
                }
                DeclNodeKind::Case { name, slots } => DeclKind::Case(CaseDecl { name, slots }),
                DeclNodeKind::Other => DeclKind::Other,
            };
            decls.push(Decl {
                id: DeclId::from(decls.len()),
                span,
                text,
                attributes,
                kind,
            });
        }
        Self { decls }
    }

    pub fn root(&self) -> DeclId {
        DeclId(0)
    }

    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decl> {
        self.decls.iter()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Gets the member declarations of an aggregate in declaration order.
    pub fn members<'t>(&'t self, aggregate: &'t AggregateDecl) -> impl Iterator<Item = &'t Decl> {
        aggregate.members().iter().map(move |&id| &self[id])
    }
}

impl From<DeclNode> for DeclTree {
    fn from(root: DeclNode) -> Self {
        Self::from_root(root)
    }
}

impl Index<DeclId> for DeclTree {
    type Output = Decl;

    fn index(&self, index: DeclId) -> &Self::Output {
        self.get(index)
            .unwrap_or_else(|| panic!("declaration #{} not found", index))
    }
}
