//! Structured output of a generation pass.
//!
//! Renderers (see [render](super::render)) turn it into text; tests compare it structurally.

use crate::{declaration::TypeRef, resolver::ArgumentLabel};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Display)]
pub enum Visibility {
    #[display(fmt = "private")]
    Private,
    #[display(fmt = "fileprivate")]
    FilePrivate,
    #[default]
    #[display(fmt = "internal")]
    Internal,
}

impl Visibility {
    /// Gets the first visibility found in `modifiers`, internal when none.
    pub fn from_modifiers(modifiers: &[String]) -> Self {
        modifiers
            .iter()
            .find_map(|modifier| match modifier.as_str() {
                "private" => Some(Self::Private),
                "fileprivate" => Some(Self::FilePrivate),
                "internal" => Some(Self::Internal),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Both declarations produced for one annotated aggregate.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Generated {
    pub dispatch: DispatchDecl,
    pub interface: InterfaceDecl,
}

/// Private wrapper holding a handler and forwarding every action to it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DispatchDecl {
    pub name: String,
    pub capability: String,
    pub handler_field: String,
    pub handler_type: String,
    pub body: DispatchBody,
}

impl DispatchDecl {
    pub fn arms(&self) -> &[DispatchArm] {
        match &self.body {
            DispatchBody::NoOp => &[],
            DispatchBody::Match(arms) => arms,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DispatchBody {
    NoOp,
    /// Exhaustive match, one arm per case in declaration order.
    Match(Vec<DispatchArm>),
}

#[derive(Clone, PartialEq, Eq, Debug, new)]
pub struct DispatchArm {
    pub tag: String,
    pub bindings: Vec<String>,
    pub body: ArmBody,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ArmBody {
    NoOp,
    Forward(HandlerCall),
}

#[derive(Clone, PartialEq, Eq, Debug, new)]
pub struct HandlerCall {
    pub receiver: String,
    pub method: String,
    pub arguments: Vec<CallArgument>,
}

#[derive(Clone, PartialEq, Eq, Debug, new)]
pub struct CallArgument {
    pub label: Option<String>,
    pub value: CallValue,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CallValue {
    Binding(String),
    /// Mutable reference to the state.
    State(String),
}

/// Handler contract: one method per dispatched case.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InterfaceDecl {
    pub visibility: Visibility,
    pub name: String,
    /// State and action aliases, in that order.
    pub aliases: Vec<TypeAlias>,
    pub methods: Vec<HandlerSignature>,
}

impl InterfaceDecl {
    pub fn method(&self, name: &str) -> Option<&HandlerSignature> {
        self.methods.iter().find(|method| method.name == name)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, new)]
pub struct TypeAlias {
    pub name: String,
    pub target: TypeRef,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HandlerSignature {
    pub name: String,
    pub parameters: Vec<HandlerParameter>,
    pub state: StateParameter,
    pub returns: TypeRef,
}

impl HandlerSignature {
    /// Number of parameters, the trailing state included.
    pub fn arity(&self) -> usize {
        self.parameters.len() + 1
    }
}

#[derive(Clone, PartialEq, Eq, Debug, new)]
pub struct HandlerParameter {
    pub label: ArgumentLabel,
    pub name: String,
    pub ty: TypeRef,
}

/// Trailing mutable state parameter of every handler.
#[derive(Clone, PartialEq, Eq, Debug, new)]
pub struct StateParameter {
    pub name: String,
    pub ty: TypeRef,
}
