//! Type references declared by payload slots.

use std::{
    convert::Infallible,
    fmt::{Display, Formatter},
    str::FromStr,
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One segment of a dotted type path, with its generic arguments.
#[derive(Clone, PartialEq, Eq, Debug, new)]
pub struct PathSegment {
    pub name: String,
    pub generics: Vec<TypeRef>,
}

impl PathSegment {
    /// Creates a segment without generic arguments.
    pub fn plain<N: Into<String>>(name: N) -> Self {
        Self::new(name.into(), Vec::new())
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if !self.generics.is_empty() {
            write!(f, "<{}>", self.generics.iter().join(", "))?;
        }
        Ok(())
    }
}

/// Nesting depth past which a type is kept verbatim.
pub const MAX_TYPE_DEPTH: usize = 128;

/// Type reference of a payload slot, or of a generated parameter.
///
/// Dotted paths (possibly generic), tuples, optionals, arrays and dictionaries are understood
/// structurally, up to [MAX_TYPE_DEPTH] nesting levels. Anything else is kept verbatim in
/// [TypeRef::Other]: the generator never needs to look inside it, and it cannot be used to
/// derive a parameter name.
///
/// The textual form is used for (de)serialization:
///
/// ```rust
/// # use action_dispatch::declaration::type_ref::TypeRef;
/// let ty: TypeRef = "Result<Child.Action, Error>".parse().unwrap();
/// assert_eq!(ty.simple_name(), Some("Result"));
/// assert_eq!(ty.to_string(), "Result<Child.Action, Error>");
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeRef {
    Path(Vec<PathSegment>),
    Tuple(Vec<TypeRef>),
    /// `T?`
    Optional(Box<TypeRef>),
    /// `[T]`
    Array(Box<TypeRef>),
    /// `[K: V]`
    Dictionary(Box<TypeRef>, Box<TypeRef>),
    Other(String),
}

impl TypeRef {
    /// Creates a path type reference without any generic argument.
    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Path(segments.into_iter().map(PathSegment::plain).collect())
    }

    /// Gets the last identifier of a path, ignoring generic arguments.
    ///
    /// `Foo.Bar<Baz>` yields `Bar`. Tuples and unstructured types have no simple name.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Self::Path(segments) => segments.last().map(|segment| segment.name.as_str()),
            _ => None,
        }
    }

    /// Gets the dot separated identifiers of a path, ignoring generic arguments.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Self::Path(segments) => Some(segments.iter().map(|segment| &segment.name).join(".")),
            _ => None,
        }
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(segments) => write!(f, "{}", segments.iter().join(".")),
            Self::Tuple(elements) => write!(f, "({})", elements.iter().join(", ")),
            Self::Optional(wrapped) => write!(f, "{}?", wrapped),
            Self::Array(element) => write!(f, "[{}]", element),
            Self::Dictionary(key, value) => write!(f, "[{}: {}]", key, value),
            Self::Other(text) => f.write_str(text),
        }
    }
}

impl FromStr for TypeRef {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let mut parser = TypeParser {
            input: text,
            pos: 0,
            depth: 0,
        };
        Ok(match parser.parse_type() {
            Some(ty) if parser.at_end() => ty,
            _ => Self::Other(text.to_owned()),
        })
    }
}

impl From<&str> for TypeRef {
    fn from(text: &str) -> Self {
        match text.parse() {
            Ok(ty) => ty,
            Err(never) => match never {},
        }
    }
}

impl From<String> for TypeRef {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl From<TypeRef> for String {
    fn from(ty: TypeRef) -> Self {
        ty.to_string()
    }
}

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> TypeParser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.rest().is_empty()
    }

    // Gives up past the maximum depth, so that nothing downstream recurses without bound.
    fn enter(&mut self) -> Option<()> {
        if self.depth >= MAX_TYPE_DEPTH {
            return None;
        }
        self.depth += 1;
        Some(())
    }

    fn parse_type(&mut self) -> Option<TypeRef> {
        let depth = self.depth;
        let mut ty = self.parse_unwrapped()?;
        while self.eat('?') {
            self.enter()?;
            ty = TypeRef::Optional(Box::new(ty));
        }
        self.depth = depth;
        Some(ty)
    }

    fn parse_unwrapped(&mut self) -> Option<TypeRef> {
        if self.eat('(') {
            self.enter()?;
            let elements = if self.eat(')') {
                Vec::new()
            } else {
                self.parse_list(')')?
            };
            self.depth -= 1;
            return Some(TypeRef::Tuple(elements));
        }

        if self.eat('[') {
            self.enter()?;
            let element = self.parse_type()?;
            let ty = if self.eat(':') {
                let value = self.parse_type()?;
                TypeRef::Dictionary(Box::new(element), Box::new(value))
            } else {
                TypeRef::Array(Box::new(element))
            };
            if !self.eat(']') {
                return None;
            }
            self.depth -= 1;
            return Some(ty);
        }

        let mut segments = Vec::new();
        loop {
            let name = self.parse_identifier()?;
            let generics = if self.eat('<') {
                self.enter()?;
                let generics = self.parse_list('>')?;
                self.depth -= 1;
                generics
            } else {
                Vec::new()
            };
            segments.push(PathSegment::new(name, generics));
            if !self.eat('.') {
                break;
            }
        }
        Some(TypeRef::Path(segments))
    }

    // Comma separated types up to and including the closing delimiter.
    fn parse_list(&mut self, close: char) -> Option<Vec<TypeRef>> {
        let mut types = Vec::new();
        loop {
            types.push(self.parse_type()?);
            if self.eat(',') {
                continue;
            }
            if self.eat(close) {
                return Some(types);
            }
            return None;
        }
    }

    fn parse_identifier(&mut self) -> Option<String> {
        self.skip_whitespace();
        let rest = self.rest();
        if !rest.starts_with(|c: char| c.is_alphabetic() || c == '_') {
            return None;
        }
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.pos += len;
        Some(rest[..len].to_owned())
    }
}
