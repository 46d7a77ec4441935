//! Classification of generation failures.
//!
//! Rendering a diagnostic (source highlighting, message decoration) is left to the host: the
//! generator only tells what went wrong and where.

use std::error::Error;

use crate::declaration::Span;

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum DiagnosticKind {
    #[error("action dispatch needs to be applied to a struct")]
    InvalidRootNodeType,
    #[error("action dispatch requires conformance to the reducer capability in the declaration")]
    ReducerConformanceNotFound,
    #[error("action dispatch requires the Action enum to be nested inside the reducer")]
    NestedActionRequired,
    #[error("the dispatch exclusion attribute can only be attached to an enum case")]
    IncorrectAttributeUsage,
    #[error("cannot derive a parameter name for payload #{index} of case `{case}`")]
    UnsupportedParameter { case: String, index: usize },
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl DiagnosticKind {
    /// Stable identifier of the diagnostic, independent from its message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRootNodeType => "invalid-root-node-type",
            Self::ReducerConformanceNotFound => "reducer-conformance-not-found",
            Self::NestedActionRequired => "nested-action-required",
            Self::IncorrectAttributeUsage => "incorrect-attribute-usage",
            Self::UnsupportedParameter { .. } => "unsupported-parameter",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// A diagnostic attached to a host location.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error, new)]
#[error("{kind}")]
pub struct Diagnostic {
    kind: DiagnosticKind,
    span: Span,
}

impl Diagnostic {
    /// Turns any error into a diagnostic.
    ///
    /// Diagnostics pass through unchanged, a bare [DiagnosticKind] is attached to `span`, and
    /// everything else becomes [DiagnosticKind::Unknown] at `span`.
    pub fn classify(error: &(dyn Error + 'static), span: Span) -> Self {
        if let Some(diagnostic) = error.downcast_ref::<Diagnostic>() {
            diagnostic.clone()
        } else if let Some(kind) = error.downcast_ref::<DiagnosticKind>() {
            Self::new(kind.clone(), span)
        } else {
            Self::new(DiagnosticKind::Unknown(error.to_string()), span)
        }
    }

    pub fn kind(&self) -> &DiagnosticKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }
}
