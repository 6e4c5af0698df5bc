//! Collected diagnostics for the static-semantic band.
//!
//! Scope and type checking never stop at the first problem; they accumulate
//! `Diagnostic` values and the driver decides whether the pipeline may
//! proceed past the pass boundary.

use std::fmt;

use crate::ast::NodeId;

/// Machine-friendly diagnostic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    DuplicateName,
    CrossCategoryClash,
    ParamShadowed,
    UndeclaredVariable,
    TypeError,
    SyntaxError,
    LexicalError,
    EmitterError,
    RecursiveInline,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateName => "DuplicateName",
            DiagnosticKind::CrossCategoryClash => "CrossCategoryClash",
            DiagnosticKind::ParamShadowed => "ParamShadowed",
            DiagnosticKind::UndeclaredVariable => "UndeclaredVariable",
            DiagnosticKind::TypeError => "TypeError",
            DiagnosticKind::SyntaxError => "SyntaxError",
            DiagnosticKind::LexicalError => "LexicalError",
            DiagnosticKind::EmitterError => "EmitterError",
            DiagnosticKind::RecursiveInline => "RecursiveInline",
        }
    }
}

/// A single static-semantic finding.
///
/// `node_id` is 0 when no AST node applies; `scope_path` names the scope the
/// checker was resolving in, when that helps locate the problem.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub node_id: NodeId,
    pub scope_path: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            node_id: 0,
            scope_path: None,
        }
    }

    pub fn at_node(kind: DiagnosticKind, message: impl Into<String>, node_id: NodeId) -> Self {
        Self {
            kind,
            message: message.into(),
            node_id,
            scope_path: None,
        }
    }

    pub fn in_scope(mut self, scope_path: impl Into<String>) -> Self {
        self.scope_path = Some(scope_path.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    /// `<Kind>: <message> (node #<id>[, scope <path>])`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)?;
        match (self.node_id, &self.scope_path) {
            (0, None) => Ok(()),
            (0, Some(path)) => write!(f, " (scope {})", path),
            (id, None) => write!(f, " (node #{})", id),
            (id, Some(path)) => write!(f, " (node #{}, scope {})", id, path),
        }
    }
}
