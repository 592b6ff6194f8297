// src/errors.rs
//! Semantic analysis diagnostics (E2xxx).

use std::hash::{Hash, Hasher};

use miette::SourceSpan;
use thiserror::Error;

use rill_frontend::NodeId;

#[derive(Error, Debug, miette::Diagnostic, Clone)]
pub enum SemanticError {
    #[error("variable '{name}' is already declared")]
    #[diagnostic(code(E2001))]
    ConflictingVariableName {
        name: String,
        #[label("conflicts with an existing declaration")]
        span: SourceSpan,
    },

    #[error("unresolved variable '{name}'")]
    #[diagnostic(code(E2002))]
    UnresolvedVariable {
        name: String,
        #[label("not found in any enclosing scope")]
        span: SourceSpan,
    },

    #[error("expected {expected}, found {found}")]
    #[diagnostic(code(E2003))]
    UnexpectedType {
        expected: String,
        found: String,
        #[label("unexpected type")]
        span: SourceSpan,
    },

    #[error("{clause} condition must be boolean, found {found}")]
    #[diagnostic(code(E2004))]
    InvalidCondition {
        clause: String,
        found: String,
        #[label("expected boolean")]
        span: SourceSpan,
    },
}

/// A semantic finding tied to the node that produced it.
///
/// The accumulating collection treats two diagnostics as the same finding
/// when they have the same variant, the same offending node, and render to
/// the same message; the first occurrence wins.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub error: SemanticError,
    pub node: NodeId,
}

impl Diagnostic {
    pub fn new(error: SemanticError, node: NodeId) -> Self {
        Self { error, node }
    }
}

impl PartialEq for Diagnostic {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
            && std::mem::discriminant(&self.error) == std::mem::discriminant(&other.error)
            && self.error.to_string() == other.error.to_string()
    }
}

impl Eq for Diagnostic {}

impl Hash for Diagnostic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state);
        std::mem::discriminant(&self.error).hash(state);
        self.error.to_string().hash(state);
    }
}
