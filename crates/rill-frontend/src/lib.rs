//! Rill frontend: syntax tree, spans, and name interning.
//!
//! The parser proper lives outside this repository; it targets the
//! [`SyntaxTree`] production constructors defined here. Everything the
//! semantic analyzer consumes (node kinds, child slots, parent links,
//! spans, interned names) is this crate's public surface.

pub mod ast;
pub mod intern;
pub mod token;

pub use ast::{BinaryOp, NodeId, NodeKind, Symbol, SyntaxTree, UnaryOp};
pub use intern::Interner;
pub use token::Span;
