// src/infer.rs
//
// Expression type inference.
//
// Pure structural walk over an expression subtree, consulting the scope
// chain for identifier types and nothing else. Forms this pass defers
// (member access, calls, indexing) infer to Unknown instead of erroring;
// Unknown is the analyzer's signal to suppress dependent checks.

use rill_frontend::{BinaryOp, NodeId, NodeKind, SyntaxTree, UnaryOp};

use crate::scope::{ScopeId, ScopeTree};
use crate::types::Type;

/// Infer the static type of the expression at `node`, resolving identifiers
/// through the scope chain starting at `scope`
pub fn infer(tree: &SyntaxTree, scopes: &ScopeTree, scope: ScopeId, node: NodeId) -> Type {
    match tree.kind(node) {
        NodeKind::IntLiteral(_) => Type::Integer,
        NodeKind::DoubleLiteral(_) => Type::Double,
        NodeKind::StringLiteral(_) => Type::String,
        NodeKind::BoolLiteral(_) => Type::Boolean,
        NodeKind::ListLiteral => Type::List,

        NodeKind::Identifier(name) => scopes
            .lookup(scope, *name)
            .map(|var| var.ty)
            .unwrap_or(Type::Unknown),

        NodeKind::Rval => infer(tree, scopes, scope, tree.rvalue_expr(node)),

        NodeKind::Unary(UnaryOp::Not) => Type::Boolean,
        NodeKind::Unary(UnaryOp::Neg) => {
            let operand = infer(tree, scopes, scope, tree.children(node)[0]);
            if operand.is_numeric() {
                operand
            } else {
                Type::Unknown
            }
        }

        NodeKind::Binary(op) => {
            let lhs = infer(tree, scopes, scope, tree.children(node)[0]);
            let rhs = infer(tree, scopes, scope, tree.children(node)[1]);
            binary_result(*op, lhs, rhs)
        }

        // Deferred to the member-resolution pass
        NodeKind::MemberAccess | NodeKind::Call(_) | NodeKind::Index => Type::Unknown,

        // Statement-level nodes have no expression type
        _ => Type::Unknown,
    }
}

fn binary_result(op: BinaryOp, lhs: Type, rhs: Type) -> Type {
    match op {
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge
        | BinaryOp::And
        | BinaryOp::Or => Type::Boolean,

        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            if lhs == Type::Integer && rhs == Type::Integer {
                Type::Integer
            } else if lhs.is_numeric() && rhs.is_numeric() {
                Type::Double
            } else if op == BinaryOp::Add && lhs == Type::String && rhs == Type::String {
                Type::String
            } else {
                Type::Unknown
            }
        }
    }
}
