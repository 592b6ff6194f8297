// src/value.rs
//
// Deferred initializer values.
//
// Declaring a variable never evaluates its initializer; the declaration
// stores a LazyValue holding the expression node, and the first consumer
// that forces it runs the constant evaluator exactly once. Non-constant
// expressions (names, calls, member access) simply yield no value.

use std::cell::OnceCell;

use rill_frontend::{BinaryOp, NodeId, NodeKind, SyntaxTree, UnaryOp};

/// A concrete script value produced by constant evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Double(f64),
    String(String),
    Boolean(bool),
    List(Vec<Value>),
}

/// Deferred, memoized evaluation of an initializer expression.
///
/// Forcing is idempotent: the first `force` evaluates and caches, every
/// later `force` returns the cached result. The cell is single-threaded
/// interior state, which keeps the whole scope tree `!Sync` on purpose.
#[derive(Debug)]
pub struct LazyValue {
    expr: NodeId,
    cell: OnceCell<Option<Value>>,
}

impl LazyValue {
    pub fn new(expr: NodeId) -> Self {
        Self {
            expr,
            cell: OnceCell::new(),
        }
    }

    /// The expression this value is deferred from
    pub fn expr(&self) -> NodeId {
        self.expr
    }

    pub fn is_forced(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Evaluate at most once and cache; `None` if the expression is not a
    /// constant this pass can fold.
    pub fn force(&self, tree: &SyntaxTree) -> Option<&Value> {
        self.cell.get_or_init(|| evaluate(tree, self.expr)).as_ref()
    }
}

/// Fold a constant expression to its value, or `None` if it is not constant
pub fn evaluate(tree: &SyntaxTree, node: NodeId) -> Option<Value> {
    match tree.kind(node) {
        NodeKind::IntLiteral(v) => Some(Value::Integer(*v)),
        NodeKind::DoubleLiteral(v) => Some(Value::Double(*v)),
        NodeKind::StringLiteral(s) => Some(Value::String(s.clone())),
        NodeKind::BoolLiteral(b) => Some(Value::Boolean(*b)),
        NodeKind::Rval => evaluate(tree, tree.rvalue_expr(node)),
        NodeKind::ListLiteral => tree
            .children(node)
            .iter()
            .map(|&element| evaluate(tree, element))
            .collect::<Option<Vec<Value>>>()
            .map(Value::List),
        NodeKind::Unary(op) => {
            let operand = evaluate(tree, tree.children(node)[0])?;
            apply_unary(*op, operand)
        }
        NodeKind::Binary(op) => {
            let lhs = evaluate(tree, tree.children(node)[0])?;
            let rhs = evaluate(tree, tree.children(node)[1])?;
            apply_binary(*op, lhs, rhs)
        }
        // Names, calls, indexing and member access are not constants
        _ => None,
    }
}

fn apply_unary(op: UnaryOp, operand: Value) -> Option<Value> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Integer(n)) => n.checked_neg().map(Value::Integer),
        (UnaryOp::Neg, Value::Double(d)) => Some(Value::Double(-d)),
        (UnaryOp::Not, Value::Boolean(b)) => Some(Value::Boolean(!b)),
        _ => None,
    }
}

fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Option<Value> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, lhs, rhs)
        }
        BinaryOp::Eq => Some(Value::Boolean(values_equal(&lhs, &rhs))),
        BinaryOp::Ne => Some(Value::Boolean(!values_equal(&lhs, &rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, lhs, rhs),
        BinaryOp::And => match (lhs, rhs) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(Value::Boolean(a && b)),
            _ => None,
        },
        BinaryOp::Or => match (lhs, rhs) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(Value::Boolean(a || b)),
            _ => None,
        },
    }
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> Option<Value> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => match op {
            BinaryOp::Add => a.checked_add(b).map(Value::Integer),
            BinaryOp::Sub => a.checked_sub(b).map(Value::Integer),
            BinaryOp::Mul => a.checked_mul(b).map(Value::Integer),
            BinaryOp::Div => a.checked_div(b).map(Value::Integer),
            BinaryOp::Mod => a.checked_rem(b).map(Value::Integer),
            _ => None,
        },
        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => {
            Some(Value::String(a + &b))
        }
        (lhs, rhs) => {
            let (a, b) = (as_double(&lhs)?, as_double(&rhs)?);
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Mod => a % b,
                _ => return None,
            };
            Some(Value::Double(result))
        }
    }
}

fn compare(op: BinaryOp, lhs: Value, rhs: Value) -> Option<Value> {
    let ordering = match (&lhs, &rhs) {
        (Value::String(a), Value::String(b)) => a.partial_cmp(b),
        _ => as_double(&lhs)?.partial_cmp(&as_double(&rhs)?),
    }?;

    let result = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => return None,
    };
    Some(Value::Boolean(result))
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    // Numeric equality ignores the integer/double distinction
    if let (Some(a), Some(b)) = (as_double(lhs), as_double(rhs)) {
        return a == b;
    }
    lhs == rhs
}

fn as_double(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Double(d) => Some(*d),
        _ => None,
    }
}
