// tests/scripts.rs
//
// Whole-script scenarios driven through the public API, standing in for the
// external parser: each test builds the tree the way the grammar would and
// checks the full diagnostic profile and scope topology in one run.

use rill_frontend::{BinaryOp, Interner, NodeId, Span, SyntaxTree};
use rill_sema::{Analyzer, Conversions, SemanticError, Type, Value};

fn span() -> Span {
    Span::new(0, 1, 1, 1)
}

struct Script {
    tree: SyntaxTree,
    interner: Interner,
}

impl Script {
    fn new() -> Self {
        Self {
            tree: SyntaxTree::new(),
            interner: Interner::new(),
        }
    }

    fn ident(&mut self, name: &str) -> NodeId {
        let sym = self.interner.intern(name);
        self.tree.identifier(span(), sym)
    }

    fn assign(&mut self, name: &str, rhs: NodeId) -> NodeId {
        let lhs = self.ident(name);
        let assignment = self.tree.assignment(span(), lhs, rhs);
        self.tree.statement(assignment)
    }

    fn analyze(&self) -> rill_sema::Analysis {
        Analyzer::new(&self.tree, &self.interner, &Conversions).into_analysis()
    }
}

/// total = 0
/// values = [1, 2, 3]
/// foreach v in values { total = total + 1 }
/// if total > 2 { label = "big" } elseif total == 0 { label = "empty" }
/// while total > 0 { total = total - 1 }
#[test]
fn well_formed_script_produces_no_diagnostics() {
    let mut s = Script::new();

    let zero = s.tree.int_literal(span(), 0);
    let decl_total = s.assign("total", zero);

    let elems = vec![
        s.tree.int_literal(span(), 1),
        s.tree.int_literal(span(), 2),
        s.tree.int_literal(span(), 3),
    ];
    let list = s.tree.list_literal(span(), elems);
    let decl_values = s.assign("values", list);

    let total_read = s.ident("total");
    let one = s.tree.int_literal(span(), 1);
    let bump = s.tree.binary(span(), BinaryOp::Add, total_read, one);
    let bump_stmt = s.assign("total", bump);
    let foreach_body = s.tree.block(span(), vec![bump_stmt]);
    let v = s.ident("v");
    let values_read = s.ident("values");
    let foreach = s.tree.foreach_stmt(span(), v, values_read, foreach_body);
    let foreach_stmt = s.tree.statement(foreach);

    let total_read = s.ident("total");
    let two = s.tree.int_literal(span(), 2);
    let gt = s.tree.binary(span(), BinaryOp::Gt, total_read, two);
    let big = s.tree.string_literal(span(), "big");
    let then_assign = s.assign("label", big);
    let then_body = s.tree.block(span(), vec![then_assign]);
    let total_read = s.ident("total");
    let zero = s.tree.int_literal(span(), 0);
    let eq = s.tree.binary(span(), BinaryOp::Eq, total_read, zero);
    let empty = s.tree.string_literal(span(), "empty");
    let elseif_assign = s.assign("label", empty);
    let elseif_body = s.tree.block(span(), vec![elseif_assign]);
    let elseif = s.tree.elseif(span(), eq, elseif_body);
    let if_node = s.tree.if_stmt(span(), gt, then_body, vec![elseif], None);
    let if_stmt = s.tree.statement(if_node);

    let total_read = s.ident("total");
    let zero = s.tree.int_literal(span(), 0);
    let positive = s.tree.binary(span(), BinaryOp::Gt, total_read, zero);
    let total_read = s.ident("total");
    let one = s.tree.int_literal(span(), 1);
    let dec = s.tree.binary(span(), BinaryOp::Sub, total_read, one);
    let dec_stmt = s.assign("total", dec);
    let while_body = s.tree.block(span(), vec![dec_stmt]);
    let while_node = s.tree.while_stmt(span(), positive, while_body);
    let while_stmt = s.tree.statement(while_node);

    s.tree.script(vec![
        decl_total,
        decl_values,
        foreach_stmt,
        if_stmt,
        while_stmt,
    ]);

    let analysis = s.analyze();
    assert!(analysis.success(), "unexpected: {:?}", analysis.diagnostics());

    // root, foreach + its block, then block, elseif block, while block
    assert_eq!(analysis.scopes().len(), 6);
    assert_eq!(analysis.statements().count(), 9);

    let root = analysis.root();
    assert_eq!(analysis.scope_of(decl_total), Some(root));
    assert_eq!(analysis.scope_of(foreach_stmt), Some(root));

    let foreach_scope = analysis.scopes().scope(root).children()[0];
    let foreach_block = analysis.scopes().scope(foreach_scope).children()[0];
    assert_eq!(analysis.scope_of(bump_stmt), Some(foreach_block));

    let total = s.interner.intern("total");
    let variable = analysis.scopes().lookup(root, total).unwrap();
    assert_eq!(variable.ty, Type::Integer);
    // The last write wins: total = total - 1, not a constant
    assert_eq!(variable.value.force(&s.tree), None);

    let values = s.interner.intern("values");
    let variable = analysis.scopes().lookup(root, values).unwrap();
    assert_eq!(variable.ty, Type::List);
    assert_eq!(
        variable.value.force(&s.tree),
        Some(&Value::List(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
        ]))
    );
}

/// count = 1
/// count = "one"
/// msg = missing
/// for count = 0 to 3 { }
/// foreach item in count { }
/// if "x" { }
#[test]
fn every_semantic_issue_is_reported_in_one_run() {
    let mut s = Script::new();

    let one = s.tree.int_literal(span(), 1);
    let decl = s.assign("count", one);

    let one_str = s.tree.string_literal(span(), "one");
    let bad_write = s.assign("count", one_str);

    let missing = s.ident("missing");
    let bad_read = s.assign("msg", missing);

    let var = s.ident("count");
    let start = s.tree.int_literal(span(), 0);
    let end = s.tree.int_literal(span(), 3);
    let for_body = s.tree.block(span(), vec![]);
    let for_node = s.tree.for_stmt(span(), var, start, end, for_body);
    let for_stmt = s.tree.statement(for_node);

    let item = s.ident("item");
    let count_read = s.ident("count");
    let foreach_body = s.tree.block(span(), vec![]);
    let foreach = s.tree.foreach_stmt(span(), item, count_read, foreach_body);
    let foreach_stmt = s.tree.statement(foreach);

    let x = s.tree.string_literal(span(), "x");
    let then_body = s.tree.block(span(), vec![]);
    let if_node = s.tree.if_stmt(span(), x, then_body, vec![], None);
    let if_stmt = s.tree.statement(if_node);

    s.tree.script(vec![
        decl,
        bad_write,
        bad_read,
        for_stmt,
        foreach_stmt,
        if_stmt,
    ]);

    let analysis = s.analyze();
    assert!(!analysis.success());

    let diagnostics = analysis.diagnostics();
    assert_eq!(diagnostics.len(), 5, "got: {diagnostics:?}");

    match &diagnostics[0].error {
        SemanticError::UnexpectedType {
            expected, found, ..
        } => {
            assert_eq!(expected, "integer");
            assert_eq!(found, "string");
        }
        other => panic!("expected UnexpectedType, got {other:?}"),
    }
    assert!(matches!(
        diagnostics[1].error,
        SemanticError::UnresolvedVariable { .. }
    ));
    assert!(matches!(
        diagnostics[2].error,
        SemanticError::ConflictingVariableName { .. }
    ));
    match &diagnostics[3].error {
        SemanticError::UnexpectedType {
            expected, found, ..
        } => {
            assert_eq!(expected, "list");
            assert_eq!(found, "integer");
        }
        other => panic!("expected UnexpectedType, got {other:?}"),
    }
    match &diagnostics[4].error {
        SemanticError::InvalidCondition { clause, found, .. } => {
            assert_eq!(clause, "if");
            assert_eq!(found, "string");
        }
        other => panic!("expected InvalidCondition, got {other:?}"),
    }

    // Despite the rejected write, count holds the new value and its old type
    let count = s.interner.intern("count");
    let variable = analysis.scopes().lookup(analysis.root(), count).unwrap();
    assert_eq!(variable.ty, Type::Integer);
    assert_eq!(
        variable.value.force(&s.tree),
        Some(&Value::String("one".into()))
    );
}

/// settings.depth = 3
/// x = settings.depth + widget.size
#[test]
fn member_chains_are_left_to_the_next_pass() {
    let mut s = Script::new();

    let settings = s.ident("settings");
    let depth = s.ident("depth");
    let target = s.tree.member_access(span(), settings, depth);
    let three = s.tree.int_literal(span(), 3);
    let member_write = s.tree.assignment(span(), target, three);
    let member_write_stmt = s.tree.statement(member_write);

    let settings = s.ident("settings");
    let depth = s.ident("depth");
    let lhs_access = s.tree.member_access(span(), settings, depth);
    let widget = s.ident("widget");
    let size = s.ident("size");
    let rhs_access = s.tree.member_access(span(), widget, size);
    let sum = s.tree.binary(span(), BinaryOp::Add, lhs_access, rhs_access);
    let read_stmt = s.assign("x", sum);

    s.tree.script(vec![member_write_stmt, read_stmt]);

    let analysis = s.analyze();
    assert!(analysis.success(), "unexpected: {:?}", analysis.diagnostics());

    // Nothing was declared by the member write; x inferred as unknown
    let x = s.interner.intern("x");
    let variable = analysis.scopes().lookup(analysis.root(), x).unwrap();
    assert_eq!(variable.ty, Type::Unknown);

    let settings = s.interner.intern("settings");
    assert!(analysis.scopes().lookup(analysis.root(), settings).is_none());
}
