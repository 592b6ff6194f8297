// src/analyzer.rs
//
// The scope-building traversal.
//
// One pre-order walk over the syntax tree does all of the work: it pushes
// and pops the scope cursor around scope-introducing constructs, declares
// variables at loop headers and first assignments, resolves identifier
// reads, validates condition and assignment types, and records which scope
// owns each statement. Nothing aborts the walk; every rule degrades to a
// recorded diagnostic plus best-effort state.

use rustc_hash::FxHashMap;

use rill_frontend::{Interner, NodeId, NodeKind, Symbol, SyntaxTree};

use crate::compatibility::ConversionOracle;
use crate::errors::{Diagnostic, SemanticError};
use crate::infer::infer;
use crate::scope::{ScopeId, ScopeTree, Variable};
use crate::types::Type;
use crate::value::LazyValue;

/// Everything the traversal produces, retained for downstream passes
#[derive(Debug)]
pub struct Analysis {
    scopes: ScopeTree,
    statement_scopes: FxHashMap<NodeId, ScopeId>,
    diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    /// True iff the pass recorded no diagnostics
    pub fn success(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn root(&self) -> ScopeId {
        self.scopes.root()
    }

    /// Owning scope of a `Statement` node
    pub fn scope_of(&self, statement: NodeId) -> Option<ScopeId> {
        self.statement_scopes.get(&statement).copied()
    }

    pub fn statements(&self) -> impl Iterator<Item = (NodeId, ScopeId)> + '_ {
        self.statement_scopes.iter().map(|(&node, &scope)| (node, scope))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Semantic analyzer for one syntax tree.
///
/// Not reentrant: one traversal per instance, run on first use and cached.
/// Repeated [`Analyzer::analyze`] calls return the same [`Analysis`].
pub struct Analyzer<'a> {
    tree: &'a SyntaxTree,
    interner: &'a Interner,
    oracle: &'a dyn ConversionOracle,
    output: Option<Analysis>,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        tree: &'a SyntaxTree,
        interner: &'a Interner,
        oracle: &'a dyn ConversionOracle,
    ) -> Self {
        Self {
            tree,
            interner,
            oracle,
            output: None,
        }
    }

    /// Run the traversal on first call; afterwards return the cached output
    #[tracing::instrument(skip_all)]
    pub fn analyze(&mut self) -> &Analysis {
        let (tree, interner, oracle) = (self.tree, self.interner, self.oracle);
        self.output
            .get_or_insert_with(|| ScopeBuilder::new(tree, interner, oracle).run())
    }

    /// Like [`Analyzer::analyze`], but takes ownership of the output
    pub fn into_analysis(self) -> Analysis {
        match self.output {
            Some(analysis) => analysis,
            None => ScopeBuilder::new(self.tree, self.interner, self.oracle).run(),
        }
    }
}

/// Working state of the traversal: the scope cursor plus the accumulators
struct ScopeBuilder<'a> {
    tree: &'a SyntaxTree,
    interner: &'a Interner,
    oracle: &'a dyn ConversionOracle,
    scopes: ScopeTree,
    current: ScopeId,
    statement_scopes: FxHashMap<NodeId, ScopeId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ScopeBuilder<'a> {
    fn new(
        tree: &'a SyntaxTree,
        interner: &'a Interner,
        oracle: &'a dyn ConversionOracle,
    ) -> Self {
        let scopes = ScopeTree::new();
        let current = scopes.root();
        Self {
            tree,
            interner,
            oracle,
            scopes,
            current,
            statement_scopes: FxHashMap::default(),
            diagnostics: Vec::new(),
        }
    }

    fn run(mut self) -> Analysis {
        let root = self.tree.root().expect("syntax tree has no script root");
        self.visit(root);
        debug_assert_eq!(self.current, self.scopes.root(), "unbalanced scope cursor");

        tracing::debug!(
            scopes = self.scopes.len(),
            statements = self.statement_scopes.len(),
            diagnostics = self.diagnostics.len(),
            "analysis finished"
        );
        Analysis {
            scopes: self.scopes,
            statement_scopes: self.statement_scopes,
            diagnostics: self.diagnostics,
        }
    }

    /// Record a diagnostic unless the same finding was already recorded
    fn report(&mut self, error: SemanticError, node: NodeId) {
        let diagnostic = Diagnostic::new(error, node);
        if !self.diagnostics.contains(&diagnostic) {
            tracing::debug!(node = %node, message = %diagnostic.error, "semantic diagnostic");
            self.diagnostics.push(diagnostic);
        }
    }

    fn push_scope(&mut self) {
        self.current = self.scopes.create_child(self.current);
        tracing::trace!(scope = %self.current, "entered scope");
    }

    fn pop_scope(&mut self) {
        let parent = self
            .scopes
            .scope(self.current)
            .parent()
            .expect("cannot pop the root scope");
        tracing::trace!(scope = %self.current, "left scope");
        self.current = parent;
    }

    fn visit(&mut self, node: NodeId) {
        match self.tree.kind(node) {
            NodeKind::Statement => self.visit_statement(node),
            NodeKind::Block => {
                self.push_scope();
                self.visit_children(node);
                self.pop_scope();
            }
            NodeKind::While => self.visit_while(node),
            NodeKind::For => self.visit_for(node),
            NodeKind::Foreach => self.visit_foreach(node),
            NodeKind::If => self.visit_if(node),
            NodeKind::Assignment => self.visit_assignment(node),
            NodeKind::Identifier(name) => {
                let name = *name;
                self.visit_identifier(node, name);
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: NodeId) {
        let tree = self.tree;
        for &child in tree.children(node) {
            self.visit(child);
        }
    }

    /// Every statement, compound ones included, is owned by the scope that
    /// is current when its wrapper is reached
    fn visit_statement(&mut self, node: NodeId) {
        self.statement_scopes.insert(node, self.current);
        self.scopes.bind_statement(self.current, node);
        self.visit_children(node);
    }

    fn visit_while(&mut self, node: NodeId) {
        let tree = self.tree;
        // A textual block body introduces its own scope; pushing here too
        // would nest two scopes for one block
        let has_block = tree
            .descendants(node)
            .any(|n| matches!(tree.kind(n), NodeKind::Block));
        if !has_block {
            self.push_scope();
        }
        self.visit_children(node);
        if !has_block {
            self.pop_scope();
        }
    }

    fn visit_for(&mut self, node: NodeId) {
        let tree = self.tree;
        let var = tree.loop_variable(node);
        let name = tree.symbol(var);

        self.push_scope();
        if self.scopes.is_defined(self.current, name) {
            self.report(
                SemanticError::ConflictingVariableName {
                    name: self.interner.resolve(name).to_string(),
                    span: tree.span(var).into(),
                },
                var,
            );
        } else {
            let start = tree.iteration_start(node);
            let mut variable = Variable::new(Type::Integer, LazyValue::new(start), var);
            variable.is_iteration = true;
            tracing::trace!(name = self.interner.resolve(name), "declared iteration variable");
            self.scopes.declare(self.current, name, variable);
        }
        self.visit_children(node);
        self.pop_scope();
    }

    fn visit_foreach(&mut self, node: NodeId) {
        let tree = self.tree;
        let var = tree.loop_variable(node);
        let name = tree.symbol(var);
        let source = tree.enumeration_source(node);

        self.push_scope();
        let source_ty = infer(tree, &self.scopes, self.current, source);
        if source_ty != Type::List {
            let expr = tree.rvalue_expr(source);
            self.report(
                SemanticError::UnexpectedType {
                    expected: Type::List.name().to_string(),
                    found: source_ty.name().to_string(),
                    span: tree.span(expr).into(),
                },
                expr,
            );
        }

        if self.scopes.is_defined(self.current, name) {
            self.report(
                SemanticError::ConflictingVariableName {
                    name: self.interner.resolve(name).to_string(),
                    span: tree.span(var).into(),
                },
                var,
            );
        } else {
            // The variable takes the enumerated expression's own type and
            // value; element typing belongs to a later pass
            let mut variable = Variable::new(source_ty, LazyValue::new(source), var);
            variable.is_enumeration = true;
            tracing::trace!(name = self.interner.resolve(name), "declared enumeration variable");
            self.scopes.declare(self.current, name, variable);
        }
        self.visit_children(node);
        self.pop_scope();
    }

    fn visit_if(&mut self, node: NodeId) {
        let tree = self.tree;
        self.check_condition(tree.condition(node), "if".to_string());
        for (index, elseif) in tree.elseifs(node).enumerate() {
            self.check_condition(tree.condition(elseif), format!("elseif #{}", index + 1));
        }
        self.visit_children(node);
    }

    /// A condition whose type is known and not boolean is invalid; an
    /// undetermined type suppresses the check
    fn check_condition(&mut self, cond: NodeId, clause: String) {
        let ty = infer(self.tree, &self.scopes, self.current, cond);
        if ty != Type::Unknown && ty != Type::Boolean {
            let expr = self.tree.rvalue_expr(cond);
            self.report(
                SemanticError::InvalidCondition {
                    clause,
                    found: ty.name().to_string(),
                    span: self.tree.span(expr).into(),
                },
                expr,
            );
        }
    }

    fn visit_assignment(&mut self, node: NodeId) {
        let tree = self.tree;
        // Both sides are visited before any declaration happens, so
        // right-side reads of the target name resolve against prior state
        self.visit_children(node);

        let lval = tree.assignment_lval(node);
        let rval = tree.assignment_rval(node);

        // Member (and index) targets resolve in the later member-model pass
        let deferred = matches!(tree.kind(lval), NodeKind::MemberAccess | NodeKind::Index)
            || tree
                .descendants(lval)
                .any(|n| matches!(tree.kind(n), NodeKind::MemberAccess));
        if deferred {
            return;
        }
        let name = match tree.kind(lval) {
            NodeKind::Identifier(name) => *name,
            _ => return,
        };

        if !self.scopes.is_defined(self.current, name) {
            let ty = infer(tree, &self.scopes, self.current, rval);
            tracing::trace!(
                name = self.interner.resolve(name),
                ty = ty.name(),
                "declared variable"
            );
            self.scopes
                .declare(self.current, name, Variable::new(ty, LazyValue::new(rval), lval));
        } else {
            let expected = infer(tree, &self.scopes, self.current, lval);
            let found = infer(tree, &self.scopes, self.current, rval);
            if expected != found && !self.oracle.can_convert(found, expected) {
                let expr = tree.rvalue_expr(rval);
                self.report(
                    SemanticError::UnexpectedType {
                        expected: expected.name().to_string(),
                        found: found.name().to_string(),
                        span: tree.span(expr).into(),
                    },
                    expr,
                );
            }
            // The write happens whether or not the types agreed
            if let Some(variable) = self.scopes.lookup_mut(self.current, name) {
                variable.value = LazyValue::new(rval);
            }
        }
    }

    fn visit_identifier(&mut self, node: NodeId, name: Symbol) {
        let tree = self.tree;
        // Member components resolve in the later member-model pass
        if let Some(parent) = tree.parent(node)
            && matches!(tree.kind(parent), NodeKind::MemberAccess)
        {
            return;
        }
        // Only reads are validated; assignment targets and loop headers may
        // introduce the name
        let is_read = tree
            .ancestors(node)
            .any(|a| matches!(tree.kind(a), NodeKind::Rval));
        if is_read && !self.scopes.is_defined(self.current, name) {
            self.report(
                SemanticError::UnresolvedVariable {
                    name: self.interner.resolve(name).to_string(),
                    span: tree.span(node).into(),
                },
                node,
            );
        }
    }
}
