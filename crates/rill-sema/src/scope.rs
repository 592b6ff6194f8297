// src/scope.rs
//
// The lexical scope tree.
//
// Scopes live in an arena addressed by ScopeId so the finished tree can be
// handed to downstream passes without ownership cycles: each scope stores
// its parent's index and the indices of the scopes it owns. Chain lookups
// walk parent links; inner definitions win over outer ones.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use rill_frontend::{NodeId, Symbol};

use crate::types::Type;
use crate::value::LazyValue;

/// Stable handle to a scope in a [`ScopeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// A declared variable
#[derive(Debug)]
pub struct Variable {
    pub ty: Type,
    /// Deferred initializer; replaced wholesale on re-assignment
    pub value: LazyValue,
    /// Bound by a `for` header; later stages reject writes to it
    pub is_iteration: bool,
    /// Bound by a `foreach` header; later stages reject writes to it
    pub is_enumeration: bool,
    /// Declaring node, for diagnostics
    pub decl_node: NodeId,
}

impl Variable {
    pub fn new(ty: Type, value: LazyValue, decl_node: NodeId) -> Self {
        Self {
            ty,
            value,
            is_iteration: false,
            is_enumeration: false,
            decl_node,
        }
    }
}

/// One lexical scope: local variables plus tree links
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<ScopeId>,
    children: SmallVec<[ScopeId; 4]>,
    variables: FxHashMap<Symbol, Variable>,
    bound_statements: Vec<NodeId>,
}

impl Scope {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    /// Look up a variable in this scope only, ignoring ancestors
    pub fn get(&self, name: Symbol) -> Option<&Variable> {
        self.variables.get(&name)
    }

    pub fn variables(&self) -> impl Iterator<Item = (Symbol, &Variable)> {
        self.variables.iter().map(|(&name, var)| (name, var))
    }

    /// Statement nodes whose enclosing scope is this one
    pub fn bound_statements(&self) -> &[NodeId] {
        &self.bound_statements
    }
}

/// Arena of scopes; the root is allocated at construction and never removed
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Allocate a new scope owned by `parent`
    pub fn create_child(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        self.scope_mut(parent).children.push(id);
        id
    }

    /// Whether `name` resolves anywhere on the chain from `from` to the root
    pub fn is_defined(&self, from: ScopeId, name: Symbol) -> bool {
        self.lookup(from, name).is_some()
    }

    /// Resolve `name` from `from` outwards; the innermost definition wins
    pub fn lookup(&self, from: ScopeId, name: Symbol) -> Option<&Variable> {
        self.defining_scope(from, name)
            .and_then(|scope| self.scope(scope).get(name))
    }

    pub fn lookup_mut(&mut self, from: ScopeId, name: Symbol) -> Option<&mut Variable> {
        let scope = self.defining_scope(from, name)?;
        self.scope_mut(scope).variables.get_mut(&name)
    }

    fn defining_scope(&self, from: ScopeId, name: Symbol) -> Option<ScopeId> {
        let mut current = Some(from);
        while let Some(id) = current {
            if self.scope(id).variables.contains_key(&name) {
                return Some(id);
            }
            current = self.scope(id).parent;
        }
        None
    }

    /// Insert into the local table of `scope` only. Conflict policy is the
    /// caller's: this overwrites silently, so check `is_defined` first when
    /// redeclaration must be rejected.
    pub fn declare(&mut self, scope: ScopeId, name: Symbol, var: Variable) {
        self.scope_mut(scope).variables.insert(name, var);
    }

    pub(crate) fn bind_statement(&mut self, scope: ScopeId, stmt: NodeId) {
        self.scope_mut(scope).bound_statements.push(stmt);
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
