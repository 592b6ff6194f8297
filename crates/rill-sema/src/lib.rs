//! Rill semantic analysis.
//!
//! One pass over the parser's syntax tree builds the lexical scope tree,
//! declares and resolves variables, infers expression types, and validates
//! language rules, accumulating every finding instead of stopping at the
//! first. The result is what later passes (member resolution, execution)
//! consume: the scope tree, the statement-to-scope map, and the diagnostic
//! set.

pub mod analyzer;
pub mod compatibility;
pub mod errors;
pub mod infer;
pub mod scope;
pub mod types;
pub mod value;

pub use analyzer::{Analysis, Analyzer};
pub use compatibility::{ConversionOracle, Conversions};
pub use errors::{Diagnostic, SemanticError};
pub use infer::infer;
pub use scope::{Scope, ScopeId, ScopeTree, Variable};
pub use types::Type;
pub use value::{LazyValue, Value, evaluate};
