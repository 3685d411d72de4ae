//! Nexus: the symbol model and unification engine of NexusL.
//!
//! Every entity of a NexusL program is a [`Symbol`] allocated in a
//! [`SymbolTable`] and referred to by [`SymbolId`]. Terms are built from
//! symbols: constants, logic variables, cons cells and compound structures.
//!
//! Unification runs against an [`Environment`] that records speculative
//! bindings on a trail, so a failed branch can be undone precisely:
//!
//! ```
//! use nexus::syntax::parse_equation;
//! use nexus::unify::{Environment, Unifier};
//! use nexus::SymbolTable;
//!
//! let mut table = SymbolTable::new();
//! let (left, right) = parse_equation(&mut table, "likes(john, X) = likes(Y, food)").unwrap();
//!
//! let unifier = Unifier::with_defaults(&table);
//! let mut env = Environment::new();
//! assert!(unifier.unify(left, right, &mut env));
//! assert_eq!(unifier.resolve(left, &env).unwrap().to_string(), "likes(john, food)");
//! ```
//!
//! Bindings only become visible to other environments once they are
//! committed with [`Environment::apply_bindings_to_symbols`] (or
//! [`Registry::commit`] when the table is shared between threads).

pub mod error;
pub mod symbol;
pub mod syntax;
pub mod unify;

pub use error::{NexusError, Result};
pub use symbol::{
    LogicalKind, Registry, SemanticKind, Symbol, SymbolId, SymbolState, SymbolTable, Value,
};
pub use syntax::{parse_equation, parse_term};
pub use unify::{Environment, Term, Unifier, UnifyConfig};
