//! Error types for Nexus.

use crate::symbol::{LogicalKind, SymbolId};
use thiserror::Error;

/// The main error type for Nexus operations.
#[derive(Debug, Error)]
pub enum NexusError {
    /// `bind` was called on something that is not a logic variable
    #[error("attempted to bind a non-variable symbol: {0}")]
    NotAVariable(String),

    /// Only undefined symbols and constants can take a constant value
    #[error("cannot instantiate {kind} symbol {name}")]
    NotInstantiable { name: String, kind: LogicalKind },

    /// Id not allocated by this table
    #[error("unknown symbol: {0}")]
    UnknownSymbol(SymbolId),

    /// Binding would create an infinite term
    #[error("occurs check failed: {variable} occurs in {term}")]
    OccursCheck { variable: SymbolId, term: SymbolId },

    /// A binding chain loops back on itself
    #[error("cyclic binding chain starting at {0}")]
    CyclicBinding(SymbolId),

    /// Constant payloads of different kinds were compared in strict mode
    #[error("incomparable constants: {left} vs {right}")]
    IncomparableConstants { left: String, right: String },

    /// Unification ran out of steps
    #[error("step budget of {0} exceeded")]
    StepBudgetExceeded(usize),

    /// Terms nested deeper than allowed
    #[error("depth limit of {0} exceeded")]
    DepthLimitExceeded(usize),

    /// Cooperative cancellation was requested
    #[error("unification cancelled")]
    Cancelled,

    /// A variable is already committed to a different value
    #[error("commit conflict: {variable} is already bound to {existing}, cannot rebind to {proposed}")]
    CommitConflict {
        variable: SymbolId,
        existing: SymbolId,
        proposed: SymbolId,
    },

    /// No procedure attached to the symbol
    #[error("no procedure attached to symbol {name} (ID: {id})")]
    NoProcedure { name: String, id: SymbolId },

    /// Attached procedure failed
    #[error("procedure error: {0}")]
    Procedure(String),

    /// Expected a list
    #[error("not a list: {0}")]
    NotAList(String),

    /// Term reader error
    #[error("parse error at {location}: {message}")]
    Parse { location: String, message: String },

    /// Reading a script failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Nexus operations.
pub type Result<T> = std::result::Result<T, NexusError>;
