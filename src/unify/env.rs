//! Unification environments: speculative bindings plus an undo trail.

use crate::error::{NexusError, Result};
use crate::symbol::{SymbolId, SymbolTable};
use rustc_hash::FxHashMap;
use tracing::debug;

/// State of one variable just before a binding was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoRecord {
    /// The variable had no binding in this environment
    Unbound { variable: SymbolId },
    /// The variable was bound to `previous`
    Bound { variable: SymbolId, previous: SymbolId },
}

impl UndoRecord {
    pub fn variable(&self) -> SymbolId {
        match *self {
            UndoRecord::Unbound { variable } | UndoRecord::Bound { variable, .. } => variable,
        }
    }
}

/// A position in the trail. Obtained from [`Environment::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TrailMark(usize);

/// Bindings of one unification branch.
///
/// Every binding pushes exactly one [`UndoRecord`] before the map is touched,
/// so any prefix of the history can be restored with
/// [`backtrack_to`](Environment::backtrack_to). Forking is a plain clone; an
/// environment must not be shared between threads while it is mutated.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: FxHashMap<SymbolId, SymbolId>,
    trail: Vec<UndoRecord>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current binding of `variable` in this environment.
    pub fn get_binding(&self, variable: SymbolId) -> Option<SymbolId> {
        self.bindings.get(&variable).copied()
    }

    /// Trail the previous state of `variable`, then bind it to `value`.
    ///
    /// No kind checks happen here; [`Unifier::bind`](super::Unifier::bind)
    /// is the checked entry point.
    pub fn add_binding(&mut self, variable: SymbolId, value: SymbolId) {
        let record = match self.bindings.get(&variable) {
            Some(&previous) => UndoRecord::Bound { variable, previous },
            None => UndoRecord::Unbound { variable },
        };
        self.trail.push(record);
        self.bindings.insert(variable, value);
    }

    /// Remember the current trail position.
    pub fn mark(&self) -> TrailMark {
        TrailMark(self.trail.len())
    }

    /// Undo every binding made after `mark`, newest first. Bindings made
    /// before the mark survive. Marks newer than the trail are ignored.
    pub fn backtrack_to(&mut self, mark: TrailMark) {
        if mark.0 >= self.trail.len() {
            return;
        }
        debug!(from = self.trail.len(), to = mark.0, "backtracking environment");
        for record in self.trail.drain(mark.0..).rev() {
            match record {
                UndoRecord::Unbound { variable } => {
                    self.bindings.remove(&variable);
                }
                UndoRecord::Bound { variable, previous } => {
                    self.bindings.insert(variable, previous);
                }
            }
        }
    }

    /// Undo everything and start over with an empty environment.
    pub fn backtrack(&mut self) {
        self.backtrack_to(TrailMark(0));
        self.trail.clear();
        self.bindings.clear();
    }

    /// Independent copy for exploring another branch.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// All current bindings, ordered by variable id.
    pub fn bindings(&self) -> Vec<(SymbolId, SymbolId)> {
        let mut pairs: Vec<_> = self.bindings.iter().map(|(&k, &v)| (k, v)).collect();
        pairs.sort_unstable();
        pairs
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    pub fn trail(&self) -> &[UndoRecord] {
        &self.trail
    }

    /// Commit every binding into the table's persistent variable state.
    ///
    /// The commit is all-or-nothing: if any variable already carries a
    /// committed binding to a different symbol, nothing is written and
    /// [`NexusError::CommitConflict`] is returned. Committed bindings cannot
    /// be undone by [`backtrack`](Self::backtrack). Returns the number of
    /// bindings written.
    pub fn apply_bindings_to_symbols(&self, table: &mut SymbolTable) -> Result<usize> {
        let pairs = self.bindings();

        for &(variable, value) in &pairs {
            let sym = table.symbol(variable)?;
            if !sym.is_variable() {
                return Err(NexusError::NotAVariable(sym.display_name()));
            }
            table.symbol(value)?;
            if let Some(existing) = sym.binding {
                if existing != value {
                    return Err(NexusError::CommitConflict {
                        variable,
                        existing,
                        proposed: value,
                    });
                }
            }
        }

        for &(variable, value) in &pairs {
            table.set_binding(variable, value)?;
        }
        debug!(count = pairs.len(), "applied bindings to symbols");
        Ok(pairs.len())
    }
}
