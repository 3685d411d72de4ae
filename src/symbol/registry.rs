//! Thread-safe front end to a [`SymbolTable`].

use super::{SymbolId, SymbolTable, Value};
use crate::error::Result;
use crate::unify::Environment;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// A symbol table shared between threads.
///
/// Allocation and renaming take the write lock, so ids stay unique and
/// monotonic no matter how many threads create symbols. Unification only
/// needs a [`read`](Registry::read) guard.
#[derive(Debug, Default)]
pub struct Registry {
    table: RwLock<SymbolTable>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: SymbolTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Shared access for lookups and unification.
    pub fn read(&self) -> RwLockReadGuard<'_, SymbolTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access for bulk construction.
    pub fn write(&self) -> RwLockWriteGuard<'_, SymbolTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn new_symbol(&self) -> SymbolId {
        self.write().new_symbol()
    }

    pub fn new_variable(&self, name: &str) -> SymbolId {
        self.write().new_variable(name)
    }

    pub fn new_constant(&self, name: &str, value: impl Into<Value>) -> SymbolId {
        self.write().new_constant(name, value)
    }

    pub fn new_list(&self, head: SymbolId, tail: SymbolId) -> SymbolId {
        self.write().new_list(head, tail)
    }

    pub fn new_structure(&self, functor: SymbolId, args: Vec<SymbolId>) -> SymbolId {
        self.write().new_structure(functor, args)
    }

    pub fn assign_public_name(&self, id: SymbolId, name: &str) -> Result<()> {
        self.write().assign_public_name(id, name)
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<SymbolId> {
        self.read().lookup_by_name(name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Commit `env` into the shared table under one write lock, so readers
    /// see either none or all of its bindings.
    pub fn commit(&self, env: &Environment) -> Result<usize> {
        let mut table = self.write();
        let count = env.apply_bindings_to_symbols(&mut table)?;
        debug!(count, "committed environment to registry");
        Ok(count)
    }

    pub fn into_inner(self) -> SymbolTable {
        self.table.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
