//! Symbol table: the arena that allocates and indexes every symbol.

use super::{
    ListPair, LogicalKind, Payload, Procedure, SemanticKind, StructureTerm, Symbol, SymbolId,
    SymbolState, Value,
};
use crate::error::{NexusError, Result};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Arena of symbols indexed by [`SymbolId`], plus a public-name index.
///
/// Ids are handed out monotonically starting at
/// [`RESERVED_IDS`](super::RESERVED_IDS) and are never reused. The first two
/// ids are the `nil` and `_` singletons, created by [`SymbolTable::new`].
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_name: FxHashMap<String, SymbolId>,
}

impl SymbolTable {
    /// Create a table holding only the `nil` and `_` singletons.
    pub fn new() -> Self {
        let mut table = Self {
            symbols: Vec::with_capacity(64),
            by_name: FxHashMap::default(),
        };

        let null = table.new_symbol();
        table.init_singleton(null, "nil", SemanticKind::Literal, LogicalKind::Null);
        let anonymous = table.new_symbol();
        table.init_singleton(
            anonymous,
            "_",
            SemanticKind::Identifier,
            LogicalKind::Anonymous,
        );
        debug_assert_eq!(null, SymbolId::NULL);
        debug_assert_eq!(anonymous, SymbolId::ANONYMOUS);

        table
    }

    fn init_singleton(&mut self, id: SymbolId, name: &str, semantic: SemanticKind, kind: LogicalKind) {
        let sym = &mut self.symbols[id.index().unwrap_or_default()];
        sym.public_name = Some(name.to_string());
        sym.semantic_kind = semantic;
        sym.logical_kind = kind;
        sym.state = SymbolState::Embodied;
        self.by_name.insert(name.to_string(), id);
    }

    /// The `nil` singleton.
    pub fn null(&self) -> SymbolId {
        SymbolId::NULL
    }

    /// The `_` singleton.
    pub fn anonymous(&self) -> SymbolId {
        SymbolId::ANONYMOUS
    }

    /// Number of allocated symbols, singletons included.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Look up a symbol by id.
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        id.index().and_then(|i| self.symbols.get(i))
    }

    /// Like [`get`](Self::get), but unknown ids are an error.
    pub fn symbol(&self, id: SymbolId) -> Result<&Symbol> {
        self.get(id).ok_or(NexusError::UnknownSymbol(id))
    }

    fn symbol_mut(&mut self, id: SymbolId) -> Result<&mut Symbol> {
        id.index()
            .and_then(|i| self.symbols.get_mut(i))
            .ok_or(NexusError::UnknownSymbol(id))
    }

    /// Iterate over all symbols in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Allocate a fresh `Undefined`/`Exists` symbol.
    pub fn new_symbol(&mut self) -> SymbolId {
        let id = SymbolId::from_index(self.symbols.len());
        self.symbols.push(Symbol::new(id));
        id
    }

    /// Allocate a symbol and register it under `name`.
    pub fn new_symbol_with_public_name(&mut self, name: &str, semantic: SemanticKind) -> SymbolId {
        let id = self.new_symbol();
        self.register_name(id, name);
        let slot = self.slot(id);
        self.symbols[slot].semantic_kind = semantic;
        id
    }

    /// Give a symbol a public name, replacing any name it had before.
    pub fn assign_public_name(&mut self, id: SymbolId, name: &str) -> Result<()> {
        self.symbol(id)?;
        self.register_name(id, name);
        Ok(())
    }

    fn register_name(&mut self, id: SymbolId, name: &str) {
        let slot = self.slot(id);
        if let Some(old) = self.symbols[slot].public_name.take() {
            if self.by_name.get(&old) == Some(&id) {
                self.by_name.remove(&old);
            }
        }
        self.symbols[slot].public_name = Some(name.to_string());
        self.by_name.insert(name.to_string(), id);
    }

    fn slot(&self, id: SymbolId) -> usize {
        id.index().unwrap_or(usize::MAX)
    }

    /// Find a symbol by its registered public name.
    pub fn lookup_by_name(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    /// New unbound logic variable. Variable names are not indexed: two
    /// clauses may both use `X`.
    pub fn new_variable(&mut self, name: &str) -> SymbolId {
        let id = self.new_symbol();
        let slot = self.slot(id);
        let sym = &mut self.symbols[slot];
        sym.public_name = Some(name.to_string());
        sym.logical_kind = LogicalKind::Variable;
        sym.semantic_kind = SemanticKind::Identifier;
        sym.state = SymbolState::Exists;
        id
    }

    /// New constant registered under `name`.
    pub fn new_constant(&mut self, name: &str, value: impl Into<Value>) -> SymbolId {
        let id = self.new_symbol();
        self.register_name(id, name);
        let slot = self.slot(id);
        let sym = &mut self.symbols[slot];
        sym.logical_kind = LogicalKind::Constant;
        sym.semantic_kind = SemanticKind::Literal;
        sym.value = Payload::Constant(value.into());
        sym.state = SymbolState::Embodied;
        id
    }

    /// Reuse the constant registered under `name` if it holds `value`,
    /// otherwise create it.
    pub fn intern_constant(&mut self, name: &str, value: impl Into<Value>) -> SymbolId {
        let value = value.into();
        if let Some(id) = self.lookup_by_name(name) {
            if let Some(existing) = self.get(id).and_then(|s| s.constant()) {
                if *existing == value {
                    return id;
                }
            }
        }
        self.new_constant(name, value)
    }

    /// New cons cell `[head | tail]`.
    pub fn new_list(&mut self, head: SymbolId, tail: SymbolId) -> SymbolId {
        debug_assert!(self.get(head).is_some() && self.get(tail).is_some());
        let id = self.new_symbol();
        let slot = self.slot(id);
        let sym = &mut self.symbols[slot];
        sym.logical_kind = LogicalKind::List;
        sym.semantic_kind = SemanticKind::Literal;
        sym.value = Payload::List(ListPair { head, tail });
        sym.state = SymbolState::Embodied;
        id
    }

    /// Build `[items... | tail]` from the back. Pass [`SymbolId::NULL`] as
    /// `tail` for a proper list.
    pub fn new_list_from(&mut self, items: &[SymbolId], tail: SymbolId) -> SymbolId {
        items
            .iter()
            .rev()
            .fold(tail, |acc, &item| self.new_list(item, acc))
    }

    /// New compound term. Its public name is the functor's name, but it is
    /// not entered in the name index.
    pub fn new_structure(&mut self, functor: SymbolId, args: Vec<SymbolId>) -> SymbolId {
        let name = self.get(functor).and_then(|f| f.public_name.clone());
        let id = self.new_symbol();
        let slot = self.slot(id);
        let sym = &mut self.symbols[slot];
        sym.public_name = name;
        sym.logical_kind = LogicalKind::Structure;
        sym.semantic_kind = SemanticKind::Predicate;
        sym.value = Payload::Structure(StructureTerm { functor, args });
        sym.state = SymbolState::Embodied;
        id
    }

    /// Read a list back as its elements and terminator, following cons cells
    /// but not variable bindings. The terminator is `nil` for proper lists.
    pub fn list_items(&self, id: SymbolId) -> Result<(Vec<SymbolId>, SymbolId)> {
        let mut items = Vec::new();
        let mut current = id;
        loop {
            let sym = self.symbol(current)?;
            match sym.list() {
                Some(pair) => {
                    items.push(pair.head);
                    current = pair.tail;
                    if items.len() > self.symbols.len() {
                        return Err(NexusError::NotAList(format!("cyclic list at {}", id)));
                    }
                }
                None if current == id && sym.logical_kind != LogicalKind::Null => {
                    return Err(NexusError::NotAList(sym.display_name()));
                }
                None => return Ok((items, current)),
            }
        }
    }

    /// Give a symbol a concrete value, making it `Embodied`. `Undefined`
    /// symbols become constants. Variables must go through unification.
    pub fn instantiate_as(&mut self, id: SymbolId, value: impl Into<Value>) -> Result<()> {
        let sym = self.symbol_mut(id)?;
        match sym.logical_kind {
            LogicalKind::Variable | LogicalKind::Anonymous | LogicalKind::Null => {
                return Err(NexusError::NotInstantiable {
                    name: sym.display_name(),
                    kind: sym.logical_kind,
                });
            }
            LogicalKind::Undefined => sym.logical_kind = LogicalKind::Constant,
            _ => {}
        }
        sym.value = Payload::Constant(value.into());
        sym.state = SymbolState::Embodied;
        Ok(())
    }

    pub fn set_semantic_kind(&mut self, id: SymbolId, semantic: SemanticKind) -> Result<()> {
        self.symbol_mut(id)?.semantic_kind = semantic;
        Ok(())
    }

    /// Add or replace a metadata property.
    pub fn add_property(&mut self, id: SymbolId, key: &str, value: impl Into<Value>) -> Result<()> {
        self.symbol_mut(id)?
            .properties
            .insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn get_property(&self, id: SymbolId, key: &str) -> Option<&Value> {
        self.get(id).and_then(|s| s.properties.get(key))
    }

    /// Attach a host procedure to a symbol.
    pub fn attach_procedure(&mut self, id: SymbolId, procedure: Procedure) -> Result<()> {
        self.symbol_mut(id)?.procedure = Some(procedure);
        Ok(())
    }

    /// Run the procedure attached to `id`.
    pub fn call_procedure(&self, id: SymbolId, args: &[Value]) -> Result<Value> {
        let sym = self.symbol(id)?;
        match &sym.procedure {
            Some(procedure) => procedure(args),
            None => Err(NexusError::NoProcedure {
                name: sym.display_name(),
                id,
            }),
        }
    }

    /// Record a committed binding on a variable. Callers check conflicts.
    pub(crate) fn set_binding(&mut self, variable: SymbolId, value: SymbolId) -> Result<()> {
        let sym = self.symbol_mut(variable)?;
        if !sym.is_variable() {
            return Err(NexusError::NotAVariable(sym.display_name()));
        }
        trace!(variable = %variable, value = %value, "committing binding");
        sym.binding = Some(value);
        sym.state = SymbolState::Embodied;
        Ok(())
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_singletons() {
        let table = SymbolTable::new();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup_by_name("nil"), Some(SymbolId::NULL));
        assert_eq!(table.lookup_by_name("_"), Some(SymbolId::ANONYMOUS));
        let null = table.symbol(table.null()).unwrap();
        assert_eq!(null.logical_kind, LogicalKind::Null);
        assert_eq!(null.state, SymbolState::Embodied);
        let anon = table.symbol(table.anonymous()).unwrap();
        assert_eq!(anon.logical_kind, LogicalKind::Anonymous);
    }

    #[test]
    fn test_ids_are_monotonic_and_unique() {
        let mut table = SymbolTable::new();
        let a = table.new_symbol();
        let b = table.new_symbol();
        let c = table.new_variable("X");
        assert!(a < b && b < c);
        assert!(a.as_u32() > SymbolId::ANONYMOUS.as_u32());
        let fresh = table.symbol(a).unwrap();
        assert_eq!(fresh.logical_kind, LogicalKind::Undefined);
        assert_eq!(fresh.state, SymbolState::Exists);
        assert!(fresh.properties.is_empty());
    }

    #[test]
    fn test_unknown_symbol() {
        let table = SymbolTable::new();
        assert!(table.get(SymbolId::new(3)).is_none());
        assert!(matches!(
            table.symbol(SymbolId::new(5000)),
            Err(NexusError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_rename_removes_old_index_entry() {
        let mut table = SymbolTable::new();
        let s = table.new_symbol();
        table.assign_public_name(s, "robot-1").unwrap();
        assert_eq!(table.lookup_by_name("robot-1"), Some(s));

        table.assign_public_name(s, "robot-2").unwrap();
        assert_eq!(table.lookup_by_name("robot-1"), None);
        assert_eq!(table.lookup_by_name("robot-2"), Some(s));
    }

    #[test]
    fn test_rename_keeps_entry_owned_by_other_symbol() {
        let mut table = SymbolTable::new();
        let a = table.new_constant("x", 1);
        let b = table.new_constant("x", 2);
        // "x" now points at b; renaming a must not drop b's entry
        table.assign_public_name(a, "y").unwrap();
        assert_eq!(table.lookup_by_name("x"), Some(b));
        assert_eq!(table.lookup_by_name("y"), Some(a));
    }

    #[test]
    fn test_constructors() {
        let mut table = SymbolTable::new();
        let x = table.new_variable("X");
        let sym = table.symbol(x).unwrap();
        assert_eq!(sym.logical_kind, LogicalKind::Variable);
        assert_eq!(sym.state, SymbolState::Exists);
        assert!(!sym.is_bound());
        assert_eq!(table.lookup_by_name("X"), None);

        let c = table.new_constant("42", 42);
        let sym = table.symbol(c).unwrap();
        assert_eq!(sym.logical_kind, LogicalKind::Constant);
        assert_eq!(sym.state, SymbolState::Embodied);
        assert_eq!(sym.constant(), Some(&Value::Int(42)));
        assert_eq!(table.lookup_by_name("42"), Some(c));

        let likes = table.new_constant("likes", "likes");
        let s = table.new_structure(likes, vec![c, x]);
        let sym = table.symbol(s).unwrap();
        assert_eq!(sym.logical_kind, LogicalKind::Structure);
        assert_eq!(sym.semantic_kind, SemanticKind::Predicate);
        assert_eq!(sym.public_name.as_deref(), Some("likes"));
        assert_eq!(sym.structure().map(|t| t.arity()), Some(2));
        // the structure does not steal the functor's index entry
        assert_eq!(table.lookup_by_name("likes"), Some(likes));
    }

    #[test]
    fn test_intern_constant() {
        let mut table = SymbolTable::new();
        let a = table.intern_constant("john", "john");
        let b = table.intern_constant("john", "john");
        assert_eq!(a, b);
        let c = table.intern_constant("john", 7);
        assert_ne!(a, c);
    }

    #[test]
    fn test_list_items() {
        let mut table = SymbolTable::new();
        let a = table.new_constant("a", "a");
        let b = table.new_constant("b", "b");
        let list = table.new_list_from(&[a, b], SymbolId::NULL);
        let (items, tail) = table.list_items(list).unwrap();
        assert_eq!(items, vec![a, b]);
        assert_eq!(tail, SymbolId::NULL);

        let t = table.new_variable("T");
        let open = table.new_list_from(&[a], t);
        assert_eq!(table.list_items(open).unwrap(), (vec![a], t));

        assert!(matches!(table.list_items(a), Err(NexusError::NotAList(_))));
    }

    #[test]
    fn test_instantiate_as() {
        let mut table = SymbolTable::new();
        let s = table.new_symbol();
        table.instantiate_as(s, "hello").unwrap();
        let sym = table.symbol(s).unwrap();
        assert_eq!(sym.logical_kind, LogicalKind::Constant);
        assert_eq!(sym.state, SymbolState::Embodied);

        let x = table.new_variable("X");
        let err = table.instantiate_as(x, 1).unwrap_err();
        assert!(matches!(
            err,
            NexusError::NotInstantiable { ref name, kind: LogicalKind::Variable } if name == "X"
        ));
        assert_eq!(err.to_string(), "cannot instantiate Variable symbol X");
        assert!(matches!(
            table.instantiate_as(SymbolId::NULL, 1),
            Err(NexusError::NotInstantiable { kind: LogicalKind::Null, .. })
        ));
    }

    #[test]
    fn test_properties_and_semantics() {
        let mut table = SymbolTable::new();
        let s = table.new_symbol_with_public_name("fact", SemanticKind::TripletScope);
        assert_eq!(table.symbol(s).unwrap().semantic_kind, SemanticKind::TripletScope);
        table.add_property(s, "arity", 3).unwrap();
        table.add_property(s, "doc", "a scope").unwrap();
        assert_eq!(table.get_property(s, "arity"), Some(&Value::Int(3)));
        assert_eq!(table.get_property(s, "missing"), None);
        let keys: Vec<_> = table.symbol(s).unwrap().properties.keys().cloned().collect();
        assert_eq!(keys, vec!["arity", "doc"]);

        table.set_semantic_kind(s, SemanticKind::Macro).unwrap();
        assert_eq!(table.symbol(s).unwrap().semantic_kind, SemanticKind::Macro);
    }

    #[test]
    fn test_procedures() {
        let mut table = SymbolTable::new();
        let add = table.new_symbol_with_public_name("add", SemanticKind::Predicate);
        assert!(matches!(
            table.call_procedure(add, &[]),
            Err(NexusError::NoProcedure { .. })
        ));

        table
            .attach_procedure(
                add,
                Arc::new(|args: &[Value]| {
                    let mut sum = 0;
                    for arg in args {
                        match arg {
                            Value::Int(n) => sum += n,
                            other => {
                                return Err(NexusError::Procedure(format!(
                                    "expected int, got {}",
                                    other.type_name()
                                )))
                            }
                        }
                    }
                    Ok(Value::Int(sum))
                }),
            )
            .unwrap();
        assert_eq!(
            table.call_procedure(add, &[Value::Int(2), Value::Int(3)]).unwrap(),
            Value::Int(5)
        );
        assert!(table.call_procedure(add, &[Value::Bool(true)]).is_err());
    }
}
