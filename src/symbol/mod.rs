//! Symbols: the atomic referenceable entities of NexusL.
//!
//! A symbol is interpreted two ways at once. Its [`LogicalKind`] tells the
//! unification engine how to treat it (variable, constant, list cell,
//! compound structure). Its [`SemanticKind`] is the classification used by the
//! language layers above (literal, identifier, predicate, ...) and is carried
//! along untouched by unification.
//!
//! Symbols live in a [`SymbolTable`] arena and refer to each other by
//! [`SymbolId`], so list cells and structures never own their children.

mod display;
mod registry;
mod table;

pub use display::SymbolInfo;
pub use registry::Registry;
pub use table::SymbolTable;

use crate::error::Result;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Ids below this value are never handed out.
pub const RESERVED_IDS: u32 = 1000;

/// Process-unique identity of a symbol within its table.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    /// The empty list / null term (`nil`).
    pub const NULL: SymbolId = SymbolId(RESERVED_IDS);
    /// The anonymous variable (`_`).
    pub const ANONYMOUS: SymbolId = SymbolId(RESERVED_IDS + 1);

    /// Creates an id from its raw value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Arena slot for this id, `None` inside the reserved range.
    pub(crate) fn index(&self) -> Option<usize> {
        self.0.checked_sub(RESERVED_IDS).map(|i| i as usize)
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(RESERVED_IDS + index as u32)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How the unification engine interprets a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalKind {
    /// Not yet specified (fresh symbols)
    Undefined,
    /// Logic variable, may be bound
    Variable,
    /// Atomic value
    Constant,
    /// Cons cell holding a [`ListPair`]
    List,
    /// Compound term holding a [`StructureTerm`]
    Structure,
    /// The anonymous variable `_`
    Anonymous,
    /// The empty list / null term
    Null,
}

impl fmt::Display for LogicalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogicalKind::Undefined => "Undefined",
            LogicalKind::Variable => "Variable",
            LogicalKind::Constant => "Constant",
            LogicalKind::List => "List",
            LogicalKind::Structure => "Structure",
            LogicalKind::Anonymous => "Anonymous",
            LogicalKind::Null => "Null",
        };
        write!(f, "{}", s)
    }
}

/// Domain classification used by the language layers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticKind {
    /// Concrete values (numbers, strings, booleans, lists)
    Literal,
    /// Names of entities and variables
    Identifier,
    /// Predicates and relations (`has:`, `is:`, `do:`)
    Predicate,
    /// High-level scopes (fact, program, func)
    TripletScope,
    /// Language macros
    Macro,
    /// Categories defined by loaders
    Other(String),
}

impl fmt::Display for SemanticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticKind::Literal => write!(f, "Literal"),
            SemanticKind::Identifier => write!(f, "Identifier"),
            SemanticKind::Predicate => write!(f, "Predicate"),
            SemanticKind::TripletScope => write!(f, "TripletScope"),
            SemanticKind::Macro => write!(f, "Macro"),
            SemanticKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Lifecycle state of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolState {
    /// Declared, not yet materialized
    Exists,
    /// Has a concrete value or is bound
    Embodied,
}

impl fmt::Display for SymbolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolState::Exists => write!(f, "Exists"),
            SymbolState::Embodied => write!(f, "Embodied"),
        }
    }
}

/// Host payload that the engine can only compare by identity.
#[derive(Clone)]
pub struct OpaqueValue(Arc<dyn Any + Send + Sync>);

impl OpaqueValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the payload as a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueValue({:p})", Arc::as_ptr(&self.0))
    }
}

/// Payload of a constant.
///
/// Values of different variants are never equal: `Int(1)` does not unify with
/// `Float(1.0)` or `Str("1")`.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Opaque(OpaqueValue),
}

impl Value {
    /// Short name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Opaque(_) => "opaque",
        }
    }

    /// True when both values can be meaningfully compared.
    pub fn comparable_with(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Opaque(o) => write!(f, "{:?}", o),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// A cons cell. Proper lists end in [`SymbolId::NULL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListPair {
    pub head: SymbolId,
    pub tail: SymbolId,
}

/// A compound term such as `likes(john, X)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureTerm {
    pub functor: SymbolId,
    pub args: Vec<SymbolId>,
}

impl StructureTerm {
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

/// What a symbol holds, depending on its logical kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Constant(Value),
    List(ListPair),
    Structure(StructureTerm),
}

/// Host procedure attached to a symbol.
pub type Procedure = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A symbol record stored in the [`SymbolTable`].
#[derive(Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub logical_kind: LogicalKind,
    pub semantic_kind: SemanticKind,
    pub state: SymbolState,
    pub public_name: Option<String>,
    pub value: Payload,
    /// Committed binding; only ever set on variables.
    pub binding: Option<SymbolId>,
    pub properties: IndexMap<String, Value>,
    pub procedure: Option<Procedure>,
}

impl Symbol {
    pub(crate) fn new(id: SymbolId) -> Self {
        Self {
            id,
            logical_kind: LogicalKind::Undefined,
            semantic_kind: SemanticKind::Identifier,
            state: SymbolState::Exists,
            public_name: None,
            value: Payload::None,
            binding: None,
            properties: IndexMap::new(),
            procedure: None,
        }
    }

    pub fn is_variable(&self) -> bool {
        self.logical_kind == LogicalKind::Variable
    }

    /// Whether this variable carries a committed binding.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Public name, or `anon:<id>` for unnamed symbols.
    pub fn display_name(&self) -> String {
        match &self.public_name {
            Some(name) => name.clone(),
            None => format!("anon:{}", self.id.as_u32()),
        }
    }

    pub fn constant(&self) -> Option<&Value> {
        match &self.value {
            Payload::Constant(v) => Some(v),
            _ => None,
        }
    }

    pub fn list(&self) -> Option<&ListPair> {
        match &self.value {
            Payload::List(pair) => Some(pair),
            _ => None,
        }
    }

    pub fn structure(&self) -> Option<&StructureTerm> {
        match &self.value {
            Payload::Structure(term) => Some(term),
            _ => None,
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("id", &self.id)
            .field("logical_kind", &self.logical_kind)
            .field("semantic_kind", &self.semantic_kind)
            .field("state", &self.state)
            .field("public_name", &self.public_name)
            .field("value", &self.value)
            .field("binding", &self.binding)
            .field("properties", &self.properties)
            .field("procedure", &self.procedure.as_ref().map(|_| "<proc>"))
            .finish()
    }
}
