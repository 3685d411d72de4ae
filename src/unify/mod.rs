//! Unification: environments, the engine and parallel alternative search.

mod config;
mod engine;
mod env;
mod search;
mod term;

pub use config::{BindingOrder, UnifyConfig};
pub use engine::{bind, deref, unify, Unifier};
pub use env::{Environment, TrailMark, UndoRecord};
pub use search::unify_alternatives;
pub use term::Term;
