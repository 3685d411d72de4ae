//! Dereferencing, binding and structural unification.
//!
//! Unification walks an explicit stack of pending term pairs instead of
//! recursing, so term depth is bounded by memory rather than the call stack.
//! Pairs are popped left to right: the head of a list before its tail, the
//! functor of a structure before its arguments.

use super::config::{BindingOrder, UnifyConfig};
use super::env::Environment;
use super::term::Term;
use crate::error::{NexusError, Result};
use crate::symbol::{LogicalKind, Symbol, SymbolId, SymbolTable};
use rustc_hash::FxHashSet;
use tracing::{trace, warn};

/// Unification over the symbols of one table.
pub struct Unifier<'t> {
    table: &'t SymbolTable,
    config: UnifyConfig,
}

impl<'t> Unifier<'t> {
    pub fn new(table: &'t SymbolTable, config: UnifyConfig) -> Self {
        Self { table, config }
    }

    pub fn with_defaults(table: &'t SymbolTable) -> Self {
        Self::new(table, UnifyConfig::default())
    }

    pub fn config(&self) -> &UnifyConfig {
        &self.config
    }

    pub fn table(&self) -> &'t SymbolTable {
        self.table
    }

    /// Follow variable bindings to the representative symbol.
    ///
    /// Environment bindings take precedence over committed ones. A chain with
    /// more links than there are symbols must loop, and is reported as
    /// [`NexusError::CyclicBinding`].
    pub fn deref(&self, id: SymbolId, env: &Environment) -> Result<SymbolId> {
        let mut current = id;
        for _ in 0..=self.table.len() {
            let sym = self.table.symbol(current)?;
            if sym.logical_kind != LogicalKind::Variable {
                return Ok(current);
            }
            match env.get_binding(current).or(sym.binding) {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
        Err(NexusError::CyclicBinding(id))
    }

    /// Bind `variable` to the dereferenced `value` in `env`.
    ///
    /// Binding a variable to itself is a no-op. With the occurs check on,
    /// binding a variable to a term that contains it fails with
    /// [`NexusError::OccursCheck`]; otherwise such bindings are accepted and
    /// produce cyclic terms.
    pub fn bind(&self, variable: SymbolId, value: SymbolId, env: &mut Environment) -> Result<()> {
        let sym = self.table.symbol(variable)?;
        if sym.logical_kind != LogicalKind::Variable {
            return Err(NexusError::NotAVariable(sym.display_name()));
        }

        let value = self.deref(value, env)?;
        if value == variable {
            return Ok(());
        }
        if self.config.occurs_check && self.occurs(variable, value, env)? {
            return Err(NexusError::OccursCheck { variable, term: value });
        }

        trace!(variable = %variable, value = %value, "bind");
        env.add_binding(variable, value);
        Ok(())
    }

    /// Does `variable` occur anywhere inside `term` under `env`?
    fn occurs(&self, variable: SymbolId, term: SymbolId, env: &Environment) -> Result<bool> {
        let mut stack = vec![term];
        let mut seen = FxHashSet::default();
        while let Some(id) = stack.pop() {
            let id = self.deref(id, env)?;
            if id == variable {
                return Ok(true);
            }
            if !seen.insert(id) {
                continue;
            }
            let sym = self.table.symbol(id)?;
            if let Some(pair) = sym.list() {
                stack.push(pair.tail);
                stack.push(pair.head);
            } else if let Some(term) = sym.structure() {
                stack.extend(term.args.iter().rev().copied());
                stack.push(term.functor);
            }
        }
        Ok(false)
    }

    /// Unify `x` and `y`, reporting budget exhaustion, cancellation and
    /// cyclic bindings as errors.
    ///
    /// On `Ok(false)` in transactional mode, and on any error, `env` is
    /// restored to its state before the call.
    pub fn try_unify(&self, x: SymbolId, y: SymbolId, env: &mut Environment) -> Result<bool> {
        let mark = env.mark();
        match self.unify_pairs(x, y, env) {
            Ok(true) => Ok(true),
            Ok(false) => {
                if self.config.transactional {
                    env.backtrack_to(mark);
                }
                Ok(false)
            }
            Err(e) => {
                env.backtrack_to(mark);
                Err(e)
            }
        }
    }

    /// Unify `x` and `y`. Engine errors count as failure.
    ///
    /// The anonymous variable `_` is matched before ordinary variables, so
    /// `X = _` succeeds without binding `X`. Classic Prolog-style engines bind
    /// `X` to `_` here instead.
    pub fn unify(&self, x: SymbolId, y: SymbolId, env: &mut Environment) -> bool {
        match self.try_unify(x, y, env) {
            Ok(unified) => unified,
            Err(e) => {
                warn!(error = %e, x = %x, y = %y, "unification aborted");
                false
            }
        }
    }

    fn unify_pairs(&self, x: SymbolId, y: SymbolId, env: &mut Environment) -> Result<bool> {
        let mut pending = vec![(x, y, 0usize)];
        let mut steps = 0usize;

        while let Some((x, y, depth)) = pending.pop() {
            if self.config.is_cancelled() {
                return Err(NexusError::Cancelled);
            }
            steps += 1;
            if let Some(max) = self.config.max_steps {
                if steps > max {
                    return Err(NexusError::StepBudgetExceeded(max));
                }
            }
            if let Some(max) = self.config.max_depth {
                if depth > max {
                    return Err(NexusError::DepthLimitExceeded(max));
                }
            }

            let x = self.deref(x, env)?;
            let y = self.deref(y, env)?;
            if x == y {
                continue;
            }
            trace!(x = %x, y = %y, depth, "unify");

            let sx = self.table.symbol(x)?;
            let sy = self.table.symbol(y)?;
            use LogicalKind::*;
            let unified = match (sx.logical_kind, sy.logical_kind) {
                // `_` matches anything and never causes a binding
                (Anonymous, _) | (_, Anonymous) => true,
                (Variable, Variable) => {
                    let (var, value) = match self.config.binding_order {
                        BindingOrder::ArgumentOrder => (x, y),
                        BindingOrder::YoungerToOlder if x > y => (x, y),
                        BindingOrder::YoungerToOlder => (y, x),
                    };
                    self.bind_or_fail(var, value, env)?
                }
                (Variable, _) => self.bind_or_fail(x, y, env)?,
                (_, Variable) => self.bind_or_fail(y, x, env)?,
                (Null, Null) => true,
                (Null, _) | (_, Null) => false,
                (Constant, Constant) => self.constants_equal(sx, sy)?,
                (List, List) => match (sx.list(), sy.list()) {
                    (Some(a), Some(b)) => {
                        pending.push((a.tail, b.tail, depth + 1));
                        pending.push((a.head, b.head, depth + 1));
                        true
                    }
                    _ => false,
                },
                (Structure, Structure) => match (sx.structure(), sy.structure()) {
                    (Some(a), Some(b)) if a.arity() == b.arity() => {
                        for (&l, &r) in a.args.iter().zip(&b.args).rev() {
                            pending.push((l, r, depth + 1));
                        }
                        pending.push((a.functor, b.functor, depth + 1));
                        true
                    }
                    _ => false,
                },
                _ => false,
            };

            if !unified {
                trace!(x = %x, y = %y, "mismatch");
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn bind_or_fail(&self, variable: SymbolId, value: SymbolId, env: &mut Environment) -> Result<bool> {
        match self.bind(variable, value, env) {
            Ok(()) => Ok(true),
            Err(NexusError::OccursCheck { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn constants_equal(&self, a: &Symbol, b: &Symbol) -> Result<bool> {
        let (Some(va), Some(vb)) = (a.constant(), b.constant()) else {
            return Ok(false);
        };
        if va.comparable_with(vb) {
            return Ok(va == vb);
        }
        if self.config.strict_constants {
            return Err(NexusError::IncomparableConstants {
                left: format!("{} ({})", a.display_name(), va.type_name()),
                right: format!("{} ({})", b.display_name(), vb.type_name()),
            });
        }
        Ok(false)
    }

    /// Snapshot of `id` with every bound variable replaced by its value.
    ///
    /// Works off an explicit stack, so arbitrarily deep terms resolve without
    /// touching the call stack. Cyclic terms (possible without the occurs
    /// check) are reported as [`NexusError::CyclicBinding`] instead of looping.
    pub fn resolve(&self, id: SymbolId, env: &Environment) -> Result<Term> {
        let mut steps = vec![Resolve::Visit { id, depth: 0 }];
        let mut built: Vec<Term> = Vec::new();
        // compounds whose children are still being resolved
        let mut active = FxHashSet::default();

        while let Some(step) = steps.pop() {
            if self.config.is_cancelled() {
                return Err(NexusError::Cancelled);
            }
            match step {
                Resolve::Visit { id, depth } => {
                    if let Some(max) = self.config.max_depth {
                        if depth > max {
                            return Err(NexusError::DepthLimitExceeded(max));
                        }
                    }
                    self.resolve_visit(id, depth, env, &mut active, &mut steps, &mut built)?;
                }
                Resolve::Structure { id, arity } => {
                    let args = built.split_off(built.len().saturating_sub(arity));
                    let functor = built.pop().unwrap_or(Term::Null);
                    active.remove(&id);
                    built.push(Term::Structure {
                        functor: Box::new(functor),
                        args,
                    });
                }
                Resolve::List { cells } => {
                    let tail = built.pop().unwrap_or(Term::Null);
                    let items = built.split_off(built.len().saturating_sub(cells.len()));
                    for cell in &cells {
                        active.remove(cell);
                    }
                    built.push(Term::List {
                        items,
                        tail: Box::new(tail),
                    });
                }
            }
        }

        Ok(built.pop().unwrap_or(Term::Null))
    }

    /// Emit a leaf into `built`, or schedule the children of a compound
    /// followed by the step that assembles it.
    fn resolve_visit(
        &self,
        id: SymbolId,
        depth: usize,
        env: &Environment,
        active: &mut FxHashSet<SymbolId>,
        steps: &mut Vec<Resolve>,
        built: &mut Vec<Term>,
    ) -> Result<()> {
        let id = self.deref(id, env)?;
        let sym = self.table.symbol(id)?;
        let leaf = match sym.logical_kind {
            LogicalKind::Variable => Term::Var {
                id,
                name: sym.public_name.clone(),
            },
            LogicalKind::Anonymous => Term::Anonymous,
            LogicalKind::Null => Term::Null,
            LogicalKind::Undefined => Term::Undefined(id),
            LogicalKind::Constant => match sym.constant() {
                Some(v) => Term::Constant(v.clone()),
                None => Term::Undefined(id),
            },
            LogicalKind::Structure => {
                let Some(term) = sym.structure() else {
                    built.push(Term::Undefined(id));
                    return Ok(());
                };
                if !active.insert(id) {
                    return Err(NexusError::CyclicBinding(id));
                }
                steps.push(Resolve::Structure {
                    id,
                    arity: term.arity(),
                });
                for &arg in term.args.iter().rev() {
                    steps.push(Resolve::Visit { id: arg, depth: depth + 1 });
                }
                steps.push(Resolve::Visit {
                    id: term.functor,
                    depth: depth + 1,
                });
                return Ok(());
            }
            LogicalKind::List => {
                // the spine is flattened here so long lists add no depth
                let mut heads = Vec::new();
                let mut cells = Vec::new();
                let mut current = id;
                let end = loop {
                    let cell = self.deref(current, env)?;
                    match self.table.symbol(cell)?.list() {
                        Some(pair) => {
                            if !active.insert(cell) {
                                return Err(NexusError::CyclicBinding(cell));
                            }
                            cells.push(cell);
                            heads.push(pair.head);
                            current = pair.tail;
                        }
                        None => break cell,
                    }
                };
                steps.push(Resolve::List { cells });
                steps.push(Resolve::Visit {
                    id: end,
                    depth: depth + 1,
                });
                for &head in heads.iter().rev() {
                    steps.push(Resolve::Visit { id: head, depth: depth + 1 });
                }
                return Ok(());
            }
        };
        built.push(leaf);
        Ok(())
    }
}

/// Pending work of [`Unifier::resolve`].
enum Resolve {
    Visit { id: SymbolId, depth: usize },
    /// Assemble a structure from the functor and `arity` args on top of `built`
    Structure { id: SymbolId, arity: usize },
    /// Assemble a list from one item per cell plus the tail
    List { cells: Vec<SymbolId> },
}

/// Dereference with the default configuration.
pub fn deref(table: &SymbolTable, id: SymbolId, env: &Environment) -> Result<SymbolId> {
    Unifier::with_defaults(table).deref(id, env)
}

/// Bind with the default configuration (no occurs check).
pub fn bind(table: &SymbolTable, variable: SymbolId, value: SymbolId, env: &mut Environment) -> Result<()> {
    Unifier::with_defaults(table).bind(variable, value, env)
}

/// Transactional unification with the default configuration.
pub fn unify(table: &SymbolTable, x: SymbolId, y: SymbolId, env: &mut Environment) -> bool {
    Unifier::with_defaults(table).unify(x, y, env)
}
