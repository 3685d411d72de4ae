//! Trying one goal against many candidates at once.

use super::config::UnifyConfig;
use super::engine::Unifier;
use super::env::Environment;
use crate::symbol::{SymbolId, SymbolTable};
use rayon::prelude::*;
use tracing::debug;

/// Unify `goal` with every candidate, each in its own fork of `env`.
///
/// Candidates are independent, so they are tried on the rayon pool. Returns
/// the index and environment of every candidate that unified, in candidate
/// order. `env` itself is never modified. Engine errors (budgets,
/// cancellation) count as failure for that candidate only.
pub fn unify_alternatives(
    table: &SymbolTable,
    goal: SymbolId,
    candidates: &[SymbolId],
    env: &Environment,
    config: &UnifyConfig,
) -> Vec<(usize, Environment)> {
    let unifier = Unifier::new(table, config.clone());
    let mut matches: Vec<(usize, Environment)> = candidates
        .par_iter()
        .enumerate()
        .filter_map(|(index, &candidate)| {
            let mut branch = env.fork();
            unifier
                .unify(goal, candidate, &mut branch)
                .then_some((index, branch))
        })
        .collect();
    matches.sort_unstable_by_key(|(index, _)| *index);
    debug!(
        candidates = candidates.len(),
        matched = matches.len(),
        "unified alternatives"
    );
    matches
}
