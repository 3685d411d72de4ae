//! Unifier configuration.

use tokio_util::sync::CancellationToken;

/// Which variable gets bound when both sides of a pair are unbound variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingOrder {
    /// The left-hand variable is bound to the right-hand one.
    ArgumentOrder,
    /// The younger variable (higher id) is bound to the older one, so traces
    /// do not depend on argument order.
    #[default]
    YoungerToOlder,
}

/// Options for a [`Unifier`](super::Unifier).
///
/// The defaults match classic Prolog: no occurs check, no budgets. Failed
/// unifications are rolled back unless `transactional` is turned off.
#[derive(Debug, Clone)]
pub struct UnifyConfig {
    pub occurs_check: bool,
    pub transactional: bool,
    pub binding_order: BindingOrder,
    /// Maximum number of term pairs examined by one `unify` call
    pub max_steps: Option<usize>,
    /// Maximum nesting depth of term pairs
    pub max_depth: Option<usize>,
    /// Comparing constants of different kinds is an error instead of a mismatch
    pub strict_constants: bool,
    pub cancel: Option<CancellationToken>,
}

impl Default for UnifyConfig {
    fn default() -> Self {
        Self {
            occurs_check: false,
            transactional: true,
            binding_order: BindingOrder::default(),
            max_steps: None,
            max_depth: None,
            strict_constants: false,
            cancel: None,
        }
    }
}

impl UnifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_occurs_check(mut self, on: bool) -> Self {
        self.occurs_check = on;
        self
    }

    pub fn with_transactional(mut self, on: bool) -> Self {
        self.transactional = on;
        self
    }

    pub fn with_binding_order(mut self, order: BindingOrder) -> Self {
        self.binding_order = order;
        self
    }

    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_strict_constants(mut self, on: bool) -> Self {
        self.strict_constants = on;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }
}
