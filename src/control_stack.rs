//! Scoped control-qubit propagation (spec §4.2).
//!
//! Conditionals, module calls and compound arithmetic each open a scope;
//! while the scope is alive, every gate emitted anywhere beneath it implicitly
//! gains the scope's registered qubits as extra controls. Scopes nest: a
//! child scope inherits its parent's registrations, and popping the child
//! forgets only what the child itself registered.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::qubit::QubitId;

/// One level of control-qubit propagation. `true` means "registered in this
/// scope", `false` means "explicitly deregistered in this scope" (hiding a
/// registration made by an ancestor scope for as long as this scope lives).
#[derive(Default)]
struct Scope {
    marks: FxHashMap<QubitId, bool>,
}

#[derive(Default)]
pub struct ControlStack {
    scopes: Vec<Scope>,
    aggregate: FxHashSet<QubitId>,
    known_qubits: FxHashSet<QubitId>,
}

impl ControlStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a qubit index as eligible to be used as a control. The
    /// allocator calls this whenever it hands out a new qubit.
    pub fn declare_qubit(&mut self, q: QubitId) {
        self.known_qubits.insert(q);
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pops the top scope and recomputes the aggregate from what remains.
    /// A no-op on an empty stack.
    pub fn leave_scope(&mut self) {
        if self.scopes.pop().is_some() {
            self.recompute_aggregate();
        }
    }

    pub fn register(&mut self, q: QubitId) -> Result<()> {
        self.require_known(q)?;
        let scope = self.scopes.last_mut().expect("register called with no active scope");
        scope.marks.insert(q, true);
        self.aggregate.insert(q);
        Ok(())
    }

    /// Hides `q` from the aggregate while the current scope is alive, unless
    /// an ancestor scope also registers it — in which case it stays hidden
    /// only until this scope is popped.
    pub fn deregister(&mut self, q: QubitId) -> Result<()> {
        self.require_known(q)?;
        let scope = self.scopes.last_mut().expect("deregister called with no active scope");
        scope.marks.insert(q, false);
        self.aggregate.remove(&q);
        Ok(())
    }

    pub fn is_propagated(&self, q: QubitId) -> bool {
        self.aggregate.contains(&q)
    }

    pub fn aggregate(&self) -> &FxHashSet<QubitId> {
        &self.aggregate
    }

    fn require_known(&self, q: QubitId) -> Result<()> {
        if self.known_qubits.contains(&q) {
            Ok(())
        } else {
            Err(Error::InvalidQubit(q))
        }
    }

    /// Folds scopes bottom-to-top: a later scope's mark for a qubit overrides
    /// an earlier scope's mark for the same qubit.
    fn recompute_aggregate(&mut self) {
        let mut aggregate = FxHashSet::default();
        for scope in &self.scopes {
            for (&q, &registered) in &scope.marks {
                if registered {
                    aggregate.insert(q);
                } else {
                    aggregate.remove(&q);
                }
            }
        }
        self.aggregate = aggregate;
    }
}
