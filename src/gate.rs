//! Gate representation.

use rustc_hash::FxHashSet;

use crate::qubit::QubitId;

/// A control set: a genuine set (insertion is idempotent), but it remembers
/// insertion order so gate output/debugging is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    order: Vec<QubitId>,
    set: FxHashSet<QubitId>,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_iter(iter: impl IntoIterator<Item = QubitId>) -> Self {
        let mut controls = Self::new();
        for q in iter {
            controls.insert(q);
        }
        controls
    }

    /// Returns `true` if `q` was newly inserted.
    pub fn insert(&mut self, q: QubitId) -> bool {
        if self.set.insert(q) {
            self.order.push(q);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, q: QubitId) -> bool {
        self.set.contains(&q)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.order.iter().copied()
    }

    pub fn union(&self, other: &Controls) -> Controls {
        let mut result = self.clone();
        for q in other.iter() {
            result.insert(q);
        }
        result
    }
}

/// The five reversible gate kinds this engine emits (spec §3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    Not { target: QubitId },
    Cnot { control: QubitId, target: QubitId },
    Toffoli { controls: [QubitId; 2], target: QubitId },
    MultiControlToffoli { controls: Controls, target: QubitId },
    Fredkin { controls: Controls, targets: [QubitId; 2] },
}

impl Gate {
    /// All qubits this gate treats as controls (empty for `Not`).
    pub fn control_set(&self) -> Controls {
        match self {
            Gate::Not { .. } => Controls::new(),
            Gate::Cnot { control, .. } => Controls::from_iter([*control]),
            Gate::Toffoli { controls, .. } => Controls::from_iter(controls.iter().copied()),
            Gate::MultiControlToffoli { controls, .. } => controls.clone(),
            Gate::Fredkin { controls, .. } => controls.clone(),
        }
    }

    /// All qubits this gate writes to.
    pub fn target_set(&self) -> Vec<QubitId> {
        match self {
            Gate::Not { target } | Gate::Cnot { target, .. } | Gate::Toffoli { target, .. } => {
                vec![*target]
            }
            Gate::MultiControlToffoli { target, .. } => vec![*target],
            Gate::Fredkin { targets, .. } => targets.to_vec(),
        }
    }

    /// Per-gate-kind cost used by the (read-only) cost-accounting statistic.
    pub fn cost(&self) -> u64 {
        match self {
            Gate::Not { .. } | Gate::Cnot { .. } | Gate::Fredkin { .. } => 1,
            Gate::Toffoli { .. } => 5,
            Gate::MultiControlToffoli { controls, .. } => {
                1_u64 << controls.len().saturating_sub(1).min(62)
            }
        }
    }
}
