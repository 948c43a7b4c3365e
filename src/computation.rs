//! The append-only gate container and qubit registry (spec §4.3).
//!
//! Every gate emission is validated and routed through here: it unions the
//! caller-supplied controls with whatever the active [`ControlStack`]
//! propagates, rejects overlap between controls and targets, and records a
//! per-statement source-line annotation via the global-annotation mechanism.

use rustc_hash::FxHashMap;

use crate::control_stack::ControlStack;
use crate::error::{Error, Result};
use crate::gate::{Controls, Gate};
use crate::qubit::{InlineInformation, QubitId, QubitKind};

struct QubitRecord {
    kind: QubitKind,
    internal_label: String,
    user_declared_label: Option<String>,
    inline_info: InlineInformation,
}

#[derive(Default)]
pub struct QuantumComputation {
    qubits: Vec<QubitRecord>,
    labels: FxHashMap<String, QubitId>,
    gates: Vec<Gate>,
    gate_annotations: Vec<FxHashMap<String, String>>,
    global_annotations: FxHashMap<String, String>,
    frozen: bool,
}

impl QuantumComputation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Registers a new qubit with a dense, monotonically-assigned index.
    /// Fails if the computation is frozen or the internal label clashes with
    /// one already registered.
    pub fn add_qubit(
        &mut self,
        kind: QubitKind,
        internal_label: String,
        user_declared_label: Option<String>,
        inline_info: InlineInformation,
    ) -> Result<QubitId> {
        if self.frozen {
            return Err(Error::AllocationAfterFreeze);
        }
        if self.labels.contains_key(&internal_label) {
            return Err(Error::DuplicateLabel(internal_label));
        }
        let id = QubitId(self.qubits.len());
        self.labels.insert(internal_label.clone(), id);
        self.qubits.push(QubitRecord {
            kind,
            internal_label,
            user_declared_label,
            inline_info,
        });
        Ok(id)
    }

    pub fn qubit_count(&self) -> usize {
        self.qubits.len()
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn gate_cost(&self) -> u64 {
        self.gates.iter().map(Gate::cost).sum()
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn kind_of(&self, q: QubitId) -> Result<QubitKind> {
        self.qubits
            .get(q.index())
            .map(|r| r.kind)
            .ok_or(Error::InvalidQubit(q))
    }

    pub fn internal_label(&self, q: QubitId) -> Result<&str> {
        self.qubits
            .get(q.index())
            .map(|r| r.internal_label.as_str())
            .ok_or(Error::InvalidQubit(q))
    }

    pub fn user_declared_label(&self, q: QubitId) -> Result<Option<&str>> {
        self.qubits
            .get(q.index())
            .map(|r| r.user_declared_label.as_deref())
            .ok_or(Error::InvalidQubit(q))
    }

    pub fn inline_information(&self, q: QubitId) -> Result<&InlineInformation> {
        self.qubits
            .get(q.index())
            .map(|r| &r.inline_info)
            .ok_or(Error::InvalidQubit(q))
    }

    fn validate_exists(&self, q: QubitId) -> Result<()> {
        if q.index() < self.qubits.len() {
            Ok(())
        } else {
            Err(Error::InvalidQubit(q))
        }
    }

    /// Validates and appends a gate, after unioning `controls` with the
    /// stack's propagated aggregate. A gate whose final control and target
    /// sets are both empty is never appended.
    fn emit(&mut self, controls: Controls, targets: Vec<QubitId>, stack: &ControlStack, build: impl FnOnce(Controls) -> Gate) -> Result<()> {
        for &q in controls.iter().collect::<Vec<_>>().iter().chain(targets.iter()) {
            self.validate_exists(q)?;
        }
        let full_controls = controls.union(&Controls::from_iter(
            stack.aggregate().iter().copied(),
        ));
        for &t in &targets {
            if full_controls.contains(t) {
                return Err(Error::OverlapControlTarget(t));
            }
        }
        if full_controls.is_empty() && targets.is_empty() {
            return Ok(());
        }
        let gate = build(full_controls);
        self.gates.push(gate);
        self.gate_annotations.push(FxHashMap::default());
        Ok(())
    }

    pub fn emit_not(&mut self, target: QubitId, stack: &ControlStack) -> Result<()> {
        self.emit(Controls::new(), vec![target], stack, |_| Gate::Not { target })
    }

    pub fn emit_cnot(&mut self, control: QubitId, target: QubitId, stack: &ControlStack) -> Result<()> {
        self.emit(Controls::from_iter([control]), vec![target], stack, move |full| {
            if full.len() <= 1 {
                Gate::Cnot { control, target }
            } else {
                Gate::MultiControlToffoli { controls: full, target }
            }
        })
    }

    pub fn emit_toffoli(&mut self, c1: QubitId, c2: QubitId, target: QubitId, stack: &ControlStack) -> Result<()> {
        self.emit(Controls::from_iter([c1, c2]), vec![target], stack, move |full| {
            if full.len() == 2 {
                Gate::Toffoli { controls: [c1, c2], target }
            } else {
                Gate::MultiControlToffoli { controls: full, target }
            }
        })
    }

    pub fn emit_mct(&mut self, controls: Controls, target: QubitId, stack: &ControlStack) -> Result<()> {
        self.emit(controls, vec![target], stack, move |full| match full.len() {
            0 => Gate::Not { target },
            1 => Gate::Cnot {
                control: full.iter().next().expect("len == 1"),
                target,
            },
            2 => {
                let mut it = full.iter();
                let c1 = it.next().expect("len == 2");
                let c2 = it.next().expect("len == 2");
                Gate::Toffoli { controls: [c1, c2], target }
            }
            _ => Gate::MultiControlToffoli { controls: full, target },
        })
    }

    pub fn emit_fredkin(&mut self, t1: QubitId, t2: QubitId, stack: &ControlStack) -> Result<()> {
        self.emit(Controls::new(), vec![t1, t2], stack, move |full| Gate::Fredkin {
            controls: full,
            targets: [t1, t2],
        })
    }

    pub fn set_annotation(&mut self, gate_index: usize, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let slot = self
            .gate_annotations
            .get_mut(gate_index)
            .ok_or_else(|| Error::UnsupportedOperation(format!("no gate at index {gate_index}")))?;
        slot.insert(key.into(), value.into());
        Ok(())
    }

    /// Future gates will fall back to this value for `key` unless they carry
    /// their own annotation for it. Never applied retroactively.
    pub fn set_global_annotation(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.global_annotations.insert(key.into(), value.into());
    }

    pub fn remove_global_annotation(&mut self, key: &str) {
        self.global_annotations.remove(key);
    }

    /// A gate's own annotation for `key` takes precedence over the global one.
    pub fn annotation(&self, gate_index: usize, key: &str) -> Option<&str> {
        self.gate_annotations
            .get(gate_index)
            .and_then(|m| m.get(key))
            .map(String::as_str)
            .or_else(|| self.global_annotations.get(key).map(String::as_str))
    }

    /// Copies gates at `[first..=last]` (or `[last..=first]` if `first > last`)
    /// and appends the copies. Annotations are not copied for the new gates.
    pub fn replay(&mut self, first: usize, last: usize) -> Result<()> {
        let (lo, hi) = if first <= last { (first, last) } else { (last, first) };
        if hi >= self.gates.len() {
            return Err(Error::UnsupportedOperation(format!(
                "replay range [{first}..{last}] out of bounds"
            )));
        }
        let range: Vec<usize> = if first <= last {
            (lo..=hi).collect()
        } else {
            (lo..=hi).rev().collect()
        };
        let copies: Vec<Gate> = range.iter().map(|&i| self.gates[i].clone()).collect();
        for gate in copies {
            self.gates.push(gate);
            self.gate_annotations.push(FxHashMap::default());
        }
        Ok(())
    }

    /// Freezes the computation: all preliminary ancillaries become permanent
    /// and no further qubits can be added.
    pub fn promote_ancillaries(&mut self) {
        for record in &mut self.qubits {
            if let QubitKind::PreliminaryAncillary { initial_value } = record.kind {
                record.kind = QubitKind::PromotedAncillary { initial_value };
            }
        }
        self.frozen = true;
    }
}
