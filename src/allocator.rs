//! Variable and ancillary qubit allocation (spec §4.1).
//!
//! Variable qubits are added densely, leaf by leaf, through
//! [`QuantumComputation::add_qubit`]; ancillaries are drawn from a dual pool
//! keyed by their initial classical value, matching
//! `syrec_synthesis.cpp::getConstantLine`/`getConstantLines`: pop the
//! matching-value bag first, then the opposite-value bag with a NOT-flip,
//! then fall back to a fresh qubit.

use std::rc::Rc;

use crate::call_stack::CallStack;
use crate::computation::QuantumComputation;
use crate::control_stack::ControlStack;
use crate::error::{Error, Result};
use crate::qubit::{self, InlineInformation, QubitId, QubitKind};

/// `getConstantLines`/`getConstantLine` in the original assert the requested
/// bitwidth never exceeds this; here it's a recoverable error instead of a
/// panic (SPEC_FULL §4.4).
const MAX_CONSTANT_BITWIDTH: usize = 32;

#[derive(Default)]
pub struct QubitAllocator {
    pool_zero: Vec<QubitId>,
    pool_one: Vec<QubitId>,
    frozen: bool,
}

impl QubitAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn pool_mut(&mut self, value: bool) -> &mut Vec<QubitId> {
        if value {
            &mut self.pool_one
        } else {
            &mut self.pool_zero
        }
    }

    /// Allocates `∏ dimensions × bitwidth` qubits for a RevLang variable,
    /// recursing dimension by dimension (row-major, matching
    /// [`crate::variable_binding::VariableBinding`]'s indexing). Returns the
    /// qubit index of the first (lowest-offset, bit 0) leaf.
    #[allow(clippy::too_many_arguments)]
    pub fn allocate_variable(
        &mut self,
        computation: &mut QuantumComputation,
        control_stack: &mut ControlStack,
        name: &str,
        is_garbage: bool,
        anonymize: bool,
        dimensions: &[usize],
        bitwidth: usize,
        inline_stack: Option<Rc<CallStack>>,
    ) -> Result<QubitId> {
        if self.frozen {
            return Err(Error::AllocationAfterFreeze);
        }
        if dimensions.iter().any(|&d| d == 0) {
            return Err(Error::UnsupportedOperation(format!(
                "variable {name:?} has a zero-sized dimension"
            )));
        }
        if bitwidth == 0 {
            return Err(Error::UnsupportedOperation(format!(
                "variable {name:?} has a zero bitwidth"
            )));
        }
        let base_allocation_index = computation.qubit_count();
        let mut indices = Vec::new();
        self.allocate_leaves(
            computation,
            control_stack,
            name,
            is_garbage,
            anonymize,
            dimensions,
            bitwidth,
            base_allocation_index,
            &mut indices,
            inline_stack.as_ref(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn allocate_leaves(
        &mut self,
        computation: &mut QuantumComputation,
        control_stack: &mut ControlStack,
        name: &str,
        is_garbage: bool,
        anonymize: bool,
        dimensions: &[usize],
        bitwidth: usize,
        base_allocation_index: usize,
        indices: &mut Vec<usize>,
        inline_stack: Option<&Rc<CallStack>>,
    ) -> Result<QubitId> {
        let Some((&head, rest)) = dimensions.split_first() else {
            let mut first = None;
            for bit in 0..bitwidth {
                let internal_label = if anonymize {
                    qubit::label::internal_leaf(base_allocation_index, indices, bit)
                } else {
                    qubit::label::user_declared(name, indices, bit)
                };
                let user_declared_label = qubit::label::user_declared(name, indices, bit);
                let inline_info = if internal_label != user_declared_label {
                    InlineInformation {
                        user_declared_label: Some(user_declared_label.clone()),
                        call_stack: inline_stack.cloned(),
                    }
                } else {
                    InlineInformation::none()
                };
                let id = computation.add_qubit(
                    QubitKind::Variable { is_garbage },
                    internal_label,
                    Some(user_declared_label),
                    inline_info,
                )?;
                control_stack.declare_qubit(id);
                first.get_or_insert(id);
            }
            return Ok(first.expect("bitwidth > 0 was checked by the caller"));
        };

        let mut first = None;
        for i in 0..head {
            indices.push(i);
            let id = self.allocate_leaves(
                computation,
                control_stack,
                name,
                is_garbage,
                anonymize,
                rest,
                bitwidth,
                base_allocation_index,
                indices,
                inline_stack,
            );
            indices.pop();
            first.get_or_insert(id?);
        }
        Ok(first.expect("dimension size > 0 was checked by the caller"))
    }

    /// Pops a qubit known to hold `initial_value` from the pool, borrowing
    /// (and NOT-flipping) the opposite-value pool if the matching one is
    /// empty, falling back to a fresh qubit labeled `__q<N>_const_<0|1>`.
    pub fn allocate_ancillary(
        &mut self,
        computation: &mut QuantumComputation,
        control_stack: &mut ControlStack,
        initial_value: bool,
        inline_stack: Option<Rc<CallStack>>,
    ) -> Result<QubitId> {
        if self.frozen {
            return Err(Error::AllocationAfterFreeze);
        }
        if let Some(q) = self.pool_mut(initial_value).pop() {
            return Ok(q);
        }
        if let Some(q) = self.pool_mut(!initial_value).pop() {
            computation.emit_not(q, control_stack)?;
            return Ok(q);
        }
        let allocation_index = computation.qubit_count();
        let label = qubit::label::ancillary(allocation_index, initial_value, 0);
        let inline_info = InlineInformation {
            user_declared_label: None,
            call_stack: inline_stack,
        };
        let id = computation.add_qubit(
            QubitKind::PreliminaryAncillary { initial_value },
            label,
            None,
            inline_info,
        )?;
        control_stack.declare_qubit(id);
        Ok(id)
    }

    /// Allocates `bitwidth` ancillaries whose initial values are the bits of
    /// `value` (LSB first), for a numeric-constant expression or a
    /// zero-initialized arithmetic scratch register.
    pub fn allocate_constant_lines(
        &mut self,
        computation: &mut QuantumComputation,
        control_stack: &mut ControlStack,
        bitwidth: usize,
        value: u64,
        inline_stack: Option<Rc<CallStack>>,
    ) -> Result<Vec<QubitId>> {
        if bitwidth > MAX_CONSTANT_BITWIDTH {
            return Err(Error::UnsupportedOperation(format!(
                "constant bitwidth {bitwidth} exceeds the maximum of {MAX_CONSTANT_BITWIDTH}"
            )));
        }
        let mut lines = Vec::with_capacity(bitwidth);
        for i in 0..bitwidth {
            let bit = (value >> i) & 1 != 0;
            lines.push(self.allocate_ancillary(computation, control_stack, bit, inline_stack.clone())?);
        }
        Ok(lines)
    }

    /// Returns a previously-allocated ancillary to the pool; the caller
    /// vouches that its classical value is currently `known_final_value`
    /// (SPEC_FULL §3.1 — explicit, caller-driven release).
    pub fn release_ancillary(&mut self, qubit: QubitId, known_final_value: bool) {
        self.pool_mut(known_final_value).push(qubit);
    }

    /// Freezes the allocator and promotes every preliminary ancillary in
    /// `computation` to a permanent one. One-way.
    pub fn freeze(&mut self, computation: &mut QuantumComputation) {
        self.frozen = true;
        computation.promote_ancillaries();
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
