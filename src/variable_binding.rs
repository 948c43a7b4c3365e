//! Per-module variable bindings and parameter aliasing (spec §4.4).
//!
//! Each module frame (entry module, or one per nested call/uncall currently
//! being synthesized) owns a scope of identifier -> binding entries. A
//! binding is either `Direct` (an actual qubit range) or `Alias`, which
//! points at an identifier in an ancestor frame; resolving a variable access
//! walks the alias chain down to its root `Direct` binding, mirroring
//! `syrec_synthesis.cpp::getVariables`' `referenceVariableData->reference`
//! walk without needing to mutate the (immutable) AST to record it.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::qubit::QubitId;

#[derive(Clone, Debug)]
enum Binding {
    Direct {
        base: QubitId,
        dimensions: Vec<usize>,
        bitwidth: usize,
    },
    /// Points at `identifier` in the frame at `frame_index`, captured at
    /// bind time so that later pushes/pops of deeper frames can't shift
    /// which frame the alias resolves against.
    Alias { frame_index: usize, identifier: String },
}

#[derive(Default)]
pub struct VariableBinding {
    frames: Vec<FxHashMap<String, Binding>>,
}

impl VariableBinding {
    /// Starts with a single frame for the entry module.
    pub fn new() -> Self {
        Self {
            frames: vec![FxHashMap::default()],
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// The frame index callers should capture now to later alias a callee
    /// parameter back to a binding visible in the current frame.
    pub fn current_frame_index(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn bind_direct(
        &mut self,
        identifier: impl Into<String>,
        base: QubitId,
        dimensions: Vec<usize>,
        bitwidth: usize,
    ) -> Result<()> {
        let identifier = identifier.into();
        let frame = self.frames.last_mut().expect("at least the entry frame always exists");
        if frame.contains_key(&identifier) {
            return Err(Error::DuplicateLabel(identifier));
        }
        frame.insert(
            identifier,
            Binding::Direct {
                base,
                dimensions,
                bitwidth,
            },
        );
        Ok(())
    }

    /// Aliases `identifier` in the current (just-pushed callee) frame to
    /// `parent_identifier` as it was bound in `parent_frame_index`.
    pub fn bind_alias(
        &mut self,
        identifier: impl Into<String>,
        parent_frame_index: usize,
        parent_identifier: impl Into<String>,
    ) -> Result<()> {
        let identifier = identifier.into();
        let frame = self.frames.last_mut().expect("at least the entry frame always exists");
        if frame.contains_key(&identifier) {
            return Err(Error::DuplicateLabel(identifier));
        }
        frame.insert(
            identifier,
            Binding::Alias {
                frame_index: parent_frame_index,
                identifier: parent_identifier.into(),
            },
        );
        Ok(())
    }

    fn resolve_layout(&self, identifier: &str) -> Result<(QubitId, &[usize], usize)> {
        let mut frame_index = self.current_frame_index();
        let mut name = identifier.to_string();
        loop {
            let frame = &self.frames[frame_index];
            match frame.get(&name) {
                Some(Binding::Direct { base, dimensions, bitwidth }) => {
                    return Ok((*base, dimensions.as_slice(), *bitwidth));
                }
                Some(Binding::Alias { frame_index: parent, identifier: parent_name }) => {
                    frame_index = *parent;
                    name = parent_name.clone();
                }
                None => return Err(Error::UnknownVariable(identifier.to_string())),
            }
        }
    }

    /// Resolves a (possibly indexed, possibly bit-ranged) variable access to
    /// its qubit vector. `indices` are the already-evaluated dimension
    /// indices (row-major: `offset = Σ_i (idx_i × ∏_{j>i} dim_j) × bitwidth`);
    /// `bit_range`, if given, may run high-to-low to request the bits in
    /// reverse order, matching spec §4.4 and `getVariables`.
    pub fn resolve(
        &self,
        identifier: &str,
        indices: &[usize],
        bit_range: Option<(usize, usize)>,
    ) -> Result<Vec<QubitId>> {
        let (base, dimensions, bitwidth) = self.resolve_layout(identifier)?;

        let element_offset = if indices.is_empty() {
            0
        } else {
            if indices.len() != dimensions.len() {
                return Err(Error::UnsupportedOperation(format!(
                    "variable {identifier:?} indexed with {} indices but declared with {} dimensions",
                    indices.len(),
                    dimensions.len()
                )));
            }
            let mut offset = 0usize;
            for (i, &idx) in indices.iter().enumerate() {
                let trailing_product: usize = dimensions[i + 1..].iter().product();
                offset += idx * trailing_product;
            }
            offset * bitwidth
        };

        let (lo, hi) = bit_range.unwrap_or((0, bitwidth.saturating_sub(1)));
        let element_base = base.index() + element_offset;
        let qubits: Vec<QubitId> = if lo <= hi {
            (lo..=hi).map(|b| QubitId(element_base + b)).collect()
        } else {
            (hi..=lo).rev().map(|b| QubitId(element_base + b)).collect()
        };
        if qubits.is_empty() {
            return Err(Error::UnknownVariable(identifier.to_string()));
        }
        Ok(qubits)
    }
}
