//! Shared black-box helpers for the integration suite: a classical gate
//! simulator plus small AST builders so each test file can describe a
//! module in a couple of lines instead of the full struct literals.

#![allow(dead_code)]

use revsynth::ast::{Module, Program, Variable, VariableKind};
use revsynth::computation::QuantumComputation;
use revsynth::gate::Gate;
use revsynth::qubit::QubitId;

pub fn var(name: &str, kind: VariableKind, bitwidth: usize) -> Variable {
    Variable {
        name: name.to_string(),
        kind,
        dimensions: vec![],
        bitwidth,
    }
}

pub fn module(name: &str, parameters: Vec<Variable>, variables: Vec<Variable>, statements: Vec<revsynth::ast::Statement>) -> Module {
    Module {
        name: name.to_string(),
        parameters,
        variables,
        statements,
    }
}

pub fn single_module_program(m: Module) -> Program {
    Program { modules: vec![m] }
}

/// Qubits `[base, base + width)`, matching the row-major dense allocation
/// order the allocator assigns to a variable (spec §4.2).
pub fn qrange(base: usize, width: usize) -> Vec<QubitId> {
    (0..width).map(|i| QubitId(base + i)).collect()
}

pub fn value_of(state: &[bool], qubits: &[QubitId]) -> u64 {
    qubits.iter().enumerate().fold(0u64, |acc, (i, &q)| acc | (u64::from(state[q.index()]) << i))
}

/// Runs every gate in `qc` against a classical basis state starting with
/// `initial_true` set and everything else zero. Stands in for the (out of
/// scope) real simulator so these tests can assert on synthesized behavior
/// without a quantum backend.
pub fn simulate(qc: &QuantumComputation, initial_true: &[QubitId]) -> Vec<bool> {
    let mut state = vec![false; qc.qubit_count()];
    for &q in initial_true {
        state[q.index()] = true;
    }
    for gate in qc.gates() {
        let active = |controls: &revsynth::gate::Controls| controls.iter().all(|c| state[c.index()]);
        match gate {
            Gate::Not { target } => state[target.index()] ^= true,
            Gate::Cnot { control, target } => {
                if state[control.index()] {
                    state[target.index()] ^= true;
                }
            }
            Gate::Toffoli { controls, target } => {
                if state[controls[0].index()] && state[controls[1].index()] {
                    state[target.index()] ^= true;
                }
            }
            Gate::MultiControlToffoli { controls, target } => {
                if active(controls) {
                    state[target.index()] ^= true;
                }
            }
            Gate::Fredkin { controls, targets } => {
                if active(controls) {
                    state.swap(targets[0].index(), targets[1].index());
                }
            }
        }
    }
    state
}
