//! Reversible arithmetic primitives (spec §4.7).
//!
//! Transcribed gate-for-gate from `syrec_synthesis.cpp`'s
//! `increase`/`decrease`/`decreaseWithCarry`/`increment`/`decrement`/
//! `multiplication`/`division`/`modulo`/`equals`/`lessThan`/`greaterThan`/
//! `greaterEquals`/`lessEquals`/`notEquals`/`bitwiseAnd`/`bitwiseOr`/
//! `conjunction`/`disjunction`. All operands are little-endian (bit 0 = LSB).

use crate::computation::QuantumComputation;
use crate::control_stack::ControlStack;
use crate::error::{Error, Result};
use crate::qubit::QubitId;

fn require_equal_len(a: &[QubitId], b: &[QubitId], what: &str) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::UnsupportedOperation(format!(
            "{what}: operand bitwidth mismatch ({} vs {})",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

pub fn bitwise_negation(qc: &mut QuantumComputation, ctrl: &ControlStack, dest: &[QubitId]) -> Result<()> {
    for &q in dest {
        qc.emit_not(q, ctrl)?;
    }
    Ok(())
}

pub fn bitwise_cnot(qc: &mut QuantumComputation, ctrl: &ControlStack, dest: &[QubitId], src: &[QubitId]) -> Result<()> {
    for (&d, &s) in dest.iter().zip(src.iter()) {
        qc.emit_cnot(s, d, ctrl)?;
    }
    Ok(())
}

pub fn conjunction(qc: &mut QuantumComputation, ctrl: &ControlStack, dest: QubitId, src1: QubitId, src2: QubitId) -> Result<()> {
    qc.emit_toffoli(src1, src2, dest, ctrl)
}

pub fn disjunction(qc: &mut QuantumComputation, ctrl: &ControlStack, dest: QubitId, src1: QubitId, src2: QubitId) -> Result<()> {
    qc.emit_cnot(src1, dest, ctrl)?;
    qc.emit_cnot(src2, dest, ctrl)?;
    qc.emit_toffoli(src1, src2, dest, ctrl)
}

pub fn bitwise_and(qc: &mut QuantumComputation, ctrl: &ControlStack, dest: &[QubitId], src1: &[QubitId], src2: &[QubitId]) -> Result<()> {
    for i in 0..dest.len() {
        conjunction(qc, ctrl, dest[i], src1[i], src2[i])?;
    }
    Ok(())
}

pub fn bitwise_or(qc: &mut QuantumComputation, ctrl: &ControlStack, dest: &[QubitId], src1: &[QubitId], src2: &[QubitId]) -> Result<()> {
    for i in 0..dest.len() {
        disjunction(qc, ctrl, dest[i], src1[i], src2[i])?;
    }
    Ok(())
}

/// `increment`/`decrement` register each bit of `dest` as an active control
/// before toggling it, so bit `i` only flips when every lower bit has
/// already carried through — the asymmetry in iteration order between the
/// two (`decrement` registers-then-NOTs low to high, `increment` registers
/// all first and then NOTs high to low) is exactly what the original does.
pub fn decrement(qc: &mut QuantumComputation, ctrl: &mut ControlStack, dest: &[QubitId]) -> Result<()> {
    ctrl.enter_scope();
    let result = (|| {
        for &q in dest {
            qc.emit_not(q, ctrl)?;
            ctrl.register(q)?;
        }
        Ok(())
    })();
    ctrl.leave_scope();
    result
}

pub fn increment(qc: &mut QuantumComputation, ctrl: &mut ControlStack, dest: &[QubitId]) -> Result<()> {
    ctrl.enter_scope();
    let result = (|| {
        for &q in dest {
            ctrl.register(q)?;
        }
        for &q in dest.iter().rev() {
            ctrl.deregister(q)?;
            qc.emit_not(q, ctrl)?;
        }
        Ok(())
    })();
    ctrl.leave_scope();
    result
}

/// `b := (a + b) mod 2^N`, no ancillaries, no carry propagation beyond
/// `carry_out` (Cuccaro et al. ripple-carry adder).
pub fn increase(
    qc: &mut QuantumComputation,
    ctrl: &ControlStack,
    a: &[QubitId],
    b: &[QubitId],
    carry_out: Option<QubitId>,
) -> Result<()> {
    require_equal_len(a, b, "increase")?;
    let n = b.len();
    if n == 0 {
        return Ok(());
    }
    if n == 1 {
        qc.emit_cnot(a[0], b[0], ctrl)?;
        return Ok(());
    }

    for i in 1..n {
        qc.emit_cnot(a[i], b[i], ctrl)?;
    }
    if let Some(c) = carry_out {
        qc.emit_cnot(a[n - 1], c, ctrl)?;
    }
    for i in (2..n).rev() {
        qc.emit_cnot(a[i - 1], a[i], ctrl)?;
    }
    for i in 0..n - 1 {
        qc.emit_toffoli(b[i], a[i], a[i + 1], ctrl)?;
    }
    if let Some(c) = carry_out {
        qc.emit_toffoli(a[n - 1], b[n - 1], c, ctrl)?;
    }
    for i in (1..n).rev() {
        qc.emit_cnot(a[i], b[i], ctrl)?;
        qc.emit_toffoli(a[i - 1], b[i - 1], a[i], ctrl)?;
    }
    for i in 1..n - 1 {
        qc.emit_cnot(a[i], a[i + 1], ctrl)?;
    }
    for i in (1..=n).rev() {
        qc.emit_cnot(a[i - 1], b[i - 1], ctrl)?;
    }
    Ok(())
}

/// `b := (b - a) mod 2^N`: invert, add, invert back.
pub fn decrease(qc: &mut QuantumComputation, ctrl: &ControlStack, a: &[QubitId], b: &[QubitId]) -> Result<()> {
    for &q in b {
        qc.emit_not(q, ctrl)?;
    }
    increase(qc, ctrl, a, b, None)?;
    for &q in b {
        qc.emit_not(q, ctrl)?;
    }
    Ok(())
}

/// Like [`decrease`], but `carry` receives the sign bit of `b - a`.
pub fn decrease_with_carry(
    qc: &mut QuantumComputation,
    ctrl: &ControlStack,
    a: &[QubitId],
    b: &[QubitId],
    carry: QubitId,
) -> Result<()> {
    for &q in b {
        qc.emit_not(q, ctrl)?;
    }
    increase(qc, ctrl, a, b, Some(carry))?;
    for &q in b {
        qc.emit_not(q, ctrl)?;
    }
    Ok(())
}

pub fn less_than(qc: &mut QuantumComputation, ctrl: &mut ControlStack, dest: QubitId, src1: &[QubitId], src2: &[QubitId]) -> Result<()> {
    decrease_with_carry(qc, ctrl, src1, src2, dest)?;
    increase(qc, ctrl, src1, src2, None)
}

pub fn greater_than(qc: &mut QuantumComputation, ctrl: &mut ControlStack, dest: QubitId, src2: &[QubitId], src1: &[QubitId]) -> Result<()> {
    less_than(qc, ctrl, dest, src1, src2)
}

pub fn less_equals(qc: &mut QuantumComputation, ctrl: &mut ControlStack, dest: QubitId, src2: &[QubitId], src1: &[QubitId]) -> Result<()> {
    less_than(qc, ctrl, dest, src1, src2)?;
    qc.emit_not(dest, ctrl)
}

pub fn greater_equals(qc: &mut QuantumComputation, ctrl: &mut ControlStack, dest: QubitId, src_two: &[QubitId], src_one: &[QubitId]) -> Result<()> {
    greater_than(qc, ctrl, dest, src_one, src_two)?;
    qc.emit_not(dest, ctrl)
}

pub fn equals(qc: &mut QuantumComputation, ctrl: &ControlStack, dest: QubitId, src1: &[QubitId], src2: &[QubitId]) -> Result<()> {
    if src2.len() < src1.len() {
        return Err(Error::UnsupportedOperation("equals: src2 shorter than src1".into()));
    }
    for i in 0..src1.len() {
        qc.emit_cnot(src2[i], src1[i], ctrl)?;
        qc.emit_not(src1[i], ctrl)?;
    }
    qc.emit_mct(crate::gate::Controls::from_iter(src1.iter().copied()), dest, ctrl)?;
    for i in 0..src1.len() {
        qc.emit_cnot(src2[i], src1[i], ctrl)?;
        qc.emit_not(src1[i], ctrl)?;
    }
    Ok(())
}

pub fn not_equals(qc: &mut QuantumComputation, ctrl: &ControlStack, dest: QubitId, src1: &[QubitId], src2: &[QubitId]) -> Result<()> {
    equals(qc, ctrl, dest, src1, src2)?;
    qc.emit_not(dest, ctrl)
}

/// Shift-and-add multiplication: for bit `i` of `src1`, within a scope
/// controlled by that bit, either bitwise-CNOT a shifted window of `src2`
/// into `dest` (`i == 0`) or `increase` it in (`i > 0`).
pub fn multiplication(qc: &mut QuantumComputation, ctrl: &mut ControlStack, dest: &[QubitId], src1: &[QubitId], src2: &[QubitId]) -> Result<()> {
    if src1.is_empty() || dest.is_empty() {
        return Ok(());
    }
    if src1.len() < dest.len() || src2.len() < dest.len() {
        return Err(Error::UnsupportedOperation("multiplication: operand narrower than destination".into()));
    }

    ctrl.enter_scope();
    let result = (|| {
        let mut sum = dest.to_vec();
        let mut partial = src2.to_vec();

        ctrl.register(src1[0])?;
        bitwise_cnot(qc, ctrl, &sum, &partial)?;
        ctrl.deregister(src1[0])?;

        for i in 1..dest.len() {
            sum.remove(0);
            partial.pop();
            ctrl.register(src1[i])?;
            increase(qc, ctrl, &sum, &partial, None)?;
            ctrl.deregister(src1[i])?;
        }
        Ok(())
    })();
    ctrl.leave_scope();
    result
}

/// Restoring division: `dividend = divisor * quotient + remainder`.
/// Initializes `quotient := dividend`, then for each bit, left-shifts the
/// virtual `{remainder, quotient}` aggregate and subtracts `divisor`,
/// restoring (adding `divisor` back) when the subtraction's sign bit says
/// the result went negative. The quotient bit is the inverted sign bit.
/// Since the algorithm leaves quotient/remainder swapped relative to their
/// names, a final element-wise Fredkin row corrects it.
pub fn division(
    qc: &mut QuantumComputation,
    ctrl: &mut ControlStack,
    dividend: &[QubitId],
    divisor: &[QubitId],
    quotient: &[QubitId],
    remainder: &[QubitId],
) -> Result<()> {
    let n = dividend.len();
    if divisor.len() != n || quotient.len() != n || remainder.len() != n {
        return Err(Error::UnsupportedOperation("division: operand bitwidth mismatch".into()));
    }

    for i in 0..n {
        qc.emit_cnot(dividend[i], quotient[i], ctrl)?;
    }

    // V = reverse(quotient ++ remainder), i.e. R_{n-1}..R_0, Q_{n-1}..Q_0.
    let mut aggregate: Vec<QubitId> = quotient.iter().chain(remainder.iter()).copied().collect();
    aggregate.reverse();

    ctrl.enter_scope();
    let result = (|| {
        for i in 1..=n {
            let mut window: Vec<QubitId> = aggregate[i..i + n].to_vec();
            window.reverse();

            let sign_bit = remainder[n - i];
            decrease_with_carry(qc, ctrl, divisor, &window, sign_bit)?;

            ctrl.register(sign_bit)?;
            increase(qc, ctrl, divisor, &window, None)?;
            ctrl.deregister(sign_bit)?;

            qc.emit_not(sign_bit, ctrl)?;
        }
        Ok(())
    })();
    ctrl.leave_scope();
    result?;

    for i in 0..n {
        qc.emit_fredkin(quotient[i], remainder[i], ctrl)?;
    }
    Ok(())
}

pub fn left_shift(qc: &mut QuantumComputation, ctrl: &ControlStack, dest: &[QubitId], src: &[QubitId], amount: usize) -> Result<()> {
    if amount >= dest.len() {
        return Ok(());
    }
    let n_shifted = dest.len() - amount;
    if src.len() < n_shifted {
        return Err(Error::UnsupportedOperation("left_shift: source too narrow".into()));
    }
    for i in 0..n_shifted {
        qc.emit_cnot(src[i], dest[amount + i], ctrl)?;
    }
    Ok(())
}

pub fn right_shift(qc: &mut QuantumComputation, ctrl: &ControlStack, dest: &[QubitId], src: &[QubitId], amount: usize) -> Result<()> {
    if amount >= dest.len() {
        return Ok(());
    }
    let n_shifted = dest.len() - amount;
    if src.len() < n_shifted {
        return Err(Error::UnsupportedOperation("right_shift: source too narrow".into()));
    }
    for i in 0..n_shifted {
        qc.emit_cnot(src[amount + i], dest[i], ctrl)?;
    }
    Ok(())
}

pub fn swap_vectors(qc: &mut QuantumComputation, ctrl: &ControlStack, a: &[QubitId], b: &[QubitId]) -> Result<()> {
    require_equal_len(a, b, "swap")?;
    for i in 0..a.len() {
        qc.emit_fredkin(a[i], b[i], ctrl)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubit::{InlineInformation, QubitKind};

    fn wire_vec(qc: &mut QuantumComputation, ctrl: &mut ControlStack, n: usize) -> Vec<QubitId> {
        (0..n)
            .map(|i| {
                let id = qc
                    .add_qubit(
                        QubitKind::Variable { is_garbage: false },
                        format!("__q{i}.0"),
                        None,
                        InlineInformation::none(),
                    )
                    .unwrap();
                ctrl.declare_qubit(id);
                id
            })
            .collect()
    }

    /// A minimal classical gate simulator, used only to check arithmetic
    /// primitives behave correctly on concrete inputs (spec §8's round-trip
    /// and end-to-end scenarios) without needing the real simulator, which
    /// is out of scope for this crate.
    fn simulate(qc: &QuantumComputation, initial: &[bool]) -> Vec<bool> {
        let mut state = initial.to_vec();
        for gate in qc.gates() {
            use crate::gate::Gate;
            let active = |controls: &crate::gate::Controls| controls.iter().all(|c| state[c.index()]);
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

    fn bits_lsb_first(value: u64, n: usize) -> Vec<bool> {
        (0..n).map(|i| (value >> i) & 1 != 0).collect()
    }

    fn value_of(bits: &[bool], qubits: &[QubitId]) -> u64 {
        qubits.iter().enumerate().fold(0u64, |acc, (i, &q)| acc | (u64::from(bits[q.index()]) << i))
    }

    #[test]
    fn increase_computes_modular_sum() {
        let mut qc = QuantumComputation::new();
        let mut ctrl = ControlStack::new();
        let a = wire_vec(&mut qc, &mut ctrl, 3);
        let b = wire_vec(&mut qc, &mut ctrl, 3);
        increase(&mut qc, &ctrl, &a, &b, None).unwrap();

        let mut initial = bits_lsb_first(0b011, 3);
        initial.extend(bits_lsb_first(0b110, 3));
        let result = simulate(&qc, &initial);
        assert_eq!(value_of(&result, &b), (0b011 + 0b110) % 8);
        assert_eq!(value_of(&result, &a), 0b011, "a is untouched by increase");
    }

    #[test]
    fn increase_then_decrease_round_trips() {
        let mut qc = QuantumComputation::new();
        let mut ctrl = ControlStack::new();
        let a = wire_vec(&mut qc, &mut ctrl, 4);
        let b = wire_vec(&mut qc, &mut ctrl, 4);
        increase(&mut qc, &ctrl, &a, &b, None).unwrap();
        decrease(&mut qc, &ctrl, &a, &b).unwrap();

        let mut initial = bits_lsb_first(5, 4);
        initial.extend(bits_lsb_first(11, 4));
        let result = simulate(&qc, &initial);
        assert_eq!(value_of(&result, &b), 11);
        assert_eq!(value_of(&result, &a), 5);
    }

    #[test]
    fn increment_adds_one_modulo_width() {
        let mut qc = QuantumComputation::new();
        let mut ctrl = ControlStack::new();
        let a = wire_vec(&mut qc, &mut ctrl, 3);
        increment(&mut qc, &mut ctrl, &a).unwrap();

        let result = simulate(&qc, &bits_lsb_first(0b010, 3));
        assert_eq!(value_of(&result, &a), 0b011);

        let result = simulate(&qc, &bits_lsb_first(0b111, 3));
        assert_eq!(value_of(&result, &a), 0, "wraps modulo 2^3");
    }

    #[test]
    fn increment_then_decrement_is_identity() {
        let mut qc = QuantumComputation::new();
        let mut ctrl = ControlStack::new();
        let a = wire_vec(&mut qc, &mut ctrl, 3);
        increment(&mut qc, &mut ctrl, &a).unwrap();
        decrement(&mut qc, &mut ctrl, &a).unwrap();

        let result = simulate(&qc, &bits_lsb_first(0b101, 3));
        assert_eq!(value_of(&result, &a), 0b101);
    }

    #[test]
    fn division_produces_quotient_and_remainder() {
        let mut qc = QuantumComputation::new();
        let mut ctrl = ControlStack::new();
        let dividend = wire_vec(&mut qc, &mut ctrl, 4);
        let divisor = wire_vec(&mut qc, &mut ctrl, 4);
        let quotient = wire_vec(&mut qc, &mut ctrl, 4);
        let remainder = wire_vec(&mut qc, &mut ctrl, 4);
        division(&mut qc, &mut ctrl, &dividend, &divisor, &quotient, &remainder).unwrap();

        let mut initial = bits_lsb_first(13, 4);
        initial.extend(bits_lsb_first(4, 4));
        initial.extend(bits_lsb_first(0, 4));
        initial.extend(bits_lsb_first(0, 4));
        let result = simulate(&qc, &initial);
        assert_eq!(value_of(&result, &quotient), 13 / 4);
        assert_eq!(value_of(&result, &remainder), 13 % 4);
    }

    #[test]
    fn multiplication_computes_product_into_fresh_destination() {
        let mut qc = QuantumComputation::new();
        let mut ctrl = ControlStack::new();
        let src1 = wire_vec(&mut qc, &mut ctrl, 3);
        let src2 = wire_vec(&mut qc, &mut ctrl, 3);
        let dest = wire_vec(&mut qc, &mut ctrl, 3);
        multiplication(&mut qc, &mut ctrl, &dest, &src1, &src2).unwrap();

        let mut initial = bits_lsb_first(3, 3);
        initial.extend(bits_lsb_first(2, 3));
        initial.extend(bits_lsb_first(0, 3));
        let result = simulate(&qc, &initial);
        assert_eq!(value_of(&result, &dest), (3 * 2) % 8);
    }

    #[test]
    fn equals_sets_dest_only_when_operands_match() {
        let mut qc = QuantumComputation::new();
        let mut ctrl = ControlStack::new();
        let src1 = wire_vec(&mut qc, &mut ctrl, 2);
        let src2 = wire_vec(&mut qc, &mut ctrl, 2);
        let dest = wire_vec(&mut qc, &mut ctrl, 1)[0];
        equals(&mut qc, &ctrl, dest, &src1, &src2).unwrap();

        let mut initial = bits_lsb_first(0b10, 2);
        initial.extend(bits_lsb_first(0b10, 2));
        initial.push(false);
        let result = simulate(&qc, &initial);
        assert!(result[dest.index()]);

        let mut initial = bits_lsb_first(0b10, 2);
        initial.extend(bits_lsb_first(0b01, 2));
        initial.push(false);
        let result = simulate(&qc, &initial);
        assert!(!result[dest.index()]);
    }

    #[test]
    fn less_than_compares_operands() {
        let mut qc = QuantumComputation::new();
        let mut ctrl = ControlStack::new();
        let src1 = wire_vec(&mut qc, &mut ctrl, 2);
        let src2 = wire_vec(&mut qc, &mut ctrl, 2);
        let dest = wire_vec(&mut qc, &mut ctrl, 1)[0];
        less_than(&mut qc, &mut ctrl, dest, &src1, &src2).unwrap();

        let mut initial = bits_lsb_first(1, 2);
        initial.extend(bits_lsb_first(3, 2));
        initial.push(false);
        let result = simulate(&qc, &initial);
        assert!(result[dest.index()]);
        assert_eq!(value_of(&result, &src1), 1, "operands restored after the comparison");
        assert_eq!(value_of(&result, &src2), 3);
    }

    #[test]
    fn left_shift_then_right_shift_is_identity_on_unshifted_bits() {
        let mut qc = QuantumComputation::new();
        let mut ctrl = ControlStack::new();
        let src = wire_vec(&mut qc, &mut ctrl, 4);
        let shifted = wire_vec(&mut qc, &mut ctrl, 4);
        let restored = wire_vec(&mut qc, &mut ctrl, 4);
        left_shift(&mut qc, &ctrl, &shifted, &src, 1).unwrap();
        right_shift(&mut qc, &ctrl, &restored, &shifted, 1).unwrap();

        let mut initial = bits_lsb_first(0b1011, 4);
        initial.extend(bits_lsb_first(0, 4));
        initial.extend(bits_lsb_first(0, 4));
        let result = simulate(&qc, &initial);
        // bit 3 of `src` falls off the top on a left shift by 1, so only bits
        // 0..3 survive the round trip.
        assert_eq!(value_of(&result, &restored) & 0b0111, 0b011);
    }

    #[test]
    fn swap_vectors_exchanges_qubits() {
        let mut qc = QuantumComputation::new();
        let mut ctrl = ControlStack::new();
        let a = wire_vec(&mut qc, &mut ctrl, 2);
        let b = wire_vec(&mut qc, &mut ctrl, 2);
        swap_vectors(&mut qc, &ctrl, &a, &b).unwrap();

        let mut initial = bits_lsb_first(0b10, 2);
        initial.extend(bits_lsb_first(0b01, 2));
        let result = simulate(&qc, &initial);
        assert_eq!(value_of(&result, &a), 0b01);
        assert_eq!(value_of(&result, &b), 0b10);
    }
}
