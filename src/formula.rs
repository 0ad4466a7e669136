//! Evaluation of read-once monotone boolean formulas (ROMBF).
//!
//! A formula is a fixed circuit of seven two-input units selected by a 15-bit
//! field from a hint word. Each of the eight input history bits is consumed
//! by exactly one unit, and every unit is monotone; the only inversion is the
//! top-level one selected by bit 14.

use crate::branch::Outcome;
use bitvec::prelude::*;

/// Number of history bits consumed by a formula.
pub const FORMULA_INPUT_BITS: usize = 8;

/// Evaluate a single two-input unit.
///
/// The 2-bit selector encodes:
/// `00: b1 AND b0`, `01: b1 OR b0`, `10: b1 OR !b0`, `11: b1 AND !b0`.
fn unit(sel: u16, b1: bool, b0: bool) -> bool {
    let o0 = sel & 0b01 != 0;
    let o1 = sel & 0b10 != 0;
    let b0i = if o1 { !b0 } else { b0 };
    if o1 ^ o0 {
        b1 | b0i
    } else {
        b1 & b0i
    }
}

/// A 15-bit selector for the formula circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BooleanFormula(pub u16);

impl BooleanFormula {
    /// Evaluate the circuit over the eight most-recent history bits
    /// (most recent at index 0).
    pub fn evaluate(&self, bits: &BitSlice) -> Outcome {
        assert_eq!(bits.len(), FORMULA_INPUT_BITS);
        let o = self.0;

        let u0 = unit(o & 0b11, bits[1], bits[0]);
        let u1 = unit((o >> 4) & 0b11, bits[3], bits[2]);
        let u2 = unit((o >> 2) & 0b11, u1, u0);
        let u3 = unit((o >> 8) & 0b11, bits[5], bits[4]);
        let u4 = unit((o >> 12) & 0b11, bits[7], bits[6]);
        let u5 = unit((o >> 10) & 0b11, u4, u3);
        let u6 = unit((o >> 6) & 0b11, u5, u2);

        let res = if (o >> 14) & 1 != 0 { u6 } else { !u6 };
        Outcome::from_bool(res)
    }
}
