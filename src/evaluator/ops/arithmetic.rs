//! Arithmetic operators and exponentiation

use super::to_i32;
use crate::error::{EvaluationError, EvaluationResult};
use crate::evaluator::Machine;
use crate::evaluator::stack::Slot;
use crate::postfix::Opcode;

impl Machine<'_, '_> {
    /// `+ - * / % >? <?`
    pub(super) fn arithmetic(&mut self, op: Opcode, position: usize) -> EvaluationResult<()> {
        match op {
            Opcode::Add => self.binary_elementwise(position, |a, b| Ok(a + b)),
            Opcode::Sub => self.binary_elementwise(position, |a, b| Ok(a - b)),
            Opcode::Mult => self.binary_elementwise(position, |a, b| Ok(a * b)),
            Opcode::Div => self.binary_elementwise(position, |a, b| {
                if b == 0.0 {
                    Err(EvaluationError::DivisionByZero { position })
                } else {
                    Ok(a / b)
                }
            }),
            Opcode::Modulo => self.binary_elementwise(position, |a, b| {
                let divisor = to_i32(b);
                if divisor == 0 {
                    Err(EvaluationError::ModuloByZero { position })
                } else {
                    Ok(f64::from(to_i32(a).wrapping_rem(divisor)))
                }
            }),
            // Comparison keeps the first operand on ties and NaN
            Opcode::Max => self.binary_elementwise(position, |a, b| Ok(if a < b { b } else { a })),
            Opcode::Min => self.binary_elementwise(position, |a, b| Ok(if a > b { b } else { a })),
            _ => Err(EvaluationError::UnsupportedOpcode {
                opcode: op.mnemonic(),
                position,
            }),
        }
    }

    /// `**`: the exponent is always reduced to a scalar integer
    pub(super) fn power(&mut self, position: usize) -> EvaluationResult<()> {
        let exponent = self.stack.pop_scalar(position)?;
        if exponent.fract() != 0.0 || !exponent.is_finite() {
            return Err(EvaluationError::NonIntegerExponent { exponent });
        }

        let base = self.stack.top(position)?;
        match self.stack.slot(base) {
            Slot::Scalar(value) => self.stack.set_scalar(base, integer_power(value, exponent)),
            Slot::Array { .. } => {
                for value in self.stack.region_mut(base) {
                    *value = integer_power(*value, exponent);
                }
            }
        }
        Ok(())
    }
}

/// `base ** exponent` for an integral exponent, via logarithms.
///
/// A zero base stays zero for every exponent. Negative bases take the sign
/// from the exponent's parity.
fn integer_power(base: f64, exponent: f64) -> f64 {
    if base == 0.0 {
        return base;
    }

    let magnitude = (exponent * base.abs().ln()).exp();
    if base < 0.0 && exponent % 2.0 != 0.0 {
        -magnitude
    } else {
        magnitude
    }
}
