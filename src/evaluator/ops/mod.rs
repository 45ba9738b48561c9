//! Operator families
//!
//! Each submodule adds an `impl Machine` block for one family of opcodes;
//! [`Machine::execute`] routes every zero-operand opcode to its family.

mod arithmetic;
mod array;
mod fetch;
mod logic;
mod reduce;
mod unary;

use super::Machine;
use super::stack::Slot;
use crate::error::{EvaluationError, EvaluationResult};
use crate::postfix::Opcode;

impl Machine<'_, '_> {
    pub(super) fn execute(&mut self, op: Opcode, position: usize) -> EvaluationResult<()> {
        use Opcode::*;

        match op {
            FetchA | FetchB | FetchC | FetchD | FetchE | FetchF | FetchG | FetchH | FetchI
            | FetchJ | FetchK | FetchL => {
                let index = op.direct_fetch_index().unwrap_or_default();
                self.fetch_scalar(index, position)
            }
            FetchIndexed => self.fetch_scalar_indexed(position),
            AFetchIndexed => self.fetch_array_indexed(position),

            ConstPi | ConstD2R | ConstR2D | ConstS2R | ConstR2S => self.push_constant(op, position),
            ConstIx => self.push_index_ramp(position),
            Random => self.push_random(position),
            ARandom => self.push_random_array(position),

            Add | Sub | Mult | Div | Modulo | Max | Min => self.arithmetic(op, position),
            Expon => self.power(position),

            GrOrEq | GrThan | LessOrEq | LessThan | NotEq | Equal | RelOr | RelAnd | BitOr
            | BitAnd | BitExclOr | Atan2 => self.logic(op, position),
            RightShift | LeftShift => self.shift(op, position),

            AbsVal | UnaryNeg | SquRt | Exp | Log10 | LogE | Acos | Asin | Atan | Cos | Sin
            | Tan | Cosh | Sinh | Tanh | Ceil | Floor | Nint | RelNot | BitNot => {
                self.unary(op, position)
            }

            Amax | Amin | Average | StdDev | Fwhm | Sum | IxMax | IxMin | IxZ | IxNz | Finite
            | IsNan | IsInf => self.reduce(op, position),

            Cum => self.cumulative(position),
            Cat => self.concat(position),
            Subrange | SubrangeInPlace => self.subrange(op, position),

            ToDouble => {
                let idx = self.stack.top(position)?;
                self.stack.to_scalar(idx);
                Ok(())
            }
            ToArray => {
                let idx = self.stack.top(position)?;
                self.stack.to_array(idx);
                Ok(())
            }

            Store => Err(EvaluationError::UnsupportedOpcode {
                opcode: op.mnemonic(),
                position,
            }),

            // Handled by the dispatch loop before reaching the operator table
            EndStack | Fetch | AFetch | Literal | CondIf | CondElse | CondEnd => {
                Err(EvaluationError::UnsupportedOpcode {
                    opcode: op.mnemonic(),
                    position,
                })
            }
        }
    }

    /// Indices of the two topmost elements, `(second, top)`
    fn operand_pair(&self, position: usize) -> EvaluationResult<(usize, usize)> {
        let rhs = self.stack.top(position)?;
        let lhs = rhs
            .checked_sub(1)
            .ok_or(EvaluationError::StackUnderflow { position })?;
        Ok((lhs, rhs))
    }

    /// Replace the two topmost elements with `f(second, top)`.
    ///
    /// If either operand is an array both are broadcast and `f` runs per
    /// element over all `array_size` entries.
    fn binary_elementwise<F>(&mut self, position: usize, f: F) -> EvaluationResult<()>
    where
        F: Fn(f64, f64) -> EvaluationResult<f64>,
    {
        let (lhs, rhs) = self.operand_pair(position)?;

        match (self.stack.slot(lhs), self.stack.slot(rhs)) {
            (Slot::Scalar(a), Slot::Scalar(b)) => {
                let value = f(a, b)?;
                self.stack.set_scalar(lhs, value);
            }
            (lhs_slot, rhs_slot) => {
                let len = combined_len(lhs_slot, rhs_slot);
                self.stack.to_array(lhs);
                self.stack.to_array(rhs);
                let (a, b) = self.stack.regions_mut(lhs, rhs);
                for (x, y) in a.iter_mut().zip(b) {
                    *x = f(*x, *y)?;
                }
                self.stack.set_array_len(lhs, len);
            }
        }

        self.stack.pop(position)?;
        Ok(())
    }
}

/// Logical length of a binary result: the longer of two arrays, otherwise
/// the array operand's
fn combined_len(lhs: Slot, rhs: Slot) -> usize {
    match (lhs, rhs) {
        (Slot::Array { len: a }, Slot::Array { len: b }) => a.max(b),
        (Slot::Array { len }, Slot::Scalar(_)) | (Slot::Scalar(_), Slot::Array { len }) => len,
        (Slot::Scalar(_), Slot::Scalar(_)) => 1,
    }
}

/// Truncating conversion used by the integer operators
pub(crate) fn to_i32(value: f64) -> i32 {
    value as i32
}

/// Round half away from zero, saturating like the legacy `long` cast
pub(crate) fn nint(value: f64) -> f64 {
    let rounded = if value >= 0.0 { value + 0.5 } else { value - 0.5 };
    rounded as i64 as f64
}

/// Truthiness of a logical operand
pub(crate) fn truthy(value: f64) -> bool {
    value != 0.0
}

/// 1.0 or 0.0
pub(crate) fn flag(condition: bool) -> f64 {
    if condition { 1.0 } else { 0.0 }
}
