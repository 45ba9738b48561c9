//! Comparison, logical, bitwise and shift operators

use super::{flag, nint, to_i32, truthy};
use crate::error::{EvaluationError, EvaluationResult};
use crate::evaluator::Machine;
use crate::evaluator::stack::Slot;
use crate::postfix::Opcode;

impl Machine<'_, '_> {
    pub(super) fn logic(&mut self, op: Opcode, position: usize) -> EvaluationResult<()> {
        let f: fn(f64, f64) -> f64 = match op {
            Opcode::GrOrEq => |a, b| flag(a >= b),
            Opcode::GrThan => |a, b| flag(a > b),
            Opcode::LessOrEq => |a, b| flag(a <= b),
            Opcode::LessThan => |a, b| flag(a < b),
            Opcode::NotEq => |a, b| flag(a != b),
            Opcode::Equal => |a, b| flag(a == b),
            Opcode::RelOr => |a, b| flag(truthy(a) || truthy(b)),
            Opcode::RelAnd => |a, b| flag(truthy(a) && truthy(b)),
            Opcode::BitOr => |a, b| f64::from(to_i32(a) | to_i32(b)),
            Opcode::BitAnd => |a, b| f64::from(to_i32(a) & to_i32(b)),
            Opcode::BitExclOr => |a, b| f64::from(to_i32(a) ^ to_i32(b)),
            Opcode::Atan2 => |a, b| b.atan2(a),
            _ => {
                return Err(EvaluationError::UnsupportedOpcode {
                    opcode: op.mnemonic(),
                    position,
                });
            }
        };

        self.binary_elementwise(position, |a, b| Ok(f(a, b)))
    }

    /// `>>` and `<<`
    pub(super) fn shift(&mut self, op: Opcode, position: usize) -> EvaluationResult<()> {
        let amount = self.stack.pop_scalar(position)?;
        let target = self.stack.top(position)?;
        let right = op == Opcode::RightShift;

        match self.stack.slot(target) {
            Slot::Scalar(value) => {
                let bits = to_i32(amount) as u32;
                let shifted = if right {
                    to_i32(value).wrapping_shr(bits)
                } else {
                    to_i32(value).wrapping_shl(bits)
                };
                self.stack.set_scalar(target, f64::from(shifted));
            }
            Slot::Array { len } => {
                let slots = nint(amount) as i64;
                let offset = if right { slots } else { slots.saturating_neg() };
                let n = self.stack.array_size();
                shift_region(self.stack.region_mut(target), offset);

                let distance = usize::try_from(offset.unsigned_abs()).unwrap_or(usize::MAX);
                let len = if offset >= 0 {
                    len.saturating_add(distance).min(n)
                } else {
                    len.saturating_sub(distance)
                };
                self.stack.set_array_len(target, len);
            }
        }
        Ok(())
    }
}

/// Move elements `offset` slots towards higher indices (negative: lower),
/// filling vacated slots with zero
fn shift_region(buf: &mut [f64], offset: i64) {
    let n = buf.len();
    let distance = usize::try_from(offset.unsigned_abs()).unwrap_or(usize::MAX);
    if distance >= n {
        buf.fill(0.0);
        return;
    }

    if offset > 0 {
        buf.copy_within(..n - distance, distance);
        buf[..distance].fill(0.0);
    } else if offset < 0 {
        buf.copy_within(distance.., 0);
        buf[n - distance..].fill(0.0);
    }
}
