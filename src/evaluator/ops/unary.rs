//! Single-operand math operators

use super::{flag, nint, to_i32, truthy};
use crate::config::ScalarUnaryMode;
use crate::error::{EvaluationError, EvaluationResult};
use crate::evaluator::Machine;
use crate::evaluator::stack::Slot;
use crate::postfix::Opcode;

impl Machine<'_, '_> {
    pub(super) fn unary(&mut self, op: Opcode, position: usize) -> EvaluationResult<()> {
        let idx = self.stack.top(position)?;

        match self.stack.slot(idx) {
            Slot::Array { .. } => {
                for value in self.stack.region_mut(idx) {
                    *value = apply(op, *value, position)?;
                }
            }
            Slot::Scalar(value) => {
                let legacy_skip = self.unary_mode == ScalarUnaryMode::Legacy
                    && applies_to_negative_only(op)
                    && !(value < 0.0);
                if !legacy_skip {
                    self.stack.set_scalar(idx, apply(op, value, position)?);
                }
            }
        }
        Ok(())
    }
}

/// Operators the legacy scalar path only applied to negative operands
fn applies_to_negative_only(op: Opcode) -> bool {
    matches!(
        op,
        Opcode::Acos
            | Opcode::Asin
            | Opcode::Atan
            | Opcode::Cos
            | Opcode::Sin
            | Opcode::Tan
            | Opcode::Cosh
            | Opcode::Sinh
            | Opcode::Tanh
            | Opcode::Ceil
            | Opcode::Floor
            | Opcode::Nint
    )
}

fn apply(op: Opcode, x: f64, position: usize) -> EvaluationResult<f64> {
    Ok(match op {
        Opcode::AbsVal => {
            if x < 0.0 {
                -x
            } else {
                x
            }
        }
        Opcode::UnaryNeg => -x,
        Opcode::SquRt => {
            if x < 0.0 {
                return Err(EvaluationError::NegativeRadicand { value: x });
            }
            x.sqrt()
        }
        Opcode::Exp => x.exp(),
        Opcode::Log10 => {
            if x < 0.0 {
                return Err(EvaluationError::NegativeLogArgument { value: x });
            }
            x.log10()
        }
        Opcode::LogE => {
            if x < 0.0 {
                return Err(EvaluationError::NegativeLogArgument { value: x });
            }
            x.ln()
        }
        Opcode::Acos => x.acos(),
        Opcode::Asin => x.asin(),
        Opcode::Atan => x.atan(),
        Opcode::Cos => x.cos(),
        Opcode::Sin => x.sin(),
        Opcode::Tan => x.tan(),
        Opcode::Cosh => x.cosh(),
        Opcode::Sinh => x.sinh(),
        Opcode::Tanh => x.tanh(),
        Opcode::Ceil => x.ceil(),
        Opcode::Floor => x.floor(),
        Opcode::Nint => nint(x),
        Opcode::RelNot => flag(!truthy(x)),
        Opcode::BitNot => f64::from(!to_i32(x)),
        _ => {
            return Err(EvaluationError::UnsupportedOpcode {
                opcode: op.mnemonic(),
                position,
            });
        }
    })
}
