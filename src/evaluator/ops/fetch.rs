//! Operand producers: input fetches, constants and random values

use std::f64::consts::PI;

use crate::error::{EvaluationError, EvaluationResult};
use crate::evaluator::Machine;
use crate::postfix::Opcode;

const ARC_SECONDS_PER_RADIAN: f64 = 180.0 * 3600.0 / PI;

impl Machine<'_, '_> {
    /// Push scalar input `index`
    pub(crate) fn fetch_scalar(&mut self, index: usize, position: usize) -> EvaluationResult<()> {
        let value = self.args.scalar(index);
        self.stack.push_scalar(value, position)
    }

    /// Push a copy of array input `index`, zeros when absent
    pub(crate) fn fetch_array(&mut self, index: usize, position: usize) -> EvaluationResult<()> {
        let src = self.args.array(index).unwrap_or_default();
        self.stack.push_array(src, position)
    }

    /// `@`: replace the top with the scalar input it selects
    pub(super) fn fetch_scalar_indexed(&mut self, position: usize) -> EvaluationResult<()> {
        let index = input_index(self.stack.pop_scalar(position)?);
        self.fetch_scalar(index, position)
    }

    /// `@@`: replace the top with the array input it selects
    pub(super) fn fetch_array_indexed(&mut self, position: usize) -> EvaluationResult<()> {
        let index = input_index(self.stack.pop_scalar(position)?);
        self.fetch_array(index, position)
    }

    pub(super) fn push_constant(&mut self, op: Opcode, position: usize) -> EvaluationResult<()> {
        let value = match op {
            Opcode::ConstPi => PI,
            Opcode::ConstD2R => PI / 180.0,
            Opcode::ConstR2D => 180.0 / PI,
            Opcode::ConstS2R => 1.0 / ARC_SECONDS_PER_RADIAN,
            Opcode::ConstR2S => ARC_SECONDS_PER_RADIAN,
            _ => {
                return Err(EvaluationError::UnsupportedOpcode {
                    opcode: op.mnemonic(),
                    position,
                });
            }
        };
        self.stack.push_scalar(value, position)
    }

    /// `IX`: the array `0, 1, ..., n-1`
    pub(super) fn push_index_ramp(&mut self, position: usize) -> EvaluationResult<()> {
        let n = self.stack.array_size();
        self.stack.push_array_with(n, position, |buf| {
            for (i, value) in buf.iter_mut().enumerate() {
                *value = i as f64;
            }
        })
    }

    pub(super) fn push_random(&mut self, position: usize) -> EvaluationResult<()> {
        let value = self.random.next_unit();
        self.stack.push_scalar(value, position)
    }

    pub(super) fn push_random_array(&mut self, position: usize) -> EvaluationResult<()> {
        let n = self.stack.array_size();
        let random = &mut *self.random;
        self.stack.push_array_with(n, position, |buf| random.fill(buf))
    }
}

/// Round an index operand to the nearest input slot; negatives select slot 0
fn input_index(value: f64) -> usize {
    if value >= 0.0 {
        (value + 0.5).floor() as usize
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_index_rounding() {
        assert_eq!(input_index(0.0), 0);
        assert_eq!(input_index(1.49), 1);
        assert_eq!(input_index(1.5), 2);
        assert_eq!(input_index(-3.0), 0);
        assert_eq!(input_index(f64::NAN), 0);
        assert_eq!(input_index(1e300), usize::MAX);
    }

    #[test]
    fn test_arc_second_constants() {
        assert!((ARC_SECONDS_PER_RADIAN - 206_264.806_247_096_36).abs() < 1e-6);
    }
}
