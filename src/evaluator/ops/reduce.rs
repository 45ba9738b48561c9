//! Array reductions
//!
//! Every reduction covers all `array_size` elements, regardless of the
//! operand's logical length.

use super::flag;
use crate::error::{EvaluationError, EvaluationResult};
use crate::evaluator::Machine;
use crate::evaluator::stack::Slot;
use crate::postfix::Opcode;

impl Machine<'_, '_> {
    pub(super) fn reduce(&mut self, op: Opcode, position: usize) -> EvaluationResult<()> {
        let idx = self.stack.top(position)?;

        let value = match self.stack.slot(idx) {
            Slot::Scalar(value) => reduce_scalar(op, value),
            Slot::Array { .. } => reduce_array(op, self.stack.region(idx)),
        };

        match value {
            Some(value) => {
                self.stack.set_scalar(idx, value);
                Ok(())
            }
            None => Err(EvaluationError::UnsupportedOpcode {
                opcode: op.mnemonic(),
                position,
            }),
        }
    }
}

fn reduce_scalar(op: Opcode, value: f64) -> Option<f64> {
    Some(match op {
        Opcode::Amax | Opcode::Amin | Opcode::Average | Opcode::Sum => value,
        Opcode::StdDev | Opcode::Fwhm | Opcode::IxMax | Opcode::IxMin => 0.0,
        Opcode::IxZ => {
            if value == 0.0 {
                0.0
            } else {
                -1.0
            }
        }
        Opcode::IxNz => {
            if value != 0.0 {
                0.0
            } else {
                -1.0
            }
        }
        Opcode::Finite => flag(value.is_finite()),
        Opcode::IsNan => flag(value.is_nan()),
        Opcode::IsInf => flag(value.is_infinite()),
        _ => return None,
    })
}

fn reduce_array(op: Opcode, a: &[f64]) -> Option<f64> {
    if a.is_empty() {
        return reduce_scalar(op, 0.0).map(|_| 0.0);
    }

    Some(match op {
        Opcode::Amax => a[index_of_max(a)],
        Opcode::Amin => a[index_of_min(a)],
        Opcode::Average => a.iter().sum::<f64>() / a.len() as f64,
        Opcode::StdDev => std_dev(a),
        Opcode::Fwhm => fwhm(a),
        Opcode::Sum => a.iter().sum(),
        Opcode::IxMax => index_of_max(a) as f64,
        Opcode::IxMin => index_of_min(a) as f64,
        Opcode::IxZ => position_or_minus_one(a, |v| v == 0.0),
        Opcode::IxNz => position_or_minus_one(a, |v| v != 0.0),
        Opcode::Finite => flag(a.iter().all(|v| v.is_finite())),
        Opcode::IsNan => flag(a.iter().any(|v| v.is_nan())),
        Opcode::IsInf => flag(a.iter().any(|v| v.is_infinite())),
        _ => return None,
    })
}

/// First index holding the maximum
fn index_of_max(a: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in a.iter().enumerate().skip(1) {
        if v > a[best] {
            best = i;
        }
    }
    best
}

/// First index holding the minimum
fn index_of_min(a: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in a.iter().enumerate().skip(1) {
        if v < a[best] {
            best = i;
        }
    }
    best
}

fn position_or_minus_one(a: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    a.iter()
        .position(|&v| pred(v))
        .map_or(-1.0, |i| i as f64)
}

/// Sample standard deviation; a single element divides by one
fn std_dev(a: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean = a.iter().sum::<f64>() / n;
    let sum_sq: f64 = a.iter().map(|v| (v - mean) * (v - mean)).sum();
    let divisor = if a.len() > 1 { n - 1.0 } else { n };
    (sum_sq / divisor).sqrt()
}

/// Full width at half maximum of the peak, in index units
fn fwhm(a: &[f64]) -> f64 {
    let n = a.len();
    let peak = index_of_max(a);
    let max = a[peak];
    let min = a[index_of_min(a)];
    let threshold = min + (max - min) / 2.0;

    let mut upper = (n - 1) as f64;
    for i in peak + 1..n {
        if a[i] < threshold {
            upper = (i - 1) as f64 + (threshold - a[i - 1]) / (a[i] - a[i - 1]);
            break;
        }
    }

    let mut lower = 0.0;
    for i in (0..peak).rev() {
        if a[i] < threshold {
            lower = i as f64 + (threshold - a[i]) / (a[i + 1] - a[i]);
            break;
        }
    }

    upper - lower
}
