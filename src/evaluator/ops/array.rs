//! Array restructuring operators: subranges, concatenation and running sums

use crate::error::EvaluationResult;
use crate::evaluator::Machine;
use crate::evaluator::stack::Slot;
use crate::postfix::Opcode;

impl Machine<'_, '_> {
    /// `[i,j]` extracts, `{i,j}` zeroes around the slice in place
    pub(super) fn subrange(&mut self, op: Opcode, position: usize) -> EvaluationResult<()> {
        let last = self.stack.pop_scalar(position)?;
        let first = self.stack.pop_scalar(position)?;

        let target = self.stack.top(position)?;
        self.stack.to_array(target);
        let n = self.stack.array_size();
        let range = SliceBounds::resolve(first, last, n);
        let buf = self.stack.region_mut(target);

        if op == Opcode::SubrangeInPlace {
            buf[..range.first].fill(0.0);
            if let Some(after) = range.after_last() {
                buf[after..].fill(0.0);
            }
        } else {
            let count = range.count();
            buf.copy_within(range.first..range.first + count, 0);
            buf[count..].fill(0.0);
            self.stack.set_array_len(target, count);
        }
        Ok(())
    }

    /// `cat`: append the top operand after the logical length of the one below
    pub(super) fn concat(&mut self, position: usize) -> EvaluationResult<()> {
        let (lhs, rhs) = self.operand_pair(position)?;
        let n = self.stack.array_size();
        let lhs_len = self.stack.slot(lhs).logical_len().min(n);
        let rhs_len = self.stack.slot(rhs).logical_len();

        for idx in [lhs, rhs] {
            if let Slot::Scalar(value) = self.stack.slot(idx) {
                if let Some(head) = self.stack.region_mut(idx).first_mut() {
                    *head = value;
                }
            }
        }

        let (a, b) = self.stack.regions_mut(lhs, rhs);
        let count = rhs_len.min(n - lhs_len);
        a[lhs_len..lhs_len + count].copy_from_slice(&b[..count]);
        a[lhs_len + count..].fill(0.0);

        self.stack.set_array_len(lhs, lhs_len + count);
        self.stack.pop(position)?;
        Ok(())
    }

    /// `cum`: running sum in place; scalars are left alone
    pub(super) fn cumulative(&mut self, position: usize) -> EvaluationResult<()> {
        let idx = self.stack.top(position)?;
        if self.stack.slot(idx).is_array() {
            let mut total = 0.0;
            for value in self.stack.region_mut(idx) {
                total += *value;
                *value = total;
            }
        }
        Ok(())
    }
}

/// Resolved inclusive slice `first..=last` of an `n` element array
#[derive(Debug, Clone, Copy, PartialEq)]
struct SliceBounds {
    first: usize,
    /// May lie before `first` (empty slice) or at `n`
    last: i64,
    n: usize,
}

impl SliceBounds {
    fn resolve(first: f64, last: f64, n: usize) -> Self {
        let size = n as i64;
        let from_end = |value: f64| {
            let index = value as i64;
            if index < 0 { index.saturating_add(size) } else { index }
        };

        let first = from_end(first).clamp(0, size);
        let last = from_end(last).min(size);
        Self {
            first: first as usize,
            last,
            n,
        }
    }

    /// Elements inside the slice that exist in the array
    fn count(&self) -> usize {
        let end = self.last.min(self.n as i64 - 1);
        let first = self.first as i64;
        if end < first {
            0
        } else {
            (end - first + 1) as usize
        }
    }

    /// First index past the slice, if it lies inside the array
    fn after_last(&self) -> Option<usize> {
        let after = self.last.saturating_add(1).max(0) as usize;
        (after < self.n).then_some(after)
    }
}
