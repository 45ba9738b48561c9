//! Operand stack with per-slot array storage
//!
//! Elements are tagged as scalar or array. Every stack slot owns a fixed
//! region of `array_size` doubles inside one arena, so array operands are
//! always private copies and operators may work on them in place. The arena
//! only grows, and is reused across evaluations.

use crate::error::{EvaluationError, EvaluationResult};

/// Tag of a stack element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    /// Scalar value
    Scalar(f64),
    /// Array stored in the slot's arena region; `len` is the logical length
    Array {
        /// Meaningful prefix used by concatenation
        len: usize,
    },
}

impl Slot {
    /// Whether the element is an array
    pub fn is_array(&self) -> bool {
        matches!(self, Slot::Array { .. })
    }

    /// Logical length, 1 for scalars
    pub fn logical_len(&self) -> usize {
        match self {
            Slot::Scalar(_) => 1,
            Slot::Array { len } => *len,
        }
    }
}

/// Fixed-capacity operand stack
#[derive(Debug, Clone)]
pub struct OperandStack {
    slots: Vec<Slot>,
    arena: Vec<f64>,
    capacity: usize,
    array_size: usize,
    high_water: usize,
}

impl OperandStack {
    /// Create an empty stack; no arena memory is reserved until [`reset`](Self::reset)
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            arena: Vec::new(),
            capacity,
            array_size: 0,
            high_water: 0,
        }
    }

    /// Clear all elements and size array regions for this evaluation
    pub fn reset(&mut self, array_size: usize) {
        self.slots.clear();
        self.array_size = array_size;
        self.high_water = 0;

        let needed = self.capacity * array_size;
        if self.arena.len() < needed {
            self.arena.resize(needed, 0.0);
        }
    }

    /// Number of elements currently on the stack
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    /// Maximum number of elements
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Deepest point reached since the last reset
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Element count of every array in this evaluation
    pub fn array_size(&self) -> usize {
        self.array_size
    }

    fn push_slot(&mut self, slot: Slot, position: usize) -> EvaluationResult<usize> {
        if self.slots.len() >= self.capacity {
            return Err(EvaluationError::StackOverflow {
                capacity: self.capacity,
                position,
            });
        }
        self.slots.push(slot);
        self.high_water = self.high_water.max(self.slots.len());
        Ok(self.slots.len() - 1)
    }

    /// Push a scalar
    pub fn push_scalar(&mut self, value: f64, position: usize) -> EvaluationResult<()> {
        self.push_slot(Slot::Scalar(value), position).map(|_| ())
    }

    /// Push a copy of `src`; missing trailing elements are zero.
    ///
    /// The logical length is the number of elements actually supplied.
    pub fn push_array(&mut self, src: &[f64], position: usize) -> EvaluationResult<()> {
        let len = src.len().min(self.array_size);
        self.push_array_with(len, position, |buf| {
            let copied = src.len().min(buf.len());
            buf[..copied].copy_from_slice(&src[..copied]);
            buf[copied..].fill(0.0);
        })
    }

    /// Push an array whose contents `fill` writes in full
    pub fn push_array_with<F>(
        &mut self,
        len: usize,
        position: usize,
        fill: F,
    ) -> EvaluationResult<()>
    where
        F: FnOnce(&mut [f64]),
    {
        let idx = self.push_slot(Slot::Array { len }, position)?;
        fill(self.region_mut(idx));
        Ok(())
    }

    /// Remove the top element and return its index.
    ///
    /// The element's storage stays readable through [`region`](Self::region)
    /// until something is pushed again.
    pub fn pop(&mut self, position: usize) -> EvaluationResult<(usize, Slot)> {
        let slot = self
            .slots
            .pop()
            .ok_or(EvaluationError::StackUnderflow { position })?;
        Ok((self.slots.len(), slot))
    }

    /// Remove the top element and return it as a scalar (element 0 of an array)
    pub fn pop_scalar(&mut self, position: usize) -> EvaluationResult<f64> {
        let (idx, slot) = self.pop(position)?;
        Ok(match slot {
            Slot::Scalar(value) => value,
            Slot::Array { .. } => self.region(idx).first().copied().unwrap_or(0.0),
        })
    }

    /// Index of the top element
    pub fn top(&self, position: usize) -> EvaluationResult<usize> {
        self.slots
            .len()
            .checked_sub(1)
            .ok_or(EvaluationError::StackUnderflow { position })
    }

    /// Tag of element `idx`
    pub fn slot(&self, idx: usize) -> Slot {
        self.slots[idx]
    }

    /// Store a scalar into element `idx`
    pub fn set_scalar(&mut self, idx: usize, value: f64) {
        self.slots[idx] = Slot::Scalar(value);
    }

    /// Mark element `idx` as an array of logical length `len`
    pub fn set_array_len(&mut self, idx: usize, len: usize) {
        self.slots[idx] = Slot::Array { len };
    }

    /// Array storage of element `idx`
    pub fn region(&self, idx: usize) -> &[f64] {
        let n = self.array_size;
        &self.arena[idx * n..(idx + 1) * n]
    }

    /// Mutable array storage of element `idx`
    pub fn region_mut(&mut self, idx: usize) -> &mut [f64] {
        let n = self.array_size;
        &mut self.arena[idx * n..(idx + 1) * n]
    }

    /// Storage of two elements at once, `lower` below `upper`
    pub fn regions_mut(&mut self, lower: usize, upper: usize) -> (&mut [f64], &[f64]) {
        debug_assert!(lower < upper);
        let n = self.array_size;
        let (below, above) = self.arena.split_at_mut(upper * n);
        (&mut below[lower * n..(lower + 1) * n], &above[..n])
    }

    /// Value of element `idx` as a scalar, without changing it
    pub fn scalar_value(&self, idx: usize) -> f64 {
        match self.slots[idx] {
            Slot::Scalar(value) => value,
            Slot::Array { .. } => self.region(idx).first().copied().unwrap_or(0.0),
        }
    }

    /// Coerce element `idx` to a scalar (element 0 of an array) and return it
    pub fn to_scalar(&mut self, idx: usize) -> f64 {
        let value = self.scalar_value(idx);
        self.slots[idx] = Slot::Scalar(value);
        value
    }

    /// Coerce element `idx` to an array; scalars are broadcast, NaN as zeros
    pub fn to_array(&mut self, idx: usize) {
        if let Slot::Scalar(value) = self.slots[idx] {
            let fill = if value.is_nan() { 0.0 } else { value };
            self.region_mut(idx).fill(fill);
            self.slots[idx] = Slot::Array {
                len: self.array_size,
            };
        }
    }
}
