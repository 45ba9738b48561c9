//! Postfix stack evaluator
//!
//! This module executes compiled postfix streams over scalar and array inputs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────────┐
//! │   Postfix    │ -> │ TokenReader  │ -> │     Machine      │
//! │   (bytes)    │    │   (tokens)   │    │ (operator table) │
//! └──────────────┘    └──────────────┘    └──────────────────┘
//!                                                  │
//!                                                  ▼
//!                                         ┌──────────────────┐
//!                                         │  OperandStack    │
//!                                         │ (arena per call) │
//!                                         └──────────────────┘
//! ```
//!
//! Each [`Evaluator`] owns its stack, so separate evaluators can run on
//! separate threads. [`SharedEvaluator`] keeps the single shared stack of the
//! legacy engine behind a non-blocking busy guard.
//!
//! # Example
//!
//! ```
//! use acalc::{Arguments, Evaluator, Opcode, PostfixBuilder};
//!
//! // A + B * 2
//! let postfix = PostfixBuilder::new()
//!     .fetch(0)
//!     .fetch(1)
//!     .literal(2.0)
//!     .op(Opcode::Mult)
//!     .op(Opcode::Add)
//!     .build();
//!
//! let mut evaluator = Evaluator::new();
//! let args = Arguments::new(&[1.0, 3.0], &[]);
//! let result = evaluator.evaluate(postfix.as_bytes(), &args, 4).unwrap();
//! assert_eq!(result.value, 7.0);
//! assert_eq!(result.array, vec![7.0; 4]);
//! ```

mod ops;
pub mod shared;
pub mod stack;

pub use shared::SharedEvaluator;
pub use stack::{OperandStack, Slot};

use crate::config::{EvaluatorConfig, ScalarUnaryMode};
use crate::error::{EvaluationError, EvaluationResult};
use crate::postfix::{MAX_ARGS, Opcode, Token, TokenReader};
use crate::random::RandomSource;

/// Scalar and array input variables of one evaluation
#[derive(Debug, Clone, Copy, Default)]
pub struct Arguments<'a> {
    scalars: &'a [f64],
    arrays: &'a [&'a [f64]],
}

impl<'a> Arguments<'a> {
    /// Inputs addressed by index: `scalars[i]` by `FETCH i`, `arrays[i]` by `AFETCH i`
    pub fn new(scalars: &'a [f64], arrays: &'a [&'a [f64]]) -> Self {
        Self { scalars, arrays }
    }

    /// Scalar inputs only
    pub fn scalars(scalars: &'a [f64]) -> Self {
        Self {
            scalars,
            arrays: &[],
        }
    }

    /// Scalar input `index`, 0 when not supplied
    pub fn scalar(&self, index: usize) -> f64 {
        self.scalars.get(index).copied().unwrap_or(0.0)
    }

    /// Array input `index`, if supplied
    pub fn array(&self, index: usize) -> Option<&'a [f64]> {
        self.arrays.get(index).copied()
    }

    /// Number of scalar inputs
    pub fn scalar_count(&self) -> usize {
        self.scalars.len()
    }

    /// Number of array inputs
    pub fn array_count(&self) -> usize {
        self.arrays.len()
    }

    fn validate(&self) -> EvaluationResult<()> {
        if self.scalars.len() > MAX_ARGS {
            return Err(EvaluationError::TooManyArguments {
                kind: "scalar",
                count: self.scalars.len(),
                max: MAX_ARGS,
            });
        }
        if self.arrays.len() > MAX_ARGS {
            return Err(EvaluationError::TooManyArguments {
                kind: "array",
                count: self.arrays.len(),
                max: MAX_ARGS,
            });
        }
        Ok(())
    }
}

/// Result destinations; either or both may be requested
#[derive(Debug, Default)]
pub struct Outputs<'a> {
    /// Scalar result
    pub value: Option<&'a mut f64>,
    /// Array result, at least `array_size` long
    pub array: Option<&'a mut [f64]>,
}

impl<'a> Outputs<'a> {
    /// Request the scalar result only
    pub fn value(value: &'a mut f64) -> Self {
        Self {
            value: Some(value),
            array: None,
        }
    }

    /// Request the array result only
    pub fn array(array: &'a mut [f64]) -> Self {
        Self {
            value: None,
            array: Some(array),
        }
    }

    /// Request both results
    pub fn both(value: &'a mut f64, array: &'a mut [f64]) -> Self {
        Self {
            value: Some(value),
            array: Some(array),
        }
    }
}

/// Owned results of a successful evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Scalar result (element 0 when the expression produced an array)
    pub value: f64,
    /// Array result (broadcast when the expression produced a scalar)
    pub array: Vec<f64>,
}

/// Reentrant postfix evaluator
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvaluatorConfig,
    stack: OperandStack,
    random: RandomSource,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Create an evaluator with the default configuration
    pub fn new() -> Self {
        Self::build(EvaluatorConfig::default())
    }

    /// Create an evaluator with a custom configuration
    pub fn with_config(config: EvaluatorConfig) -> EvaluationResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EvaluatorConfig) -> Self {
        Self {
            stack: OperandStack::new(config.stack_capacity),
            random: config.random.source(),
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate `postfix` and write the requested results into `outputs`.
    ///
    /// On error the outputs may have been partially written.
    pub fn perform(
        &mut self,
        postfix: &[u8],
        args: &Arguments<'_>,
        array_size: usize,
        outputs: &mut Outputs<'_>,
    ) -> EvaluationResult<()> {
        self.check_array_size(array_size)?;
        args.validate()?;
        if let Some(array) = outputs.array.as_deref() {
            if array.len() < array_size {
                return Err(EvaluationError::OutputBufferTooSmall {
                    required: array_size,
                    provided: array.len(),
                });
            }
        }

        let result = self.run(postfix, args, array_size);
        log::debug!(
            "postfix evaluation finished: stack high-water {} of {}",
            self.stack.high_water(),
            self.stack.capacity()
        );
        result.inspect_err(|e| log::debug!("postfix evaluation failed: {e}"))?;

        self.extract(outputs)
    }

    /// Evaluate `postfix` and return both results
    pub fn evaluate(
        &mut self,
        postfix: &[u8],
        args: &Arguments<'_>,
        array_size: usize,
    ) -> EvaluationResult<Evaluation> {
        self.check_array_size(array_size)?;

        let mut value = 0.0;
        let mut array = vec![0.0; array_size];
        self.perform(
            postfix,
            args,
            array_size,
            &mut Outputs::both(&mut value, &mut array),
        )?;

        Ok(Evaluation { value, array })
    }

    fn check_array_size(&self, array_size: usize) -> EvaluationResult<()> {
        if array_size > self.config.max_array_size {
            log::debug!(
                "array size {array_size} exceeds capacity {}",
                self.config.max_array_size
            );
            return Err(EvaluationError::ArraySizeExceeded {
                requested: array_size,
                capacity: self.config.max_array_size,
            });
        }
        Ok(())
    }

    fn run(
        &mut self,
        postfix: &[u8],
        args: &Arguments<'_>,
        array_size: usize,
    ) -> EvaluationResult<()> {
        let mut reader = TokenReader::new(postfix)?;
        self.stack.reset(array_size);

        let mut machine = Machine {
            stack: &mut self.stack,
            args,
            random: &mut self.random,
            unary_mode: self.config.scalar_unary_mode,
        };

        loop {
            let position = reader.position();
            let token = reader.next_token()?;
            log::trace!(
                "offset {position}: {token:?} (depth {})",
                machine.stack.depth()
            );

            match token {
                Token::Op(Opcode::EndStack) => break,
                Token::Fetch(index) => machine.fetch_scalar(usize::from(index), position)?,
                Token::AFetch(index) => machine.fetch_array(usize::from(index), position)?,
                Token::Literal(value) => machine.stack.push_scalar(value, position)?,
                Token::Op(Opcode::CondIf) => {
                    if machine.stack.pop_scalar(position)? == 0.0 {
                        reader.skip_branch(Opcode::CondElse, position)?;
                    }
                }
                // Reached only when the then-branch ran
                Token::Op(Opcode::CondElse) => reader.skip_branch(Opcode::CondEnd, position)?,
                Token::Op(Opcode::CondEnd) => {}
                Token::Op(op) => machine.execute(op, position)?,
            }
        }

        match self.stack.depth() {
            1 => Ok(()),
            remaining => Err(EvaluationError::UnbalancedStack { remaining }),
        }
    }

    fn extract(&mut self, outputs: &mut Outputs<'_>) -> EvaluationResult<()> {
        let n = self.stack.array_size();
        let value = self.stack.scalar_value(0);

        if let Some(out) = outputs.value.as_deref_mut() {
            *out = value;
        }
        if let Some(out) = outputs.array.as_deref_mut() {
            match self.stack.slot(0) {
                Slot::Array { .. } => out[..n].copy_from_slice(self.stack.region(0)),
                Slot::Scalar(v) => out[..n].fill(if v.is_nan() { 0.0 } else { v }),
            }
        }

        if !value.is_finite() {
            log::debug!("postfix evaluation produced non-finite result {value}");
            return Err(EvaluationError::NonFiniteResult { value });
        }
        Ok(())
    }
}

/// Execution state of one evaluation
pub(crate) struct Machine<'s, 'a> {
    stack: &'s mut OperandStack,
    args: &'s Arguments<'a>,
    random: &'s mut RandomSource,
    unary_mode: ScalarUnaryMode,
}
