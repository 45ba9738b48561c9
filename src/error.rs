// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Error types for postfix evaluation

use thiserror::Error;

/// Result type for evaluation operations
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors that can occur while evaluating a postfix stream.
///
/// Every variant aborts the evaluation immediately. `position` fields hold the
/// byte offset of the offending token inside the postfix stream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// The stream header marks the expression as invalid
    #[error("Bad expression: postfix stream is marked invalid")]
    BadExpression,

    /// The stream ended before `END_STACK`
    #[error("Truncated expression at offset {position}")]
    TruncatedExpression {
        /// Offset where more bytes were expected
        position: usize,
    },

    /// A byte that does not name any opcode
    #[error("Unknown opcode {byte:#04x} at offset {position}")]
    UnknownOpcode {
        /// The offending byte
        byte: u8,
        /// Offset of the byte
        position: usize,
    },

    /// A known opcode that this engine never executes
    #[error("Unsupported opcode {opcode} at offset {position}")]
    UnsupportedOpcode {
        /// Mnemonic of the opcode
        opcode: &'static str,
        /// Offset of the token
        position: usize,
    },

    /// Push past the stack capacity
    #[error("Stack overflow: capacity of {capacity} elements exceeded at offset {position}")]
    StackOverflow {
        /// Configured capacity
        capacity: usize,
        /// Offset of the token
        position: usize,
    },

    /// Pop from an empty stack
    #[error("Stack underflow at offset {position}")]
    StackUnderflow {
        /// Offset of the token
        position: usize,
    },

    /// The stream finished with other than exactly one value on the stack
    #[error("Unbalanced stack: {remaining} values remain after evaluation")]
    UnbalancedStack {
        /// Number of values left on the stack
        remaining: usize,
    },

    /// Division by zero (scalar or any array element)
    #[error("Division by zero at offset {position}")]
    DivisionByZero {
        /// Offset of the token
        position: usize,
    },

    /// Modulo by a divisor that truncates to zero
    #[error("Modulo by zero at offset {position}")]
    ModuloByZero {
        /// Offset of the token
        position: usize,
    },

    /// Exponentiation with a fractional exponent
    #[error("Exponent {exponent} is not an integer")]
    NonIntegerExponent {
        /// The rejected exponent
        exponent: f64,
    },

    /// Square root of a negative value
    #[error("Square root of negative value {value}")]
    NegativeRadicand {
        /// The rejected operand
        value: f64,
    },

    /// Logarithm of a negative value
    #[error("Logarithm of negative value {value}")]
    NegativeLogArgument {
        /// The rejected operand
        value: f64,
    },

    /// `?` / `:` markers do not close before `END_STACK`
    #[error("Unbalanced conditional starting at offset {position}")]
    UnbalancedConditional {
        /// Offset of the conditional marker that started the scan
        position: usize,
    },

    /// The scalar result is NaN or infinite
    #[error("Non-finite result: {value}")]
    NonFiniteResult {
        /// The computed value
        value: f64,
    },

    /// Requested array size is larger than the evaluator buffers
    #[error("Array size {requested} exceeds evaluator capacity of {capacity}")]
    ArraySizeExceeded {
        /// Requested number of elements
        requested: usize,
        /// Configured maximum
        capacity: usize,
    },

    /// The shared evaluator is already in use
    #[error("Evaluator busy: shared stack already in use")]
    EvaluatorBusy,

    /// More input variables than the engine can address
    #[error("Too many {kind} arguments: {count} supplied, at most {max} supported")]
    TooManyArguments {
        /// "scalar" or "array"
        kind: &'static str,
        /// Number supplied
        count: usize,
        /// Supported maximum
        max: usize,
    },

    /// The array destination cannot hold the result
    #[error("Output buffer too small: {required} elements required, {provided} provided")]
    OutputBufferTooSmall {
        /// `array_size` of the evaluation
        required: usize,
        /// Length of the supplied buffer
        provided: usize,
    },

    /// Rejected evaluator configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },
}

impl EvaluationError {
    /// Byte offset of the offending token, if the error is tied to one
    pub fn position(&self) -> Option<usize> {
        match self {
            EvaluationError::TruncatedExpression { position }
            | EvaluationError::UnknownOpcode { position, .. }
            | EvaluationError::UnsupportedOpcode { position, .. }
            | EvaluationError::StackOverflow { position, .. }
            | EvaluationError::StackUnderflow { position }
            | EvaluationError::DivisionByZero { position }
            | EvaluationError::ModuloByZero { position }
            | EvaluationError::UnbalancedConditional { position } => Some(*position),
            _ => None,
        }
    }

    /// Whether the failure comes from the postfix stream itself rather than
    /// from the values it was evaluated with
    pub fn is_malformed_expression(&self) -> bool {
        matches!(
            self,
            EvaluationError::BadExpression
                | EvaluationError::TruncatedExpression { .. }
                | EvaluationError::UnknownOpcode { .. }
                | EvaluationError::UnsupportedOpcode { .. }
                | EvaluationError::StackOverflow { .. }
                | EvaluationError::StackUnderflow { .. }
                | EvaluationError::UnbalancedStack { .. }
                | EvaluationError::UnbalancedConditional { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EvaluationError::DivisionByZero { position: 7 };
        assert_eq!(err.to_string(), "Division by zero at offset 7");

        let err = EvaluationError::UnknownOpcode {
            byte: 0xab,
            position: 3,
        };
        assert_eq!(err.to_string(), "Unknown opcode 0xab at offset 3");
    }

    #[test]
    fn test_error_position() {
        assert_eq!(
            EvaluationError::StackUnderflow { position: 4 }.position(),
            Some(4)
        );
        assert_eq!(EvaluationError::EvaluatorBusy.position(), None);
    }

    #[test]
    fn test_malformed_classification() {
        assert!(EvaluationError::BadExpression.is_malformed_expression());
        assert!(EvaluationError::UnbalancedStack { remaining: 2 }.is_malformed_expression());
        assert!(!EvaluationError::DivisionByZero { position: 1 }.is_malformed_expression());
        assert!(!EvaluationError::NonFiniteResult { value: f64::NAN }.is_malformed_expression());
    }
}
