//! Array calculation engine in Rust
//!
//! Evaluates compiled postfix expressions over scalar doubles and fixed-length
//! double arrays: arithmetic, comparison, bitwise, trigonometric, statistical
//! and conditional operators, plus array subranges, concatenation, shifting
//! and reductions.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod postfix;
pub mod random;

// Re-export main types
pub use config::{EvaluatorConfig, RandomMode, ScalarUnaryMode};
pub use error::{EvaluationError, EvaluationResult};
pub use evaluator::{Arguments, Evaluation, Evaluator, Outputs, SharedEvaluator};
pub use postfix::{Opcode, Postfix, PostfixBuilder};
