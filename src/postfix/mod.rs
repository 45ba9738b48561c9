//! Compiled postfix stream format
//!
//! This module defines the byte-level contract shared with the infix compiler:
//! the opcode table, the token reader used by the evaluator and a token emitter
//! for hosts and tests.

pub mod builder;
pub mod opcode;
pub mod reader;

pub use builder::{Postfix, PostfixBuilder};
pub use opcode::{BAD_EXPRESSION, EXPRESSION_OK, MAX_ARGS, Opcode};
pub use reader::{Token, TokenReader};
