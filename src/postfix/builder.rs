//! Postfix token emitter
//!
//! Hosts that already hold an operator sequence (and the test-suite) use
//! [`PostfixBuilder`] to produce the byte stream the evaluator consumes. It
//! does no parsing: callers emit tokens in evaluation order.

use std::fmt;

use super::opcode::{BAD_EXPRESSION, EXPRESSION_OK, Opcode};
use super::reader::{Token, TokenReader};

/// Compiled postfix stream
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Postfix {
    bytes: Vec<u8>,
}

impl Postfix {
    /// Wrap raw compiler output
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Stream the compiler marked invalid
    pub fn bad_expression() -> Self {
        Self {
            bytes: vec![BAD_EXPRESSION, Opcode::EndStack.byte()],
        }
    }

    /// Raw bytes, header included
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into the raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size in bytes of the stream
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the header marks the stream invalid
    pub fn is_bad(&self) -> bool {
        self.bytes.first() == Some(&BAD_EXPRESSION)
    }

    /// Upper bound on the stack depth needed to evaluate the stream.
    ///
    /// Both branches of a conditional are counted, so the bound is
    /// conservative for ternary expressions.
    pub fn max_stack_depth(&self) -> usize {
        let Ok(mut reader) = TokenReader::new(&self.bytes) else {
            return 0;
        };

        let mut current_depth = 0i32;
        let mut max_depth = 0i32;
        while let Ok(token) = reader.next_token() {
            let op = token.opcode();
            if op == Opcode::EndStack {
                break;
            }
            current_depth += i32::from(op.stack_effect());
            max_depth = max_depth.max(current_depth);
        }

        usize::try_from(max_depth).unwrap_or(0)
    }

    /// Pretty print the stream for debugging
    pub fn disassemble(&self) -> String {
        let mut output = String::new();
        output.push_str("=== POSTFIX DISASSEMBLY ===\n");

        let mut reader = match TokenReader::new(&self.bytes) {
            Ok(reader) => reader,
            Err(e) => {
                output.push_str(&format!("{e}\n"));
                return output;
            }
        };

        output.push_str(&format!("Size: {} bytes\n", self.bytes.len()));
        output.push_str(&format!("Max Stack Depth: {}\n", self.max_stack_depth()));
        output.push('\n');

        loop {
            let offset = reader.position();
            match reader.next_token() {
                Ok(token) => {
                    output.push_str(&format!("{offset:4}: {}\n", TokenDisplay(token)));
                    if token == Token::Op(Opcode::EndStack) {
                        break;
                    }
                }
                Err(e) => {
                    output.push_str(&format!("{offset:4}: <{e}>\n"));
                    break;
                }
            }
        }

        output
    }
}

impl AsRef<[u8]> for Postfix {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

struct TokenDisplay(Token);

impl fmt::Display for TokenDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Token::Op(op) => write!(f, "{op}"),
            Token::Fetch(idx) => write!(f, "FETCH {idx}"),
            Token::AFetch(idx) => write!(f, "AFETCH {idx}"),
            Token::Literal(value) => write!(f, "LIT {value}"),
        }
    }
}

/// Incremental emitter for [`Postfix`] streams
#[derive(Debug, Clone)]
pub struct PostfixBuilder {
    bytes: Vec<u8>,
}

impl Default for PostfixBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PostfixBuilder {
    /// Start a stream with a valid header
    pub fn new() -> Self {
        Self {
            bytes: vec![EXPRESSION_OK],
        }
    }

    /// Emit a zero-operand opcode.
    ///
    /// Opcodes that carry operands must go through [`fetch`](Self::fetch),
    /// [`afetch`](Self::afetch) or [`literal`](Self::literal); passing one
    /// here emits just its byte, which yields a malformed stream.
    pub fn op(mut self, op: Opcode) -> Self {
        self.bytes.push(op.byte());
        self
    }

    /// Emit a sequence of zero-operand opcodes
    pub fn ops(mut self, ops: &[Opcode]) -> Self {
        self.bytes.extend(ops.iter().map(|op| op.byte()));
        self
    }

    /// Push scalar input `index`, using the one-byte form when it exists
    pub fn fetch(mut self, index: u8) -> Self {
        match Opcode::direct_fetch(usize::from(index)) {
            Some(op) => self.bytes.push(op.byte()),
            None => self.bytes.extend_from_slice(&[Opcode::Fetch.byte(), index]),
        }
        self
    }

    /// Push scalar input `index` with the two-byte `FETCH` form
    pub fn fetch_long(mut self, index: u8) -> Self {
        self.bytes.extend_from_slice(&[Opcode::Fetch.byte(), index]);
        self
    }

    /// Push a copy of array input `index`
    pub fn afetch(mut self, index: u8) -> Self {
        self.bytes.extend_from_slice(&[Opcode::AFetch.byte(), index]);
        self
    }

    /// Push an embedded double
    pub fn literal(mut self, value: f64) -> Self {
        self.bytes.push(Opcode::Literal.byte());
        self.bytes.extend_from_slice(&value.to_ne_bytes());
        self
    }

    /// Append raw bytes verbatim
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Terminate the stream with `END_STACK`
    pub fn build(mut self) -> Postfix {
        self.bytes.push(Opcode::EndStack.byte());
        Postfix { bytes: self.bytes }
    }

    /// Take the bytes without appending `END_STACK`
    pub fn build_unterminated(self) -> Postfix {
        Postfix { bytes: self.bytes }
    }
}
