//! Token stream reader
//!
//! Decodes one token at a time from a compiled postfix buffer. Conditional
//! skipping goes through the same decoder, so operand bytes of `LITERAL`,
//! `FETCH` and `AFETCH` can never be taken for control markers.

use super::opcode::{BAD_EXPRESSION, Opcode};
use crate::error::{EvaluationError, EvaluationResult};

/// A decoded token
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    /// Zero-operand opcode
    Op(Opcode),
    /// `FETCH <index>`
    Fetch(u8),
    /// `AFETCH <index>`
    AFetch(u8),
    /// `LITERAL <8 bytes>`
    Literal(f64),
}

impl Token {
    /// Opcode that introduced this token
    pub fn opcode(&self) -> Opcode {
        match self {
            Token::Op(op) => *op,
            Token::Fetch(_) => Opcode::Fetch,
            Token::AFetch(_) => Opcode::AFetch,
            Token::Literal(_) => Opcode::Literal,
        }
    }
}

/// Cursor over a postfix buffer
#[derive(Debug, Clone)]
pub struct TokenReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> TokenReader<'a> {
    /// Check the header byte and position the reader on the first token
    pub fn new(buf: &'a [u8]) -> EvaluationResult<Self> {
        match buf.first() {
            None => Err(EvaluationError::TruncatedExpression { position: 0 }),
            Some(&BAD_EXPRESSION) => Err(EvaluationError::BadExpression),
            Some(_) => Ok(Self { buf, pos: 1 }),
        }
    }

    /// Offset of the next token
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Decode the token at the cursor and advance past it
    pub fn next_token(&mut self) -> EvaluationResult<Token> {
        let start = self.pos;
        let byte = *self
            .buf
            .get(start)
            .ok_or(EvaluationError::TruncatedExpression { position: start })?;
        let op = Opcode::from_byte(byte).ok_or(EvaluationError::UnknownOpcode {
            byte,
            position: start,
        })?;

        let end = start + op.size();
        let operand = self
            .buf
            .get(start + 1..end)
            .ok_or(EvaluationError::TruncatedExpression { position: start })?;
        self.pos = end;

        Ok(match op {
            Opcode::Fetch => Token::Fetch(operand[0]),
            Opcode::AFetch => Token::AFetch(operand[0]),
            Opcode::Literal => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(operand);
                Token::Literal(f64::from_ne_bytes(raw))
            }
            _ => Token::Op(op),
        })
    }

    /// Skip forward past the marker that closes the current conditional level.
    ///
    /// `closing` is `COND_ELSE` when a false condition skips its then-branch
    /// and `COND_END` when a finished then-branch skips the else-branch.
    /// Nested `COND_IF` markers open a new level. `origin` is reported if the
    /// stream ends first.
    pub fn skip_branch(&mut self, closing: Opcode, origin: usize) -> EvaluationResult<()> {
        let mut depth = 1usize;
        loop {
            match self.next_token()? {
                Token::Op(Opcode::EndStack) => {
                    return Err(EvaluationError::UnbalancedConditional { position: origin });
                }
                Token::Op(Opcode::CondIf) => depth += 1,
                Token::Op(op) if op == closing => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postfix::opcode::EXPRESSION_OK;

    fn stream(tokens: &[u8]) -> Vec<u8> {
        let mut buf = vec![EXPRESSION_OK];
        buf.extend_from_slice(tokens);
        buf
    }

    #[test]
    fn test_decodes_variable_length_tokens() {
        let mut buf = stream(&[Opcode::Fetch.byte(), 3, Opcode::Literal.byte()]);
        buf.extend_from_slice(&2.5f64.to_ne_bytes());
        buf.extend_from_slice(&[Opcode::AFetch.byte(), 11, Opcode::Add.byte()]);
        buf.push(Opcode::EndStack.byte());

        let mut reader = TokenReader::new(&buf).unwrap();
        assert_eq!(reader.next_token().unwrap(), Token::Fetch(3));
        assert_eq!(reader.position(), 3);
        assert_eq!(reader.next_token().unwrap(), Token::Literal(2.5));
        assert_eq!(reader.position(), 12);
        assert_eq!(reader.next_token().unwrap(), Token::AFetch(11));
        assert_eq!(reader.next_token().unwrap(), Token::Op(Opcode::Add));
        assert_eq!(reader.next_token().unwrap(), Token::Op(Opcode::EndStack));
    }

    #[test]
    fn test_bad_expression_header() {
        let buf = [BAD_EXPRESSION, Opcode::FetchA.byte(), Opcode::EndStack.byte()];
        assert_eq!(
            TokenReader::new(&buf).unwrap_err(),
            EvaluationError::BadExpression
        );
        assert_eq!(
            TokenReader::new(&[]).unwrap_err(),
            EvaluationError::TruncatedExpression { position: 0 }
        );
    }

    #[test]
    fn test_truncated_literal() {
        let buf = stream(&[Opcode::Literal.byte(), 0, 0, 0]);
        let mut reader = TokenReader::new(&buf).unwrap();
        assert_eq!(
            reader.next_token().unwrap_err(),
            EvaluationError::TruncatedExpression { position: 1 }
        );
    }

    #[test]
    fn test_unknown_opcode() {
        let buf = stream(&[200]);
        let mut reader = TokenReader::new(&buf).unwrap();
        assert_eq!(
            reader.next_token().unwrap_err(),
            EvaluationError::UnknownOpcode {
                byte: 200,
                position: 1
            }
        );
    }

    #[test]
    fn test_skip_ignores_operand_bytes() {
        // FETCH whose index byte equals COND_ELSE, then a literal whose payload
        // is full of COND_ELSE bytes, then the real marker
        let mut buf = stream(&[Opcode::Fetch.byte(), Opcode::CondElse.byte()]);
        buf.push(Opcode::Literal.byte());
        buf.extend_from_slice(&[Opcode::CondElse.byte(); 8]);
        buf.extend_from_slice(&[
            Opcode::Add.byte(),
            Opcode::CondElse.byte(),
            Opcode::FetchB.byte(),
            Opcode::CondEnd.byte(),
            Opcode::EndStack.byte(),
        ]);

        let mut reader = TokenReader::new(&buf).unwrap();
        reader.skip_branch(Opcode::CondElse, 0).unwrap();
        assert_eq!(reader.next_token().unwrap(), Token::Op(Opcode::FetchB));
    }

    #[test]
    fn test_skip_respects_nesting() {
        let buf = stream(&[
            Opcode::FetchA.byte(),
            Opcode::CondIf.byte(),
            Opcode::FetchB.byte(),
            Opcode::CondElse.byte(),
            Opcode::FetchC.byte(),
            Opcode::CondEnd.byte(),
            Opcode::CondElse.byte(),
            Opcode::FetchD.byte(),
            Opcode::CondEnd.byte(),
            Opcode::EndStack.byte(),
        ]);
        let mut reader = TokenReader::new(&buf).unwrap();
        reader.skip_branch(Opcode::CondElse, 0).unwrap();
        assert_eq!(reader.next_token().unwrap(), Token::Op(Opcode::FetchD));
    }

    #[test]
    fn test_skip_unbalanced() {
        let buf = stream(&[Opcode::FetchA.byte(), Opcode::EndStack.byte()]);
        let mut reader = TokenReader::new(&buf).unwrap();
        assert_eq!(
            reader.skip_branch(Opcode::CondElse, 5).unwrap_err(),
            EvaluationError::UnbalancedConditional { position: 5 }
        );
    }
}
