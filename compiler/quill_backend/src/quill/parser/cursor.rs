//! Token cursor for navigating the token stream.

use quill_ir::Span;

use crate::quill::lexer::{SpannedToken, Token};

/// Cursor over a token stream that always ends in [`Token::Eof`].
pub struct Cursor<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [SpannedToken]) -> Self {
        debug_assert!(matches!(
            tokens.last().map(|t| &t.token),
            Some(Token::Eof)
        ));
        Cursor { tokens, pos: 0 }
    }

    /// The current token; sticks at `Eof` once reached.
    pub fn current(&self) -> &'a SpannedToken {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    pub fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map_or(Span::DUMMY, |t| t.span)
    }

    pub fn at_eof(&self) -> bool {
        matches!(self.current().token, Token::Eof)
    }

    /// Check the current token's kind, ignoring payloads.
    pub fn check(&self, kind: &Token) -> bool {
        std::mem::discriminant(&self.current().token) == std::mem::discriminant(kind)
    }

    /// Consume the current token and return it.
    pub fn bump(&mut self) -> &'a SpannedToken {
        let token = self.current();
        if !self.at_eof() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: &Token) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }
}
