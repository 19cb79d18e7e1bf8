//! Token cursor with one token of lookahead.

use valet_diagnostic::ErrorCode;
use valet_ir::{Span, Token, TokenKind, TokenList};

use crate::ParseError;

/// Cursor over a `TokenList`. Reads past the end keep returning the
/// trailing `Eof` token, so the parser never needs an `Option` path.
pub struct TokenCursor<'t> {
    tokens: &'t TokenList,
    pos: usize,
    prev_span: Span,
}

impl<'t> TokenCursor<'t> {
    pub fn new(tokens: &'t TokenList) -> Self {
        TokenCursor {
            tokens,
            pos: 0,
            prev_span: Span::DUMMY,
        }
    }

    /// Current token (clamped to `Eof`).
    #[inline]
    pub fn current(&self) -> &Token {
        self.tokens.get(self.pos)
    }

    /// Kind of the current token.
    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Span of the current token.
    #[inline]
    pub fn span(&self) -> Span {
        self.current().span
    }

    /// Span of the most recently consumed token.
    #[inline]
    pub fn prev_span(&self) -> Span {
        self.prev_span
    }

    /// Current position, used by recovery loops to guarantee progress.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn at_eof(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> Token {
        let token = *self.current();
        if !matches!(token.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        self.prev_span = token.span;
        token
    }

    /// Check the current token kind without consuming.
    #[inline]
    pub fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Consume the current token if it matches `kind`.
    pub fn bump_if(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail with `code`.
    pub fn expect(&mut self, kind: TokenKind, code: ErrorCode) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                code,
                format!("expected {}, found {}", kind.describe(), self.kind().describe()),
                self.span(),
            ))
        }
    }
}
