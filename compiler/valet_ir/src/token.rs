//! Tokens for Valet scripts.

use std::fmt;

use crate::{Name, Span};

/// Token kinds for Valet.
///
/// Float literals store bits as u64 for Eq/Hash.
/// String/Ident use interned `Name` for O(1) equality.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum TokenKind {
    /// Integer literal: `42`
    Int(i64),
    /// Float literal: `3.14`, `2.5e-8` (stored as bits)
    Float(u64),
    /// String literal (interned, escapes already cooked): `"hello"`
    String(Name),
    /// Identifier (interned). Type names (`int`, record names) are plain
    /// identifiers; the parser resolves them against the type table.
    Ident(Name),

    // Keywords
    If,
    Else,
    While,
    Repeat,
    Until,
    Foreach,
    In,
    Break,
    Continue,
    Return,
    Record,
    True,
    False,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    Dot,

    // Operators
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    BangEq,
    Lt,
    Le,
    Gt,
    Ge,
    AmpAmp,
    PipePipe,
    Bang,

    /// End of input sentinel.
    Eof,
}

impl TokenKind {
    /// Short human-readable description for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Int(_) => "integer literal",
            TokenKind::Float(_) => "float literal",
            TokenKind::String(_) => "string literal",
            TokenKind::Ident(_) => "identifier",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::Repeat => "'repeat'",
            TokenKind::Until => "'until'",
            TokenKind::Foreach => "'foreach'",
            TokenKind::In => "'in'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::Return => "'return'",
            TokenKind::Record => "'record'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Semi => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Dot => "'.'",
            TokenKind::Assign => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::EqEq => "'=='",
            TokenKind::BangEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::PipePipe => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::Eof => "end of script",
        }
    }
}

impl fmt::Debug for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "Int({n})"),
            TokenKind::Float(bits) => write!(f, "Float({})", f64::from_bits(*bits)),
            TokenKind::String(name) => write!(f, "String({name:?})"),
            TokenKind::Ident(name) => write!(f, "Ident({name:?})"),
            other => f.write_str(other.describe()),
        }
    }
}

/// A token with its source span.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token.
    #[inline]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

/// Lexer output: a finite, ordered token sequence ending in `Eof`.
#[derive(Clone, Debug, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    /// Create an empty list (no `Eof` yet; the lexer appends it).
    pub fn new() -> Self {
        TokenList { tokens: Vec::new() }
    }

    /// Create with capacity estimated from source size.
    /// Heuristic: ~1 token per 4 bytes of source.
    pub fn with_capacity(source_len: usize) -> Self {
        TokenList {
            tokens: Vec::with_capacity(source_len / 4 + 1),
        }
    }

    /// Append a token.
    #[inline]
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Get the token at `index`, clamped to the trailing `Eof`.
    #[inline]
    pub fn get(&self, index: usize) -> &Token {
        let clamped = index.min(self.tokens.len().saturating_sub(1));
        &self.tokens[clamped]
    }

    /// Number of tokens including the trailing `Eof`.
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if no tokens have been pushed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate over the tokens.
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_clamps_to_eof() {
        let mut list = TokenList::new();
        list.push(Token::new(TokenKind::Int(1), Span::new(0, 1)));
        list.push(Token::new(TokenKind::Eof, Span::point(1)));
        assert_eq!(list.get(0).kind, TokenKind::Int(1));
        assert_eq!(list.get(99).kind, TokenKind::Eof);
    }

    #[test]
    fn describe_is_stable() {
        assert_eq!(TokenKind::Foreach.describe(), "'foreach'");
        assert_eq!(TokenKind::Ident(Name::EMPTY).describe(), "identifier");
    }
}
