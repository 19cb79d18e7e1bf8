//! Lexer for Valet scripts.
//!
//! A pure function of the source text: produces a finite token sequence
//! (always terminated by `Eof`) plus any lex errors, each pinpointing
//! the offending character. Lex errors are fatal to compilation; the
//! lexer still scans to the end so a host can batch-report them.

mod cursor;
mod keywords;
mod lex_error;

pub use lex_error::{LexError, LexErrorKind};

use cursor::Cursor;
use valet_ir::{Span, StringInterner, Token, TokenKind, TokenList};

/// Lex a script into tokens.
pub fn lex(source: &str, interner: &StringInterner) -> (TokenList, Vec<LexError>) {
    let mut lexer = Lexer {
        cursor: Cursor::new(source),
        interner,
        tokens: TokenList::with_capacity(source.len()),
        errors: Vec::new(),
    };
    lexer.run();
    (lexer.tokens, lexer.errors)
}

struct Lexer<'src, 'i> {
    cursor: Cursor<'src>,
    interner: &'i StringInterner,
    tokens: TokenList,
    errors: Vec<LexError>,
}

impl Lexer<'_, '_> {
    fn run(&mut self) {
        loop {
            self.skip_trivia();
            let start = self.cursor.pos();
            let Some(c) = self.cursor.peek() else {
                self.tokens
                    .push(Token::new(TokenKind::Eof, Span::point(start)));
                return;
            };

            if c.is_ascii_alphabetic() || c == '_' {
                self.ident(start);
            } else if c.is_ascii_digit() {
                self.number(start);
            } else if c == '"' {
                self.string(start);
            } else {
                self.operator(start, c);
            }
        }
    }

    /// Skip whitespace and `#` line comments.
    fn skip_trivia(&mut self) {
        loop {
            self.cursor.bump_while(char::is_whitespace);
            if self.cursor.peek() == Some('#') {
                self.cursor.bump_while(|c| c != '\n');
            } else {
                return;
            }
        }
    }

    fn ident(&mut self, start: u32) {
        self.cursor
            .bump_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let end = self.cursor.pos();
        let text = self.cursor.slice(start, end);
        let kind = keywords::keyword(text)
            .unwrap_or_else(|| TokenKind::Ident(self.interner.intern(text)));
        self.push(kind, start, end);
    }

    fn number(&mut self, start: u32) {
        self.cursor.bump_while(|c| c.is_ascii_digit());

        let mut is_float = false;
        // Fractional part only when a digit follows the dot, so `a[0].f`
        // style chains never swallow the dot.
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.cursor.bump();
            self.cursor.bump_while(|c| c.is_ascii_digit());
        }
        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            let after_sign = match self.cursor.peek_second() {
                Some('+' | '-') => true,
                Some(c) if c.is_ascii_digit() => false,
                _ => {
                    // `12e` with nothing exponent-like after it: leave the
                    // `e` for the next token and let the parser complain.
                    let end = self.cursor.pos();
                    self.finish_number(start, end, is_float);
                    return;
                }
            };
            is_float = true;
            self.cursor.bump();
            if after_sign {
                self.cursor.bump();
            }
            let exp_start = self.cursor.pos();
            self.cursor.bump_while(|c| c.is_ascii_digit());
            if self.cursor.pos() == exp_start {
                let end = self.cursor.pos();
                self.error(LexErrorKind::InvalidNumber, start, end);
                self.push(TokenKind::Float(0f64.to_bits()), start, end);
                return;
            }
        }

        let end = self.cursor.pos();
        self.finish_number(start, end, is_float);
    }

    fn finish_number(&mut self, start: u32, end: u32, is_float: bool) {
        let text = self.cursor.slice(start, end);
        if is_float {
            match text.parse::<f64>() {
                Ok(value) => self.push(TokenKind::Float(value.to_bits()), start, end),
                Err(_) => {
                    self.error(LexErrorKind::InvalidNumber, start, end);
                    self.push(TokenKind::Float(0f64.to_bits()), start, end);
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => self.push(TokenKind::Int(value), start, end),
                Err(_) => {
                    self.error(LexErrorKind::InvalidNumber, start, end);
                    self.push(TokenKind::Int(0), start, end);
                }
            }
        }
    }

    fn string(&mut self, start: u32) {
        self.cursor.bump(); // opening quote
        let mut cooked = String::new();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    let end = self.cursor.pos();
                    self.error(LexErrorKind::UnterminatedString, start, end);
                    self.push(TokenKind::String(self.interner.intern(&cooked)), start, end);
                    return;
                }
                Some('"') => {
                    self.cursor.bump();
                    let end = self.cursor.pos();
                    self.push(TokenKind::String(self.interner.intern(&cooked)), start, end);
                    return;
                }
                Some('\\') => {
                    let esc_start = self.cursor.pos();
                    self.cursor.bump();
                    match self.cursor.bump() {
                        Some('n') => cooked.push('\n'),
                        Some('t') => cooked.push('\t'),
                        Some('r') => cooked.push('\r'),
                        Some('\\') => cooked.push('\\'),
                        Some('"') => cooked.push('"'),
                        Some('\'') => cooked.push('\''),
                        Some(other) => {
                            self.error(
                                LexErrorKind::InvalidEscape(other),
                                esc_start,
                                self.cursor.pos(),
                            );
                            cooked.push(other);
                        }
                        None => {
                            self.error(LexErrorKind::UnterminatedString, start, self.cursor.pos());
                            self.push(
                                TokenKind::String(self.interner.intern(&cooked)),
                                start,
                                self.cursor.pos(),
                            );
                            return;
                        }
                    }
                }
                Some(c) => {
                    cooked.push(c);
                    self.cursor.bump();
                }
            }
        }
    }

    fn operator(&mut self, start: u32, first: char) {
        self.cursor.bump();
        let kind = match first {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semi,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => {
                if self.cursor.bump_if('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.cursor.bump_if('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.cursor.bump_if('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.cursor.bump_if('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.cursor.bump_if('&') {
                    TokenKind::AmpAmp
                } else {
                    self.error(LexErrorKind::InvalidCharacter('&'), start, self.cursor.pos());
                    return;
                }
            }
            '|' => {
                if self.cursor.bump_if('|') {
                    TokenKind::PipePipe
                } else {
                    self.error(LexErrorKind::InvalidCharacter('|'), start, self.cursor.pos());
                    return;
                }
            }
            other => {
                self.error(
                    LexErrorKind::InvalidCharacter(other),
                    start,
                    self.cursor.pos(),
                );
                return;
            }
        };
        self.push(kind, start, self.cursor.pos());
    }

    fn push(&mut self, kind: TokenKind, start: u32, end: u32) {
        self.tokens.push(Token::new(kind, Span::new(start, end)));
    }

    fn error(&mut self, kind: LexErrorKind, start: u32, end: u32) {
        self.errors.push(LexError::new(kind, Span::new(start, end)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use valet_ir::SharedInterner;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let interner = SharedInterner::new();
        let (tokens, errors) = lex(source, &interner);
        assert_eq!(errors, vec![], "unexpected lex errors for {source:?}");
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_declaration() {
        let interner = SharedInterner::new();
        let (tokens, errors) = lex("int [5] arr;", &interner);
        assert!(errors.is_empty());
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident(interner.intern("int")),
                TokenKind::LBracket,
                TokenKind::Int(5),
                TokenKind::RBracket,
                TokenKind::Ident(interner.intern("arr")),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_keywords_and_operators() {
        let got = kinds("while (x <= 10) { x = x + 1; }");
        assert!(got.contains(&TokenKind::While));
        assert!(got.contains(&TokenKind::Le));
        assert!(got.contains(&TokenKind::Assign));
        assert_eq!(got.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn lex_string_escapes() {
        let interner = SharedInterner::new();
        let (tokens, errors) = lex(r#""a\tb\n\"q\"""#, &interner);
        assert!(errors.is_empty());
        let TokenKind::String(name) = tokens.get(0).kind else {
            panic!("expected string token");
        };
        assert_eq!(interner.lookup(name), "a\tb\n\"q\"");
    }

    #[test]
    fn lex_numbers() {
        assert_eq!(kinds("42")[0], TokenKind::Int(42));
        assert_eq!(kinds("3.25")[0], TokenKind::Float(3.25f64.to_bits()));
        assert_eq!(kinds("2.5e-3")[0], TokenKind::Float(2.5e-3f64.to_bits()));
        assert_eq!(kinds("1e6")[0], TokenKind::Float(1e6f64.to_bits()));
    }

    #[test]
    fn dot_after_int_is_not_a_float() {
        let interner = SharedInterner::new();
        let (tokens, errors) = lex("a[0].f", &interner);
        assert!(errors.is_empty());
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenKind::Dot));
    }

    #[test]
    fn comments_are_skipped() {
        let got = kinds("1 # the rest is commentary\n2");
        assert_eq!(got, vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_reports_position() {
        let interner = SharedInterner::new();
        let (_, errors) = lex("\"oops\nint x;", &interner);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::UnterminatedString);
        assert_eq!(errors[0].span.start, 0);
    }

    #[test]
    fn invalid_character_reported() {
        let interner = SharedInterner::new();
        let (_, errors) = lex("int x @ 5;", &interner);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::InvalidCharacter('@'));
    }

    #[test]
    fn lone_ampersand_is_an_error() {
        let interner = SharedInterner::new();
        let (_, errors) = lex("a & b", &interner);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::InvalidCharacter('&'));
    }

    #[test]
    fn int_overflow_is_invalid_number() {
        let interner = SharedInterner::new();
        let (_, errors) = lex("99999999999999999999", &interner);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::InvalidNumber);
    }

    #[test]
    fn every_stream_ends_in_eof() {
        for source in ["", "   ", "# only a comment", "x"] {
            let interner = SharedInterner::new();
            let (tokens, _) = lex(source, &interner);
            assert_eq!(tokens.get(tokens.len() - 1).kind, TokenKind::Eof);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The lexer is total: any input produces a token stream
            /// ending in Eof without panicking.
            #[test]
            fn lexing_never_panics(source in ".{0,256}") {
                let interner = SharedInterner::new();
                let (tokens, _) = lex(&source, &interner);
                prop_assert!(tokens.len() >= 1);
                prop_assert_eq!(tokens.get(tokens.len() - 1).kind, TokenKind::Eof);
            }

            /// Token spans are ordered and within the source.
            #[test]
            fn spans_are_monotonic(source in "[ -~]{0,128}") {
                let interner = SharedInterner::new();
                let (tokens, _) = lex(&source, &interner);
                let mut prev_start = 0u32;
                for token in &tokens {
                    prop_assert!(token.span.start >= prev_start);
                    prop_assert!(token.span.end as usize <= source.len());
                    prev_start = token.span.start;
                }
            }
        }
    }
}
