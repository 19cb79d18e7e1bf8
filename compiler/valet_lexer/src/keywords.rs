//! Keyword recognition.
//!
//! Type names (`int`, `string`, record names) are deliberately NOT
//! keywords: the parser resolves them against the type table, so user
//! records share the identifier namespace with primitives.

use valet_ir::TokenKind;

/// Map an identifier's text to its keyword token, if it is one.
pub fn keyword(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "repeat" => TokenKind::Repeat,
        "until" => TokenKind::Until,
        "foreach" => TokenKind::Foreach,
        "in" => TokenKind::In,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "return" => TokenKind::Return,
        "record" => TokenKind::Record,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_recognized() {
        assert_eq!(keyword("foreach"), Some(TokenKind::Foreach));
        assert_eq!(keyword("return"), Some(TokenKind::Return));
    }

    #[test]
    fn type_names_are_not_keywords() {
        assert_eq!(keyword("int"), None);
        assert_eq!(keyword("string"), None);
        assert_eq!(keyword("item"), None);
    }
}
