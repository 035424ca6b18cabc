//! Statement front end: logos lexer and recursive-descent parser.
//!
//! The parser materialises every node through the symbol table
//! constructors, one statement at a time, so the caller can bracket each
//! statement with a checkpoint and roll its temporaries back afterwards.

mod parser;
mod span;
mod token;

pub use parser::Parser;
pub use span::Span;
pub use token::Token;

use crate::error::{CompileError, Result};
use logos::Logos;

/// Tokenize source code
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(_) => {
                return Err(CompileError::lexer(
                    format!("unexpected character: {:?}", lexer.slice()),
                    span,
                ));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   ; only a comment").unwrap().is_empty());
    }

    #[test]
    fn test_keywords_ignore_case() {
        assert_eq!(
            kinds("IF x Then y ELSE z"),
            vec![
                Token::If,
                Token::Ident("x".into()),
                Token::Then,
                Token::Ident("y".into()),
                Token::Else,
                Token::Ident("z".into()),
            ]
        );
    }

    #[test]
    fn test_numbers_keep_their_text() {
        assert_eq!(
            kinds("300b 1.5D3 0x1F .25 2e-3 3i"),
            vec![
                Token::Number("300b".into()),
                Token::Number("1.5D3".into()),
                Token::Number("0x1F".into()),
                Token::Number(".25".into()),
                Token::Number("2e-3".into()),
                Token::Number("3i".into()),
            ]
        );
    }

    #[test]
    fn test_minus_after_number_is_an_operator() {
        assert_eq!(
            kinds("3-1"),
            vec![Token::Number("3".into()), Token::Minus, Token::Number("1".into())]
        );
    }

    #[test]
    fn test_names_and_globals() {
        assert_eq!(
            kinds("total.f $g !v #pi"),
            vec![
                Token::Ident("total.f".into()),
                Token::Ident("$g".into()),
                Token::Ident("!v".into()),
                Token::Ident("#pi".into()),
            ]
        );
    }

    #[test]
    fn test_strings_include_and_newlines() {
        assert_eq!(
            kinds("print, 'a b'\n@setup.lux"),
            vec![
                Token::Ident("print".into()),
                Token::Comma,
                Token::Str("a b".into()),
                Token::Newline,
                Token::Include("setup.lux".into()),
            ]
        );
    }

    #[test]
    fn test_word_and_symbol_comparisons() {
        assert_eq!(kinds("a eq b == c"), {
            vec![
                Token::Ident("a".into()),
                Token::Eq,
                Token::Ident("b".into()),
                Token::Eq,
                Token::Ident("c".into()),
            ]
        });
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("x = ~").unwrap_err();
        assert_eq!(err.span(), Some(Span::new(4, 5)));
    }
}
