//! Token definitions

use logos::Logos;

/// LUX token
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r";[^\n]*")]
pub enum Token {
    // Keywords
    #[token("if", ignore(case))]
    If,
    #[token("then", ignore(case))]
    Then,
    #[token("else", ignore(case))]
    Else,
    #[token("for", ignore(case))]
    For,
    #[token("do", ignore(case))]
    Do,
    #[token("while", ignore(case))]
    While,
    #[token("repeat", ignore(case))]
    Repeat,
    #[token("until", ignore(case))]
    Until,
    #[token("begin", ignore(case))]
    Begin,
    #[token("end", ignore(case))]
    End,
    #[token("return", ignore(case))]
    Return,
    #[token("break", ignore(case))]
    Break,
    #[token("continue", ignore(case))]
    Continue,
    #[token("subr", ignore(case))]
    Subr,
    #[token("endsubr", ignore(case))]
    EndSubr,
    #[token("func", ignore(case))]
    Func,
    #[token("endfunc", ignore(case))]
    EndFunc,
    #[token("block", ignore(case))]
    Block,
    #[token("endblock", ignore(case))]
    EndBlock,
    #[token("run", ignore(case))]
    Run,

    // Comparison operators, word and symbol spellings
    #[token("eq", ignore(case))]
    #[token("==")]
    Eq,
    #[token("ne", ignore(case))]
    #[token("!=")]
    Ne,
    #[token("lt", ignore(case))]
    #[token("<")]
    Lt,
    #[token("le", ignore(case))]
    #[token("<=")]
    Le,
    #[token("gt", ignore(case))]
    #[token(">")]
    Gt,
    #[token("ge", ignore(case))]
    #[token(">=")]
    Ge,

    // Literals. Numbers keep their text for the literal grammar.
    #[regex(r"([0-9]|\.[0-9])([0-9a-zA-Z.]|[eEdD][+-][0-9])*", |lex| lex.slice().to_string())]
    Number(String),
    #[regex(r#""[^"\n]*""#, |lex| { let s = lex.slice(); s[1..s.len() - 1].to_string() })]
    #[regex(r"'[^'\n]*'", |lex| { let s = lex.slice(); s[1..s.len() - 1].to_string() })]
    Str(String),

    /// Names, optionally with one dotted suffix; `$`, `!` and `#` prefixes
    /// mark global names
    #[regex(r"([a-zA-Z_]|[$!#][a-zA-Z_])[a-zA-Z0-9_$]*(\.[a-zA-Z_][a-zA-Z0-9_]*)?", |lex| lex.slice().to_string())]
    Ident(String),

    /// `@file` compiles and runs another source file
    #[regex(r"@[^ \t\r\n;]+", |lex| lex.slice()[1..].to_string())]
    Include(String),

    // Punctuation
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("=")]
    Assign,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("\n")]
    Newline,
}

impl Token {
    /// Tokens that close a statement list
    pub fn is_block_end(&self) -> bool {
        matches!(
            self,
            Token::End | Token::EndSubr | Token::EndFunc | Token::EndBlock | Token::Until
        )
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "'{s}'"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Include(p) => write!(f, "@{p}"),
            Token::Newline => write!(f, "end of line"),
            other => write!(f, "{}", format!("{other:?}").to_lowercase()),
        }
    }
}
