//! Quill lexer, built on `logos`.

use std::fmt;

use logos::Logos;
use quill_ir::Span;

use super::{ErrorCode, Problem};

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[regex(r"//[^\n]*", logos::skip)]
    Comment,

    // Keywords
    #[token("import")]
    Import,
    #[token("pub")]
    Pub,
    #[token("type")]
    Type,
    #[token("new")]
    New,
    #[token("fn")]
    Fn,
    #[token("return")]
    Return,
    #[token("fail")]
    Fail,
    #[token("loop")]
    Loop,
    #[token("self")]
    SelfKw,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("none")]
    NoneKw,

    // Symbols
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Eq,
    #[token("+")]
    Plus,

    // Literals. Integers stay textual so the parser can report overflow.
    #[regex(r"[0-9]+", |lex| lex.slice().to_owned())]
    Int(String),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    /// A string that reaches end of line or input without its closing quote.
    #[regex(r#""([^"\\\n]|\\.)*"#)]
    UnterminatedStr,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),

    /// End of input; appended by [`tokenize`], never produced by logos.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Import => f.write_str("`import`"),
            Token::Pub => f.write_str("`pub`"),
            Token::Type => f.write_str("`type`"),
            Token::New => f.write_str("`new`"),
            Token::Fn => f.write_str("`fn`"),
            Token::Return => f.write_str("`return`"),
            Token::Fail => f.write_str("`fail`"),
            Token::Loop => f.write_str("`loop`"),
            Token::SelfKw => f.write_str("`self`"),
            Token::True => f.write_str("`true`"),
            Token::False => f.write_str("`false`"),
            Token::NoneKw => f.write_str("`none`"),
            Token::LBrace => f.write_str("`{`"),
            Token::RBrace => f.write_str("`}`"),
            Token::LParen => f.write_str("`(`"),
            Token::RParen => f.write_str("`)`"),
            Token::Semi => f.write_str("`;`"),
            Token::Comma => f.write_str("`,`"),
            Token::Dot => f.write_str("`.`"),
            Token::Eq => f.write_str("`=`"),
            Token::Plus => f.write_str("`+`"),
            Token::Int(text) => write!(f, "integer `{text}`"),
            Token::Str(_) | Token::UnterminatedStr => f.write_str("string literal"),
            Token::Ident(name) => write!(f, "identifier `{name}`"),
            Token::Comment => f.write_str("comment"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Tokenize source text.
///
/// Never fails: bad characters and unterminated strings become problems
/// and are dropped from the stream. The result always ends with [`Token::Eof`].
pub fn tokenize(source: &str) -> (Vec<SpannedToken>, Vec<Problem>) {
    let mut tokens = Vec::new();
    let mut problems = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::from_range(lexer.span());
        match result {
            Ok(Token::UnterminatedStr) => {
                problems.push(Problem::new(
                    ErrorCode::Q1002,
                    span,
                    "unterminated string literal",
                ));
            }
            Ok(token) => tokens.push(SpannedToken { token, span }),
            Err(()) => {
                problems.push(Problem::new(
                    ErrorCode::Q1001,
                    span,
                    format!("unexpected character `{}`", lexer.slice()),
                ));
            }
        }
    }

    let end = Span::from_range(source.len()..source.len());
    tokens.push(SpannedToken {
        token: Token::Eof,
        span: end,
    });
    (tokens, problems)
}

/// Strip quotes and resolve `\n`, `\t`, `\\` and `\"`.
///
/// Unknown escapes keep the escaped character.
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
