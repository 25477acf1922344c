//! Lexer for the VYP source language
//!
//! A logos-derived internal token enum converted to the public `Token`
//! stream with line/column tracking. The lexer is the only producer of
//! `CompileError::Lexical`.

use crate::token::{Span, Token};
use logos::Logos;
use vypc_ir::{CompileError, CompileResult};

#[derive(Logos, Debug, Clone, PartialEq)]
enum LogosToken {
    // Whitespace (skip)
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*", lex_block_comment)]
    BlockComment,

    // Keywords (must come before identifiers)
    #[token("class")]
    Class,

    #[token("else")]
    Else,

    #[token("float")]
    Float,

    #[token("if")]
    If,

    #[token("int")]
    Int,

    #[token("new")]
    New,

    #[token("private")]
    Private,

    #[token("protected")]
    Protected,

    #[token("public")]
    Public,

    #[token("return")]
    Return,

    #[token("string")]
    String,

    #[token("super")]
    Super,

    #[token("this")]
    This,

    #[token("void")]
    Void,

    #[token("while")]
    While,

    // Identifiers (must come after keywords)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"[0-9]+", parse_int)]
    IntLiteral(u64),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", parse_float)]
    FloatLiteral(f64),

    #[regex(r#""([^"\\\n]|\\.)*""#, parse_string)]
    StringLiteral(String),

    // Operators (2-char before 1-char)
    #[token("==")]
    EqualEqual,

    #[token("!=")]
    BangEqual,

    #[token("<=")]
    LessEqual,

    #[token(">=")]
    GreaterEqual,

    #[token("&&")]
    AmpAmp,

    #[token("||")]
    PipePipe,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("!")]
    Bang,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("=")]
    Equal,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,
}

fn lex_block_comment(lex: &mut logos::Lexer<LogosToken>) -> logos::FilterResult<(), ()> {
    // "/*" is consumed; find the closing "*/".
    let remainder = lex.remainder();
    match remainder.find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            logos::FilterResult::Skip
        }
        None => {
            lex.bump(remainder.len());
            logos::FilterResult::Error(())
        }
    }
}

fn parse_int(lex: &mut logos::Lexer<LogosToken>) -> Option<u64> {
    lex.slice().parse().ok()
}

fn parse_float(lex: &mut logos::Lexer<LogosToken>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn parse_string(lex: &mut logos::Lexer<LogosToken>) -> Option<String> {
    let s = lex.slice();
    let inner = &s[1..s.len() - 1];
    Some(unescape_string(inner))
}

fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some(c) => result.push(c),
                None => break,
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Tokenize a whole source file. The first lexical failure aborts; the
/// error message carries the offending position.
pub fn tokenize(source: &str) -> CompileResult<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = LogosToken::lexer(source);
    let mut line = 1u32;
    let mut column = 1u32;
    let mut last_end = 0;

    while let Some(token_result) = lexer.next() {
        let range = lexer.span();

        for c in source[last_end..range.start].chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        let span = Span::new(range.start, range.end, line, column);

        match token_result {
            Ok(logos_token) => {
                tokens.push((convert_token(logos_token), span));
            }
            Err(_) => {
                let text = &source[range.start..range.end];
                let message = if text.starts_with("/*") {
                    format!("{}:{}: unterminated block comment", line, column)
                } else if text.starts_with('"') {
                    format!("{}:{}: unterminated string literal", line, column)
                } else {
                    let c = text.chars().next().unwrap_or('\0');
                    format!("{}:{}: unexpected character '{}'", line, column, c)
                };
                return Err(CompileError::lexical(message));
            }
        }

        for c in source[range.start..range.end].chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        last_end = range.end;
    }

    let eof_span = Span::new(source.len(), source.len(), line, column);
    tokens.push((Token::Eof, eof_span));
    Ok(tokens)
}

fn convert_token(logos_token: LogosToken) -> Token {
    match logos_token {
        LogosToken::Class => Token::Class,
        LogosToken::Else => Token::Else,
        LogosToken::Float => Token::Float,
        LogosToken::If => Token::If,
        LogosToken::Int => Token::Int,
        LogosToken::New => Token::New,
        LogosToken::Private => Token::Private,
        LogosToken::Protected => Token::Protected,
        LogosToken::Public => Token::Public,
        LogosToken::Return => Token::Return,
        LogosToken::String => Token::String,
        LogosToken::Super => Token::Super,
        LogosToken::This => Token::This,
        LogosToken::Void => Token::Void,
        LogosToken::While => Token::While,
        LogosToken::Identifier(s) => Token::Identifier(s),
        LogosToken::IntLiteral(v) => Token::IntLiteral(v),
        LogosToken::FloatLiteral(v) => Token::FloatLiteral(v),
        LogosToken::StringLiteral(s) => Token::StringLiteral(s),
        LogosToken::EqualEqual => Token::EqualEqual,
        LogosToken::BangEqual => Token::BangEqual,
        LogosToken::LessEqual => Token::LessEqual,
        LogosToken::GreaterEqual => Token::GreaterEqual,
        LogosToken::AmpAmp => Token::AmpAmp,
        LogosToken::PipePipe => Token::PipePipe,
        LogosToken::Plus => Token::Plus,
        LogosToken::Minus => Token::Minus,
        LogosToken::Star => Token::Star,
        LogosToken::Slash => Token::Slash,
        LogosToken::Bang => Token::Bang,
        LogosToken::Less => Token::Less,
        LogosToken::Greater => Token::Greater,
        LogosToken::Equal => Token::Equal,
        LogosToken::Dot => Token::Dot,
        LogosToken::Comma => Token::Comma,
        LogosToken::Semicolon => Token::Semicolon,
        LogosToken::Colon => Token::Colon,
        LogosToken::LeftParen => Token::LeftParen,
        LogosToken::RightParen => Token::RightParen,
        LogosToken::LeftBrace => Token::LeftBrace,
        LogosToken::RightBrace => Token::RightBrace,
        LogosToken::Whitespace | LogosToken::LineComment | LogosToken::BlockComment => {
            unreachable!("whitespace and comments are skipped")
        }
    }
}
