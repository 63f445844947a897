//! Source cursor and token lexer.
//!
//! # Responsibilities
//! - Track byte offset, line and column while scanning
//! - Tokenize declaration and expression code
//! - Hand raw scanning back to the template parser between expressions
//!
//! # Design Decisions
//! - One token of lookahead; the parser only switches to raw template
//!   scanning when no token is buffered
//! - Longest-match punctuation table, no regex

use std::fmt;

use serde_json::Number;

use crate::compiler::error::{CompileError, Span};

/// Character cursor over a source slice.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    origin: Span,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::at(src, Span::start())
    }

    /// A cursor whose positions continue from `origin`, for scanning a slice
    /// cut out of a larger source.
    pub fn at(src: &'a str, origin: Span) -> Self {
        Self {
            src,
            pos: 0,
            origin,
            line: origin.line,
            column: origin.column,
        }
    }

    pub fn span(&self) -> Span {
        Span {
            offset: self.origin.offset + self.pos,
            line: self.line,
            column: self.column,
        }
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume `literal` if the remaining input starts with it.
    pub fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            for _ in literal.chars() {
                self.bump();
            }
            true
        } else {
            false
        }
    }

    pub fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    pub fn skip_whitespace(&mut self) {
        self.eat_while(char::is_whitespace);
    }
}

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(Number),
    Str(String),
    Punct(&'static str),
    Eof,
}

impl Token {
    pub fn is_punct(&self, p: &str) -> bool {
        matches!(self, Token::Punct(q) if *q == p)
    }

    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, Token::Ident(n) if n == name)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "`{name}`"),
            Token::Number(n) => write!(f, "number {n}"),
            Token::Str(s) => write!(f, "string {s:?}"),
            Token::Punct(p) => write!(f, "`{p}`"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

const PUNCTUATION: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+", "-", "*", "/", "%", "<",
    ">", "!", "=", "(", ")", "[", "]", "{", "}", ",", ":", ".", "?", ";",
];

/// Token lexer with one token of lookahead.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    peeked: Option<Spanned>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::from_cursor(Cursor::new(src))
    }

    pub fn from_cursor(cursor: Cursor<'a>) -> Self {
        Self {
            cursor,
            peeked: None,
        }
    }

    /// Raw access for template scanning. Must not be called with a buffered token.
    pub fn cursor(&mut self) -> &mut Cursor<'a> {
        debug_assert!(self.peeked.is_none(), "raw scan with a buffered token");
        &mut self.cursor
    }

    pub fn peek(&mut self) -> Result<&Spanned, CompileError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lex()?,
        };
        Ok(self.peeked.insert(token))
    }

    pub fn next(&mut self) -> Result<Spanned, CompileError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lex(),
        }
    }

    /// Consume the next token if it is the punctuation `p`.
    pub fn eat_punct(&mut self, p: &str) -> Result<bool, CompileError> {
        if self.peek()?.token.is_punct(p) {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn expect_punct(&mut self, p: &'static str) -> Result<Span, CompileError> {
        let next = self.next()?;
        if next.token.is_punct(p) {
            Ok(next.span)
        } else {
            Err(CompileError::expected(format!("`{p}`"), next.token, next.span))
        }
    }

    pub fn expect_ident(&mut self, what: &str) -> Result<(String, Span), CompileError> {
        let next = self.next()?;
        match next.token {
            Token::Ident(name) => Ok((name, next.span)),
            other => Err(CompileError::expected(what, other, next.span)),
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.rest().starts_with("//") {
                self.cursor.eat_while(|c| c != '\n');
            } else if self.cursor.eat("/*") {
                while !self.cursor.is_eof() && !self.cursor.eat("*/") {
                    self.cursor.bump();
                }
            } else {
                return;
            }
        }
    }

    fn lex(&mut self) -> Result<Spanned, CompileError> {
        self.skip_trivia();
        let span = self.cursor.span();
        let Some(c) = self.cursor.peek() else {
            return Ok(Spanned {
                token: Token::Eof,
                span,
            });
        };

        let token = if is_ident_start(c) {
            Token::Ident(self.cursor.eat_while(is_ident_continue).to_string())
        } else if c.is_ascii_digit() {
            self.lex_number(span)?
        } else if c == '"' || c == '\'' {
            self.lex_string(c, span)?
        } else if let Some(p) = PUNCTUATION.iter().find(|p| self.cursor.rest().starts_with(**p)) {
            self.cursor.eat(p);
            Token::Punct(*p)
        } else {
            return Err(CompileError::UnexpectedChar { found: c, span });
        };
        Ok(Spanned { token, span })
    }

    fn lex_number(&mut self, span: Span) -> Result<Token, CompileError> {
        let mut text = self.cursor.eat_while(|c| c.is_ascii_digit()).to_string();
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.bump();
            text.push('.');
            text.push_str(self.cursor.eat_while(|c| c.is_ascii_digit()));
        }
        // integer literals that fit i64 stay exact
        if let Ok(int) = text.parse::<i64>() {
            return Ok(Token::Number(Number::from(int)));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Token::Number)
            .ok_or_else(|| CompileError::expected("number", &text, span))
    }

    fn lex_string(&mut self, quote: char, span: Span) -> Result<Token, CompileError> {
        self.cursor.bump();
        let mut out = String::new();
        loop {
            match self.cursor.bump() {
                None | Some('\n') => return Err(CompileError::UnterminatedString { span }),
                Some(c) if c == quote => return Ok(Token::Str(out)),
                Some('\\') => match self.cursor.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some(other) => out.push(other),
                    None => return Err(CompileError::UnterminatedString { span }),
                },
                Some(c) => out.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let next = lexer.next().unwrap();
            if next.token == Token::Eof {
                return out;
            }
            out.push(next.token);
        }
    }

    #[test]
    fn test_longest_punctuation_wins() {
        assert_eq!(
            tokens("a === b != c"),
            vec![
                Token::Ident("a".into()),
                Token::Punct("==="),
                Token::Ident("b".into()),
                Token::Punct("!="),
                Token::Ident("c".into()),
            ]
        );
    }

    #[test]
    fn test_strings_and_numbers() {
        assert_eq!(
            tokens(r#"'it\'s' "x" 4.25 7"#),
            vec![
                Token::Str("it's".into()),
                Token::Str("x".into()),
                Token::Number(Number::from_f64(4.25).unwrap()),
                Token::Number(Number::from(7)),
            ]
        );
    }

    #[test]
    fn test_large_integer_literals() {
        assert_eq!(
            tokens("9223372036854775807 100000000000000000000"),
            vec![
                Token::Number(Number::from(i64::MAX)),
                Token::Number(Number::from_f64(1e20).unwrap()),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            tokens("a // trailing\n /* block */ b"),
            vec![Token::Ident("a".into()), Token::Ident("b".into())]
        );
    }

    #[test]
    fn test_spans_track_lines() {
        let mut lexer = Lexer::new("a\n  b");
        lexer.next().unwrap();
        let b = lexer.next().unwrap();
        assert_eq!((b.span.line, b.span.column, b.span.offset), (2, 3, 4));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("'abc");
        assert!(matches!(
            lexer.next(),
            Err(CompileError::UnterminatedString { .. })
        ));
    }
}
