use std::fmt;

use tracing::trace;

use crate::error::Span;
use crate::token_type::TokenType::{self, *};

/// The `Scanner` walks the query text and hands out one `Token` per call to `next_token`.
/// Once the input is exhausted every further call returns an `End` token.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>, // iterator over chars of source
    start: usize, // byte index of the first char of the lexeme
    current: Option<(usize, char)>, // current char (byte index, char)
    next: Option<(usize, char)>, // next char (byte index, char)
}

impl<'a> Scanner<'a> {

    pub fn new(source: &'a str) -> Self {
        let mut chars = source.char_indices();
        let current = chars.next();
        let next = chars.clone().next();

        Scanner {
            source,
            chars,
            start: 0,
            current,
            next,
        }
    }

    /// Scans the next token. Lexing problems come back as `Error` tokens whose lexeme is the
    /// message, so the parser decides how to surface them.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.offset();

        let c = match self.advance() {
            Some(ch) => ch,
            None => return self.make_token(End, String::new()),
        };

        let token = match c {
            '(' => self.make_token(LeftParen, c.to_string()),
            ')' => self.make_token(RightParen, c.to_string()),
            '[' => self.make_token(LeftSquare, c.to_string()),
            ']' => self.make_token(RightSquare, c.to_string()),
            '{' => self.make_token(LeftCurly, c.to_string()),
            '}' => self.make_token(RightCurly, c.to_string()),
            ':' | '=' => self.make_token(Separator, c.to_string()),
            '^' => self.make_token(Caret, c.to_string()),
            '~' => self.make_token(Tilde, c.to_string()),
            '>' => self.match_and_make_token('=', GreaterEqual, Greater),
            '<' => self.match_and_make_token('=', LessEqual, Less),
            '"' => self.quoted(),
            '/' => self.regexp(),
            // a sign in front of a number is folded in by the parser, in value position only
            '+' => self.make_token(Plus, c.to_string()),
            '-' => self.make_token(Minus, c.to_string()),
            _ => self.bareword(c),
        };

        trace!(token = %token, "scanned");
        token
    }

    /// Reads a bareword starting with `first`, resolving backslash escapes.
    fn bareword(&mut self, first: char) -> Token {
        let mut text = String::new();
        let mut escaped = false;
        let mut wild = false;
        let mut c = first;

        loop {
            if c == '\\' {
                match self.advance() {
                    Some(ch) => {
                        text.push(ch);
                        escaped = true;
                    }
                    None => return self.error_token("dangling escape at end of input"),
                }
            } else {
                wild |= c == '*' || c == '?';
                text.push(c);
            }

            match self.peek() {
                Some(ch) if Self::is_term_char(ch) => {
                    self.advance();
                    c = ch;
                }
                _ => break,
            }
        }

        // reserved words are case sensitive and lose their meaning when escaped
        let variant = match text.as_str() {
            "AND" if !escaped => And,
            "OR" if !escaped => Or,
            "NOT" if !escaped => Not,
            "TO" if !escaped => To,
            _ => Literal,
        };

        let mut token = self.make_token(variant, text);
        token.wild = wild;
        token
    }

    /// Reads a double quoted string. The opening quote is already consumed.
    fn quoted(&mut self) -> Token {
        let mut text = String::new();
        while let Some(c) = self.advance() {
            match c {
                '"' => return self.make_token(Quoted, text),
                '\\' => match self.advance() {
                    Some(ch) => text.push(ch),
                    None => break,
                },
                _ => text.push(c),
            }
        }
        self.error_token("unterminated quoted string")
    }

    /// Reads a `/`-delimited regular expression verbatim. The opening slash is already
    /// consumed; escape sequences, including `\/`, are kept as written.
    fn regexp(&mut self) -> Token {
        let mut text = String::new();
        while let Some(c) = self.advance() {
            match c {
                '/' => return self.make_token(Regexp, text),
                '\\' => {
                    text.push(c);
                    match self.advance() {
                        Some(ch) => text.push(ch),
                        None => break,
                    }
                }
                _ => text.push(c),
            }
        }
        self.error_token("unterminated regular expression")
    }

    fn is_term_char(c: char) -> bool {
        !c.is_whitespace() && !matches!(c, ':' | '=' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | '^' | '~' | '<' | '>')
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn match_and_make_token(&mut self, expected: char, type1: TokenType, type2: TokenType) -> Token {
        let variant = if self.match_char(expected) { type1 } else { type2 };
        let lexeme = self.source[self.start..self.offset()].to_string();
        self.make_token(variant, lexeme)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            return true
        }
        false
    }

    /// Byte index of the current char, or the source length at the end.
    fn offset(&self) -> usize {
        self.current.map_or(self.source.len(), |(idx, _)| idx)
    }

    /// Return current char and advance to next.
    fn advance(&mut self) -> Option<char> {
        let c = self.current.map(|(_, c)| c);
        self.current = self.next; // advance current
        self.chars.next(); // advance iterator
        self.next = self.chars.clone().next(); // advance next
        c
    }

    /// Return current char without advancing.
    fn peek(&self) -> Option<char> {
        self.current.map(|(_, c)| c)
    }

    fn make_token(&self, variant: TokenType, lexeme: String) -> Token {
        Token {
            variant,
            lexeme,
            span: self.start..self.offset(),
            wild: false,
        }
    }

    fn error_token(&self, message: &str) -> Token {
        self.make_token(Error, message.to_string())
    }
}

/// Scans `source` to the end, including the final `End` token.
pub fn scan_all(source: &str) -> Vec<Token> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token();
        let done = token.variant == End;
        tokens.push(token);
        if done {
            return tokens
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub variant: TokenType,
    /// Decoded text: escapes resolved, quotes and slashes stripped.
    pub lexeme: String,
    pub span: Span,
    /// Bareword holds an unescaped `*` or `?`.
    pub wild: bool,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{} {}", self.variant, self.lexeme)
    }
}
