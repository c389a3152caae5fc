//! Lexer — converts source text into a stream of [`Token`]s.
//!
//! Whitespace is insignificant outside tokens. Note literals are lexed as
//! single tokens; they never collide with identifiers because pitch letters
//! are uppercase and identifiers start lowercase.

use crate::music::{Accidental, Time};

use super::error::MusicError;
use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        // A leading byte-order mark is tolerated and stripped.
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, MusicError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line: self.line,
                    col: self.col,
                });
                break;
            }

            let ch = self.peek();
            let token = match ch {
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                '{' => self.single_char(TokenKind::LBrace),
                '}' => self.single_char(TokenKind::RBrace),
                ';' => self.single_char(TokenKind::Semicolon),
                ',' => self.single_char(TokenKind::Comma),
                '*' => self.single_char(TokenKind::Star),
                '/' => self.single_char(TokenKind::Slash),
                '%' => self.single_char(TokenKind::Percent),
                '-' => self.single_char(TokenKind::Minus),
                '>' => self.single_char(TokenKind::Gt),
                '|' => self.single_char(TokenKind::Pipe),
                '+' => self.plus_or_concat(),
                '=' => self.eq_or_eqeq(),
                '!' => self.bang_or_bangeq(),
                '<' => self.lt_or_assign(),
                '0'..='9' => self.lex_number()?,
                'a'..='z' => self.lex_ident_or_keyword(),
                'R' => self.lex_rest()?,
                'A'..='G' => self.lex_note()?,
                _ => {
                    return Err(MusicError::syntax(
                        format!("unexpected character: '{ch}'"),
                        self.line,
                        self.col,
                    ));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        Token { kind, line, col }
    }

    fn two_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        self.advance();
        Token { kind, line, col }
    }

    fn plus_or_concat(&mut self) -> Token {
        if self.peek_next() == Some('+') {
            self.two_char(TokenKind::Concat)
        } else {
            self.single_char(TokenKind::Plus)
        }
    }

    fn eq_or_eqeq(&mut self) -> Token {
        if self.peek_next() == Some('=') {
            self.two_char(TokenKind::EqEq)
        } else {
            self.single_char(TokenKind::Eq)
        }
    }

    fn bang_or_bangeq(&mut self) -> Token {
        if self.peek_next() == Some('=') {
            self.two_char(TokenKind::BangEq)
        } else {
            self.single_char(TokenKind::Bang)
        }
    }

    fn lt_or_assign(&mut self) -> Token {
        if self.peek_next() == Some('-') {
            self.two_char(TokenKind::Assign)
        } else {
            self.single_char(TokenKind::Lt)
        }
    }

    fn lex_number(&mut self) -> Result<Token, MusicError> {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance());
        }
        let value: i64 = s
            .parse()
            .map_err(|_| MusicError::syntax(format!("number too large: {s}"), line, col))?;
        Ok(Token {
            kind: TokenKind::Number(value),
            line,
            col,
        })
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();
        while !self.is_at_end()
            && (self.peek().is_ascii_alphanumeric() || self.peek() == '_')
        {
            s.push(self.advance());
        }

        let kind = match s.as_str() {
            "var" => TokenKind::Var,
            "print" => TokenKind::Print,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "function" => TokenKind::Function,
            "procedure" => TokenKind::Procedure,
            "let" => TokenKind::Let,
            "in" => TokenKind::In,
            "return" => TokenKind::Return,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "head" => TokenKind::Head,
            "tail" => TokenKind::Tail,
            "is_empty" => TokenKind::IsEmpty,
            "pitch" => TokenKind::Pitch,
            "initialize" => TokenKind::Initialize,
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => TokenKind::Ident(s),
        };

        Token { kind, line, col }
    }

    fn lex_rest(&mut self) -> Result<Token, MusicError> {
        let line = self.line;
        let col = self.col;
        self.advance(); // consume 'R'
        let duration = self.lex_duration_suffix(line, col)?;
        Ok(Token {
            kind: TokenKind::Rest { duration },
            line,
            col,
        })
    }

    fn lex_note(&mut self) -> Result<Token, MusicError> {
        let line = self.line;
        let col = self.col;
        let letter = self.advance();

        let accidental = match self.chars.get(self.pos).copied() {
            Some('b') => {
                self.advance();
                if !self.is_at_end() && self.peek() == 'b' {
                    self.advance();
                    Accidental::DoubleFlat
                } else {
                    Accidental::Flat
                }
            }
            Some('d') => {
                self.advance();
                if !self.is_at_end() && self.peek() == 'd' {
                    self.advance();
                    Accidental::DoubleSharp
                } else {
                    Accidental::Sharp
                }
            }
            Some('n') => {
                self.advance();
                Accidental::Natural
            }
            _ => {
                return Err(MusicError::syntax(
                    format!("expected accidental (bb, b, n, d, dd) after pitch letter '{letter}'"),
                    line,
                    col,
                ));
            }
        };

        if self.is_at_end() || !self.peek().is_ascii_digit() {
            return Err(MusicError::syntax(
                format!("expected octave digit in note starting with '{letter}'"),
                line,
                col,
            ));
        }
        let octave = self.advance() as u8 - b'0';

        let duration = self.lex_duration_suffix(line, col)?;
        Ok(Token {
            kind: TokenKind::Note {
                letter,
                accidental,
                octave,
                duration,
            },
            line,
            col,
        })
    }

    /// Lex an optional `/DUR` suffix. The slash must follow immediately;
    /// a spaced `/` is the division operator.
    fn lex_duration_suffix(&mut self, line: usize, col: usize) -> Result<Option<Time>, MusicError> {
        if self.is_at_end() || self.peek() != '/' {
            return Ok(None);
        }
        self.advance(); // consume '/'

        let mut s = String::new();
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance());
        }
        if !self.is_at_end()
            && self.peek() == '.'
            && self.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            s.push(self.advance());
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance());
            }
        }

        match Time::parse_literal(&s) {
            Some(duration) => Ok(Some(duration)),
            None => Err(MusicError::syntax(
                format!("invalid duration: '/{s}'"),
                line,
                col,
            )),
        }
    }
}
