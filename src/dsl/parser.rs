//! Parser — builds the typed AST from the token stream.
//!
//! Commands are parsed by recursive descent; expressions by precedence
//! climbing, highest to lowest binding: unary; `* / %`; `+ -`; `! ++ |`;
//! `== != < >`; `and or`. Ties break left-associatively.

use crate::music::{note, Time};

use super::ast::*;
use super::error::MusicError;
use super::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse a whole program: a command sequence covering every token.
    pub fn parse(&mut self) -> Result<CommandSeq, MusicError> {
        let seq = self.parse_command_seq()?;
        let t = self.peek();
        if t.kind != TokenKind::Eof {
            return Err(MusicError::syntax(
                format!("expected end of program, got {:?}", t.kind),
                t.line,
                t.col,
            ));
        }
        Ok(seq)
    }

    fn parse_command_seq(&mut self) -> Result<CommandSeq, MusicError> {
        let first = self.parse_command()?;
        let rest = if self.check(&TokenKind::Semicolon) {
            self.advance();
            Some(Box::new(self.parse_command_seq()?))
        } else {
            None
        };
        Ok(CommandSeq {
            first: Box::new(first),
            rest,
        })
    }

    fn parse_command(&mut self) -> Result<Command, MusicError> {
        let t = self.peek().clone();
        let pos = Pos {
            line: t.line,
            col: t.col,
        };
        match t.kind {
            TokenKind::Var => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(TokenKind::Eq)?;
                let expr = self.parse_expr()?;
                Ok(Command {
                    kind: CommandKind::VarDecl { name, expr },
                    pos,
                })
            }
            TokenKind::Print => {
                self.advance();
                let expr = self.parse_expr()?;
                Ok(Command {
                    kind: CommandKind::Print(expr),
                    pos,
                })
            }
            TokenKind::While => {
                self.advance();
                let cond = self.parse_expr()?;
                self.expect(TokenKind::Do)?;
                self.expect(TokenKind::LBrace)?;
                let body = self.parse_command_seq()?;
                self.expect(TokenKind::RBrace)?;
                Ok(Command {
                    kind: CommandKind::While { cond, body },
                    pos,
                })
            }
            TokenKind::If => {
                self.advance();
                let cond = self.parse_expr()?;
                self.expect(TokenKind::Then)?;
                self.expect(TokenKind::LBrace)?;
                let then_branch = self.parse_command_seq()?;
                self.expect(TokenKind::RBrace)?;
                self.expect(TokenKind::Else)?;
                self.expect(TokenKind::LBrace)?;
                let else_branch = self.parse_command_seq()?;
                self.expect(TokenKind::RBrace)?;
                Ok(Command {
                    kind: CommandKind::If {
                        cond,
                        then_branch,
                        else_branch,
                    },
                    pos,
                })
            }
            TokenKind::Function => {
                self.advance();
                let name = self.expect_ident()?;
                let params = self.parse_params()?;
                self.expect(TokenKind::Eq)?;
                let body = self.parse_expr()?;
                Ok(Command {
                    kind: CommandKind::FunDecl { name, params, body },
                    pos,
                })
            }
            TokenKind::Procedure => {
                self.advance();
                let name = self.expect_ident()?;
                let params = self.parse_params()?;
                self.expect(TokenKind::Eq)?;
                self.expect(TokenKind::LBrace)?;
                let body = self.parse_command_seq()?;
                self.expect(TokenKind::Return)?;
                let return_expr = self.parse_expr()?;
                self.expect(TokenKind::RBrace)?;
                Ok(Command {
                    kind: CommandKind::ProcDecl {
                        name,
                        params,
                        body,
                        return_expr,
                    },
                    pos,
                })
            }
            TokenKind::Ident(name) => {
                self.advance();
                self.expect(TokenKind::Assign)?;
                let expr = self.parse_expr()?;
                Ok(Command {
                    kind: CommandKind::Assign { name, expr },
                    pos,
                })
            }
            _ => Err(MusicError::syntax(
                format!("expected a command, got {:?}", t.kind),
                t.line,
                t.col,
            )),
        }
    }

    /// Parse a parenthesized parameter list: `(` IDENT ("," IDENT)* `)`.
    fn parse_params(&mut self) -> Result<Vec<String>, MusicError> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            params.push(self.expect_ident()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                params.push(self.expect_ident()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    pub fn parse_expr(&mut self) -> Result<Expr, MusicError> {
        self.parse_logic()
    }

    fn parse_logic(&mut self) -> Result<Expr, MusicError> {
        self.parse_binary_level(
            |k| match k {
                TokenKind::And => Some("and"),
                TokenKind::Or => Some("or"),
                _ => None,
            },
            Self::parse_comparison,
        )
    }

    fn parse_comparison(&mut self) -> Result<Expr, MusicError> {
        self.parse_binary_level(
            |k| match k {
                TokenKind::EqEq => Some("=="),
                TokenKind::BangEq => Some("!="),
                TokenKind::Lt => Some("<"),
                TokenKind::Gt => Some(">"),
                _ => None,
            },
            Self::parse_music,
        )
    }

    fn parse_music(&mut self) -> Result<Expr, MusicError> {
        self.parse_binary_level(
            |k| match k {
                TokenKind::Bang => Some("!"),
                TokenKind::Concat => Some("++"),
                TokenKind::Pipe => Some("|"),
                _ => None,
            },
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<Expr, MusicError> {
        self.parse_binary_level(
            |k| match k {
                TokenKind::Plus => Some("+"),
                TokenKind::Minus => Some("-"),
                _ => None,
            },
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, MusicError> {
        self.parse_binary_level(
            |k| match k {
                TokenKind::Star => Some("*"),
                TokenKind::Slash => Some("/"),
                TokenKind::Percent => Some("%"),
                _ => None,
            },
            Self::parse_unary,
        )
    }

    /// One left-associative precedence tier: fold `operand (OP operand)*`.
    fn parse_binary_level(
        &mut self,
        op_at_level: fn(&TokenKind) -> Option<&'static str>,
        next_level: fn(&mut Self) -> Result<Expr, MusicError>,
    ) -> Result<Expr, MusicError> {
        let mut lhs = next_level(self)?;
        while let Some(op) = op_at_level(&self.peek().kind) {
            let t = self.advance();
            let pos = Pos {
                line: t.line,
                col: t.col,
            };
            let rhs = next_level(self)?;
            lhs = Expr {
                kind: ExprKind::Apply {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                pos,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, MusicError> {
        let op = match self.peek().kind {
            TokenKind::Not => Some("not"),
            TokenKind::Head => Some("head"),
            TokenKind::Tail => Some("tail"),
            TokenKind::IsEmpty => Some("is_empty"),
            TokenKind::Pitch => Some("pitch"),
            TokenKind::Initialize => Some("initialize"),
            _ => None,
        };
        match op {
            Some(op) => {
                let t = self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr {
                    kind: ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    pos: Pos {
                        line: t.line,
                        col: t.col,
                    },
                })
            }
            None => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, MusicError> {
        let t = self.peek().clone();
        let pos = Pos {
            line: t.line,
            col: t.col,
        };
        match t.kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Number(value),
                    pos,
                })
            }
            TokenKind::Bool(value) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Bool(value),
                    pos,
                })
            }
            TokenKind::Note {
                letter,
                accidental,
                octave,
                duration,
            } => {
                self.advance();
                // Pitch spelling is range-checked at build time.
                if note::midi_number(letter, accidental, octave).is_none() {
                    return Err(MusicError::semantic(
                        format!(
                            "pitch {letter}{}{octave} is outside the MIDI range [0, 127]",
                            accidental.symbol()
                        ),
                        t.line,
                        t.col,
                    ));
                }
                Ok(Expr {
                    kind: ExprKind::Note {
                        letter,
                        accidental,
                        octave,
                        duration: duration.unwrap_or(Time::ONE),
                    },
                    pos,
                })
            }
            TokenKind::Rest { duration } => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Rest {
                        duration: duration.unwrap_or(Time::ONE),
                    },
                    pos,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Let => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(TokenKind::Eq)?;
                let bound = self.parse_expr()?;
                self.expect(TokenKind::In)?;
                let body = self.parse_expr()?;
                Ok(Expr {
                    kind: ExprKind::Let {
                        name,
                        bound: Box::new(bound),
                        body: Box::new(body),
                    },
                    pos,
                })
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    Ok(Expr {
                        kind: ExprKind::Call { name, args },
                        pos,
                    })
                } else {
                    Ok(Expr {
                        kind: ExprKind::Var(name),
                        pos,
                    })
                }
            }
            _ => Err(MusicError::syntax(
                format!("expected an expression, got {:?}", t.kind),
                t.line,
                t.col,
            )),
        }
    }

    /// Parse a parenthesized argument list: `(` expr ("," expr)* `)`.
    fn parse_args(&mut self) -> Result<Vec<Expr>, MusicError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            args.push(self.parse_expr()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, MusicError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let t = self.peek();
            Err(MusicError::syntax(
                format!("expected {:?}, got {:?}", kind, t.kind),
                t.line,
                t.col,
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, MusicError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(MusicError::syntax(
                format!("expected an identifier, got {:?}", t.kind),
                t.line,
                t.col,
            )),
        }
    }
}
