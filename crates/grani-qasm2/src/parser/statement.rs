//! Statement parsing for QASM2.

use super::Parser;
use crate::ast::{Argument, GateCall, GateDecl, RegKind, Statement};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse one top-level statement.
    pub(super) fn parse_statement(&mut self) -> ParseResult<Statement> {
        let position = self.position();
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof {
                position,
                expected: "statement".into(),
            })?;

        match token {
            Token::Include => self.parse_include(),
            Token::QReg => self.parse_reg_decl(RegKind::Quantum),
            Token::CReg => self.parse_reg_decl(RegKind::Classical),
            Token::Gate => self.parse_gate_decl(),
            Token::Measure => self.parse_measure(),
            Token::Reset => self.parse_reset(),
            Token::Barrier => self.parse_barrier(),
            Token::If => self.parse_if(),
            Token::Identifier(_) | Token::GateU | Token::GateCX => {
                let call = self.parse_gate_call()?;
                self.expect(Token::Semicolon)?;
                Ok(Statement::Gate(call))
            }
            _ => Err(ParseError::UnexpectedToken {
                position,
                expected: "statement".into(),
                found: token.to_string(),
            }),
        }
    }

    /// Parse an include directive. The named file is recorded but never
    /// opened: one invocation checks exactly one input.
    fn parse_include(&mut self) -> ParseResult<Statement> {
        let pos = self.position();
        self.expect(Token::Include)?;

        let path_pos = self.position();
        let path = match self.advance() {
            Some(Token::StringLiteral(s)) => s,
            Some(other) => {
                return Err(ParseError::UnexpectedToken {
                    position: path_pos,
                    expected: "string literal".into(),
                    found: other.to_string(),
                });
            }
            None => {
                return Err(ParseError::UnexpectedEof {
                    position: path_pos,
                    expected: "string literal".into(),
                });
            }
        };
        self.expect(Token::Semicolon)?;

        Ok(Statement::Include { path, pos })
    }

    /// Parse `qreg name[size];` or `creg name[size];`.
    fn parse_reg_decl(&mut self, kind: RegKind) -> ParseResult<Statement> {
        let pos = self.position();
        self.advance(); // qreg / creg

        let name = self.parse_identifier()?;
        self.expect(Token::LBracket)?;
        let size = self.parse_int_literal()?;
        self.expect(Token::RBracket)?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::RegDecl {
            kind,
            name,
            size,
            pos,
        })
    }

    /// Parse a gate declaration:
    /// `gate name [( params )] qubits { gate calls }`.
    fn parse_gate_decl(&mut self) -> ParseResult<Statement> {
        let pos = self.position();
        self.expect(Token::Gate)?;
        let name = self.parse_identifier()?;

        let params = if self.consume(&Token::LParen) {
            let p = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.parse_identifier_list()?
            };
            self.expect(Token::RParen)?;
            p
        } else {
            vec![]
        };

        let qubits = self.parse_identifier_list()?;

        self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&Token::RBrace) {
            body.push(self.parse_gate_body_call()?);
        }
        self.expect(Token::RBrace)?;

        Ok(Statement::GateDecl(GateDecl {
            name,
            params,
            qubits,
            body,
            pos,
        }))
    }

    /// Parse one gate call inside a gate body.
    fn parse_gate_body_call(&mut self) -> ParseResult<GateCall> {
        let position = self.position();
        match self.peek() {
            Some(Token::Identifier(_) | Token::GateU | Token::GateCX) => {
                let call = self.parse_gate_call()?;
                self.expect(Token::Semicolon)?;
                Ok(call)
            }
            Some(other) => Err(ParseError::UnexpectedToken {
                position,
                expected: "gate call".into(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                position,
                expected: "gate call".into(),
            }),
        }
    }

    /// Parse `measure arg -> arg;`.
    fn parse_measure(&mut self) -> ParseResult<Statement> {
        let pos = self.position();
        self.expect(Token::Measure)?;
        let src = self.parse_argument()?;
        self.expect(Token::Arrow)?;
        let dst = self.parse_argument()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Measure { src, dst, pos })
    }

    /// Parse `reset arg;`.
    fn parse_reset(&mut self) -> ParseResult<Statement> {
        let pos = self.position();
        self.expect(Token::Reset)?;
        let arg = self.parse_argument()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Reset { arg, pos })
    }

    /// Parse `barrier arg, ...;` (at least one operand).
    fn parse_barrier(&mut self) -> ParseResult<Statement> {
        let pos = self.position();
        self.expect(Token::Barrier)?;
        let args = self.parse_argument_list()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Barrier { args, pos })
    }

    /// Parse `if (creg == int) gate_call;`.
    fn parse_if(&mut self) -> ParseResult<Statement> {
        let pos = self.position();
        self.expect(Token::If)?;
        self.expect(Token::LParen)?;
        let register = self.parse_identifier()?;
        self.expect(Token::EqEq)?;
        let value = self.parse_int_literal()?;
        self.expect(Token::RParen)?;
        let call = self.parse_gate_call()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::If {
            register,
            value,
            call,
            pos,
        })
    }

    /// Parse a gate call without its trailing semicolon:
    /// `name [( exprs )] arg, ...`.
    ///
    /// Undeclared names parse fine here; resolution is the validator's
    /// job, so `h q[0];` is a structurally valid call.
    fn parse_gate_call(&mut self) -> ParseResult<GateCall> {
        let pos = self.position();
        let name = match self.advance() {
            Some(Token::Identifier(s)) => s,
            Some(Token::GateU) => "U".into(),
            Some(Token::GateCX) => "CX".into(),
            Some(other) => {
                return Err(ParseError::UnexpectedToken {
                    position: pos,
                    expected: "gate name".into(),
                    found: other.to_string(),
                });
            }
            None => {
                return Err(ParseError::UnexpectedEof {
                    position: pos,
                    expected: "gate name".into(),
                });
            }
        };

        let params = if self.consume(&Token::LParen) {
            let p = self.parse_expression_list()?;
            self.expect(Token::RParen)?;
            p
        } else {
            vec![]
        };

        let args = self.parse_argument_list()?;

        Ok(GateCall {
            name,
            params,
            args,
            pos,
        })
    }

    /// Parse a comma-separated argument list (at least one).
    fn parse_argument_list(&mut self) -> ParseResult<Vec<Argument>> {
        let mut args = vec![self.parse_argument()?];
        while self.consume(&Token::Comma) {
            args.push(self.parse_argument()?);
        }
        Ok(args)
    }

    /// Parse a register reference: `name` or `name[index]`.
    ///
    /// An identifier followed by `[` is always an indexed reference;
    /// there is no other bracket syntax at this point in the grammar.
    fn parse_argument(&mut self) -> ParseResult<Argument> {
        let pos = self.position();
        let register = self.parse_identifier()?;

        let index = if self.consume(&Token::LBracket) {
            let index = self.parse_int_literal()?;
            self.expect(Token::RBracket)?;
            Some(index)
        } else {
            None
        };

        Ok(Argument {
            register,
            index,
            pos,
        })
    }
}
