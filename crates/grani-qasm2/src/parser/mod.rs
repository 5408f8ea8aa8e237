//! Parser for `OpenQASM` 2.0.
//!
//! Recursive descent with one-token lookahead; the first error aborts
//! the parse.

mod expression;
mod statement;

use crate::ast::Program;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{tokenize, Token};
use crate::source::Position;

/// Parse a QASM2 source string into an AST Program.
///
/// Lexical errors surface here as well, since the parser drives the
/// lexer. The result is structurally complete but not yet validated;
/// see [`crate::validate`].
pub fn parse(source: &str) -> ParseResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

/// Parser state.
pub(super) struct Parser {
    pub(super) tokens: Vec<(Token, Position)>,
    pub(super) pos: usize,
    eof: Position,
}

impl Parser {
    /// Create a new parser from source, failing on the first lexical error.
    fn new(source: &str) -> ParseResult<Self> {
        let mut tokens = Vec::new();

        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push((t.token, Position::at(source, t.span.start))),
                Err((span, error)) => {
                    let message = match error {
                        crate::lexer::LexError::UnexpectedCharacter => {
                            let snippet = source[span.clone()].chars().next().unwrap_or('?');
                            format!("unexpected character '{}'", snippet.escape_debug())
                        }
                        other => other.to_string(),
                    };
                    return Err(ParseError::Lexical {
                        position: Position::at(source, span.start),
                        message,
                    });
                }
            }
        }

        Ok(Self {
            tokens,
            pos: 0,
            eof: Position::end_of(source),
        })
    }

    /// Check if we've reached the end.
    pub(super) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Peek at the current token.
    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    /// Position of the current token, or of end-of-input.
    pub(super) fn position(&self) -> Position {
        self.tokens.get(self.pos).map_or(self.eof, |(_, p)| *p)
    }

    /// Advance and return the current token.
    pub(super) fn advance(&mut self) -> Option<Token> {
        if self.is_eof() {
            return None;
        }
        let token = self.tokens[self.pos].0.clone();
        self.pos += 1;
        Some(token)
    }

    /// Expect a specific token kind.
    #[allow(clippy::needless_pass_by_value)]
    pub(super) fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let position = self.position();
        let found = self.advance().ok_or_else(|| ParseError::UnexpectedEof {
            position,
            expected: expected.to_string(),
        })?;

        if std::mem::discriminant(&found) != std::mem::discriminant(&expected) {
            return Err(ParseError::UnexpectedToken {
                position,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    /// Check if the current token matches a kind.
    pub(super) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume the current token if it matches a kind.
    pub(super) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> ParseResult<Program> {
        if self.is_eof() {
            return Err(ParseError::MissingVersionHeader { position: self.eof });
        }

        self.expect(Token::OpenQasm)?;
        let version = self.parse_version()?;
        self.expect(Token::Semicolon)?;

        let mut statements = Vec::new();
        while !self.is_eof() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program {
            version,
            statements,
        })
    }

    /// Parse the version number; only 2.0 is accepted.
    fn parse_version(&mut self) -> ParseResult<String> {
        let position = self.position();
        match self.advance() {
            Some(Token::RealLiteral(v)) if (v - 2.0).abs() < 1e-9 => Ok("2.0".into()),
            Some(Token::RealLiteral(v)) => Err(ParseError::UnsupportedVersion {
                position,
                found: format!("{v}"),
            }),
            Some(Token::IntegerLiteral(v)) => Err(ParseError::UnsupportedVersion {
                position,
                found: format!("{v}"),
            }),
            Some(other) => Err(ParseError::UnexpectedToken {
                position,
                expected: "version number".into(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                position,
                expected: "version number".into(),
            }),
        }
    }

    /// Parse a comma-separated identifier list (at least one).
    pub(super) fn parse_identifier_list(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![self.parse_identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.parse_identifier()?);
        }
        Ok(ids)
    }

    /// Parse an identifier.
    pub(super) fn parse_identifier(&mut self) -> ParseResult<String> {
        let position = self.position();
        match self.advance() {
            Some(Token::Identifier(s)) => Ok(s),
            Some(other) => Err(ParseError::UnexpectedToken {
                position,
                expected: "identifier".into(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                position,
                expected: "identifier".into(),
            }),
        }
    }

    /// Parse an integer literal.
    pub(super) fn parse_int_literal(&mut self) -> ParseResult<u64> {
        let position = self.position();
        match self.advance() {
            Some(Token::IntegerLiteral(v)) => Ok(v),
            Some(other) => Err(ParseError::UnexpectedToken {
                position,
                expected: "integer".into(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                position,
                expected: "integer".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{RegKind, Statement};

    #[test]
    fn test_parse_version_only() {
        let program = parse("OPENQASM 2.0;").unwrap();
        assert_eq!(program.version, "2.0");
        assert!(program.statements.is_empty());
    }

    #[test]
    fn test_parse_bell_preparation() {
        let source = r"
            OPENQASM 2.0;
            qreg q[2];
            creg c[2];
            U(pi/2, 0, pi) q[0];
            CX q[0], q[1];
            measure q -> c;
            reset q;
        ";
        let program = parse(source).unwrap();
        assert_eq!(program.statements.len(), 6);
        assert!(matches!(
            program.statements[0],
            Statement::RegDecl {
                kind: RegKind::Quantum,
                size: 2,
                ..
            }
        ));
        assert!(matches!(program.statements[5], Statement::Reset { .. }));
    }

    #[test]
    fn test_parse_gate_declaration() {
        let source = r"
            OPENQASM 2.0;
            gate rz(phi) a { U(0, 0, phi) a; }
            gate cz a, b { CX a, b; }
        ";
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Statement::GateDecl(decl) => {
                assert_eq!(decl.name, "rz");
                assert_eq!(decl.params, vec!["phi"]);
                assert_eq!(decl.qubits, vec!["a"]);
                assert_eq!(decl.body.len(), 1);
            }
            other => panic!("expected gate declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_if_statement() {
        let source = "OPENQASM 2.0; qreg q[1]; creg c[1]; if (c == 1) U(0, 0, 0) q[0];";
        let program = parse(source).unwrap();
        match &program.statements[2] {
            Statement::If {
                register, value, ..
            } => {
                assert_eq!(register, "c");
                assert_eq!(*value, 1);
            }
            other => panic!("expected if statement, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_include() {
        let program = parse(r#"OPENQASM 2.0; include "qelib1.inc";"#).unwrap();
        assert!(matches!(
            &program.statements[0],
            Statement::Include { path, .. } if path == "qelib1.inc"
        ));
    }

    #[test]
    fn test_empty_input_is_missing_header() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, ParseError::MissingVersionHeader { .. }));
    }

    #[test]
    fn test_header_must_come_first() {
        let err = parse("qreg q[1]; OPENQASM 2.0;").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_unsupported_version() {
        let err = parse("OPENQASM 3.0;").unwrap_err();
        match err {
            ParseError::UnsupportedVersion { found, .. } => assert_eq!(found, "3"),
            other => panic!("expected version error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_semicolon() {
        let err = parse("OPENQASM 2.0; qreg q[2] creg c[2];").unwrap_err();
        match err {
            ParseError::UnexpectedToken {
                expected,
                found,
                position,
            } => {
                assert_eq!(expected, ";");
                assert_eq!(found, "creg");
                assert_eq!(position.line, 1);
                assert_eq!(position.column, 25);
            }
            other => panic!("expected token error, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_input() {
        let err = parse("OPENQASM 2.0; qreg q[").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_lex_error_forwarded() {
        let err = parse("OPENQASM 2.0; qreg q[2]; #").unwrap_err();
        match err {
            ParseError::Lexical { message, position } => {
                assert!(message.contains('#'));
                assert_eq!(position.column, 26);
            }
            other => panic!("expected lexical error, got {other:?}"),
        }
    }
}
