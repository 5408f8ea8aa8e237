//! Expression parsing for QASM2 gate parameters.

use super::Parser;
use crate::ast::{BinOp, Expression, MathFn};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a parameter expression.
    pub(super) fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_expr(0)
    }

    /// Parse a binary expression with precedence climbing.
    /// `^` is right-associative, everything else left-associative.
    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<Expression> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance(); // consume operator

            let next_min = if op == BinOp::Pow { prec } else { prec + 1 };
            let right = self.parse_binary_expr(next_min)?;
            left = Expression::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse a unary expression.
    fn parse_unary_expr(&mut self) -> ParseResult<Expression> {
        if self.consume(&Token::Minus) {
            let expr = self.parse_unary_expr()?;
            return Ok(Expression::Neg(Box::new(expr)));
        }
        self.parse_primary_expr()
    }

    /// Parse a primary expression.
    fn parse_primary_expr(&mut self) -> ParseResult<Expression> {
        let position = self.position();
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof {
                position,
                expected: "expression".into(),
            })?;

        match token {
            Token::IntegerLiteral(v) => {
                self.advance();
                Ok(Expression::Int(v))
            }
            Token::RealLiteral(v) => {
                self.advance();
                Ok(Expression::Real(v))
            }
            Token::Pi => {
                self.advance();
                Ok(Expression::Pi)
            }
            Token::Identifier(name) => {
                self.advance();
                Ok(Expression::Ident(name))
            }
            Token::Sin | Token::Cos | Token::Tan | Token::Exp | Token::Ln | Token::Sqrt => {
                self.advance();
                let func = match token {
                    Token::Sin => MathFn::Sin,
                    Token::Cos => MathFn::Cos,
                    Token::Tan => MathFn::Tan,
                    Token::Exp => MathFn::Exp,
                    Token::Ln => MathFn::Ln,
                    _ => MathFn::Sqrt,
                };
                self.expect(Token::LParen)?;
                let arg = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(Expression::Call {
                    func,
                    arg: Box::new(arg),
                })
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            _ => Err(ParseError::UnexpectedToken {
                position,
                expected: "expression".into(),
                found: token.to_string(),
            }),
        }
    }

    /// Peek at a binary operator.
    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Caret => Some(BinOp::Pow),
            _ => None,
        }
    }

    /// Parse a comma-separated expression list (possibly empty).
    pub(super) fn parse_expression_list(&mut self) -> ParseResult<Vec<Expression>> {
        if self.check(&Token::RParen) {
            return Ok(vec![]);
        }
        let mut exprs = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }
}

/// Operator precedence.
fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => 1,
        BinOp::Mul | BinOp::Div => 2,
        BinOp::Pow => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;
    use crate::parser::parse;
    use std::f64::consts::PI;

    fn first_param(source: &str) -> Expression {
        let program = parse(source).unwrap();
        match &program.statements[1] {
            Statement::Gate(call) => call.params[0].clone(),
            other => panic!("expected gate call, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        let expr = first_param("OPENQASM 2.0; qreg q[1]; U(1 + 2 * 3, 0, 0) q;");
        assert!((expr.as_f64().unwrap() - 7.0).abs() < 1e-10);
    }

    #[test]
    fn test_power_is_right_associative() {
        // 2 ^ 3 ^ 2 = 2 ^ 9 = 512
        let expr = first_param("OPENQASM 2.0; qreg q[1]; U(2 ^ 3 ^ 2, 0, 0) q;");
        assert!((expr.as_f64().unwrap() - 512.0).abs() < 1e-10);
    }

    #[test]
    fn test_unary_minus() {
        let expr = first_param("OPENQASM 2.0; qreg q[1]; U(-pi / 2, 0, 0) q;");
        assert!((expr.as_f64().unwrap() + PI / 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_function_call() {
        let expr = first_param("OPENQASM 2.0; qreg q[1]; U(sin(pi / 2), 0, 0) q;");
        assert!((expr.as_f64().unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_parenthesized() {
        let expr = first_param("OPENQASM 2.0; qreg q[1]; U((1 + 2) * 3, 0, 0) q;");
        assert!((expr.as_f64().unwrap() - 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_function_requires_parens() {
        let err = parse("OPENQASM 2.0; qreg q[1]; U(sin pi, 0, 0) q;").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }
}
