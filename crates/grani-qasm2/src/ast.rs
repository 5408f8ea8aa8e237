//! Abstract Syntax Tree for `OpenQASM` 2.0.

use serde::{Deserialize, Serialize};

use crate::source::Position;

/// A complete QASM2 program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// QASM version from the header (always "2.0" once validated).
    pub version: String,
    /// Top-level items in document order.
    pub statements: Vec<Statement>,
}

/// A top-level statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    /// Include directive: `include "qelib1.inc";`. Recorded, not resolved.
    Include { path: String, pos: Position },

    /// Register declaration: `qreg q[2];` or `creg c[2];`.
    RegDecl {
        kind: RegKind,
        name: String,
        size: u64,
        pos: Position,
    },

    /// User gate declaration.
    GateDecl(GateDecl),

    /// Gate application.
    Gate(GateCall),

    /// Measurement: `measure q -> c;`.
    Measure {
        src: Argument,
        dst: Argument,
        pos: Position,
    },

    /// Reset: `reset q;`.
    Reset { arg: Argument, pos: Position },

    /// Barrier: `barrier q, r;`.
    Barrier { args: Vec<Argument>, pos: Position },

    /// Conditional gate call: `if (c == 1) x q[0];`.
    If {
        register: String,
        value: u64,
        call: GateCall,
        pos: Position,
    },
}

/// Register kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegKind {
    Quantum,
    Classical,
}

impl std::fmt::Display for RegKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegKind::Quantum => write!(f, "quantum"),
            RegKind::Classical => write!(f, "classical"),
        }
    }
}

/// A user gate declaration: a symbolic template over formal parameters
/// and qubit arguments, not yet bound to concrete registers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDecl {
    pub name: String,
    /// Formal parameter names, in order.
    pub params: Vec<String>,
    /// Formal qubit argument names, in order.
    pub qubits: Vec<String>,
    /// Body: gate calls over the formal names.
    pub body: Vec<GateCall>,
    pub pos: Position,
}

/// A gate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateCall {
    pub name: String,
    /// Parameter expressions (angles).
    pub params: Vec<Expression>,
    /// Qubit operands.
    pub args: Vec<Argument>,
    pub pos: Position,
}

/// A register reference: the whole register (`q`, broadcast) or one
/// element (`q[0]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argument {
    pub register: String,
    pub index: Option<u64>,
    pub pos: Position,
}

/// A parameter expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expression {
    /// Integer literal.
    Int(u64),
    /// Real literal.
    Real(f64),
    /// Pi constant.
    Pi,
    /// Reference to a formal gate parameter; only valid inside gate bodies.
    Ident(String),
    /// Negation.
    Neg(Box<Expression>),
    /// Binary operation.
    BinOp {
        left: Box<Expression>,
        op: BinOp,
        right: Box<Expression>,
    },
    /// Built-in function call: `sin(expr)` etc.
    Call { func: MathFn, arg: Box<Expression> },
}

impl Expression {
    /// Try to evaluate to a constant f64. Returns `None` when the
    /// expression references a formal parameter.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Expression::Int(v) => Some(*v as f64),
            Expression::Real(v) => Some(*v),
            Expression::Pi => Some(std::f64::consts::PI),
            Expression::Ident(_) => None,
            Expression::Neg(e) => e.as_f64().map(|v| -v),
            Expression::BinOp { left, op, right } => {
                let l = left.as_f64()?;
                let r = right.as_f64()?;
                Some(match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Pow => l.powf(r),
                })
            }
            Expression::Call { func, arg } => {
                let v = arg.as_f64()?;
                Some(match func {
                    MathFn::Sin => v.sin(),
                    MathFn::Cos => v.cos(),
                    MathFn::Tan => v.tan(),
                    MathFn::Exp => v.exp(),
                    MathFn::Ln => v.ln(),
                    MathFn::Sqrt => v.sqrt(),
                })
            }
        }
    }

    /// First identifier in the expression that `allowed` rejects,
    /// scanning left to right. Every identifier is visited, so a valid
    /// reference cannot mask an invalid one later in the expression.
    pub fn unresolved_ident(&self, allowed: &dyn Fn(&str) -> bool) -> Option<&str> {
        match self {
            Expression::Int(_) | Expression::Real(_) | Expression::Pi => None,
            Expression::Ident(name) => (!allowed(name)).then_some(name.as_str()),
            Expression::Neg(e) | Expression::Call { arg: e, .. } => e.unresolved_ident(allowed),
            Expression::BinOp { left, right, .. } => left
                .unresolved_ident(allowed)
                .or_else(|| right.unresolved_ident(allowed)),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Built-in unary functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathFn {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_expression_eval() {
        let expr = Expression::BinOp {
            left: Box::new(Expression::Pi),
            op: BinOp::Div,
            right: Box::new(Expression::Int(2)),
        };
        let result = expr.as_f64().unwrap();
        assert!((result - PI / 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_pow_eval() {
        let expr = Expression::BinOp {
            left: Box::new(Expression::Int(2)),
            op: BinOp::Pow,
            right: Box::new(Expression::Int(10)),
        };
        assert!((expr.as_f64().unwrap() - 1024.0).abs() < 1e-10);
    }

    #[test]
    fn test_function_eval() {
        let expr = Expression::Call {
            func: MathFn::Cos,
            arg: Box::new(Expression::Pi),
        };
        assert!((expr.as_f64().unwrap() + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_symbolic_expression() {
        let expr = Expression::BinOp {
            left: Box::new(Expression::Ident("theta".into())),
            op: BinOp::Div,
            right: Box::new(Expression::Int(2)),
        };
        assert_eq!(expr.as_f64(), None);
        assert_eq!(expr.unresolved_ident(&|_| false), Some("theta"));
        assert_eq!(expr.unresolved_ident(&|id| id == "theta"), None);
    }

    #[test]
    fn test_unresolved_ident_scans_whole_expression() {
        // phi + theta: an accepted left operand must not hide the right.
        let expr = Expression::BinOp {
            left: Box::new(Expression::Ident("phi".into())),
            op: BinOp::Add,
            right: Box::new(Expression::Ident("theta".into())),
        };
        assert_eq!(expr.unresolved_ident(&|id| id == "phi"), Some("theta"));
    }
}
