//! Static validation of parsed QASM2 programs.
//!
//! A single pass in document order checks what the grammar cannot:
//! duplicate declarations, unresolved references, literal index bounds,
//! call arity against gate signatures, and broadcast size agreement.
//! The first violation wins.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{Argument, Expression, GateCall, GateDecl, Program, RegKind, Statement};
use crate::error::{ParseError, ParseResult};

/// Arity of a gate: parameter count and qubit-operand count.
#[derive(Debug, Clone, Copy)]
struct GateSignature {
    params: usize,
    qubits: usize,
}

/// Signatures of the reserved built-in gates.
const BUILTIN_GATES: [(&str, GateSignature); 2] = [
    (
        "U",
        GateSignature {
            params: 3,
            qubits: 1,
        },
    ),
    (
        "CX",
        GateSignature {
            params: 0,
            qubits: 2,
        },
    ),
];

/// Validate a parsed program, stopping at the first violation.
pub fn validate(program: &Program) -> ParseResult<()> {
    Validator::new().run(program)
}

struct Validator {
    /// Declared registers: name -> (kind, size).
    regs: FxHashMap<String, (RegKind, u64)>,
    /// Known gates: the built-ins plus user declarations seen so far.
    gates: FxHashMap<String, GateSignature>,
}

impl Validator {
    fn new() -> Self {
        let gates = BUILTIN_GATES
            .iter()
            .map(|(name, signature)| ((*name).to_string(), *signature))
            .collect();
        Self {
            regs: FxHashMap::default(),
            gates,
        }
    }

    fn run(&mut self, program: &Program) -> ParseResult<()> {
        for statement in &program.statements {
            self.check_statement(statement)?;
        }
        Ok(())
    }

    fn check_statement(&mut self, statement: &Statement) -> ParseResult<()> {
        match statement {
            Statement::Include { .. } => Ok(()),

            Statement::RegDecl {
                kind,
                name,
                size,
                pos,
            } => {
                if self.regs.contains_key(name) {
                    return Err(ParseError::DuplicateDeclaration {
                        position: *pos,
                        name: name.clone(),
                    });
                }
                if *size == 0 {
                    return Err(ParseError::ZeroSizeRegister {
                        position: *pos,
                        name: name.clone(),
                    });
                }
                self.regs.insert(name.clone(), (*kind, *size));
                Ok(())
            }

            Statement::GateDecl(decl) => self.check_gate_decl(decl),

            Statement::Gate(call) => self.check_call(call),

            Statement::Measure { src, dst, pos } => {
                let src_width = self.resolve(src, RegKind::Quantum)?;
                let dst_width = self.resolve(dst, RegKind::Classical)?;
                if src_width != dst_width {
                    return Err(ParseError::BroadcastSizeMismatch {
                        position: *pos,
                        first: src_width,
                        second: dst_width,
                    });
                }
                Ok(())
            }

            Statement::Reset { arg, .. } => {
                self.resolve(arg, RegKind::Quantum)?;
                Ok(())
            }

            Statement::Barrier { args, .. } => {
                for arg in args {
                    self.resolve(arg, RegKind::Quantum)?;
                }
                Ok(())
            }

            Statement::If {
                register,
                call,
                pos,
                ..
            } => {
                match self.regs.get(register) {
                    None => {
                        return Err(ParseError::UndeclaredRegister {
                            position: *pos,
                            name: register.clone(),
                        });
                    }
                    Some((RegKind::Quantum, _)) => {
                        return Err(ParseError::WrongRegisterKind {
                            position: *pos,
                            register: register.clone(),
                            expected: RegKind::Classical,
                            found: RegKind::Quantum,
                        });
                    }
                    Some((RegKind::Classical, _)) => {}
                }
                self.check_call(call)
            }
        }
    }

    /// Check a user gate declaration and record its signature.
    ///
    /// The body is symbolic: operands must be the declared qubit
    /// parameters (never indexed) and expressions may only reference
    /// the declared formal parameters. Calls resolve against gates
    /// declared earlier, so recursion is rejected as an unknown gate.
    fn check_gate_decl(&mut self, decl: &GateDecl) -> ParseResult<()> {
        if self.gates.contains_key(&decl.name) {
            return Err(ParseError::DuplicateDeclaration {
                position: decl.pos,
                name: decl.name.clone(),
            });
        }

        let mut formals: FxHashSet<&str> = FxHashSet::default();
        for name in decl.params.iter().chain(decl.qubits.iter()) {
            if !formals.insert(name) {
                return Err(ParseError::DuplicateDeclaration {
                    position: decl.pos,
                    name: name.clone(),
                });
            }
        }

        for call in &decl.body {
            let signature = self.signature_of(call)?;
            self.check_arity(call, signature)?;

            for expr in &call.params {
                self.check_symbolic_expr(expr, &decl.params, call)?;
            }

            for arg in &call.args {
                if arg.index.is_some() {
                    return Err(ParseError::IndexedGateParameter {
                        position: arg.pos,
                        name: arg.register.clone(),
                    });
                }
                if !decl.qubits.contains(&arg.register) {
                    return Err(ParseError::UndeclaredRegister {
                        position: arg.pos,
                        name: arg.register.clone(),
                    });
                }
            }
        }

        self.gates.insert(
            decl.name.clone(),
            GateSignature {
                params: decl.params.len(),
                qubits: decl.qubits.len(),
            },
        );
        Ok(())
    }

    /// Check a top-level gate call against concrete registers.
    fn check_call(&mut self, call: &GateCall) -> ParseResult<()> {
        let signature = self.signature_of(call)?;
        self.check_arity(call, signature)?;

        // Top-level parameters must evaluate to a real number; any
        // identifier here has nothing to bind to.
        for expr in &call.params {
            if let Some(name) = expr.unresolved_ident(&|_| false) {
                return Err(ParseError::UnknownParameter {
                    position: call.pos,
                    name: name.to_string(),
                });
            }
        }

        // Whole-register operands broadcast and must agree on size;
        // indexed operands are scalar and exempt.
        let mut broadcast: Option<u64> = None;
        for arg in &call.args {
            let width = self.resolve(arg, RegKind::Quantum)?;
            if arg.index.is_none() {
                match broadcast {
                    None => broadcast = Some(width),
                    Some(first) if first != width => {
                        return Err(ParseError::BroadcastSizeMismatch {
                            position: arg.pos,
                            first,
                            second: width,
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    /// Look up the callee's signature.
    fn signature_of(&self, call: &GateCall) -> ParseResult<GateSignature> {
        self.gates
            .get(&call.name)
            .copied()
            .ok_or_else(|| ParseError::UnknownGate {
                position: call.pos,
                name: call.name.clone(),
            })
    }

    /// Check parameter and qubit-operand counts.
    fn check_arity(&self, call: &GateCall, signature: GateSignature) -> ParseResult<()> {
        if call.params.len() != signature.params {
            return Err(ParseError::WrongParameterCount {
                position: call.pos,
                gate: call.name.clone(),
                expected: signature.params,
                got: call.params.len(),
            });
        }
        if call.args.len() != signature.qubits {
            return Err(ParseError::WrongQubitCount {
                position: call.pos,
                gate: call.name.clone(),
                expected: signature.qubits,
                got: call.args.len(),
            });
        }
        Ok(())
    }

    /// Check that a gate-body expression only references declared formals.
    fn check_symbolic_expr(
        &self,
        expr: &Expression,
        params: &[String],
        call: &GateCall,
    ) -> ParseResult<()> {
        if let Some(name) = expr.unresolved_ident(&|id| params.iter().any(|p| p == id)) {
            return Err(ParseError::UnknownParameter {
                position: call.pos,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Resolve an argument to its register and return its operand width
    /// (register size for whole-register references, 1 for indexed).
    fn resolve(&self, arg: &Argument, expected: RegKind) -> ParseResult<u64> {
        let (kind, size) = self.regs.get(&arg.register).copied().ok_or_else(|| {
            ParseError::UndeclaredRegister {
                position: arg.pos,
                name: arg.register.clone(),
            }
        })?;

        if kind != expected {
            return Err(ParseError::WrongRegisterKind {
                position: arg.pos,
                register: arg.register.clone(),
                expected,
                found: kind,
            });
        }

        match arg.index {
            Some(index) => {
                if index >= size {
                    return Err(ParseError::IndexOutOfBounds {
                        position: arg.pos,
                        register: arg.register.clone(),
                        index,
                        size,
                    });
                }
                Ok(1)
            }
            None => Ok(size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn check_err(source: &str) -> ParseError {
        let program = parse(source).expect("program should parse");
        validate(&program).expect_err("expected a validation error")
    }

    fn check_ok(source: &str) {
        let program = parse(source).expect("program should parse");
        validate(&program).expect("program should validate");
    }

    #[test]
    fn test_valid_program() {
        check_ok(
            "OPENQASM 2.0; qreg q[2]; creg c[2]; \
             U(pi/2, 0, pi) q[0]; CX q[0], q[1]; measure q -> c; reset q;",
        );
    }

    #[test]
    fn test_duplicate_register() {
        let err = check_err("OPENQASM 2.0; qreg q[2]; creg q[2];");
        assert!(matches!(err, ParseError::DuplicateDeclaration { name, .. } if name == "q"));
    }

    #[test]
    fn test_zero_size_register() {
        let err = check_err("OPENQASM 2.0; qreg q[0];");
        assert!(matches!(err, ParseError::ZeroSizeRegister { .. }));
    }

    #[test]
    fn test_undeclared_register() {
        let err = check_err("OPENQASM 2.0; qreg q[1]; CX q[0], r[0];");
        assert!(matches!(err, ParseError::UndeclaredRegister { name, .. } if name == "r"));
    }

    #[test]
    fn test_unknown_gate() {
        let err = check_err("OPENQASM 2.0; qreg q[1]; H q[0];");
        match err {
            ParseError::UnknownGate { name, position } => {
                assert_eq!(name, "H");
                assert_eq!(position.column, 26);
            }
            other => panic!("expected unknown gate, got {other:?}"),
        }
    }

    #[test]
    fn test_index_out_of_bounds() {
        let err = check_err("OPENQASM 2.0; qreg q[2]; CX q[0], q[5];");
        match err {
            ParseError::IndexOutOfBounds {
                register,
                index,
                size,
                ..
            } => {
                assert_eq!(register, "q");
                assert_eq!(index, 5);
                assert_eq!(size, 2);
            }
            other => panic!("expected bounds error, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_parameter_count() {
        let err = check_err("OPENQASM 2.0; qreg q[1]; U(pi) q[0];");
        assert!(matches!(
            err,
            ParseError::WrongParameterCount {
                expected: 3,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_qubit_count() {
        let err = check_err("OPENQASM 2.0; qreg q[2]; CX q[0];");
        assert!(matches!(
            err,
            ParseError::WrongQubitCount {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_broadcast_size_mismatch() {
        let err = check_err("OPENQASM 2.0; qreg q[2]; qreg r[3]; CX q, r;");
        assert!(matches!(
            err,
            ParseError::BroadcastSizeMismatch {
                first: 2,
                second: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_broadcast_with_scalar_operand() {
        // A scalar operand does not constrain the broadcast width.
        check_ok("OPENQASM 2.0; qreg q[2]; qreg r[3]; CX q[1], r;");
    }

    #[test]
    fn test_measure_size_mismatch() {
        let err = check_err("OPENQASM 2.0; qreg q[2]; creg c[3]; measure q -> c;");
        assert!(matches!(err, ParseError::BroadcastSizeMismatch { .. }));
    }

    #[test]
    fn test_measure_kind_mismatch() {
        let err = check_err("OPENQASM 2.0; qreg q[2]; qreg r[2]; measure q -> r;");
        assert!(matches!(
            err,
            ParseError::WrongRegisterKind {
                expected: RegKind::Classical,
                ..
            }
        ));
    }

    #[test]
    fn test_reset_on_classical_register() {
        let err = check_err("OPENQASM 2.0; creg c[1]; reset c;");
        assert!(matches!(
            err,
            ParseError::WrongRegisterKind {
                expected: RegKind::Quantum,
                ..
            }
        ));
    }

    #[test]
    fn test_if_condition_must_be_classical() {
        let err = check_err("OPENQASM 2.0; qreg q[1]; if (q == 1) U(0, 0, 0) q[0];");
        assert!(matches!(err, ParseError::WrongRegisterKind { .. }));
    }

    #[test]
    fn test_if_checks_inner_call() {
        let err = check_err("OPENQASM 2.0; qreg q[1]; creg c[1]; if (c == 1) h q[0];");
        assert!(matches!(err, ParseError::UnknownGate { name, .. } if name == "h"));
    }

    #[test]
    fn test_user_gate_roundtrip() {
        check_ok(
            "OPENQASM 2.0; \
             gate rz(phi) a { U(0, 0, phi) a; } \
             qreg q[1]; rz(pi/4) q[0];",
        );
    }

    #[test]
    fn test_redeclared_builtin() {
        let err = check_err("OPENQASM 2.0; gate CX a, b { U(0, 0, 0) a; }");
        assert!(matches!(err, ParseError::DuplicateDeclaration { name, .. } if name == "CX"));
    }

    #[test]
    fn test_gate_body_unknown_parameter() {
        let err = check_err("OPENQASM 2.0; gate rz(phi) a { U(0, 0, theta) a; }");
        assert!(matches!(err, ParseError::UnknownParameter { name, .. } if name == "theta"));
    }

    #[test]
    fn test_gate_body_unknown_parameter_after_valid_one() {
        // A declared formal earlier in the expression must not mask an
        // undeclared name later in it.
        let err = check_err("OPENQASM 2.0; gate rz(phi) a { U(0, 0, phi + theta) a; }");
        assert!(matches!(err, ParseError::UnknownParameter { name, .. } if name == "theta"));
    }

    #[test]
    fn test_gate_body_indexed_parameter() {
        let err = check_err("OPENQASM 2.0; gate flip a { U(pi, 0, pi) a[0]; }");
        assert!(matches!(err, ParseError::IndexedGateParameter { name, .. } if name == "a"));
    }

    #[test]
    fn test_gate_body_unknown_operand() {
        let err = check_err("OPENQASM 2.0; gate flip a { U(pi, 0, pi) b; }");
        assert!(matches!(err, ParseError::UndeclaredRegister { name, .. } if name == "b"));
    }

    #[test]
    fn test_gate_recursion_rejected() {
        let err = check_err("OPENQASM 2.0; gate loop a { loop a; }");
        assert!(matches!(err, ParseError::UnknownGate { name, .. } if name == "loop"));
    }

    #[test]
    fn test_user_gate_call_arity() {
        let err = check_err(
            "OPENQASM 2.0; gate cz a, b { CX a, b; } qreg q[2]; cz q[0];",
        );
        assert!(matches!(err, ParseError::WrongQubitCount { .. }));
    }

    #[test]
    fn test_symbolic_parameter_invalid_at_top_level() {
        let err = check_err("OPENQASM 2.0; qreg q[1]; U(theta, 0, 0) q[0];");
        assert!(matches!(err, ParseError::UnknownParameter { name, .. } if name == "theta"));
    }
}
