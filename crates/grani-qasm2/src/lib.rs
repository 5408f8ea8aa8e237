//! `OpenQASM` 2.0 front-end for Grani
//!
//! This crate lexes, parses, and validates `OpenQASM` 2.0 source text.
//! It answers one question: is this input a well-formed program? There
//! is no execution, simulation, or code generation behind it.
//!
//! The pipeline is a single pass: the lexer produces spanned tokens,
//! the recursive-descent parser builds a [`syntax::Program`], and the
//! validator checks the static invariants the grammar cannot express
//! (declaration uniqueness, reference resolution, index bounds, call
//! arity, broadcast sizes). Each stage stops at its first error, and a
//! run surfaces at most one [`ParseError`].
//!
//! # Supported Language
//!
//! | Feature | Example |
//! |---------|---------|
//! | Version header | `OPENQASM 2.0;` |
//! | Include directives | `include "qelib1.inc";` |
//! | Register declarations | `qreg q[2];`, `creg c[2];` |
//! | Built-in gates | `U(pi/2, 0, pi) q[0];`, `CX q[0], q[1];` |
//! | User gate declarations | `gate rz(phi) a { U(0, 0, phi) a; }` |
//! | Measurement | `measure q -> c;` |
//! | Reset and barrier | `reset q;`, `barrier q;` |
//! | Conditionals | `if (c == 1) U(0, 0, pi) q[0];` |
//! | Comments | `// line`, `/* block */` |
//!
//! # Example
//!
//! ```rust
//! use grani_qasm2::check;
//!
//! let qasm = r#"
//!     OPENQASM 2.0;
//!     qreg q[2];
//!     creg c[2];
//!     U(pi/2, 0, pi) q[0];
//!     CX q[0], q[1];
//!     measure q -> c;
//! "#;
//!
//! let program = check(qasm).unwrap();
//! assert_eq!(program.version, "2.0");
//! ```
//!
//! # Example: Diagnostics
//!
//! ```rust
//! use grani_qasm2::{check, Stage};
//!
//! let err = check("OPENQASM 2.0; qreg q[2]; CX q[0], q[5];").unwrap_err();
//! assert_eq!(err.stage(), Stage::Semantic);
//! assert_eq!(err.position().line, 1);
//! ```

mod ast;
mod error;
mod lexer;
mod parser;
mod source;
mod validate;

pub use error::{ParseError, ParseResult, Stage};
pub use parser::parse;
pub use source::Position;
pub use validate::validate;

// Re-export AST types for callers that inspect programs
pub mod syntax {
    pub use crate::ast::*;
}

/// Parse and validate a QASM2 source string.
///
/// This is the whole front-end: the first lexical, syntax, or semantic
/// error aborts the run and comes back as the single diagnostic.
pub fn check(source: &str) -> ParseResult<syntax::Program> {
    let program = parse(source)?;
    validate(&program)?;
    Ok(program)
}
