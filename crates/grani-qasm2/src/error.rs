//! Error types for the QASM2 front-end.

use thiserror::Error;

use crate::ast::RegKind;
use crate::source::Position;

/// The pipeline stage that rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lex,
    Syntax,
    Semantic,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Lex => write!(f, "lex"),
            Stage::Syntax => write!(f, "syntax"),
            Stage::Semantic => write!(f, "semantic"),
        }
    }
}

/// Errors that can occur while checking a QASM2 program.
///
/// Every variant carries the position of the offending token or
/// construct; the first error aborts the run, so at most one of these
/// ever surfaces per input.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Malformed token.
    #[error("{message}")]
    Lexical { position: Position, message: String },

    /// Empty input, or input that does not start with a version header.
    #[error("missing version header")]
    MissingVersionHeader { position: Position },

    /// A version header naming anything other than 2.0.
    #[error("unsupported OPENQASM version '{found}'")]
    UnsupportedVersion { position: Position, found: String },

    /// Token stream does not match the grammar.
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        position: Position,
        expected: String,
        found: String,
    },

    /// Input ended mid-production.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { position: Position, expected: String },

    /// Register or gate name declared twice.
    #[error("duplicate declaration of '{name}'")]
    DuplicateDeclaration { position: Position, name: String },

    /// Register reference with no prior declaration.
    #[error("undeclared register '{name}'")]
    UndeclaredRegister { position: Position, name: String },

    /// Gate call naming neither a built-in nor a declared gate.
    #[error("unknown gate '{name}'")]
    UnknownGate { position: Position, name: String },

    /// Identifier in a parameter expression that is not a formal
    /// parameter of the enclosing gate declaration.
    #[error("unknown parameter '{name}'")]
    UnknownParameter { position: Position, name: String },

    /// Register declared with size zero.
    #[error("register '{name}' must have size at least 1")]
    ZeroSizeRegister { position: Position, name: String },

    /// Wrong number of parameter expressions in a gate call.
    #[error("gate '{gate}' expects {expected} parameters, got {got}")]
    WrongParameterCount {
        position: Position,
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Wrong number of qubit operands in a gate call.
    #[error("gate '{gate}' expects {expected} qubit operands, got {got}")]
    WrongQubitCount {
        position: Position,
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Literal index outside `[0, size)`.
    #[error("index {index} out of bounds for register '{register}' of size {size}")]
    IndexOutOfBounds {
        position: Position,
        register: String,
        index: u64,
        size: u64,
    },

    /// Whole-register operands of one statement disagree on size.
    #[error("mismatched register sizes in broadcast: {first} vs {second}")]
    BroadcastSizeMismatch {
        position: Position,
        first: u64,
        second: u64,
    },

    /// Quantum register where a classical one is required, or vice versa.
    #[error("expected a {expected} register, but '{register}' is {found}")]
    WrongRegisterKind {
        position: Position,
        register: String,
        expected: RegKind,
        found: RegKind,
    },

    /// Indexing applied to a gate's formal qubit parameter.
    #[error("gate parameter '{name}' cannot be indexed")]
    IndexedGateParameter { position: Position, name: String },
}

impl ParseError {
    /// The stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            ParseError::Lexical { .. } => Stage::Lex,
            ParseError::MissingVersionHeader { .. }
            | ParseError::UnsupportedVersion { .. }
            | ParseError::UnexpectedToken { .. }
            | ParseError::UnexpectedEof { .. } => Stage::Syntax,
            ParseError::DuplicateDeclaration { .. }
            | ParseError::UndeclaredRegister { .. }
            | ParseError::UnknownGate { .. }
            | ParseError::UnknownParameter { .. }
            | ParseError::ZeroSizeRegister { .. }
            | ParseError::WrongParameterCount { .. }
            | ParseError::WrongQubitCount { .. }
            | ParseError::IndexOutOfBounds { .. }
            | ParseError::BroadcastSizeMismatch { .. }
            | ParseError::WrongRegisterKind { .. }
            | ParseError::IndexedGateParameter { .. } => Stage::Semantic,
        }
    }

    /// The 1-based source position of the failure.
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lexical { position, .. }
            | ParseError::MissingVersionHeader { position }
            | ParseError::UnsupportedVersion { position, .. }
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEof { position, .. }
            | ParseError::DuplicateDeclaration { position, .. }
            | ParseError::UndeclaredRegister { position, .. }
            | ParseError::UnknownGate { position, .. }
            | ParseError::UnknownParameter { position, .. }
            | ParseError::ZeroSizeRegister { position, .. }
            | ParseError::WrongParameterCount { position, .. }
            | ParseError::WrongQubitCount { position, .. }
            | ParseError::IndexOutOfBounds { position, .. }
            | ParseError::BroadcastSizeMismatch { position, .. }
            | ParseError::WrongRegisterKind { position, .. }
            | ParseError::IndexedGateParameter { position, .. } => *position,
        }
    }

    /// Render the single-line diagnostic the reporter emits:
    /// `<stage> error at <line>:<column>: <message>`.
    pub fn diagnostic(&self) -> String {
        format!("{} error at {}: {}", self.stage(), self.position(), self)
    }
}

/// Result type for front-end operations.
pub type ParseResult<T> = Result<T, ParseError>;
