//! Error types for every phase of the pipeline.
//!
//! ## Error Hierarchy
//!
//! ```text
//! AstError          - decoding the JSON AST document
//! CompilationError  - desugaring passes and bytecode compilation
//! RuntimeError      - faults raised while stepping the interpreter
//! ```
//!
//! The session layer wraps all three in a single top-level error.

use thiserror::Error;

// ============================================================================
// AST Errors
// ============================================================================

/// Errors raised while reading an AST document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstError {
    /// A node kind outside the supported vocabulary.
    #[error("unsupported node kind '{kind}' at {path}")]
    UnsupportedNodeKind { kind: String, path: String },

    /// The document root is not a compilation unit.
    #[error("expected a CompilationUnit at the document root, found {found}")]
    NotACompilationUnit { found: String },

    /// Structurally invalid JSON for a supported node.
    #[error("malformed AST: {message}")]
    Malformed { message: String },
}

impl From<serde_json::Error> for AstError {
    fn from(err: serde_json::Error) -> Self {
        AstError::Malformed {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Errors raised by the desugaring passes and the bytecode compiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilationError {
    /// No enclosing scope declares the name.
    #[error("unresolved symbol '{name}' in {scope}")]
    UnresolvedSymbol { name: String, scope: String },

    /// An `extends` clause names a class that is never declared.
    #[error("class '{class}' extends unknown class '{superclass}'")]
    UnresolvedSuperclass { class: String, superclass: String },

    /// The `extends` relation contains a cycle.
    #[error("circular inheritance between {}", classes.join(", "))]
    CircularInheritance { classes: Vec<String> },

    /// Superclass resolution hit the configured round cap.
    #[error("superclass resolution did not converge within {rounds} rounds")]
    ResolutionLimitExceeded { rounds: usize },

    /// Two classes share one simple name.
    #[error("duplicate class '{name}'")]
    DuplicateClass { name: String },

    /// A known node kind in a position this pipeline cannot handle.
    #[error("unsupported node kind '{kind}' in {context}")]
    UnsupportedNodeKind { kind: String, context: String },

    /// An operator outside the executable set.
    #[error("unsupported operator '{operator}' in {context}")]
    UnsupportedOperator { operator: String, context: String },

    /// Assignment or increment target that is not a variable.
    #[error("'{kind}' is not assignable")]
    NotAnLvalue { kind: String },

    /// A numeric literal that cannot be represented.
    #[error("invalid number literal '{token}'")]
    InvalidNumberLiteral { token: String },

    /// `break` or `continue` outside any loop.
    #[error("'{statement}' outside of a loop")]
    BreakOutsideLoop { statement: &'static str },

    /// A jump targets a label that was never emitted.
    #[error("jump to undefined label '{label}'")]
    UndefinedLabel { label: String },

    /// Internal compiler error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CompilationError {
    pub fn unsupported(kind: impl Into<String>, context: impl Into<String>) -> Self {
        CompilationError::UnsupportedNodeKind {
            kind: kind.into(),
            context: context.into(),
        }
    }
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Faults raised while executing the instruction tape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// No active frame binds the name.
    #[error("unresolved symbol '{name}' at pc {pc}")]
    UnresolvedSymbol { name: String, pc: usize },

    /// An instruction needed more operands than the stack holds.
    #[error("operand stack underflow at pc {pc}")]
    StackUnderflow { pc: usize },

    /// Operand types do not fit the operator.
    #[error("at pc {pc}: cannot apply '{op}' to {operands}")]
    TypeMismatch {
        op: String,
        operands: String,
        pc: usize,
    },

    /// Integer division or remainder by zero.
    #[error("division by zero at pc {pc}")]
    DivisionByZero { pc: usize },

    /// A jump whose label has no address.
    #[error("jump to undefined label '{label}' at pc {pc}")]
    UndefinedLabel { label: String, pc: usize },

    /// The per-step instruction budget ran out before a yield point.
    #[error("step exceeded the budget of {limit} instructions")]
    StepBudgetExceeded { limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_inheritance_lists_members() {
        let err = CompilationError::CircularInheritance {
            classes: vec!["A".into(), "B".into()],
        };
        assert_eq!(err.to_string(), "circular inheritance between A, B");
    }

    #[test]
    fn serde_errors_become_malformed() {
        let err: AstError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        assert!(matches!(err, AstError::Malformed { .. }));
    }

    #[test]
    fn runtime_error_names_symbol() {
        let err = RuntimeError::UnresolvedSymbol {
            name: "y".into(),
            pc: 3,
        };
        assert_eq!(err.to_string(), "unresolved symbol 'y' at pc 3");
    }
}
