//! Compilation errors
//!
//! One taxonomy for the whole pipeline. Every kind carries a
//! human-readable message naming the offending construct; the CLI maps
//! kinds to process exit codes.

use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    /// Tokenizer failures (unexpected character, unterminated string).
    #[error("lexical error: {0}")]
    Lexical(String),

    /// Grammar violations and structural impossibilities.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Name-resolution failures: undeclared symbols, redefinitions,
    /// missing `main`.
    #[error("semantic error: {0}")]
    Semantic(String),

    /// Type, visibility, and derivability mismatches.
    #[error("incompatibility error: {0}")]
    Incompatibility(String),

    /// Internal invariant violations (generator found no offset for an
    /// alloca it owns, unlowerable IR shape). Never a user error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CompileError {
    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Lexical(_) => 11,
            CompileError::Syntax(_) => 12,
            CompileError::Incompatibility(_) => 13,
            CompileError::Semantic(_) => 14,
            CompileError::Internal(_) => 19,
        }
    }

    pub fn lexical(msg: impl Into<String>) -> Self {
        CompileError::Lexical(msg.into())
    }

    pub fn syntax(msg: impl Into<String>) -> Self {
        CompileError::Syntax(msg.into())
    }

    pub fn semantic(msg: impl Into<String>) -> Self {
        CompileError::Semantic(msg.into())
    }

    pub fn incompatibility(msg: impl Into<String>) -> Self {
        CompileError::Incompatibility(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        CompileError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CompileError::lexical("x").exit_code(), 11);
        assert_eq!(CompileError::syntax("x").exit_code(), 12);
        assert_eq!(CompileError::incompatibility("x").exit_code(), 13);
        assert_eq!(CompileError::semantic("x").exit_code(), 14);
        assert_eq!(CompileError::internal("x").exit_code(), 19);
    }

    #[test]
    fn test_display_prefixes() {
        let err = CompileError::semantic("Redefinition of foo");
        assert_eq!(err.to_string(), "semantic error: Redefinition of foo");
    }
}
