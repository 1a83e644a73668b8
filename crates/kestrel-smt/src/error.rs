//! Error types for the incremental SMT layer
//!
//! Coverage gaps (constructs with no lowering yet) and solver-process
//! failures are error values; internal consistency violations such as sort
//! mismatches or unbalanced pops are panics, since they signal bugs in the
//! upstream components that produced the input.

use thiserror::Error;

/// Result type alias for SMT operations
pub type SmtResult<T> = std::result::Result<T, SmtError>;

/// Errors that can occur while lowering expressions and driving the solver
#[derive(Debug, Error)]
pub enum SmtError {
    /// A construct reachable from valid input has no lowering implemented.
    /// Distinct from ill-typed input, which panics.
    #[error("no lowering implemented for: {0}")]
    Unsupported(String),

    /// Struct types must flatten to at least one bit
    #[error("zero-width struct type cannot be encoded: {0}")]
    ZeroWidthStruct(String),

    /// Communication with the solver subprocess failed; fatal to the run
    #[error("solver process failure: {0}")]
    SolverProcess(String),

    /// The solver sent a response this client cannot interpret
    #[error("malformed solver response: {0}")]
    MalformedResponse(String),

    /// A model query was issued without a preceding satisfiable result
    #[error("model query issued without a satisfiable solver result")]
    NoModel,

    /// I/O failure on the solver pipe or dump file
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
