//! Marker Error Types
//!
//! This module defines the [`GradingError`] enum, which covers every way a grading
//! session can refuse or fail an operation: unknown question keys, out-of-range
//! scores, lifecycle violations (overriding after submission, regenerating while an
//! override exists or a regeneration is already running), collaborator failures and
//! grading-sheet loading problems.
//!
//! # Example
//!
//! ```rust
//! use marker::error::GradingError;
//!
//! fn check(score: f64) -> Result<(), GradingError> {
//!     if !(0.0..=100.0).contains(&score) {
//!         return Err(GradingError::ScoreOutOfRange(score));
//!     }
//!     Ok(())
//! }
//! assert!(check(101.0).is_err());
//! ```

use thiserror::Error;

/// Represents all error types that can occur while grading a submission.
#[derive(Debug, Error)]
pub enum GradingError {
    /// The question key is not part of the assignment being graded.
    #[error("Unknown question: {0}")]
    UnknownQuestion(String),
    /// A score outside 0..=100 was supplied.
    #[error("Score must be between 0 and 100, got {0}")]
    ScoreOutOfRange(f64),
    /// Regeneration is blocked because the lecturer has overridden this key.
    #[error("Question {0} has a lecturer override; AI feedback cannot be regenerated")]
    OverrideExists(String),
    /// A regeneration for this key has not finished yet.
    #[error("AI feedback for {0} is already being regenerated")]
    RegenerationInFlight(String),
    /// The grade has been submitted; the session is read-only.
    #[error("Grade has already been submitted")]
    AlreadySubmitted,
    /// A collaborator (feedback generator, grade store, notifier) failed.
    #[error("{0}")]
    Collaborator(String),
    /// I/O error while reading a grading sheet.
    #[error("I/O error: {0}")]
    Io(String),
    /// The grading sheet is not valid JSON or does not match the schema.
    #[error("Invalid grading sheet: {0}")]
    InvalidSheet(String),
}
