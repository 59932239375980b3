//! # Marker Library
//!
//! This crate provides the grading aggregator used by lecturers to mark student
//! submissions. It combines per-question AI-suggested scores and lecturer overrides into
//! a weighted grade, and drives the grading session from first draft to final submission.
//!
//! ## Key Concepts
//! - **GradingSession**: one lecturer's pass over one submission (override, regenerate, save, submit).
//! - **Effective score**: the lecturer score when set, otherwise the AI score.
//! - **Scorer**: weights effective scores by mark allocation and derives the letter grade.
//! - **Collaborators**: feedback generation, grade storage and student notification are
//!   traits so the REST client (or a test double) can plug in.

pub mod error;
pub mod feedback;
pub mod file_loader;
pub mod scorer;
pub mod session;
pub mod traits;
pub mod types;

pub use error::GradingError;
pub use session::{GradingSession, Phase};
pub use types::{GradeSummary, GradedAnswer, LetterGrade};
