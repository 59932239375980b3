//!
//! Traits Module
//!
//! Collaborator traits the grading session talks to. Implementations live
//! outside this crate (the REST client) or in [`crate::feedback`].
//!
//! - [`feedback`]: regenerating AI feedback for a single question.
//! - [`notifier`]: persisting drafts and final grades, and notifying the student.

pub mod feedback;
pub mod notifier;
