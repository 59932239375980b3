//! # Feedback Strategies Module
//!
//! Offline implementations of [`crate::traits::feedback::FeedbackGenerator`]. The
//! networked generator lives with the REST client.
//!
//! - [`template_feedback`]: keeps the previous score and writes a templated note.

pub mod template_feedback;
