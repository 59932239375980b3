//!
//! # Feedback Trait
//!
//! This module defines the [`FeedbackGenerator`] trait and the [`FeedbackRequest`] it
//! receives. A generator produces a fresh AI suggestion (score and feedback) for one
//! question of a submission, e.g. by calling the backend's feedback endpoint.
//!

use crate::error::GradingError;
use crate::types::AiSuggestion;
use async_trait::async_trait;
use serde::Serialize;
use util::assignment::QuestionKey;

/// Everything a generator needs to re-assess one answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRequest {
    pub submission_id: String,
    pub key: QuestionKey,
    pub answer_text: String,
    pub max_marks: u32,
    /// Score of the suggestion being replaced, if any.
    pub previous_score: Option<f64>,
}

/// A pluggable source of AI feedback.
///
/// # Returns
/// - `Ok(AiSuggestion)`: the replacement score and feedback.
/// - `Err(GradingError)`: if generation fails. The session then keeps the previous suggestion.
#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    async fn regenerate(&self, request: &FeedbackRequest) -> Result<AiSuggestion, GradingError>;
}
