//! # Template Feedback Strategy
//!
//! A [`FeedbackGenerator`] that needs no backend. It keeps the previous AI score and
//! writes a short templated note based on the length of the answer. Used by the CLI
//! when running against a local grading sheet, and in tests.

use crate::error::GradingError;
use crate::traits::feedback::{FeedbackGenerator, FeedbackRequest};
use crate::types::AiSuggestion;
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct TemplateFeedback;

#[async_trait]
impl FeedbackGenerator for TemplateFeedback {
    async fn regenerate(&self, request: &FeedbackRequest) -> Result<AiSuggestion, GradingError> {
        let words = request.answer_text.split_whitespace().count();
        let feedback = if words == 0 {
            "No answer was provided for this question.".to_string()
        } else {
            format!(
                "Regenerated AI feedback with enhanced analysis: {words} words reviewed against a {} mark allocation.",
                request.max_marks
            )
        };

        Ok(AiSuggestion {
            score: request.previous_score.unwrap_or(0.0),
            feedback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use util::assignment::QuestionKey;

    fn request(text: &str, previous_score: Option<f64>) -> FeedbackRequest {
        FeedbackRequest {
            submission_id: "s1".into(),
            key: QuestionKey::question("q1"),
            answer_text: text.into(),
            max_marks: 20,
            previous_score,
        }
    }

    #[tokio::test]
    async fn keeps_previous_score() {
        let s = TemplateFeedback
            .regenerate(&request("Normalization removes redundancy", Some(85.0)))
            .await
            .unwrap();
        assert_eq!(s.score, 85.0);
        assert!(s.feedback.starts_with("Regenerated AI feedback"));
        assert!(s.feedback.contains("3 words"));
    }

    #[tokio::test]
    async fn empty_answer_gets_zero_and_a_note() {
        let s = TemplateFeedback.regenerate(&request("   ", None)).await.unwrap();
        assert_eq!(s.score, 0.0);
        assert_eq!(s.feedback, "No answer was provided for this question.");
    }
}
