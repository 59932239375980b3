use async_trait::async_trait;
use marker::GradingError;
use marker::traits::feedback::{FeedbackGenerator, FeedbackRequest};
use marker::traits::notifier::{GradeRecord, GradeStore, StudentNotifier};
use marker::types::AiSuggestion;

use crate::client::ApiClient;

#[async_trait]
impl FeedbackGenerator for ApiClient {
    async fn regenerate(&self, request: &FeedbackRequest) -> Result<AiSuggestion, GradingError> {
        Ok(self.post("/api/feedback/generate", request).await?)
    }
}

#[async_trait]
impl GradeStore for ApiClient {
    async fn save_grade(&self, record: &GradeRecord) -> Result<(), GradingError> {
        Ok(self
            .post_unit(&format!("/api/submissions/{}/grade", record.submission_id), record)
            .await?)
    }
}

#[async_trait]
impl StudentNotifier for ApiClient {
    async fn notify_grade_released(&self, record: &GradeRecord) -> Result<(), GradingError> {
        let body = serde_json::json!({
            "submissionId": record.submission_id,
            "studentId": record.student_id,
            "percentage": record.summary.percentage,
            "letter": record.summary.letter.as_str(),
        });
        Ok(self
            .post_unit("/api/notifications/grade-released", &body)
            .await?)
    }
}
