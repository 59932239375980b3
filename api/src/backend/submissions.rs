use async_trait::async_trait;
use services::ServiceResult;
use services::analysis::AnswerAnalysis;
use services::plagiarism::FlaggedSubmission;
use services::traits::{AnswerAnalyzer, VersionStore};
use services::versioning::Version;
use util::assignment::QuestionKey;

use crate::client::ApiClient;
use crate::error::ApiError;

impl ApiClient {
    /// Submissions the integrity checker has flagged for lecturer review.
    pub async fn flagged_submissions(&self) -> Result<Vec<FlaggedSubmission>, ApiError> {
        self.get("/api/integrity/checks/flagged", &[]).await
    }
}

#[async_trait]
impl AnswerAnalyzer for ApiClient {
    async fn analyze(&self, key: &QuestionKey, text: &str) -> ServiceResult<AnswerAnalysis> {
        let body = serde_json::json!({ "questionKey": key.to_string(), "text": text });
        Ok(self.post("/api/integrity/checks", &body).await?)
    }
}

#[async_trait]
impl VersionStore for ApiClient {
    async fn save_version(&self, submission_id: &str, version: &Version) -> ServiceResult<()> {
        Ok(self
            .post_unit(&format!("/api/versions/submission/{submission_id}"), version)
            .await?)
    }

    async fn submit_version(&self, submission_id: &str, number: u32) -> ServiceResult<()> {
        let body = serde_json::json!({ "version": number });
        Ok(self
            .post_unit(&format!("/api/submissions/{submission_id}/submit"), &body)
            .await?)
    }
}
