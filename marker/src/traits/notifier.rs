use crate::error::GradingError;
use crate::types::{GradeSummary, GradedAnswer};
use async_trait::async_trait;
use serde::Serialize;

/// Whether a stored grade is still editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeStatus {
    Draft,
    Final,
}

/// Snapshot of a grading session as sent to the grade store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeRecord {
    pub submission_id: String,
    pub student_id: String,
    pub status: GradeStatus,
    pub summary: GradeSummary,
    pub answers: Vec<GradedAnswer>,
}

/// Persists grades on the backend.
#[async_trait]
pub trait GradeStore: Send + Sync {
    async fn save_grade(&self, record: &GradeRecord) -> Result<(), GradingError>;
}

/// Tells the student their grade has been released.
#[async_trait]
pub trait StudentNotifier: Send + Sync {
    async fn notify_grade_released(&self, record: &GradeRecord) -> Result<(), GradingError>;
}
