//! Collaborator traits the engines in this crate depend on.
//!
//! The REST client implements all of them; tests use in-memory doubles.

use async_trait::async_trait;
use util::assignment::QuestionKey;

use crate::analysis::AnswerAnalysis;
use crate::courses::{Course, CourseListing, Lecturer, NewCourse};
use crate::error::ServiceResult;
use crate::progress::{ProjectProgress, TaskProgress};
use crate::versioning::Version;

#[async_trait]
pub trait CourseBackend: Send + Sync {
    async fn list_courses(&self) -> ServiceResult<CourseListing>;
    async fn list_lecturers(&self) -> ServiceResult<Vec<Lecturer>>;
    async fn create_course(&self, input: &NewCourse) -> ServiceResult<Course>;
    async fn set_archived(&self, course_id: &str, archived: bool) -> ServiceResult<()>;
    async fn delete_course(&self, course_id: &str) -> ServiceResult<()>;
}

/// Server-reported progress of a project or task.
#[async_trait]
pub trait ProgressLookup: Send + Sync {
    async fn project_progress(&self, project_id: &str) -> ServiceResult<ProjectProgress>;
    async fn task_progress(&self, task_id: &str) -> ServiceResult<TaskProgress>;
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn save_project_progress(
        &self,
        project_id: &str,
        progress: &ProjectProgress,
    ) -> ServiceResult<()>;
    async fn save_task_progress(&self, task_id: &str, progress: &TaskProgress) -> ServiceResult<()>;
}

#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    async fn schedule_reminders(&self, project_id: &str) -> ServiceResult<()>;
}

/// Scores one answer for plagiarism and quality.
#[async_trait]
pub trait AnswerAnalyzer: Send + Sync {
    async fn analyze(&self, key: &QuestionKey, text: &str) -> ServiceResult<AnswerAnalysis>;
}

#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn save_version(&self, submission_id: &str, version: &Version) -> ServiceResult<()>;
    async fn submit_version(&self, submission_id: &str, number: u32) -> ServiceResult<()>;
}
