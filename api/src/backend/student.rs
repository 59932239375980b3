use async_trait::async_trait;
use serde::Deserialize;
use services::ServiceResult;
use services::progress::{ProjectProgress, TaskProgress};
use services::projects::{Project, Task};
use services::traits::{ProgressLookup, ProgressStore, ReminderScheduler};

use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Deserialize)]
struct ProjectsData {
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Deserialize)]
struct TasksData {
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct ProgressData<P> {
    progress: P,
}

impl ApiClient {
    /// Projects visible to the signed-in student, across all courses.
    pub async fn projects(&self) -> Result<Vec<Project>, ApiError> {
        let data: ProjectsData = self.get("/api/projects-and-tasks/student/projects", &[]).await?;
        Ok(data.projects)
    }

    pub async fn tasks(&self) -> Result<Vec<Task>, ApiError> {
        let data: TasksData = self.get("/api/projects-and-tasks/student/tasks", &[]).await?;
        Ok(data.tasks)
    }
}

#[async_trait]
impl ProgressLookup for ApiClient {
    async fn project_progress(&self, project_id: &str) -> ServiceResult<ProjectProgress> {
        let data: ProgressData<ProjectProgress> = self
            .get(
                "/api/projects-and-tasks/student/project-progress",
                &[("projectId", project_id)],
            )
            .await?;
        Ok(data.progress)
    }

    async fn task_progress(&self, task_id: &str) -> ServiceResult<TaskProgress> {
        let data: ProgressData<TaskProgress> = self
            .get(
                "/api/projects-and-tasks/student/task-progress",
                &[("taskId", task_id)],
            )
            .await?;
        Ok(data.progress)
    }
}

#[async_trait]
impl ProgressStore for ApiClient {
    async fn save_project_progress(
        &self,
        project_id: &str,
        progress: &ProjectProgress,
    ) -> ServiceResult<()> {
        let body = serde_json::json!({
            "projectId": project_id,
            "status": progress.status,
            "mainTasks": progress.main_tasks,
        });
        Ok(self
            .post_unit("/api/projects-and-tasks/student/project-progress", &body)
            .await?)
    }

    async fn save_task_progress(&self, task_id: &str, progress: &TaskProgress) -> ServiceResult<()> {
        let body = serde_json::json!({
            "taskId": task_id,
            "status": progress.status,
            "subtasks": progress.subtasks,
        });
        Ok(self
            .post_unit("/api/projects-and-tasks/student/task-progress", &body)
            .await?)
    }
}

#[async_trait]
impl ReminderScheduler for ApiClient {
    async fn schedule_reminders(&self, project_id: &str) -> ServiceResult<()> {
        let body = serde_json::json!({ "projectId": project_id });
        Ok(self
            .post_unit("/api/projects-and-tasks/notifications/scheduled-reminders", &body)
            .await?)
    }
}
