use async_trait::async_trait;
use serde::Deserialize;
use services::ServiceResult;
use services::courses::{Course, CourseListing, Lecturer, NewCourse};
use services::traits::CourseBackend;

use crate::client::ApiClient;

#[derive(Deserialize)]
struct LecturersData {
    #[serde(default)]
    lecturers: Vec<Lecturer>,
}

#[derive(Deserialize)]
struct CourseData {
    course: Course,
}

#[async_trait]
impl CourseBackend for ApiClient {
    async fn list_courses(&self) -> ServiceResult<CourseListing> {
        Ok(self.get("/api/admin/courses", &[]).await?)
    }

    async fn list_lecturers(&self) -> ServiceResult<Vec<Lecturer>> {
        let data: LecturersData = self.get("/api/admin/lecturers/list", &[]).await?;
        Ok(data.lecturers)
    }

    async fn create_course(&self, input: &NewCourse) -> ServiceResult<Course> {
        let data: CourseData = self.post("/api/admin/courses", input).await?;
        Ok(data.course)
    }

    async fn set_archived(&self, course_id: &str, archived: bool) -> ServiceResult<()> {
        let body = serde_json::json!({ "courseId": course_id, "isArchived": archived });
        Ok(self.post_unit("/api/admin/courses/archive", &body).await?)
    }

    async fn delete_course(&self, course_id: &str) -> ServiceResult<()> {
        Ok(self.delete(&format!("/api/admin/courses/{course_id}")).await?)
    }
}
