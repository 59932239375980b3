//! Admin course management: list, filter, create, archive and delete courses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};
use crate::traits::CourseBackend;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lecturer {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub course_name: String,
    pub credits: u8,
    pub year: u8,
    pub semester: u8,
    pub lecturer_in_charge: Lecturer,
    #[serde(default)]
    pub lecturers: Vec<Lecturer>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseStats {
    pub total: usize,
    pub active: usize,
    pub archived: usize,
}

/// What the course list endpoint returns.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CourseListing {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub stats: Option<CourseStats>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CourseFilter {
    #[default]
    All,
    Active,
    Archived,
}

impl FromStr for CourseFilter {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(CourseFilter::All),
            "active" => Ok(CourseFilter::Active),
            "archived" => Ok(CourseFilter::Archived),
            other => Err(ServiceError::Validation(format!("unknown course filter '{other}'"))),
        }
    }
}

impl CourseFilter {
    fn admits(&self, course: &Course) -> bool {
        match self {
            CourseFilter::All => true,
            CourseFilter::Active => !course.is_archived,
            CourseFilter::Archived => course.is_archived,
        }
    }
}

/// Create-course form. Lecturers are referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    #[validate(length(min = 1, message = "Course name is required"))]
    pub course_name: String,
    #[validate(range(min = 1, max = 10, message = "Credits must be between 1 and 10"))]
    pub credits: u8,
    #[validate(range(min = 1, max = 4, message = "Year must be between 1 and 4"))]
    pub year: u8,
    #[validate(range(min = 1, max = 2, message = "Semester must be 1 or 2"))]
    pub semester: u8,
    #[validate(length(min = 1, message = "Lecturer in charge is required"))]
    pub lecturer_in_charge: String,
    pub lecturers: Vec<String>,
}

impl NewCourse {
    /// Trims text fields and makes sure the lecturer in charge is also in `lecturers`,
    /// without duplicates.
    fn normalized(mut self) -> Self {
        self.course_name = self.course_name.trim().to_string();
        self.lecturer_in_charge = self.lecturer_in_charge.trim().to_string();

        let mut ids = Vec::with_capacity(self.lecturers.len() + 1);
        for id in std::iter::once(self.lecturer_in_charge.clone()).chain(self.lecturers) {
            let id = id.trim().to_string();
            if !id.is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.lecturers = ids;
        self
    }
}

pub struct CoursePanel {
    backend: Arc<dyn CourseBackend>,
    courses: Vec<Course>,
    lecturers: Vec<Lecturer>,
}

impl CoursePanel {
    pub fn new(backend: Arc<dyn CourseBackend>) -> Self {
        Self {
            backend,
            courses: Vec::new(),
            lecturers: Vec::new(),
        }
    }

    /// Replaces the local course list with the backend's. On failure the current
    /// list is kept.
    pub async fn load(&mut self) -> ServiceResult<()> {
        match self.backend.list_courses().await {
            Ok(listing) => {
                if let Some(remote) = listing.stats {
                    let local = stats_of(&listing.courses);
                    if remote != local {
                        tracing::debug!(?remote, ?local, "backend course stats differ from list");
                    }
                }
                self.courses = listing.courses;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load courses");
                Err(e)
            }
        }
    }

    pub async fn load_lecturers(&mut self) -> ServiceResult<()> {
        match self.backend.list_lecturers().await {
            Ok(lecturers) => {
                self.lecturers = lecturers;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load lecturers");
                Err(e)
            }
        }
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn lecturers(&self) -> &[Lecturer] {
        &self.lecturers
    }

    /// Courses admitted by `filter` whose name contains `search` (case-insensitive),
    /// in delivery order.
    pub fn visible(&self, filter: CourseFilter, search: &str) -> Vec<&Course> {
        let needle = search.trim().to_lowercase();
        self.courses
            .iter()
            .filter(|c| filter.admits(c))
            .filter(|c| needle.is_empty() || c.course_name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn stats(&self) -> CourseStats {
        stats_of(&self.courses)
    }

    pub async fn create(&mut self, input: NewCourse) -> ServiceResult<&Course> {
        let input = input.normalized();
        input.validate()?;

        let course = self.backend.create_course(&input).await.inspect_err(|e| {
            tracing::error!(course_name = %input.course_name, error = %e, "failed to create course");
        })?;
        tracing::info!(course_id = %course.id, "course created");
        self.courses.insert(0, course);
        Ok(&self.courses[0])
    }

    /// Flips the archive flag and returns the new value.
    pub async fn toggle_archive(&mut self, course_id: &str) -> ServiceResult<bool> {
        let idx = self.index_of(course_id)?;
        let archived = !self.courses[idx].is_archived;

        self.backend
            .set_archived(course_id, archived)
            .await
            .inspect_err(|e| tracing::error!(course_id, error = %e, "failed to toggle archive"))?;

        self.courses[idx].is_archived = archived;
        Ok(archived)
    }

    pub async fn delete(&mut self, course_id: &str) -> ServiceResult<()> {
        self.index_of(course_id)?;
        self.backend
            .delete_course(course_id)
            .await
            .inspect_err(|e| tracing::error!(course_id, error = %e, "failed to delete course"))?;

        self.courses.retain(|c| c.id != course_id);
        tracing::info!(course_id, "course deleted");
        Ok(())
    }

    fn index_of(&self, course_id: &str) -> ServiceResult<usize> {
        self.courses
            .iter()
            .position(|c| c.id == course_id)
            .ok_or_else(|| ServiceError::NotFound(format!("course {course_id}")))
    }
}

fn stats_of(courses: &[Course]) -> CourseStats {
    let archived = courses.iter().filter(|c| c.is_archived).count();
    CourseStats {
        total: courses.len(),
        active: courses.len() - archived,
        archived,
    }
}
