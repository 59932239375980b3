//! Projects and tasks as delivered by the student endpoints, and the
//! [`WorkItem`] sum type the Kanban board and progress tracker work on.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::reminders::parse_deadline;

/// Kanban column / progress status of a project or task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Todo,
    #[serde(rename = "inprogress")]
    InProgress,
    Done,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Todo => "todo",
            ItemStatus::InProgress => "inprogress",
            ItemStatus::Done => "done",
        }
    }

    /// `done` iff there is at least one child and every child is complete.
    pub fn from_children<I: IntoIterator<Item = bool>>(children: I) -> Self {
        let mut any = false;
        for complete in children {
            if !complete {
                return ItemStatus::InProgress;
            }
            any = true;
        }
        if any { ItemStatus::Done } else { ItemStatus::InProgress }
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "todo" => Ok(ItemStatus::Todo),
            "inprogress" | "in-progress" | "in_progress" => Ok(ItemStatus::InProgress),
            "done" => Ok(ItemStatus::Done),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainTask {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub completed: bool,
}

/// The course a project or task belongs to, as embedded by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub course_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub project_name: String,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub deadline_date: Option<String>,
    #[serde(default)]
    pub deadline_time: Option<String>,
    #[serde(default)]
    pub main_tasks: Vec<MainTask>,
    #[serde(default)]
    pub course: Option<CourseRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub task_name: String,
    #[serde(default)]
    pub deadline_date: Option<String>,
    #[serde(default)]
    pub deadline_time: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub course: Option<CourseRef>,
}

/// A project or a task. Consumers match on the variant instead of probing fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum WorkItem {
    Project(Project),
    Task(Task),
}

impl WorkItem {
    pub fn id(&self) -> &str {
        match self {
            WorkItem::Project(p) => &p.id,
            WorkItem::Task(t) => &t.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            WorkItem::Project(p) => &p.project_name,
            WorkItem::Task(t) => &t.task_name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorkItem::Project(_) => "project",
            WorkItem::Task(_) => "task",
        }
    }

    pub fn is_project(&self) -> bool {
        matches!(self, WorkItem::Project(_))
    }

    pub fn course_id(&self) -> Option<&str> {
        let course = match self {
            WorkItem::Project(p) => p.course.as_ref(),
            WorkItem::Task(t) => t.course.as_ref(),
        };
        course.map(|c| c.id.as_str())
    }

    /// Deadline with the default time of day applied, if the item has a parseable one.
    pub fn deadline(&self) -> Option<NaiveDateTime> {
        let (date, time) = match self {
            WorkItem::Project(p) => (p.deadline_date.as_deref(), p.deadline_time.as_deref()),
            WorkItem::Task(t) => (t.deadline_date.as_deref(), t.deadline_time.as_deref()),
        };
        parse_deadline(date?, time)
    }
}
