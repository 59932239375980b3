//! Checklist progress for a single project or task.
//!
//! A project's checklist is its main tasks (each optionally split into subtasks); a
//! task's checklist is its subtasks. Items in `todo` cannot be ticked. Saving derives
//! the item's status from the checklist and, once the backend accepts it, lets the
//! board auto-complete the item.

use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::kanban::KanbanBoard;
use crate::projects::{ItemStatus, MainTask, Subtask, WorkItem};
use crate::traits::{ProgressLookup, ProgressStore};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgress {
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub main_tasks: Vec<MainTask>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// Completed / total counts for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Checklist {
    Project(Vec<MainTask>),
    Task(Vec<Subtask>),
}

const LOCKED_WHILE_TODO: &str = "Move to In Progress to check tasks";

pub struct ProgressTracker {
    item_id: String,
    checklist: Checklist,
}

impl ProgressTracker {
    /// Loads the stored checklist for `item`, falling back to the item's own
    /// checklist when the lookup fails or returns nothing.
    pub async fn open(item: &WorkItem, lookup: &dyn ProgressLookup) -> Self {
        let checklist = match item {
            WorkItem::Project(p) => {
                let stored = lookup
                    .project_progress(&p.id)
                    .await
                    .inspect_err(|e| tracing::warn!(item_id = %p.id, error = %e, "error fetching project progress"))
                    .ok()
                    .map(|pp| pp.main_tasks)
                    .filter(|tasks| !tasks.is_empty());
                Checklist::Project(stored.unwrap_or_else(|| p.main_tasks.clone()))
            }
            WorkItem::Task(t) => {
                let stored = lookup
                    .task_progress(&t.id)
                    .await
                    .inspect_err(|e| tracing::warn!(item_id = %t.id, error = %e, "error fetching task progress"))
                    .ok()
                    .map(|tp| tp.subtasks)
                    .filter(|subs| !subs.is_empty());
                Checklist::Task(stored.unwrap_or_else(|| t.subtasks.clone()))
            }
        };
        Self {
            item_id: item.id().to_string(),
            checklist,
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    fn ensure_unlocked(&self, board: &KanbanBoard) -> ServiceResult<()> {
        match board.status_of(&self.item_id) {
            Some(ItemStatus::Todo) => Err(ServiceError::Refused(LOCKED_WHILE_TODO.into())),
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound(format!("item {}", self.item_id))),
        }
    }

    fn main_tasks_mut(&mut self) -> ServiceResult<&mut Vec<MainTask>> {
        match &mut self.checklist {
            Checklist::Project(tasks) => Ok(tasks),
            Checklist::Task(_) => Err(ServiceError::Refused("tasks have no main tasks".into())),
        }
    }

    /// Ticks or unticks a main task; its subtasks follow.
    pub fn toggle_main_task(&mut self, board: &KanbanBoard, main_task_id: &str) -> ServiceResult<bool> {
        self.ensure_unlocked(board)?;
        let main = self
            .main_tasks_mut()?
            .iter_mut()
            .find(|m| m.id == main_task_id)
            .ok_or_else(|| ServiceError::NotFound(format!("main task {main_task_id}")))?;

        let checked = !main.completed;
        main.completed = checked;
        for sub in &mut main.subtasks {
            sub.completed = checked;
        }
        Ok(checked)
    }

    /// Ticks or unticks a subtask of a project's main task. The main task is complete
    /// exactly when all of its subtasks are.
    pub fn toggle_main_subtask(
        &mut self,
        board: &KanbanBoard,
        main_task_id: &str,
        subtask_id: &str,
    ) -> ServiceResult<bool> {
        self.ensure_unlocked(board)?;
        let main = self
            .main_tasks_mut()?
            .iter_mut()
            .find(|m| m.id == main_task_id)
            .ok_or_else(|| ServiceError::NotFound(format!("main task {main_task_id}")))?;
        let sub = main
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| ServiceError::NotFound(format!("subtask {subtask_id}")))?;

        sub.completed = !sub.completed;
        let checked = sub.completed;
        main.completed = !main.subtasks.is_empty() && main.subtasks.iter().all(|s| s.completed);
        Ok(checked)
    }

    /// Ticks or unticks a subtask of a task.
    pub fn toggle_subtask(&mut self, board: &KanbanBoard, subtask_id: &str) -> ServiceResult<bool> {
        self.ensure_unlocked(board)?;
        let Checklist::Task(subtasks) = &mut self.checklist else {
            return Err(ServiceError::Refused("projects track subtasks under main tasks".into()));
        };
        let sub = subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| ServiceError::NotFound(format!("subtask {subtask_id}")))?;
        sub.completed = !sub.completed;
        Ok(sub.completed)
    }

    fn child_flags(&self) -> Vec<bool> {
        match &self.checklist {
            Checklist::Project(tasks) => tasks.iter().map(|t| t.completed).collect(),
            Checklist::Task(subs) => subs.iter().map(|s| s.completed).collect(),
        }
    }

    pub fn completion(&self) -> Completion {
        let flags = self.child_flags();
        Completion {
            completed: flags.iter().filter(|c| **c).count(),
            total: flags.len(),
        }
    }

    pub fn derived_status(&self) -> ItemStatus {
        ItemStatus::from_children(self.child_flags())
    }

    /// Persists the checklist with its derived status, then runs the board's
    /// auto-complete check. A failed save is logged and returned; the local checklist
    /// and the board are left as they are.
    pub async fn save(&self, board: &mut KanbanBoard, store: &dyn ProgressStore) -> ServiceResult<ItemStatus> {
        let status = self.derived_status();
        let result = match &self.checklist {
            Checklist::Project(tasks) => {
                let progress = ProjectProgress {
                    status,
                    main_tasks: tasks.clone(),
                };
                store.save_project_progress(&self.item_id, &progress).await
            }
            Checklist::Task(subs) => {
                let progress = TaskProgress {
                    status,
                    subtasks: subs.clone(),
                };
                store.save_task_progress(&self.item_id, &progress).await
            }
        };

        if let Err(e) = result {
            tracing::error!(item_id = %self.item_id, error = %e, "error saving progress");
            return Err(e);
        }

        board.auto_complete_check(&self.item_id, self.child_flags());
        Ok(status)
    }
}
