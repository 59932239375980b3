//! Kanban status engine.
//!
//! Classifies a student's projects and tasks into `todo`, `inprogress` and `done`
//! buckets from server-reported progress, and applies the board's transition rules:
//!
//! - every item sits in exactly one bucket,
//! - `done` is terminal; a done item cannot be dragged anywhere,
//! - `todo -> done` is not a transition; items pass through `inprogress`,
//! - a project entering `inprogress` schedules its reminders in the background.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use util::session::SelectedCourse;

use crate::projects::{ItemStatus, Project, Task, WorkItem};
use crate::traits::{ProgressLookup, ReminderScheduler};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KanbanItem {
    pub item: WorkItem,
    pub status: ItemStatus,
}

impl KanbanItem {
    pub fn id(&self) -> &str {
        self.item.id()
    }
}

/// The three buckets. Within a bucket, projects precede tasks and fetch order is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Buckets {
    pub todo: Vec<KanbanItem>,
    pub in_progress: Vec<KanbanItem>,
    pub done: Vec<KanbanItem>,
}

impl Buckets {
    fn from_items(items: Vec<KanbanItem>) -> Self {
        let mut buckets = Buckets::default();
        for item in items {
            buckets.bucket_mut(item.status).push(item);
        }
        buckets
    }

    pub fn bucket(&self, status: ItemStatus) -> &[KanbanItem] {
        match status {
            ItemStatus::Todo => &self.todo,
            ItemStatus::InProgress => &self.in_progress,
            ItemStatus::Done => &self.done,
        }
    }

    fn bucket_mut(&mut self, status: ItemStatus) -> &mut Vec<KanbanItem> {
        match status {
            ItemStatus::Todo => &mut self.todo,
            ItemStatus::InProgress => &mut self.in_progress,
            ItemStatus::Done => &mut self.done,
        }
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &KanbanItem> {
        self.todo.iter().chain(&self.in_progress).chain(&self.done)
    }

    pub fn find(&self, id: &str) -> Option<&KanbanItem> {
        self.iter().find(|i| i.id() == id)
    }

    fn take(&mut self, id: &str) -> Option<KanbanItem> {
        for status in [ItemStatus::Todo, ItemStatus::InProgress, ItemStatus::Done] {
            let bucket = self.bucket_mut(status);
            if let Some(pos) = bucket.iter().position(|i| i.id() == id) {
                return Some(bucket.remove(pos));
            }
        }
        None
    }
}

/// Projects first, then tasks, each in fetch order.
fn ordered(items: Vec<WorkItem>) -> Vec<WorkItem> {
    let (mut projects, tasks): (Vec<_>, Vec<_>) = items.into_iter().partition(WorkItem::is_project);
    projects.extend(tasks);
    projects
}

async fn lookup_status(item: &WorkItem, lookup: &dyn ProgressLookup) -> ItemStatus {
    let result = match item {
        WorkItem::Project(p) => lookup.project_progress(&p.id).await.map(|p| p.status),
        WorkItem::Task(t) => lookup.task_progress(&t.id).await.map(|t| t.status),
    };
    result.unwrap_or_else(|e| {
        tracing::warn!(item_id = item.id(), kind = item.kind(), error = %e, "progress lookup failed, defaulting to todo");
        ItemStatus::Todo
    })
}

/// Resolves every item's status with one lookup per item, concurrently.
///
/// A failed lookup puts that item in `todo` and does not affect any other item.
pub async fn classify(items: Vec<WorkItem>, lookup: &dyn ProgressLookup) -> Buckets {
    let items = ordered(items);
    let statuses = join_all(items.iter().map(|item| lookup_status(item, lookup))).await;

    Buckets::from_items(
        items
            .into_iter()
            .zip(statuses)
            .map(|(item, status)| KanbanItem { item, status })
            .collect(),
    )
}

/// Why a move did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredMove {
    NothingStaged,
    UnknownItem,
    ItemIsDone,
    TodoToDone,
    SameStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: ItemStatus, to: ItemStatus },
    Ignored(IgnoredMove),
}

pub struct KanbanBoard {
    buckets: Buckets,
    staged: Option<String>,
    reminders: Option<Arc<dyn ReminderScheduler>>,
}

impl KanbanBoard {
    pub fn new(buckets: Buckets) -> Self {
        Self {
            buckets,
            staged: None,
            reminders: None,
        }
    }

    /// Builds the board for the selected course.
    ///
    /// With a course selected, items of that course are classified through `lookup`.
    /// With no course selected, every item is shown under `todo` and no lookups are made.
    pub async fn load(
        projects: Vec<Project>,
        tasks: Vec<Task>,
        selection: Option<&SelectedCourse>,
        lookup: &dyn ProgressLookup,
    ) -> Self {
        let items: Vec<WorkItem> = projects
            .into_iter()
            .map(WorkItem::Project)
            .chain(tasks.into_iter().map(WorkItem::Task))
            .collect();

        let buckets = match selection {
            Some(course) => {
                let in_course = items
                    .into_iter()
                    .filter(|i| i.course_id() == Some(course.id.as_str()))
                    .collect();
                classify(in_course, lookup).await
            }
            None => Buckets::from_items(
                ordered(items)
                    .into_iter()
                    .map(|item| KanbanItem {
                        item,
                        status: ItemStatus::Todo,
                    })
                    .collect(),
            ),
        };
        tracing::debug!(
            todo = buckets.todo.len(),
            in_progress = buckets.in_progress.len(),
            done = buckets.done.len(),
            "kanban board loaded"
        );
        Self::new(buckets)
    }

    pub fn with_reminders(mut self, scheduler: Arc<dyn ReminderScheduler>) -> Self {
        self.reminders = Some(scheduler);
        self
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn status_of(&self, id: &str) -> Option<ItemStatus> {
        self.buckets.find(id).map(|i| i.status)
    }

    pub fn item(&self, id: &str) -> Option<&KanbanItem> {
        self.buckets.find(id)
    }

    /// Moves an item to the end of `target`.
    ///
    /// Reminders are only scheduled when called from inside a tokio runtime.
    pub fn move_item(&mut self, id: &str, target: ItemStatus) -> MoveOutcome {
        let Some(from) = self.status_of(id) else {
            return MoveOutcome::Ignored(IgnoredMove::UnknownItem);
        };
        match (from, target) {
            (ItemStatus::Done, _) => return MoveOutcome::Ignored(IgnoredMove::ItemIsDone),
            (ItemStatus::Todo, ItemStatus::Done) => {
                return MoveOutcome::Ignored(IgnoredMove::TodoToDone);
            }
            (f, t) if f == t => return MoveOutcome::Ignored(IgnoredMove::SameStatus),
            _ => {}
        }

        let Some(mut item) = self.buckets.take(id) else {
            return MoveOutcome::Ignored(IgnoredMove::UnknownItem);
        };
        item.status = target;
        let is_project = item.item.is_project();
        self.buckets.bucket_mut(target).push(item);
        tracing::info!(item_id = id, from = %from, to = %target, "kanban item moved");

        if target == ItemStatus::InProgress && is_project {
            self.spawn_reminders(id);
        }
        MoveOutcome::Moved { from, to: target }
    }

    fn spawn_reminders(&self, project_id: &str) {
        let Some(scheduler) = self.reminders.clone() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(project_id, "no async runtime, reminders not scheduled");
            return;
        };
        let project_id = project_id.to_string();
        runtime.spawn(async move {
            if let Err(e) = scheduler.schedule_reminders(&project_id).await {
                tracing::error!(project_id = %project_id, error = %e, "error scheduling reminders");
            }
        });
    }

    /// Stages an item for a drag. Done and unknown items cannot be staged.
    pub fn begin_drag(&mut self, id: &str) -> bool {
        match self.status_of(id) {
            Some(ItemStatus::Done) | None => false,
            Some(_) => {
                self.staged = Some(id.to_string());
                true
            }
        }
    }

    pub fn staged(&self) -> Option<&str> {
        self.staged.as_deref()
    }

    /// Drops the staged item on `target`. Always clears the staged item.
    pub fn drop_on(&mut self, target: ItemStatus) -> MoveOutcome {
        match self.staged.take() {
            Some(id) => self.move_item(&id, target),
            None => MoveOutcome::Ignored(IgnoredMove::NothingStaged),
        }
    }

    /// Moves an `inprogress` item to `done` when it has children and all are complete.
    /// Returns whether the item moved.
    pub fn auto_complete_check<I: IntoIterator<Item = bool>>(&mut self, id: &str, children: I) -> bool {
        if self.status_of(id) != Some(ItemStatus::InProgress) {
            return false;
        }
        if ItemStatus::from_children(children) != ItemStatus::Done {
            return false;
        }
        if let Some(mut item) = self.buckets.take(id) {
            item.status = ItemStatus::Done;
            self.buckets.done.push(item);
            tracing::info!(item_id = id, "all children complete, item moved to done");
            return true;
        }
        false
    }
}
