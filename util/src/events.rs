//! Typed in-process event bus.
//!
//! Components broadcast state changes (course selection, saved versions,
//! submitted grades) to whoever is listening. Delivery is last-writer-wins with
//! no acknowledgement: a publish with no subscribers is simply dropped.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::session::SelectedCourse;

/// Capacity of the broadcast channel. Slow subscribers that fall further
/// behind than this observe `RecvError::Lagged`.
const CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    CourseSelected(SelectedCourse),
    CourseCleared,
    VersionSaved {
        submission_id: String,
        version: u32,
    },
    GradeSubmitted {
        submission_id: String,
        percentage: u32,
        letter: String,
    },
}

/// Cheaply cloneable handle onto a shared broadcast channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts `event` to all current subscribers and returns how many
    /// received it. Zero subscribers is not an error.
    pub fn publish(&self, event: AppEvent) -> usize {
        match self.sender.send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                tracing::debug!(?event, "event published with no subscribers");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
