//! Explicit session context.
//!
//! Holds the bearer token and the currently selected course, mirrors both to a
//! small JSON file so a restart restores them, and announces selection changes
//! on the [`EventBus`]. Components receive a `Session` handle instead of
//! reading shared global storage.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use crate::events::{AppEvent, EventBus};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to write session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The course a user is currently working in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedCourse {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct SessionState {
    #[serde(default)]
    auth_token: Option<String>,
    #[serde(default)]
    selected_course: Option<SelectedCourse>,
}

#[derive(Clone)]
pub struct Session {
    path: Option<PathBuf>,
    state: Arc<RwLock<SessionState>>,
    events: EventBus,
}

impl Session {
    /// A session that is never written to disk.
    pub fn in_memory(events: EventBus) -> Self {
        Self {
            path: None,
            state: Arc::new(RwLock::new(SessionState::default())),
            events,
        }
    }

    /// Restores a session from `path`.
    ///
    /// A missing file starts an empty session. A malformed file is logged and
    /// ignored, which leaves the user signed out with no course selected.
    pub fn load(path: impl Into<PathBuf>, events: EventBus) -> Self {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<SessionState>(&raw) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring malformed session file");
                    SessionState::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => SessionState::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read session file");
                SessionState::default()
            }
        };

        Self {
            path: Some(path),
            state: Arc::new(RwLock::new(state)),
            events,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn auth_token(&self) -> Option<String> {
        self.read().auth_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().auth_token.is_some()
    }

    pub fn set_auth_token(&self, token: impl Into<String>) -> Result<(), SessionError> {
        self.write().auth_token = Some(token.into());
        self.persist()
    }

    /// Drops the token, e.g. after the backend answers 401.
    pub fn clear_auth_token(&self) -> Result<(), SessionError> {
        self.write().auth_token = None;
        self.persist()
    }

    pub fn selected_course(&self) -> Option<SelectedCourse> {
        self.read().selected_course.clone()
    }

    /// Selects `course`, broadcasts `CourseSelected`, then persists.
    ///
    /// The in-memory selection and the broadcast happen even if persisting fails.
    pub fn select_course(&self, course: SelectedCourse) -> Result<(), SessionError> {
        self.write().selected_course = Some(course.clone());
        self.events.publish(AppEvent::CourseSelected(course));
        self.persist()
    }

    pub fn clear_course(&self) -> Result<(), SessionError> {
        self.write().selected_course = None;
        self.events.publish(AppEvent::CourseCleared);
        self.persist()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Atomic-ish write: serialize to `<file>.tmp`, then rename into place.
    fn persist(&self) -> Result<(), SessionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let snapshot = self.read().clone();
        let pretty = serde_json::to_string_pretty(&snapshot)?;
        let io_err = |source| SessionError::Io {
            path: path.clone(),
            source,
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }

        let tmp = temp_path(path);
        {
            let mut f = fs::File::create(&tmp).map_err(io_err)?;
            f.write_all(pretty.as_bytes()).map_err(io_err)?;
            f.flush().map_err(io_err)?;
        }
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

fn temp_path(final_path: &Path) -> PathBuf {
    let mut tmp = final_path.to_path_buf();
    let fname = final_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("session.json");
    tmp.set_file_name(format!("{fname}.tmp"));
    tmp
}
