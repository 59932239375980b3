//! Client-side engines for courses, the student Kanban board, submissions and
//! lecturer review. Backend access goes through the traits in [`traits`].

pub mod analysis;
pub mod analytics;
pub mod courses;
pub mod error;
pub mod kanban;
pub mod plagiarism;
pub mod progress;
pub mod projects;
pub mod reminders;
pub mod traits;
pub mod versioning;

pub use error::{ServiceError, ServiceResult};
