//! Implementations of the service and marker collaborator traits on [`ApiClient`].
//!
//! [`ApiClient`]: crate::client::ApiClient

pub mod admin;
pub mod grading;
pub mod student;
pub mod submissions;
