//! REST client for the campus backend and the collaborator implementations the
//! `services` and `marker` engines run against.

pub mod backend;
pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
