pub mod assignment;
pub mod config;
pub mod events;
pub mod session;
