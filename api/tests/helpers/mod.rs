pub mod mock;

pub use mock::{Mock, spawn_server};
