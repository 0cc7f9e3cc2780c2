pub mod events;
pub mod task_store;

pub use events::{StoreBroadcaster, StoreEvent};
pub use task_store::{StatusCounts, TaskStore};
