pub mod api;
pub mod config;
pub mod error;
pub mod store;
pub mod sync;
pub mod view;

pub use api::{ApiError, HttpTaskApi, Task, TaskApi, TaskStatus, TaskSummary};
pub use config::{load_config, ClientConfig};
pub use error::{ConfigError, DocDashError, Result, SummaryError, ValidationError};
pub use store::{StoreEvent, TaskStore};
pub use sync::{PollScheduler, PollState, SyncController, UploadFile};
