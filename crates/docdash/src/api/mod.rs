pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpTaskApi, TaskApi};
pub use error::ApiError;
pub use types::{
    DashboardSnapshot, HealthStatus, SummarizeResponse, SummaryKind, Task,
    TaskStatus, TaskSummary, UploadResponse,
};
