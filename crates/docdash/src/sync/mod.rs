pub mod controller;
pub mod polling;
pub mod summary;
pub mod upload;

pub use controller::SyncController;
pub use polling::{PollScheduler, PollState};
pub use summary::SummaryWorkflow;
pub use upload::{single_file, UploadFile, MAX_UPLOAD_BYTES};
