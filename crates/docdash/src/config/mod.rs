pub mod loader;

use std::time::Duration;

pub use loader::{load_config, load_config_from_str, ConfigFile};

/// Environment variable holding the document service base URL.
pub const API_URL_ENV: &str = "DOCDASH_API_URL";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Interval between polls while any task is processing.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Every request fails after this long. Not configurable.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of tasks shown in the upload surface's recent preview.
pub const DEFAULT_RECENT_LIMIT: usize = 4;

/// Settings for the sync client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without trailing slash, e.g. `http://localhost:8000`.
    pub base_url: String,
    pub poll_interval: Duration,
    pub recent_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}
