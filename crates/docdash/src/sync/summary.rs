//! Eligibility and in-flight tracking for on-demand summaries.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::types::{Task, TaskStatus, MIN_SUMMARY_TEXT_CHARS};
use crate::error::SummaryError;

/// Tracks which tasks have a summarize call in flight.
///
/// Requests for different tasks run concurrently; a second request for a task
/// that is already being summarized is rejected.
#[derive(Debug, Clone, Default)]
pub struct SummaryWorkflow {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl SummaryWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that `task` exists, is completed and has enough translated text.
    pub fn check_eligible(id: &str, task: Option<&Task>) -> Result<(), SummaryError> {
        let task = task.ok_or_else(|| SummaryError::NotFound(id.to_string()))?;

        let reason = match task.status {
            TaskStatus::Processing => Some("it is still processing".to_string()),
            TaskStatus::Error => Some("processing failed".to_string()),
            TaskStatus::Completed if !task.is_summarizable() => Some(format!(
                "translated text has {} characters, more than {} are needed",
                task.translated_chars(),
                MIN_SUMMARY_TEXT_CHARS
            )),
            TaskStatus::Completed => None,
        };

        match reason {
            Some(reason) => Err(SummaryError::NotEligible {
                id: id.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Marks `id` as in flight until the returned guard is dropped.
    pub fn begin(&self, id: &str) -> Result<InFlightGuard, SummaryError> {
        if !self.lock().insert(id.to_string()) {
            return Err(SummaryError::InProgress(id.to_string()));
        }
        Ok(InFlightGuard {
            id: id.to_string(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_generating(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    /// True while any summary is being generated.
    pub fn is_generating_any(&self) -> bool {
        !self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        lock_in_flight(&self.in_flight)
    }
}

fn lock_in_flight(in_flight: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    match in_flight.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Summary tracking lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Clears the in-flight mark for one task when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl InFlightGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock_in_flight(&self.in_flight).remove(&self.id);
    }
}
