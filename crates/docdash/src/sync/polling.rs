//! Idle/Polling state and the loop that refreshes while tasks are processing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::api::types::Task;
use crate::store::TaskStore;
use crate::sync::controller::SyncController;

/// Whether the scheduler should be refreshing on an interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    #[default]
    Idle,
    Polling,
}

impl PollState {
    /// Polling iff at least one task is processing.
    pub fn for_tasks(tasks: &[Task]) -> Self {
        if tasks.iter().any(Task::is_processing) {
            PollState::Polling
        } else {
            PollState::Idle
        }
    }

    pub fn for_store(store: &TaskStore) -> Self {
        Self::for_tasks(store.tasks())
    }

    pub fn is_polling(&self) -> bool {
        *self == PollState::Polling
    }
}

impl std::fmt::Display for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollState::Idle => write!(f, "idle"),
            PollState::Polling => write!(f, "polling"),
        }
    }
}

/// Drives [`SyncController::refresh`] according to the poll state.
///
/// One refresh runs unconditionally at start. After that a refresh runs every
/// `interval` while the controller is polling, and immediately whenever the
/// controller asks for one (after an upload or delete). The timer is re-armed
/// from zero after every refresh and every poll state change, and is not armed
/// at all while idle.
pub struct PollScheduler {
    controller: Arc<SyncController>,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
    stop: Arc<Notify>,
}

impl PollScheduler {
    pub fn new(controller: Arc<SyncController>, interval: Duration) -> Self {
        Self {
            controller,
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(Notify::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts the poll loop on the current tokio runtime.
    pub fn start(&self) -> JoinHandle<()> {
        let controller = Arc::clone(&self.controller);
        let shutdown = Arc::clone(&self.shutdown);
        let stop = Arc::clone(&self.stop);
        let interval = self.interval;

        tokio::spawn(async move {
            let refresh_requested = controller.refresh_requested();
            let poll_state_changed = controller.poll_state_changed();

            log::debug!("Poll scheduler started (interval {:?})", interval);
            // Failures are already logged and broadcast by the controller.
            let _ = controller.refresh().await;

            loop {
                if shutdown.load(Ordering::Acquire) {
                    break;
                }

                let polling = controller.poll_state().is_polling();

                tokio::select! {
                    biased;
                    _ = stop.notified() => break,
                    _ = refresh_requested.notified() => {
                        log::debug!("Refresh requested");
                    }
                    _ = poll_state_changed.notified() => continue,
                    _ = tokio::time::sleep(interval), if polling => {}
                }

                if shutdown.load(Ordering::Acquire) {
                    break;
                }

                let _ = controller.refresh().await;
            }

            log::debug!("Poll scheduler stopped");
        })
    }

    /// Signals the loop to stop. An in-flight refresh is allowed to finish.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.stop.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
