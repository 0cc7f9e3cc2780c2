//! The synchronization controller: owns the task store and keeps it in step
//! with the document service.

use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{broadcast, Notify};
use tracing::Instrument;

use crate::api::types::{DashboardSnapshot, HealthStatus, Task, TaskSummary};
use crate::api::{HttpTaskApi, TaskApi};
use crate::config::ClientConfig;
use crate::error::{Result, SummaryError};
use crate::store::{StatusCounts, StoreBroadcaster, StoreEvent, TaskStore};
use crate::sync::polling::PollState;
use crate::sync::summary::SummaryWorkflow;
use crate::sync::upload::{single_file, UploadFile};

type Transition = Option<(PollState, PollState)>;

/// Single writer for the task store.
///
/// Views read snapshots through the accessors or subscribe to [`StoreEvent`]s,
/// and change state only through the intent methods (`refresh`, `upload`,
/// `delete`, `request_summary`). Store locks are never held across an await.
pub struct SyncController {
    api: Arc<dyn TaskApi>,
    store: RwLock<TaskStore>,
    events: StoreBroadcaster,
    summaries: SummaryWorkflow,
    poll_state: Mutex<PollState>,
    refresh_requested: Arc<Notify>,
    poll_state_changed: Arc<Notify>,
}

impl SyncController {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self {
            api,
            store: RwLock::new(TaskStore::new()),
            events: StoreBroadcaster::default(),
            summaries: SummaryWorkflow::new(),
            poll_state: Mutex::new(PollState::Idle),
            refresh_requested: Arc::new(Notify::new()),
            poll_state_changed: Arc::new(Notify::new()),
        }
    }

    /// Creates a controller talking HTTP to the configured service.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api = HttpTaskApi::new(config)?;
        log::info!("Using document service at {}", api.base_url());
        Ok(Self::new(Arc::new(api)))
    }

    // ─── Intents ───────────────────────────────────────────────────────────

    /// Fetches the task list and dashboard together and replaces both.
    ///
    /// On failure the store keeps its last good state and the error is returned.
    pub async fn refresh(&self) -> Result<()> {
        self.refresh_inner()
            .instrument(tracing::info_span!("sync.refresh"))
            .await
    }

    async fn refresh_inner(&self) -> Result<()> {
        let (tasks, dashboard) =
            match tokio::try_join!(self.api.list_tasks(), self.api.dashboard()) {
                Ok(results) => results,
                Err(e) => {
                    log::warn!("Refresh failed, keeping last known state: {}", e);
                    self.events.send(StoreEvent::RefreshFailed {
                        message: e.to_string(),
                    });
                    return Err(e.into());
                }
            };

        let (counts, transition) = self.mutate(|store| {
            store.replace_all(tasks);
            store.replace_dashboard(dashboard);
            store.counts()
        });

        log::debug!(
            "Reconciled {} tasks ({} processing)",
            counts.total(),
            counts.processing
        );
        self.events.send(StoreEvent::Reconciled {
            task_count: counts.total(),
            processing: counts.processing,
        });
        self.announce(transition);
        Ok(())
    }

    /// Uploads one file and inserts the new task at the head of the store.
    pub async fn upload(&self, file: UploadFile) -> Result<Task> {
        file.validate()?;

        let span = tracing::info_span!("api.upload", filename = %file.filename);
        let response = match self.api.upload(&file).instrument(span).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Upload of '{}' failed: {}", file.filename, e);
                return Err(e.into());
            }
        };

        let task = Task::seeded(&response);
        let ((), transition) = self.mutate(|store| store.insert_head(task.clone()));

        log::info!("Uploaded '{}' as task {}", task.filename, task.id);
        self.events.send(StoreEvent::TaskInserted {
            id: task.id.clone(),
            filename: task.filename.clone(),
        });
        self.announce(transition);
        self.schedule_refresh();
        Ok(task)
    }

    /// Uploads a selection that must contain exactly one file.
    pub async fn upload_selection(&self, files: Vec<UploadFile>) -> Result<Task> {
        let file = single_file(files)?;
        self.upload(file).await
    }

    /// Removes a task locally, then deletes it on the service.
    ///
    /// A 404 from the service counts as success. Any other failure puts the
    /// task back where it was, unless a refresh already brought it back.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let (removed, transition) = self.mutate(|store| store.remove(id));
        if removed.is_some() {
            self.events.send(StoreEvent::TaskRemoved { id: id.to_string() });
        }
        self.announce(transition);

        let span = tracing::info_span!("api.delete", id = %id);
        let outcome = match self.api.delete_task(id).instrument(span).await {
            Ok(()) => {
                log::info!("Deleted task {}", id);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                log::info!("Task {} was already deleted", id);
                Ok(())
            }
            Err(e) => {
                log::error!("Delete of task {} failed: {}", id, e);
                if let Some((index, task)) = removed {
                    self.rollback_delete(index, task);
                }
                Err(e.into())
            }
        };

        self.schedule_refresh();
        outcome
    }

    fn rollback_delete(&self, index: usize, task: Task) {
        let id = task.id.clone();
        let (restored, transition) = self.mutate(|store| store.restore(index, task));
        if restored {
            self.events.send(StoreEvent::TaskRestored { id, index });
        } else {
            log::debug!("Task {} is already back in the store", id);
        }
        self.announce(transition);
    }

    /// Generates a summary for one completed task and patches it into the store.
    ///
    /// Ineligible tasks are rejected without contacting the service.
    pub async fn request_summary(&self, id: &str) -> Result<TaskSummary> {
        let task = self.task(id);
        SummaryWorkflow::check_eligible(id, task.as_ref())?;
        let _guard = self.summaries.begin(id)?;

        let span = tracing::info_span!("api.summarize", id = %id);
        match self.api.summarize(id).instrument(span).await {
            Ok(response) => {
                let summary = TaskSummary::from_response(response);
                let (patched, transition) =
                    self.mutate(|store| store.patch_summary(id, summary.clone()));
                if patched {
                    log::info!("Summary ready for task {} ({})", id, summary.summary_type);
                    self.events.send(StoreEvent::SummaryUpdated { id: id.to_string() });
                } else {
                    log::info!("Task {} changed while its summary was generated, not applied", id);
                }
                self.announce(transition);
                Ok(summary)
            }
            Err(e) => {
                log::error!("Summary for task {} failed: {}", id, e);
                let err = SummaryError::Failed {
                    id: id.to_string(),
                    source: e,
                };
                self.events.send(StoreEvent::SummaryFailed {
                    id: id.to_string(),
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Fetches one task's status record.
    ///
    /// The stored copy is replaced if present. A 404 removes it and returns `None`.
    pub async fn refresh_task(&self, id: &str) -> Result<Option<Task>> {
        let span = tracing::info_span!("api.status", id = %id);
        match self.api.task_status(id).instrument(span).await {
            Ok(task) => {
                let task = task.normalized();
                let (updated, transition) = self.mutate(|store| store.replace_task(task.clone()));
                if updated {
                    self.events.send(StoreEvent::TaskUpdated { id: id.to_string() });
                }
                self.announce(transition);
                Ok(Some(task))
            }
            Err(e) if e.is_not_found() => {
                let (removed, transition) = self.mutate(|store| store.remove(id));
                if removed.is_some() {
                    log::info!("Task {} no longer exists on the service", id);
                    self.events.send(StoreEvent::TaskRemoved { id: id.to_string() });
                }
                self.announce(transition);
                Ok(None)
            }
            Err(e) => {
                log::warn!("Status of task {} unavailable: {}", id, e);
                Err(e.into())
            }
        }
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let health = self
            .api
            .health()
            .instrument(tracing::info_span!("api.health"))
            .await?;
        Ok(health)
    }

    /// Asks the poll scheduler for a refresh as soon as possible.
    pub fn schedule_refresh(&self) {
        self.refresh_requested.notify_one();
    }

    // ─── Read-only projections ─────────────────────────────────────────────

    pub fn tasks(&self) -> Vec<Task> {
        self.read_store().tasks().to_vec()
    }

    pub fn task(&self, id: &str) -> Option<Task> {
        self.read_store().get(id).cloned()
    }

    pub fn dashboard(&self) -> Option<DashboardSnapshot> {
        self.read_store().dashboard().cloned()
    }

    pub fn counts(&self) -> StatusCounts {
        self.read_store().counts()
    }

    /// Tasks the summarizer view can offer.
    pub fn summarizable_tasks(&self) -> Vec<Task> {
        self.read_store().summarizable()
    }

    pub fn recent(&self, limit: usize) -> Vec<Task> {
        self.read_store().recent(limit)
    }

    pub fn generation(&self) -> u64 {
        self.read_store().generation()
    }

    pub fn poll_state(&self) -> PollState {
        *self.lock_poll_state()
    }

    pub fn is_generating_summary(&self, id: &str) -> bool {
        self.summaries.is_generating(id)
    }

    pub fn is_generating_any_summary(&self) -> bool {
        self.summaries.is_generating_any()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub(crate) fn refresh_requested(&self) -> Arc<Notify> {
        Arc::clone(&self.refresh_requested)
    }

    pub(crate) fn poll_state_changed(&self) -> Arc<Notify> {
        Arc::clone(&self.poll_state_changed)
    }

    // ─── Internals ─────────────────────────────────────────────────────────

    /// Applies one mutation under the write lock and recomputes the poll state
    /// before the lock is released.
    fn mutate<R>(&self, f: impl FnOnce(&mut TaskStore) -> R) -> (R, Transition) {
        let mut store = self.write_store();
        let result = f(&mut *store);

        let next = PollState::for_store(&store);
        let mut current = self.lock_poll_state();
        let transition = if *current != next {
            let from = *current;
            *current = next;
            Some((from, next))
        } else {
            None
        };

        (result, transition)
    }

    fn announce(&self, transition: Transition) {
        if let Some((from, to)) = transition {
            log::info!("Poll state {} -> {}", from, to);
            self.events.send(StoreEvent::PollStateChanged { from, to });
            self.poll_state_changed.notify_one();
        }
    }

    fn read_store(&self) -> RwLockReadGuard<'_, TaskStore> {
        match self.store.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Task store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, TaskStore> {
        match self.store.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Task store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn lock_poll_state(&self) -> std::sync::MutexGuard<'_, PollState> {
        match self.poll_state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Poll state lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
