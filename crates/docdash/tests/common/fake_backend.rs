//! In-memory document service for driving the controller in tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use tokio::sync::Notify;

use docdash::api::types::{
    DashboardSnapshot, HealthStatus, SummarizeResponse, SummaryKind, Task, TaskStatus,
    TaskSummary, UploadResponse,
};
use docdash::api::{ApiError, TaskApi};
use docdash::sync::UploadFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Upload,
    Status,
    List,
    Delete,
    Dashboard,
    Summarize,
    Health,
}

impl Op {
    fn endpoint(&self) -> &'static str {
        match self {
            Op::Upload => "POST /api/upload",
            Op::Status => "GET /api/status",
            Op::List => "GET /api/results",
            Op::Delete => "DELETE /api/results",
            Op::Dashboard => "GET /api/dashboard",
            Op::Summarize => "POST /api/summarize",
            Op::Health => "GET /api/health",
        }
    }
}

/// A scripted failure for the next call of an operation.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Status(u16),
    Timeout,
}

impl Failure {
    fn into_error(self, op: Op) -> ApiError {
        match self {
            Failure::Status(status) => ApiError::Status {
                endpoint: op.endpoint().to_string(),
                status,
                detail: format!("scripted failure ({})", status),
            },
            Failure::Timeout => ApiError::Timeout {
                endpoint: op.endpoint().to_string(),
                timeout: Duration::from_secs(30),
            },
        }
    }
}

/// Holds a call until the test releases it.
#[derive(Clone, Default)]
pub struct Gate {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    /// Waits until a gated call has arrived.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Lets one gated call continue.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct BackendState {
    tasks: Vec<Task>,
    next_id: u32,
    failures: HashMap<Op, VecDeque<Failure>>,
    calls: HashMap<Op, usize>,
    gates: HashMap<Op, Gate>,
    held: HashMap<Op, Gate>,
    uploads: Vec<UploadFile>,
}

/// Behaves like the document service: uploads create processing tasks,
/// deletes remove them and the dashboard is computed from the task list.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<BackendState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let backend = Self::new();
        backend.set_tasks(tasks);
        backend
    }

    pub fn set_tasks(&self, tasks: Vec<Task>) {
        self.state.lock().unwrap().tasks = tasks;
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().unwrap().tasks.clone()
    }

    /// Marks a task as completed with a summarizable translation.
    pub fn complete(&self, id: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) {
            task.status = TaskStatus::Completed;
            task.progress = 100;
            task.message = "Processing completed successfully".to_string();
            task.translated_text = Some(super::LONG_TRANSLATION.to_string());
            task.language = Some("ml".to_string());
            task.completed_at = Some(Local::now().naive_local());
        }
    }

    pub fn fail_next(&self, op: Op, failure: Failure) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(op)
            .or_default()
            .push_back(failure);
    }

    /// Gates every following call of `op` until released.
    pub fn gate(&self, op: Op) -> Gate {
        let gate = Gate::default();
        self.state.lock().unwrap().gates.insert(op, gate.clone());
        gate
    }

    /// Gates only the next call of `op`. List and dashboard responses are
    /// taken when the call arrives, so a held call can land stale data.
    pub fn hold_next(&self, op: Op) -> Gate {
        let gate = Gate::default();
        self.state.lock().unwrap().held.insert(op, gate.clone());
        gate
    }

    pub fn calls(&self, op: Op) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    pub fn uploads(&self) -> Vec<UploadFile> {
        self.state.lock().unwrap().uploads.clone()
    }

    /// Records the call, waits on the gate if any, then pops a scripted failure.
    async fn enter(&self, op: Op) -> Result<(), ApiError> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            *state.calls.entry(op).or_default() += 1;
            match state.gates.get(&op).cloned() {
                Some(gate) => Some(gate),
                None => state.held.remove(&op),
            }
        };

        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        let failure = self
            .state
            .lock()
            .unwrap()
            .failures
            .get_mut(&op)
            .and_then(|queue| queue.pop_front());
        match failure {
            Some(failure) => Err(failure.into_error(op)),
            None => Ok(()),
        }
    }

    fn not_found(op: Op) -> ApiError {
        ApiError::Status {
            endpoint: op.endpoint().to_string(),
            status: 404,
            detail: "Task not found".to_string(),
        }
    }
}

#[async_trait]
impl TaskApi for FakeBackend {
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse, ApiError> {
        self.enter(Op::Upload).await?;

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("task-{}", state.next_id);
        state.uploads.push(file.clone());
        state.tasks.push(Task {
            id: id.clone(),
            filename: file.filename.clone(),
            status: TaskStatus::Processing,
            created_at: Local::now().naive_local(),
            completed_at: None,
            progress: 0,
            message: "Starting processing...".to_string(),
            original_text: None,
            translated_text: None,
            language: None,
            confidence: None,
            processing_time: None,
            error: None,
            summary: None,
        });

        Ok(UploadResponse {
            id,
            filename: file.filename.clone(),
            status: "processing".to_string(),
            message: "File uploaded successfully. Processing started.".to_string(),
        })
    }

    async fn task_status(&self, id: &str) -> Result<Task, ApiError> {
        self.enter(Op::Status).await?;
        self.state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found(Op::Status))
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let tasks = self.tasks();
        self.enter(Op::List).await?;
        Ok(tasks)
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        self.enter(Op::Delete).await?;
        let mut state = self.state.lock().unwrap();
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        if state.tasks.len() == before {
            return Err(Self::not_found(Op::Delete));
        }
        Ok(())
    }

    async fn dashboard(&self) -> Result<DashboardSnapshot, ApiError> {
        let tasks = self.tasks();
        self.enter(Op::Dashboard).await?;

        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count() as u64;
        let total = tasks.len() as u64;
        let completed = count(TaskStatus::Completed);
        let success_rate = if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Ok(DashboardSnapshot {
            total_documents: total,
            completed,
            processing: count(TaskStatus::Processing),
            errors: count(TaskStatus::Error),
            malayalam_documents: tasks
                .iter()
                .filter(|t| t.is_malayalam() && t.status == TaskStatus::Completed)
                .count() as u64,
            success_rate,
            recent_results: tasks.iter().rev().take(5).rev().cloned().collect(),
        })
    }

    async fn summarize(&self, id: &str) -> Result<SummarizeResponse, ApiError> {
        self.enter(Op::Summarize).await?;

        let mut state = self.state.lock().unwrap();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Self::not_found(Op::Summarize))?;

        let response = SummarizeResponse {
            summary: format!("Summary of {}", task.filename),
            key_points: vec!["Public meeting on Monday".to_string()],
            summary_type: SummaryKind::AiGenerated,
        };
        task.summary = Some(TaskSummary::from_response(response.clone()));
        Ok(response)
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.enter(Op::Health).await?;
        Ok(HealthStatus {
            status: "healthy".to_string(),
            timestamp: Some(Local::now().naive_local()),
            tesseract_ready: true,
            malayalam_ocr_enabled: true,
            upload_dir: "uploads".to_string(),
            active_tasks: 0,
            total_processed: self.tasks().len() as u64,
        })
    }
}
