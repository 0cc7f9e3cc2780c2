//! Builders for task records used across the integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use docdash::api::types::{SummaryKind, Task, TaskStatus, TaskSummary};

/// Translated text long enough to be summarized.
pub const LONG_TRANSLATION: &str =
    "The panchayat office announces a public meeting on Monday to discuss the new water supply scheme.";

fn at_minute(minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(10, minute, 0)
        .unwrap()
}

/// Builder for creating `Task` instances.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    /// A processing task with no results yet.
    pub fn new(id: &str) -> Self {
        Self {
            task: Task {
                id: id.to_string(),
                filename: format!("{}.pdf", id),
                status: TaskStatus::Processing,
                created_at: at_minute(0),
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
            },
        }
    }

    /// A completed Malayalam task with summarizable text.
    pub fn completed(id: &str) -> Self {
        Self::new(id)
            .status(TaskStatus::Completed)
            .progress(100)
            .message("Processing completed successfully")
            .language("ml")
            .original_text("പഞ്ചായത്ത് ഓഫീസ് അറിയിപ്പ്")
            .translated_text(LONG_TRANSLATION)
            .confidence(0.91)
            .processing_time(4.2)
    }

    pub fn errored(id: &str, error: &str) -> Self {
        let mut builder = Self::new(id).status(TaskStatus::Error).message("Processing failed");
        builder.task.error = Some(error.to_string());
        builder
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        if status == TaskStatus::Completed {
            self.task.completed_at = Some(self.task.created_at);
        }
        self
    }

    pub fn filename(mut self, filename: &str) -> Self {
        self.task.filename = filename.to_string();
        self
    }

    pub fn created_minute(mut self, minute: u32) -> Self {
        self.task.created_at = at_minute(minute);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.task.progress = progress;
        self
    }

    pub fn message(mut self, message: &str) -> Self {
        self.task.message = message.to_string();
        self
    }

    pub fn language(mut self, language: &str) -> Self {
        self.task.language = Some(language.to_string());
        self
    }

    pub fn original_text(mut self, text: &str) -> Self {
        self.task.original_text = Some(text.to_string());
        self
    }

    pub fn translated_text(mut self, text: &str) -> Self {
        self.task.translated_text = Some(text.to_string());
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.task.confidence = Some(confidence);
        self
    }

    pub fn processing_time(mut self, seconds: f64) -> Self {
        self.task.processing_time = Some(seconds);
        self
    }

    pub fn summary(mut self, text: &str) -> Self {
        self.task.summary = Some(TaskSummary {
            summary: text.to_string(),
            key_points: vec![],
            summary_type: SummaryKind::Extractive,
            summary_generated_at: None,
        });
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}
