//! Records exchanged with the document service.
//!
//! Field names follow the service's snake_case JSON exactly. Timestamps are
//! naive local ISO-8601 strings on the wire, so they are kept as
//! [`NaiveDateTime`] rather than converted to UTC.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Minimum translated text length (in characters) for a task to be summarizable.
pub const MIN_SUMMARY_TEXT_CHARS: usize = 50;

/// Progress value seeded into a freshly uploaded task.
pub const UPLOAD_SEED_PROGRESS: u8 = 10;

/// Detected language code for Malayalam.
pub const MALAYALAM: &str = "ml";

/// Status of a processing task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Processing,
    Completed,
    Error,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Error => write!(f, "error"),
        }
    }
}

/// How a summary was produced.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    AiGenerated,
    Extractive,
    Error,
    #[default]
    None,
}

impl std::fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryKind::AiGenerated => write!(f, "AI Generated"),
            SummaryKind::Extractive => write!(f, "Extractive"),
            SummaryKind::Error => write!(f, "Error"),
            SummaryKind::None => write!(f, "Basic"),
        }
    }
}

/// Summary sub-record attached to a task once summarization has run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSummary {
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub summary_type: SummaryKind,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub summary_generated_at: Option<NaiveDateTime>,
}

impl TaskSummary {
    /// Builds the sub-record from a summarize response, stamped with the local time.
    pub fn from_response(response: SummarizeResponse) -> Self {
        Self {
            summary: response.summary,
            key_points: response.key_points,
            summary_type: response.summary_type,
            summary_generated_at: Some(Local::now().naive_local()),
        }
    }
}

/// One document's processing record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub filename: String,
    pub status: TaskStatus,
    #[serde(with = "timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<NaiveDateTime>,
    /// Percentage, meaningful only while processing.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Recognition confidence in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Processing duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub summary: Option<TaskSummary>,
}

impl Task {
    /// Creates the optimistic record inserted right after a successful upload.
    pub fn seeded(upload: &UploadResponse) -> Self {
        Self {
            id: upload.id.clone(),
            filename: upload.filename.clone(),
            status: TaskStatus::Processing,
            created_at: Local::now().naive_local(),
            completed_at: None,
            progress: UPLOAD_SEED_PROGRESS,
            message: upload.message.clone(),
            original_text: None,
            translated_text: None,
            language: None,
            confidence: None,
            processing_time: None,
            error: None,
            summary: None,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.status == TaskStatus::Processing
    }

    /// Returns true if the service has finished with this task (completed or failed).
    pub fn is_finished(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Error)
    }

    pub fn is_malayalam(&self) -> bool {
        self.language.as_deref() == Some(MALAYALAM)
    }

    /// Length of the translated text in characters, 0 when absent.
    pub fn translated_chars(&self) -> usize {
        self.translated_text
            .as_deref()
            .map(|text| text.chars().count())
            .unwrap_or(0)
    }

    /// Completed tasks with enough translated text can be summarized.
    pub fn is_summarizable(&self) -> bool {
        self.status == TaskStatus::Completed && self.translated_chars() > MIN_SUMMARY_TEXT_CHARS
    }

    /// Drops fields that contradict the task's status.
    ///
    /// An errored task never carries a translation and a processing task never
    /// carries a summary.
    pub fn normalized(mut self) -> Self {
        match self.status {
            TaskStatus::Error if self.translated_text.is_some() => {
                log::debug!("Dropping translated text from errored task {}", self.id);
                self.translated_text = None;
            }
            TaskStatus::Processing if self.summary.is_some() => {
                log::debug!("Dropping summary from processing task {}", self.id);
                self.summary = None;
            }
            _ => {}
        }
        self
    }
}

/// Aggregate computed by the service over all tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardSnapshot {
    pub total_documents: u64,
    pub completed: u64,
    pub processing: u64,
    pub errors: u64,
    pub malayalam_documents: u64,
    /// Percentage in `[0, 100]`.
    pub success_rate: f64,
    #[serde(default)]
    pub recent_results: Vec<Task>,
}

/// Response to `POST /api/upload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    pub id: String,
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Response to `POST /api/summarize/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummarizeResponse {
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub summary_type: SummaryKind,
}

/// Service readiness flags from `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, with = "timestamp::option")]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub tesseract_ready: bool,
    #[serde(default)]
    pub malayalam_ocr_enabled: bool,
    #[serde(default)]
    pub upload_dir: String,
    #[serde(default)]
    pub active_tasks: u64,
    #[serde(default)]
    pub total_processed: u64,
}

/// Wire timestamps: naive ISO-8601 from the service, RFC 3339 tolerated.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s, FORMAT)
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", s)))
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(s) => super::parse(&s).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp '{}'", s))
                }),
                None => Ok(None),
            }
        }
    }
}
