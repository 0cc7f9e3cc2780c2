//! Read-only formatting used by the command line views.

use std::fmt::Write;

use crate::api::types::{DashboardSnapshot, HealthStatus, Task, TaskStatus, TaskSummary};

/// Translated text longer than this is cut in list previews.
pub const PREVIEW_CHARS: usize = 150;

/// Recent tasks shown on the dashboard.
pub const DASHBOARD_RECENT: usize = 5;

/// First `max` characters of `text`, with "..." appended when cut.
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

pub fn format_processing_time(seconds: f64) -> String {
    format!("{:.1}s", seconds)
}

/// Confidence in `[0, 1]` as a whole percentage.
pub fn confidence_percent(confidence: f64) -> u32 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u32
}

pub fn success_rate_percent(rate: f64) -> u32 {
    rate.clamp(0.0, 100.0).round() as u32
}

fn status_marker(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Processing => "…",
        TaskStatus::Completed => "✓",
        TaskStatus::Error => "✗",
    }
}

/// Tasks sorted newest first, limited to `limit`.
pub fn newest_first(tasks: &[Task], limit: usize) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(limit);
    sorted
}

/// One line per task: marker, id, filename and the status detail.
pub fn render_task_line(task: &Task) -> String {
    let detail = match task.status {
        TaskStatus::Processing => format!("{}% {}", task.progress, task.message),
        TaskStatus::Completed => {
            let mut detail = String::from("completed");
            if let Some(seconds) = task.processing_time {
                let _ = write!(detail, " in {}", format_processing_time(seconds));
            }
            if let Some(confidence) = task.confidence {
                let _ = write!(detail, ", {}% confidence", confidence_percent(confidence));
            }
            detail
        }
        TaskStatus::Error => format!(
            "failed: {}",
            task.error.as_deref().unwrap_or("unknown error")
        ),
    };

    format!(
        "{} {}  {}  {}",
        status_marker(task.status),
        task.id,
        task.filename,
        detail.trim_end()
    )
}

/// Multi-line detail view of one task.
pub fn render_task(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  {}", task.id, task.filename);
    let _ = writeln!(out, "  status:     {}", task.status);
    let _ = writeln!(out, "  created:    {}", task.created_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(completed_at) = task.completed_at {
        let _ = writeln!(out, "  completed:  {}", completed_at.format("%Y-%m-%d %H:%M:%S"));
    }
    if task.is_processing() {
        let _ = writeln!(out, "  progress:   {}%", task.progress);
    }
    if !task.message.is_empty() {
        let _ = writeln!(out, "  message:    {}", task.message);
    }
    if let Some(language) = &task.language {
        let _ = writeln!(out, "  language:   {}", language);
    }
    if let Some(confidence) = task.confidence {
        let _ = writeln!(out, "  confidence: {}%", confidence_percent(confidence));
    }
    if let Some(seconds) = task.processing_time {
        let _ = writeln!(out, "  time:       {}", format_processing_time(seconds));
    }
    if let Some(error) = &task.error {
        let _ = writeln!(out, "  error:      {}", error);
    }
    if let Some(text) = &task.translated_text {
        let _ = writeln!(out, "  translated: {}", preview(text, PREVIEW_CHARS));
    }
    if let Some(summary) = &task.summary {
        out.push_str(&render_summary(summary));
    }
    out
}

pub fn render_summary(summary: &TaskSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  summary ({}):", summary.summary_type);
    let _ = writeln!(out, "    {}", summary.summary);
    for point in &summary.key_points {
        let _ = writeln!(out, "    - {}", point);
    }
    out
}

pub fn render_dashboard(dashboard: &DashboardSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total documents:     {}", dashboard.total_documents);
    let _ = writeln!(out, "Completed:           {}", dashboard.completed);
    let _ = writeln!(out, "Processing:          {}", dashboard.processing);
    let _ = writeln!(out, "Errors:              {}", dashboard.errors);
    let _ = writeln!(out, "Malayalam documents: {}", dashboard.malayalam_documents);
    let _ = writeln!(
        out,
        "Success rate:        {}%",
        success_rate_percent(dashboard.success_rate)
    );

    if !dashboard.recent_results.is_empty() {
        let _ = writeln!(out, "\nRecent:");
        for task in newest_first(&dashboard.recent_results, DASHBOARD_RECENT) {
            let _ = writeln!(out, "  {}", render_task_line(task));
        }
    }
    out
}

pub fn render_health(health: &HealthStatus) -> String {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    let mut out = String::new();
    let _ = writeln!(out, "Status:          {}", health.status);
    let _ = writeln!(out, "OCR ready:       {}", yes_no(health.tesseract_ready));
    let _ = writeln!(out, "Malayalam OCR:   {}", yes_no(health.malayalam_ocr_enabled));
    let _ = writeln!(out, "Active tasks:    {}", health.active_tasks);
    let _ = writeln!(out, "Total processed: {}", health.total_processed);
    out
}
