use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::{broadcast, Notify};
use tracing_subscriber::EnvFilter;

use docdash::store::StoreEvent;
use docdash::view;
use docdash::{ClientConfig, DocDashError, PollScheduler, SyncController, UploadFile};

const DEFAULT_LOG_FILTER: &str = "docdash=info,reqwest=warn";

#[derive(Parser)]
#[command(name = "docdash")]
#[command(version, about = "Follow OCR, translation and summary tasks on a document service")]
struct Cli {
    /// JSON config file (baseUrl, pollIntervalMs, recentLimit)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep the task list in sync and print changes as they happen
    Watch {
        /// Exit once no task is processing
        #[arg(long)]
        until_idle: bool,
    },
    /// List all tasks, newest first
    List {
        /// Only tasks that can be summarized
        #[arg(long)]
        summarizable: bool,

        /// Show at most this many tasks
        #[arg(long, value_name = "N")]
        recent: Option<usize>,
    },
    /// Show the aggregate dashboard
    Dashboard,
    /// Upload a document and follow it until processing finishes
    Upload {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Return right after the upload is accepted
        #[arg(long)]
        no_follow: bool,
    },
    /// Delete a task
    Delete {
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
    /// Generate a summary for a completed task
    Summarize {
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
    /// Show one task in detail
    Status {
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
    /// Show service readiness
    Health,
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    tracing_log::LogTracer::init().context("Failed to bridge log records")?;
    Ok(())
}

/// Turns a library error into the message shown on the terminal.
fn user_error(err: DocDashError) -> anyhow::Error {
    anyhow!(err.user_message())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config = ClientConfig::load(cli.config.as_deref())?;
    let controller = Arc::new(SyncController::from_config(&config)?);

    match cli.command {
        Commands::Watch { until_idle } => watch(controller, &config, until_idle).await?,
        Commands::List {
            summarizable,
            recent,
        } => {
            controller.refresh().await.map_err(user_error)?;
            let tasks = if summarizable {
                controller.summarizable_tasks()
            } else {
                controller.tasks()
            };
            let limit = recent.unwrap_or(tasks.len());
            if tasks.is_empty() {
                println!("No tasks");
            }
            for task in view::newest_first(&tasks, limit) {
                println!("{}", view::render_task_line(task));
            }
        }
        Commands::Dashboard => {
            controller.refresh().await.map_err(user_error)?;
            if let Some(dashboard) = controller.dashboard() {
                print!("{}", view::render_dashboard(&dashboard));
            }
        }
        Commands::Upload { file, no_follow } => {
            upload(&controller, &config, file, no_follow).await?;
        }
        Commands::Delete { id } => {
            controller.delete(&id).await.map_err(user_error)?;
            println!("Deleted {}", id);
        }
        Commands::Summarize { id } => {
            controller.refresh().await.map_err(user_error)?;
            println!("Generating summary for {}...", id);
            let summary = controller.request_summary(&id).await.map_err(user_error)?;
            print!("{}", view::render_summary(&summary));
        }
        Commands::Status { id } => match controller.refresh_task(&id).await.map_err(user_error)? {
            Some(task) => print!("{}", view::render_task(&task)),
            None => println!("Task {} not found", id),
        },
        Commands::Health => {
            let health = controller.health().await.map_err(user_error)?;
            print!("{}", view::render_health(&health));
        }
    }

    Ok(())
}

async fn watch(controller: Arc<SyncController>, config: &ClientConfig, until_idle: bool) -> Result<()> {
    let interrupted = Arc::new(Notify::new());
    let handler_notify = Arc::clone(&interrupted);
    ctrlc::set_handler(move || handler_notify.notify_one())
        .context("Failed to install Ctrl-C handler")?;

    let mut events = controller.subscribe();
    let scheduler = PollScheduler::new(Arc::clone(&controller), config.poll_interval);
    let handle = scheduler.start();

    loop {
        tokio::select! {
            _ = interrupted.notified() => {
                log::info!("Interrupted, stopping");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    println!("{}", event);
                    if until_idle && matches!(event, StoreEvent::Reconciled { processing: 0, .. }) {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    log::warn!("Missed {} store events", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    scheduler.stop();
    if let Err(e) = handle.await {
        log::warn!("Poll scheduler ended abnormally: {}", e);
    }

    for task in controller.recent(config.recent_limit) {
        println!("{}", view::render_task_line(&task));
    }
    Ok(())
}

async fn upload(
    controller: &SyncController,
    config: &ClientConfig,
    path: PathBuf,
    no_follow: bool,
) -> Result<()> {
    let upload_failed =
        |err: DocDashError| anyhow!("Upload failed. Please try again. ({})", err.user_message());

    let file = UploadFile::from_path(&path).await.map_err(upload_failed)?;
    let task = controller.upload(file).await.map_err(upload_failed)?;
    println!("{}", view::render_task_line(&task));

    if no_follow {
        return Ok(());
    }

    let mut last_progress = task.progress;
    loop {
        tokio::time::sleep(config.poll_interval).await;
        match controller.refresh_task(&task.id).await {
            Ok(Some(current)) if current.is_finished() => {
                print!("{}", view::render_task(&current));
                return Ok(());
            }
            Ok(Some(current)) => {
                if current.progress != last_progress {
                    last_progress = current.progress;
                    println!("{}", view::render_task_line(&current));
                }
            }
            Ok(None) => {
                println!("Task {} no longer exists", task.id);
                return Ok(());
            }
            // Transient; try again on the next tick.
            Err(e) => log::debug!("Status poll failed: {}", e),
        }
    }
}
