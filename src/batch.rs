//! Windowed batch download loop.
//!
//! Links are processed in consecutive windows of the concurrency limit: every
//! task in a window runs concurrently, and the window drains completely
//! before the next one starts. Within a window there is no ordering; across
//! windows the ordering is strict.
//!
//! Each task covers one article: load the page, extract the title and audio
//! URL, download the audio to `{index}-{title}.mp3`. A task that fails at any
//! step returns its error to the batch loop, which logs it and records the
//! link — a failure never aborts sibling tasks or later windows.

use std::io;
use std::path::Path;

use futures::future;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, error, info, instrument};

use crate::download::{self, FetchError};
use crate::extractor::{self, ExtractError, HtmlPage};
use crate::models::{DownloadReport, DownloadTask};
use crate::session::{NavigationError, Session};

/// Everything that can go wrong inside one download task.
///
/// Caught at the task boundary; converted into a failure-list entry rather
/// than propagated.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The article page failed to load.
    #[error("navigation failed: {0}")]
    Navigation(#[from] NavigationError),

    /// The article page lacked the expected structure.
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// The audio file could not be downloaded.
    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Download the audio of every linked article, `concurrency_limit` at a time.
///
/// Creates `output_dir` first if it does not exist (never touching existing
/// files), then walks the links window by window. Returns the end-of-run
/// report; per-task errors are folded into its failure list and never abort
/// the run.
///
/// # Errors
///
/// Only the output-directory creation can fail here; everything after that
/// is absorbed into the report.
#[instrument(level = "info", skip_all, fields(links = links.len(), concurrency_limit = concurrency_limit))]
pub async fn run(
    session: &Session,
    links: &[String],
    concurrency_limit: usize,
    output_dir: &Path,
) -> io::Result<DownloadReport> {
    fs::create_dir_all(output_dir).await?;

    // chunks() panics on zero.
    let limit = concurrency_limit.max(1);

    let mut report = DownloadReport {
        attempted: links.len(),
        failures: Vec::new(),
    };

    for (window_index, window) in links.chunks(limit).enumerate() {
        debug!(window = window_index, size = window.len(), "starting window");

        let tasks = window.iter().enumerate().map(|(offset, link)| {
            let task = DownloadTask {
                index: window_index * limit + offset,
                link: link.clone(),
            };
            async move {
                let outcome = process_task(session, &task, output_dir).await;
                (task.link, outcome)
            }
        });

        // The window is a barrier: every task reaches a terminal state
        // before the next window starts.
        for (link, outcome) in future::join_all(tasks).await {
            if let Err(e) = outcome {
                error!(%link, error = %e, "task failed");
                report.failures.push(link);
            }
        }
    }

    info!(
        attempted = report.attempted,
        succeeded = report.succeeded(),
        failed = report.failures.len(),
        "batch complete"
    );

    Ok(report)
}

/// One article end to end: navigate, extract, resolve, fetch.
///
/// Returns the written filename, or the first error on the way there.
async fn process_task(
    session: &Session,
    task: &DownloadTask,
    output_dir: &Path,
) -> Result<String, TaskError> {
    let html = session.article_html(&task.link).await?;

    // The parsed page is dropped before the download await.
    let audio = {
        let page = HtmlPage::parse(&html);
        extractor::extract(&page)?
    };

    let resource_url = download::absolutize(&task.link, &audio.audio_url)?;
    let file_name = task.file_name(&audio.sanitized_title);
    let dest = output_dir.join(&file_name);

    let bytes = download::fetch(session.client(), &resource_url, &dest).await?;

    println!("Downloaded {file_name}");
    info!(file = %file_name, bytes, "Downloaded audio");

    Ok(file_name)
}
