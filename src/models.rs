//! Data models for the download pipeline.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ArticleAudio`]: What the extractor pulls out of one article page
//! - [`DownloadTask`]: One article link paired with its stable global index
//! - [`DownloadReport`]: End-of-run accounting returned by the batch loop

/// The audio narration extracted from one article page.
///
/// This is a transient value: it exists only between extracting an article
/// and fetching its audio file.
///
/// # Fields
///
/// * `sanitized_title` - The article heading with every character outside
///   `[A-Za-z0-9]` replaced by `-`, safe to embed in a filename
/// * `audio_url` - The audio element's declared source attribute, verbatim
///   (may still be relative to the article URL)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleAudio {
    /// Filesystem-safe article title.
    pub sanitized_title: String,
    /// Declared source of the article's audio element.
    pub audio_url: String,
}

/// One unit of work for the batch loop: an article link and its position.
///
/// The index is the link's position in the discovered list and determines the
/// output filename (`{index}-{title}.mp3`), so it stays stable for the whole
/// run regardless of which window the task lands in.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// Global position of the link in the discovered list.
    pub index: usize,
    /// The article page URL.
    pub link: String,
}

impl DownloadTask {
    /// Output filename for this task: `{index}-{sanitizedTitle}.mp3`.
    pub fn file_name(&self, sanitized_title: &str) -> String {
        format!("{}-{}.mp3", self.index, sanitized_title)
    }
}

/// End-of-run accounting for a batch of downloads.
///
/// Built by the batch loop from per-task results; read once at the end of the
/// run for console reporting.
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// How many tasks were attempted (always the number of input links).
    pub attempted: usize,
    /// Links whose task failed at any step, in completion order.
    pub failures: Vec<String>,
}

impl DownloadReport {
    /// Number of tasks that completed successfully.
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    /// The end-of-run summary line printed to the console.
    pub fn summary(&self) -> String {
        format!("Failed to download {} files", self.failures.len())
    }
}
