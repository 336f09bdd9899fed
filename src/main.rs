//! # Audible News
//!
//! Downloads the narrated audio editions of articles from a paywalled news
//! site. The program logs in with the configured credentials, harvests
//! article links from a listing page, then downloads each article's audio
//! narration to disk as `{index}-{title}.mp3`.
//!
//! ## Usage
//!
//! ```sh
//! audible_news --username reader@example.com --password secret \
//!     --auth-url https://news.example.com/login \
//!     --output-dir ./audio \
//!     --source-page https://news.example.com/the-world-ahead
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Login**: Establish an authenticated session against the auth endpoint
//! 2. **Discovery**: Harvest article links from the listing page
//! 3. **Download**: Process links in fixed-size concurrent windows
//!    (navigate → extract audio URL → stream to disk)
//! 4. **Report**: Print the failed links, exit zero regardless
//!
//! A failing article is logged and recorded; it never aborts the run.

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod batch;
mod cli;
mod download;
mod extractor;
mod models;
mod session;

use cli::Cli;
use session::Session;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("audible_news starting up");

    // Parse CLI; clap aborts here when a required value is missing.
    let args = Cli::parse();
    debug!(?args.output_dir, ?args.source_page, concurrency = args.concurrency, "Parsed CLI arguments");

    // ---- Sign in ----
    let session = Session::login(&args.auth_url, &args.username, &args.password).await?;

    // ---- Harvest article links ----
    let links = session
        .discover_links(&args.source_page, &args.article_prefix)
        .await?;
    println!("Found {} links", links.len());

    // ---- Download all files ----
    let report = batch::run(
        &session,
        &links,
        args.concurrency,
        std::path::Path::new(&args.output_dir),
    )
    .await?;

    // ---- Report ----
    println!("{}", report.summary());
    for link in &report.failures {
        println!("{link}");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        attempted = report.attempted,
        succeeded = report.succeeded(),
        failed = report.failures.len(),
        "Execution complete"
    );

    // Partial failure is reported, not signalled: the exit code stays zero.
    Ok(())
}
