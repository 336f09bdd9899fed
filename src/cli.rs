//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every value can be provided as a flag or an environment variable; the five
//! site/credential values are required, and the process refuses to start when
//! any of them is missing — clap reports the gap before any network activity.

use clap::Parser;

/// Command-line arguments for the audio edition downloader.
///
/// # Examples
///
/// ```sh
/// # Everything as flags
/// audible_news --username reader@example.com --password secret \
///     --auth-url https://news.example.com/login \
///     --output-dir ./audio \
///     --source-page https://news.example.com/the-world-ahead
///
/// # Credentials from the environment
/// NEWS_USERNAME=reader@example.com NEWS_PASSWORD=secret \
///     NEWS_AUTH_URL=https://news.example.com/login \
///     OUTPUT_DIR=./audio \
///     SOURCE_PAGE=https://news.example.com/the-world-ahead \
///     audible_news
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Login identity for the news site
    #[arg(long, env = "NEWS_USERNAME")]
    pub username: String,

    /// Login secret for the news site
    #[arg(long, env = "NEWS_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// URL where the login form is served
    #[arg(long, env = "NEWS_AUTH_URL")]
    pub auth_url: String,

    /// Directory the audio files are written to
    #[arg(short, long, env = "OUTPUT_DIR")]
    pub output_dir: String,

    /// Listing page whose article links are harvested
    #[arg(short, long, env = "SOURCE_PAGE")]
    pub source_page: String,

    /// URL-path prefix an anchor must start with to count as an article
    #[arg(long, env = "ARTICLE_PREFIX", default_value = "/the-world-ahead/20")]
    pub article_prefix: String,

    /// How many downloads run concurrently in one window
    #[arg(short, long, env = "CONCURRENCY", default_value_t = 5)]
    pub concurrency: usize,
}
