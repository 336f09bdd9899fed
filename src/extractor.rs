//! Audio extraction from article pages.
//!
//! Each article page carries its headline in a top-level `<h1>` and its
//! narration in a single `<audio>` element. The extractor reads both through
//! the narrow [`ArticlePage`] interface, so the contract stays independent of
//! the concrete HTML machinery — production code answers the two queries with
//! `scraper`, tests can answer them with a stub.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::ArticleAudio;

static HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static AUDIO_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("audio").unwrap());

/// Character substituted for everything outside `[A-Za-z0-9]` in titles.
pub const TITLE_FILLER: char = '-';

/// The two questions the extractor asks of a loaded article page.
pub trait ArticlePage {
    /// Text content of the page's top-level heading, if one exists.
    fn heading_text(&self) -> Option<String>;

    /// Declared source URL of the page's audio element, if one exists.
    fn audio_source_url(&self) -> Option<String>;
}

/// An article page parsed from raw HTML.
pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    /// Parse the HTML of an already-loaded article page.
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }
}

impl ArticlePage for HtmlPage {
    fn heading_text(&self) -> Option<String> {
        self.document
            .select(&HEADING_SELECTOR)
            .next()
            .map(|h1| h1.text().collect::<String>().trim().to_string())
    }

    fn audio_source_url(&self) -> Option<String> {
        let audio = self.document.select(&AUDIO_SELECTOR).next()?;
        match audio.value().attr("src") {
            Some(src) => Some(src.to_string()),
            None => {
                debug!("audio element present but has no src attribute");
                None
            }
        }
    }
}

/// Errors raised when an article page lacks the expected structure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// The page has no top-level heading to name the file after.
    #[error("no top-level heading found on article page")]
    MissingHeading,

    /// The page has no audio element, or the element declares no source.
    #[error("no audio source found on article page")]
    MissingAudioSource,
}

/// Read the article title and audio URL from a loaded page.
///
/// The page belongs to the caller for the duration of the call; nothing is
/// consumed or closed here. On error no partial result is returned.
///
/// # Errors
///
/// Returns [`ExtractError`] when the heading or the audio source is absent.
#[instrument(level = "debug", skip_all)]
pub fn extract(page: &impl ArticlePage) -> Result<ArticleAudio, ExtractError> {
    let title = page.heading_text().ok_or(ExtractError::MissingHeading)?;
    let audio_url = page
        .audio_source_url()
        .ok_or(ExtractError::MissingAudioSource)?;

    Ok(ArticleAudio {
        sanitized_title: sanitize_title(&title),
        audio_url,
    })
}

/// Replace every character outside `[A-Za-z0-9]` with [`TITLE_FILLER`].
///
/// Total and length-preserving, but not injective: titles differing only in
/// punctuation or spacing collapse to the same sanitized form, so two
/// articles can end up targeting the same filename.
pub fn sanitize_title(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { TITLE_FILLER })
        .collect()
}
