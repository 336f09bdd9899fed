//! Authenticated session and article link discovery.
//!
//! One cookie-carrying HTTP client stands in for the browser session of the
//! original workflow: logging in stores the site's auth cookies in the jar,
//! and every later page load and audio download rides on the same client.
//!
//! # Link discovery
//!
//! Articles are linked from the listing page with site-relative URLs. Every
//! anchor is collected, filtered to the configured path prefix, and resolved
//! to an absolute URL against the listing page, preserving document order.
//! Duplicates are kept and treated as independent downloads.

use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Whole-request ceiling; bounds a hung page load or stalled transfer so one
/// bad item cannot stall its window forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

const USER_AGENT: &str = concat!("audible_news/", env!("CARGO_PKG_VERSION"));

/// Fatal errors while establishing the session or harvesting links.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// A configured URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
    },

    /// Network-level failure reaching the site.
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The site answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// The URL that failed.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

impl SessionError {
    fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }
}

/// A per-task error: one article page failed to load.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// Network-level failure loading the article page.
    #[error("network error loading {url}: {source}")]
    Network {
        /// The article URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The article page answered with a non-success status.
    #[error("HTTP {status} loading {url}")]
    Status {
        /// The article URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

/// An authenticated browsing session against the news site.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
}

impl Session {
    /// Log in against the configured auth endpoint.
    ///
    /// Loads the endpoint once so any pre-auth cookies are set, then submits
    /// the credentials as an `email`/`password` form post. The resulting
    /// cookie jar authenticates every later request made through this
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the client cannot be built, the
    /// endpoint is unreachable, or either request answers with a non-success
    /// status.
    #[instrument(level = "info", skip_all, fields(%auth_url))]
    pub async fn login(
        auth_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, SessionError> {
        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| SessionError::Client { source })?;

        let form_page = client
            .get(auth_url)
            .send()
            .await
            .map_err(|e| SessionError::network(auth_url, e))?;
        if !form_page.status().is_success() {
            return Err(SessionError::status(auth_url, form_page.status().as_u16()));
        }

        let response = client
            .post(auth_url)
            .form(&[("email", username), ("password", password)])
            .send()
            .await
            .map_err(|e| SessionError::network(auth_url, e))?;
        if !response.status().is_success() {
            return Err(SessionError::status(auth_url, response.status().as_u16()));
        }

        info!("authenticated");
        Ok(Self { client })
    }

    /// The underlying HTTP client, for audio downloads over the same cookies.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Harvest article links from the listing page.
    ///
    /// Keeps every anchor whose `href` starts with `prefix`, resolved to an
    /// absolute URL against the listing page, in document order. No
    /// deduplication.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the listing page cannot be fetched.
    #[instrument(level = "info", skip(self))]
    pub async fn discover_links(
        &self,
        source_page: &str,
        prefix: &str,
    ) -> Result<Vec<String>, SessionError> {
        let base = Url::parse(source_page).map_err(|_| SessionError::InvalidUrl {
            url: source_page.to_string(),
        })?;

        let response = self
            .client
            .get(source_page)
            .send()
            .await
            .map_err(|e| SessionError::network(source_page, e))?;
        if !response.status().is_success() {
            return Err(SessionError::status(
                source_page,
                response.status().as_u16(),
            ));
        }
        let html = response
            .text()
            .await
            .map_err(|e| SessionError::network(source_page, e))?;

        let document = Html::parse_document(&html);
        let mut links = Vec::new();
        for element in document.select(&ANCHOR_SELECTOR) {
            if let Some(href) = element.value().attr("href") {
                if href.starts_with(prefix) {
                    if let Ok(resolved) = base.join(href) {
                        links.push(resolved.to_string());
                    }
                }
            }
        }

        info!(count = links.len(), source = source_page, "Indexed article links");
        debug!(urls = ?links, "Article links");

        Ok(links)
    }

    /// Load one article page over the authenticated session.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError`] when the page is unreachable or answers
    /// with a non-success status.
    #[instrument(level = "debug", skip_all, fields(%url))]
    pub async fn article_html(&self, url: &str) -> Result<String, NavigationError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| NavigationError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NavigationError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| NavigationError::Network {
            url: url.to_string(),
            source,
        })
    }
}
