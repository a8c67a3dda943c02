//! Breadth-first crawler confined to the start URL's site.

use crate::html::{extract_links, extract_text};
use ragchat_core::config::Settings;
use ragchat_core::{Error, PageSink, Result};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use url::Url;

/// Tuning knobs of a crawl.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Pause after every fetched page
    pub delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
    /// Pages with this many characters of text or fewer are not stored
    pub min_page_chars: usize,
    pub user_agent: String,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
            min_page_chars: 500,
            user_agent: format!("ragchat/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CrawlOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            delay: Duration::from_millis(settings.crawl_delay_ms),
            timeout: Duration::from_secs(settings.fetch_timeout_secs),
            min_page_chars: settings.min_page_chars,
            ..Self::default()
        }
    }
}

/// Fetches pages and passes their text to a [`PageSink`].
pub struct Crawler {
    client: reqwest::Client,
    options: CrawlOptions,
}

impl Crawler {
    pub fn new(options: CrawlOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|e| Error::Crawl(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Crawl from `start_url`, visiting at most `max_pages` pages.
    ///
    /// Returns the number of pages stored in `sink`. Pages that fail to load or
    /// to store are logged and skipped.
    pub async fn crawl(&self, start_url: &str, max_pages: usize, sink: &dyn PageSink) -> Result<usize> {
        let mut start = Url::parse(start_url)?;
        if !matches!(start.scheme(), "http" | "https") {
            return Err(Error::Crawl(format!("unsupported URL scheme: {}", start.scheme())));
        }
        start.set_fragment(None);

        tracing::info!("Starting crawl from {} (max {} pages)", start, max_pages);

        let mut queue = VecDeque::from([start.clone()]);
        let mut queued: HashSet<String> = HashSet::from([start.to_string()]);
        let mut visited = 0usize;
        let mut processed = 0usize;

        while visited < max_pages {
            let Some(url) = queue.pop_front() else {
                break;
            };
            visited += 1;
            tracing::info!("Crawling {}", url);

            if let Some(html) = self.fetch(&url).await {
                let text = extract_text(&html);
                if text.chars().count() > self.options.min_page_chars {
                    match sink.store_page(&url, &text).await {
                        Ok(chunks) => {
                            processed += 1;
                            tracing::info!("Processed {} - added {} chunks", url, chunks);
                        }
                        Err(e) => tracing::warn!("Failed to store {}: {}", url, e),
                    }
                } else {
                    tracing::debug!("Skipping {}: too little text", url);
                }

                for link in extract_links(&html, &url) {
                    if queued.insert(link.to_string()) {
                        queue.push_back(link);
                    }
                }
            }

            if !self.options.delay.is_zero() {
                tokio::time::sleep(self.options.delay).await;
            }
        }

        tracing::info!("Crawl complete. Processed {} of {} visited pages", processed, visited);
        Ok(processed)
    }

    /// Body of a successful (200) response, `None` otherwise.
    async fn fetch(&self, url: &Url) -> Option<String> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Error fetching {}: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!("Error fetching {}: status {}", url, status);
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("Error reading {}: {}", url, e);
                None
            }
        }
    }
}
