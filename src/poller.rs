use config::ConfigError;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::{AppConfig, PollerConfig};
use crate::extractor::ListingExtractor;
use crate::fetcher::PageFetcher;
use crate::formatter::NotificationFormatter;
use crate::models::{SearchSpec, canonicalize_url};
use crate::notifier::Notifier;
use crate::seen_index::SeenIndex;
use crate::utils::error::{AppError, Result};
use crate::web::PullBuffer;

/// Where the poller is within a cycle. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    FetchingSearch,
    FilteringResults,
    FetchingListing,
    Extracting,
    Formatting,
    Notifying,
    Sleeping,
}

/// Counters for one pass over all searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub searches_checked: usize,
    pub searches_failed: usize,
    pub candidates: usize,
    pub listings_failed: usize,
    pub new_listings: usize,
    pub notified: bool,
}

/// Link filtering rules applied to every search results page.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub delay: Duration,
    pub link_selector: String,
    pub item_url_pattern: Regex,
    pub ignore_listing: Option<String>,
}

impl PollSettings {
    pub fn from_config(config: &PollerConfig) -> Result<Self> {
        let item_url_pattern = Regex::new(&config.item_url_pattern)
            .map_err(|e| ConfigError::Message(format!("Invalid item_url_pattern: {}", e)))?;

        Ok(Self {
            delay: Duration::from_secs(config.delay_secs),
            link_selector: config.link_selector.clone(),
            item_url_pattern,
            ignore_listing: config.ignore_listing.as_deref().map(canonicalize_url),
        })
    }
}

/// Runs polling cycles: every search, then every new listing on it, strictly
/// one request at a time.
///
/// A new listing is recorded in the seen index right after it is formatted,
/// before the batch is sent. A failed send therefore never causes the same
/// listing to be reported twice.
pub struct Poller {
    searches: Vec<SearchSpec>,
    settings: PollSettings,
    fetcher: Box<dyn PageFetcher>,
    notifier: Arc<dyn Notifier>,
    extractor: ListingExtractor,
    formatter: NotificationFormatter,
    seen: SeenIndex,
    buffer: Option<PullBuffer>,
    state: PollState,
}

impl Poller {
    pub fn new(
        searches: Vec<SearchSpec>,
        settings: PollSettings,
        fetcher: Box<dyn PageFetcher>,
        notifier: Arc<dyn Notifier>,
        formatter: NotificationFormatter,
        seen: SeenIndex,
    ) -> Self {
        Self {
            searches,
            settings,
            fetcher,
            notifier,
            extractor: ListingExtractor::new(),
            formatter,
            seen,
            buffer: None,
            state: PollState::Idle,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        fetcher: Box<dyn PageFetcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let seen = if config.storage.track_seen {
            SeenIndex::load(&config.storage.path)
        } else {
            SeenIndex::in_memory()
        };

        Ok(Self::new(
            config.searches.clone(),
            PollSettings::from_config(&config.poller)?,
            fetcher,
            notifier,
            NotificationFormatter::from_source(&config.message),
            seen,
        ))
    }

    /// Also copy every new listing into `buffer` for the pull endpoint.
    pub fn with_pull_buffer(mut self, buffer: PullBuffer) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn seen(&self) -> &SeenIndex {
        &self.seen
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Poll forever, sleeping between cycles.
    pub async fn run(&mut self) {
        loop {
            let report = self.run_cycle().await;
            tracing::info!(
                "Cycle finished: {} searches ({} failed), {} candidates, {} new, {} failed listings",
                report.searches_checked,
                report.searches_failed,
                report.candidates,
                report.new_listings,
                report.listings_failed
            );

            self.transition(PollState::Sleeping);
            tokio::time::sleep(self.settings.delay).await;
        }
    }

    /// One full pass over all searches, ending with at most one notification.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();
        let mut batch: Vec<String> = Vec::new();

        for index in 0..self.searches.len() {
            let search = self.searches[index].clone();
            report.searches_checked += 1;

            let candidates = match self.collect_candidates(&search).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::warn!("Could not load search page {}: {}", search.url, e);
                    report.searches_failed += 1;
                    continue;
                }
            };
            report.candidates += candidates.len();

            for url in candidates {
                match self.process_listing(&search, &url).await {
                    Ok(message) => {
                        batch.push(message);
                        report.new_listings += 1;
                    }
                    Err(e) => {
                        tracing::warn!("Skipping listing {}: {}", url, e);
                        report.listings_failed += 1;
                    }
                }
            }
        }

        if !batch.is_empty() {
            self.transition(PollState::Notifying);
            match self.notifier.send(&batch.join("\r\n")).await {
                Ok(()) => report.notified = true,
                Err(e) => tracing::error!("Could not send notification for {} listings: {}", batch.len(), e),
            }
        }

        self.transition(PollState::Idle);
        report
    }

    /// Fetch the results page for `search` and return the canonical URLs of
    /// listings not yet seen for it, in document order.
    async fn collect_candidates(&mut self, search: &SearchSpec) -> Result<Vec<String>> {
        self.transition(PollState::FetchingSearch);
        tracing::info!("Searching with {}", search.url);

        let links: Vec<Option<String>> = {
            let doc = self.fetcher.fetch(&search.url).await?;
            doc.find_all(&self.settings.link_selector)
                .into_iter()
                .map(|node| node.attr("href").map(str::to_string))
                .collect()
        };

        self.transition(PollState::FilteringResults);
        let base = Url::parse(&search.url).ok();
        let mut candidates: Vec<String> = Vec::new();
        for (position, href) in links.into_iter().enumerate() {
            let Some(href) = href else {
                continue;
            };

            let url = canonicalize_url(&resolve_href(base.as_ref(), &href));
            if !self.settings.item_url_pattern.is_match(&url) {
                tracing::debug!("url is not an item listing, skipping it: {}", url);
                continue;
            }
            if self.settings.ignore_listing.as_deref() == Some(url.as_str()) {
                continue;
            }
            if self.seen.has(&search.url, &url) {
                if position == 0 {
                    tracing::info!("Found nothing new since last check for {}", search.url);
                }
                continue;
            }
            if candidates.contains(&url) {
                continue;
            }
            candidates.push(url);
        }

        tracing::debug!("{} unseen listings on {}", candidates.len(), search.url);
        Ok(candidates)
    }

    /// Fetch, extract and format one listing, then record it as seen.
    async fn process_listing(&mut self, search: &SearchSpec, url: &str) -> Result<String> {
        self.transition(PollState::FetchingListing);
        tracing::info!("Visiting new item page {}", url);

        let listing = {
            let doc = self.fetcher.fetch(url).await?;
            self.transition(PollState::Extracting);
            self.extractor.extract(url, &search.currency, doc.as_ref())?
        };
        tracing::debug!("Got listing details for {}", url);

        self.transition(PollState::Formatting);
        let message = self.formatter.format(&listing);

        if let Some(buffer) = &self.buffer {
            buffer.push(listing);
        }

        if let Err(e) = self.seen.record(&search.url, url) {
            tracing::error!("Could not persist seen index: {}", e);
        }

        Ok(message)
    }

    fn transition(&mut self, next: PollState) {
        tracing::trace!("Poller state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Resolve a link found on a results page against the page's own URL.
fn resolve_href(base: Option<&Url>, href: &str) -> String {
    match base.map(|base| base.join(href)) {
        Some(Ok(url)) => url.to_string(),
        _ => href.to_string(),
    }
}
