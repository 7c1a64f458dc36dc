//! Crawl orchestration - fans listing pages out over a bounded pool
//!
//! This module contains the crawl loop that coordinates:
//! - Building one job per listing page
//! - Fetching pages concurrently (primary profile, then alternate once)
//! - Extracting entries from each page
//! - Merging per-page results by page number, never by completion order

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{Fetcher, HeaderProfiles};
use crate::extract::EntryExtractor;
use crate::output::{emit, EventSink, JobEvent, JobKind};
use crate::state::{CrawlJob, CrawlResult, Entry, JobState};
use crate::url::build_crawl_jobs;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::time::Duration;

/// Merged outcome of a crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Entries ordered by page, densely indexed from 1
    pub entries: Vec<Entry>,

    /// Number of pages in the requested range
    pub total_pages: usize,

    /// Pages fetched and parsed (including pages with zero entries)
    pub succeeded_pages: usize,

    /// Pages whose fetch failed with both header profiles
    pub failed_pages: usize,

    /// Failure reason per failed page, ascending by page
    pub failures: Vec<(u32, String)>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Fraction of pages that succeeded, in `0.0..=1.0`
    pub fn success_ratio(&self) -> f64 {
        if self.total_pages == 0 {
            0.0
        } else {
            self.succeeded_pages as f64 / self.total_pages as f64
        }
    }
}

/// Merges per-page results into one page-ordered sequence
///
/// Results may arrive in any order. Failed pages contribute nothing. Every
/// surviving entry is tagged with its page and re-indexed from 1.
pub fn merge_results<I>(results: I) -> Vec<Entry>
where
    I: IntoIterator<Item = CrawlResult>,
{
    let by_page: BTreeMap<u32, CrawlResult> = results
        .into_iter()
        .map(|result| (result.page_number, result))
        .collect();

    let mut merged = Vec::new();
    for (page_number, result) in by_page {
        if !result.success {
            continue;
        }
        for mut entry in result.entries {
            entry.page = page_number;
            entry.index = merged.len() + 1;
            merged.push(entry);
        }
    }
    merged
}

/// Drives listing-page jobs over a bounded worker pool
pub struct CrawlOrchestrator {
    fetcher: Fetcher,
    profiles: HeaderProfiles,
    extractor: EntryExtractor,
    config: CrawlerConfig,
    events: Option<EventSink>,
}

impl CrawlOrchestrator {
    /// Creates an orchestrator from the harvest configuration
    pub fn new(config: &Config, fetcher: Fetcher) -> Result<Self, HarvestError> {
        Ok(Self {
            fetcher,
            profiles: HeaderProfiles::from_config(&config.headers)?,
            extractor: EntryExtractor::new(&config.extractor)?,
            config: config.crawler.clone(),
            events: None,
        })
    }

    /// Overrides the configured worker-pool width
    pub fn with_concurrency(mut self, concurrency: u32) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Attaches a job event sink
    pub fn with_events(mut self, sink: EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    /// Crawls `start_page..=end_page` of `base_url`
    ///
    /// Returns a validation error for an empty or zero-based range before any
    /// request is made. A failing page never aborts the crawl; it is counted
    /// in the report and its entries are absent.
    pub async fn crawl(
        &self,
        base_url: &str,
        start_page: u32,
        end_page: u32,
    ) -> Result<CrawlReport, HarvestError> {
        if start_page < 1 || start_page > end_page {
            return Err(HarvestError::validation(format!(
                "invalid page range {}..={}: pages start at 1 and start must not exceed end",
                start_page, end_page
            )));
        }

        let jobs = build_crawl_jobs(base_url, &self.config.page_param, start_page, end_page)?;
        let total_pages = jobs.len();
        let width = self.config.concurrency.max(1) as usize;
        let started_at = Utc::now();

        tracing::info!(
            "Crawling pages {}-{} ({} pages) with {} workers",
            start_page,
            end_page,
            total_pages,
            width
        );

        // The consuming loop below is the only owner of the tallies
        let mut results = Vec::with_capacity(total_pages);
        let mut succeeded_pages = 0;
        let mut failed_pages = 0;
        let mut failures = Vec::new();

        let mut pool = stream::iter(jobs)
            .map(|job| self.run_job(job))
            .buffer_unordered(width);

        while let Some(result) = pool.next().await {
            if result.success {
                succeeded_pages += 1;
            } else {
                failed_pages += 1;
                failures.push((
                    result.page_number,
                    result.error.clone().unwrap_or_default(),
                ));
            }

            tracing::info!(
                "Crawl progress: {}/{} pages ({} ok, {} failed)",
                succeeded_pages + failed_pages,
                total_pages,
                succeeded_pages,
                failed_pages
            );
            results.push(result);
        }

        failures.sort_by_key(|(page, _)| *page);
        let entries = merge_results(results);

        tracing::info!(
            "Merged {} entries from {}/{} pages",
            entries.len(),
            succeeded_pages,
            total_pages
        );

        Ok(CrawlReport {
            entries,
            total_pages,
            succeeded_pages,
            failed_pages,
            failures,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Fetches and extracts a single listing page
    async fn run_job(&self, job: CrawlJob) -> CrawlResult {
        let page = job.page_number;
        emit(
            self.events.as_ref(),
            JobEvent::new(JobKind::Crawl, page as usize, JobState::Dispatched),
        );
        tracing::debug!("Fetching page {}: {}", page, job.page_url);

        let delay = Duration::from_millis(self.config.request_delay_ms);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let result = match self
            .fetcher
            .get_with_fallback(&job.page_url, &self.profiles, timeout, delay)
            .await
        {
            Ok(response) => {
                let entries = self
                    .extractor
                    .extract(&response.body, &response.final_url)
                    .into_iter()
                    .map(|entry| entry.with_page(page))
                    .collect::<Vec<_>>();

                if entries.is_empty() {
                    tracing::info!("Page {}: no entries found", page);
                } else {
                    tracing::info!("Page {}: {} entries", page, entries.len());
                }
                CrawlResult::succeeded(page, entries)
            }
            Err(e) => {
                tracing::warn!("Page {} failed: {}", page, e);
                CrawlResult::failed(page, e.to_string())
            }
        };

        let state = match &result.error {
            None => JobState::Succeeded,
            Some(reason) => JobState::Failed(reason.clone()),
        };
        emit(
            self.events.as_ref(),
            JobEvent::new(JobKind::Crawl, page as usize, state),
        );

        result
    }
}
