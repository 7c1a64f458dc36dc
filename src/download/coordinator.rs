//! Download orchestration
//!
//! Selected entries are numbered up front, then resolved and streamed to disk
//! over a bounded worker pool. A failing entry never stops its siblings.

use super::naming::{file_name, next_file_number};
use crate::config::{Config, DownloadConfig};
use crate::crawler::{is_audio_content_type, FetchError, Fetcher, HeaderProfiles};
use crate::output::{emit, EventSink, JobEvent, JobKind};
use crate::resolver::AssetResolver;
use crate::state::{DownloadJob, DownloadResult, Entry, JobState};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Aggregate outcome of a download batch
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub destination: PathBuf,
    pub succeeded: usize,
    pub failed: usize,
    pub total_bytes: u64,
    /// Per-job outcomes, ascending by file number
    pub results: Vec<DownloadResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DownloadReport {
    /// Number of jobs in the batch
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Fraction of jobs that succeeded, in `0.0..=1.0`
    pub fn success_ratio(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total() as f64
        }
    }
}

/// Assigns gapless file numbers to `entries[start - 1..end]`
///
/// Numbering starts at `first_number`. The range, and room for its numbers
/// below `u32::MAX`, must already be validated.
pub fn plan_jobs(
    entries: &[Entry],
    start: usize,
    end: usize,
    first_number: u32,
) -> Vec<DownloadJob> {
    entries[start - 1..end]
        .iter()
        .zip(first_number..)
        .map(|(entry, file_number)| DownloadJob {
            entry: entry.clone(),
            file_number,
        })
        .collect()
}

/// Drives download jobs over a bounded worker pool
pub struct DownloadOrchestrator {
    fetcher: Fetcher,
    resolver: AssetResolver,
    profiles: HeaderProfiles,
    config: DownloadConfig,
    retry_delay: Duration,
    events: Option<EventSink>,
}

impl DownloadOrchestrator {
    /// Creates an orchestrator sharing `fetcher`'s connection pool
    pub fn new(config: &Config, fetcher: Fetcher) -> Result<Self, HarvestError> {
        Ok(Self {
            resolver: AssetResolver::new(config, fetcher.clone())?,
            profiles: HeaderProfiles::from_config(&config.headers)?,
            config: config.download.clone(),
            retry_delay: Duration::from_millis(config.crawler.request_delay_ms),
            fetcher,
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

    /// Downloads entries `start..=end` (1-based) into `destination`
    ///
    /// # Arguments
    ///
    /// * `entries` - The merged entry sequence
    /// * `start` / `end` - Inclusive 1-based index range into `entries`
    /// * `destination` - Target directory, created if missing
    ///
    /// # Returns
    ///
    /// * `Ok(DownloadReport)` - Per-job outcomes and totals
    /// * `Err(HarvestError)` - Invalid range (nothing touched on disk) or a
    ///   destination that cannot be created or scanned
    pub async fn download_range(
        &self,
        entries: &[Entry],
        start: usize,
        end: usize,
        destination: impl AsRef<Path>,
    ) -> Result<DownloadReport, HarvestError> {
        if start < 1 || start > end || end > entries.len() {
            return Err(HarvestError::validation(format!(
                "invalid range {}..={} for {} entries",
                start,
                end,
                entries.len()
            )));
        }

        let destination = destination.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&destination).await?;

        let first_number = next_file_number(&destination).await?;
        let span = u32::try_from(end - start).ok();
        if span.and_then(|span| first_number.checked_add(span)).is_none() {
            return Err(HarvestError::validation(format!(
                "{} files numbered from {} would exceed the largest file number",
                end - start + 1,
                first_number
            )));
        }
        let jobs = plan_jobs(entries, start, end, first_number);
        let width = self.config.concurrency.max(1) as usize;
        let started_at = Utc::now();

        tracing::info!(
            "Downloading entries {}-{} ({} files, numbered from {:03}) into {} with {} workers",
            start,
            end,
            jobs.len(),
            first_number,
            destination.display(),
            width
        );

        let total = jobs.len();
        let mut results = Vec::with_capacity(total);
        let mut succeeded = 0;
        let mut failed = 0;
        let mut total_bytes = 0;

        {
            let mut pool = stream::iter(jobs)
                .map(|job| self.run_job(job, &destination))
                .buffer_unordered(width);

            while let Some(result) = pool.next().await {
                if result.success {
                    succeeded += 1;
                    total_bytes += result.bytes_written;
                } else {
                    failed += 1;
                }
                tracing::info!(
                    "Download progress: {}/{} ({} ok, {} failed)",
                    succeeded + failed,
                    total,
                    succeeded,
                    failed
                );
                results.push(result);
            }
        }

        results.sort_by_key(|r| r.file_number);

        Ok(DownloadReport {
            destination,
            succeeded,
            failed,
            total_bytes,
            results,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Resolves and downloads a single entry
    async fn run_job(&self, job: DownloadJob, destination: &Path) -> DownloadResult {
        let DownloadJob { entry, file_number } = job;
        emit(
            self.events.as_ref(),
            JobEvent::new(JobKind::Download, entry.index, JobState::Dispatched),
        );

        let filename = file_name(file_number, &entry.title);
        let resolved = self.resolver.resolve_entry(&entry).await;
        let path = destination.join(&filename);

        let outcome = self.fetch_to_file(&resolved, &path).await;

        let result = match outcome {
            Ok(bytes_written) => {
                tracing::info!("Saved {} ({} bytes)", filename, bytes_written);
                DownloadResult {
                    entry_index: entry.index,
                    file_number,
                    success: true,
                    bytes_written,
                    error: None,
                    filename,
                    resolved_url: Some(resolved),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to download '{}': {}", entry.title, e);
                DownloadResult {
                    entry_index: entry.index,
                    file_number,
                    success: false,
                    bytes_written: 0,
                    error: Some(e.to_string()),
                    filename,
                    resolved_url: Some(resolved),
                }
            }
        };

        let state = match &result.error {
            None => JobState::Succeeded,
            Some(reason) => JobState::Failed(reason.clone()),
        };
        emit(
            self.events.as_ref(),
            JobEvent::new(JobKind::Download, entry.index, state),
        );

        result
    }

    /// Streams `url` into `path` through a `.part` file
    ///
    /// The partial file is renamed into place only after the whole body was
    /// written, and removed on any failure.
    async fn fetch_to_file(&self, url: &str, path: &Path) -> Result<u64, HarvestError> {
        let response = self.open_with_fallback(url).await?;

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_audio_content_type(content_type) {
                tracing::warn!("{} served as '{}', saving anyway", url, content_type);
            }
        }

        let part_path = part_path(path);
        match write_body(url, response, &part_path).await {
            Ok(bytes) => {
                tokio::fs::rename(&part_path, path).await?;
                Ok(bytes)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part_path).await;
                Err(e)
            }
        }
    }

    /// Opens the transfer, retrying once with the alternate profile
    async fn open_with_fallback(&self, url: &str) -> Result<Response, FetchError> {
        let timeout = Duration::from_secs(self.config.timeout_secs);

        match self.fetcher.open(url, &self.profiles.primary, timeout).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    "{} with profile '{}', retrying with '{}'",
                    e,
                    self.profiles.primary.name(),
                    self.profiles.alternate.name()
                );
                if !self.retry_delay.is_zero() {
                    tokio::time::sleep(self.retry_delay).await;
                }
                self.fetcher
                    .open(url, &self.profiles.alternate, timeout)
                    .await
            }
            Err(e) => Err(e),
        }
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

async fn write_body(url: &str, mut response: Response, path: &Path) -> Result<u64, HarvestError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}
