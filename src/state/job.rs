/// Job and result types for the two worker pools
use crate::state::Entry;
use std::fmt;

/// Transition of a single job, as reported on the event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Job was handed to the pool
    Dispatched,

    /// Job finished successfully
    Succeeded,

    /// Job finished with a terminal failure
    Failed(String),
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatched => write!(f, "dispatched"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// One listing page to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    pub page_url: String,
    pub page_number: u32,
}

/// Outcome of one crawl job
#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub page_number: u32,
    pub success: bool,
    /// Entries in discovery order, with page-local indices
    pub entries: Vec<Entry>,
    pub error: Option<String>,
}

impl CrawlResult {
    pub fn succeeded(page_number: u32, entries: Vec<Entry>) -> Self {
        Self {
            page_number,
            success: true,
            entries,
            error: None,
        }
    }

    pub fn failed(page_number: u32, error: impl Into<String>) -> Self {
        Self {
            page_number,
            success: false,
            entries: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// One selected entry with its pre-assigned file number
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub entry: Entry,
    pub file_number: u32,
}

/// Outcome of one download job
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub entry_index: usize,
    pub file_number: u32,
    pub success: bool,
    pub bytes_written: u64,
    pub error: Option<String>,
    pub filename: String,
    /// URL the asset was actually fetched from
    pub resolved_url: Option<String>,
}
