//! State module for the values flowing through the pipeline
//!
//! # Components
//!
//! - `Entry`: one discovered media item, re-indexed once at merge time
//! - `CrawlJob` / `CrawlResult`: one listing page and its outcome
//! - `DownloadJob` / `DownloadResult`: one selected entry and its outcome

mod entry;
mod job;

// Re-export main types
pub use entry::{Entry, SourceOrigin};
pub use job::{CrawlJob, CrawlResult, DownloadJob, DownloadResult, JobState};
