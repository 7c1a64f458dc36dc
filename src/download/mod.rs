//! Download side of the pipeline
//!
//! This module contains:
//! - File naming: continuation scan and title sanitization
//! - The bounded download worker pool

mod coordinator;
mod naming;

pub use coordinator::{plan_jobs, DownloadOrchestrator, DownloadReport};
pub use naming::{file_name, next_file_number, numbered_prefix, sanitize_title};
