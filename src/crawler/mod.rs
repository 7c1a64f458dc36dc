//! Crawler module for listing-page fetching and merging
//!
//! This module contains the crawl side of the pipeline, including:
//! - HTTP fetching with header profiles and error classification
//! - The bounded listing-page worker pool
//! - The page-ordered merge of per-page entry lists

mod coordinator;
mod fetcher;

pub use coordinator::{merge_results, CrawlOrchestrator, CrawlReport};
pub use fetcher::{
    build_http_client, is_audio_content_type, FetchError, FetchResponse, Fetcher, HeadResponse,
    HeaderProfile, HeaderProfiles,
};
