//! URL handling module for Audio-Harvest
//!
//! This module provides listing-page URL construction, link resolution and
//! the media-extension checks shared by extraction and resolution.

mod media;
mod pagination;

// Re-export main functions
pub use media::{contains_media_extension, has_media_extension, normalize_asset_url, resolve_link};
pub use pagination::{build_crawl_jobs, page_url};
