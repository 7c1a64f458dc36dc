//! Entry extraction from listing-page markup
//!
//! This module turns one fetched listing page into entries:
//! - A structural matcher cascade picks the candidate fragments
//! - A title cascade and a source cascade run per fragment
//! - A script scan runs only when the page yielded nothing else
//!
//! Extraction never fails on missing markup. Every absent signal degrades to
//! a weaker heuristic, and a page with nothing recognizable yields no entries.

mod matchers;
mod script;
mod source;
mod title;

pub(crate) use matchers::parse_selector;
pub use matchers::{FragmentMatcher, KeywordScan, SelectorMatcher};
pub use script::ScriptScanner;
pub use source::{
    DataIdSource, DescendantAttributeSource, DetailLinkSource, MediaElementSource,
    SourceCandidate, SourceStrategy,
};
pub use title::TitleCascade;

use crate::config::ExtractorConfig;
use crate::state::Entry;
use crate::HarvestError;
use scraper::Html;
use url::Url;

/// Heuristic extractor for listing pages
///
/// Holds only compiled selectors and patterns, so one instance is shared by
/// every crawl worker.
pub struct EntryExtractor {
    fragments: Vec<Box<dyn FragmentMatcher>>,
    sources: Vec<Box<dyn SourceStrategy>>,
    titles: TitleCascade,
    scripts: ScriptScanner,
}

impl EntryExtractor {
    /// Compiles every cascade from the extractor configuration
    pub fn new(config: &ExtractorConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            fragments: matchers::default_cascade(
                &config.content_markers,
                config.fallback_scan_limit,
            )?,
            sources: source::default_cascade(
                &config.detail_path,
                &config.asset_templates,
                &config.media_extensions,
            )?,
            titles: TitleCascade::new(&config.detail_path, config.placeholder_title.clone())?,
            scripts: ScriptScanner::new(config.script_scan_limit, &config.media_extensions)?,
        })
    }

    /// Extracts entries from one page
    ///
    /// # Arguments
    ///
    /// * `page_bytes` - Raw body of the listing page
    /// * `page_url` - URL the body was served from, used to resolve links
    ///
    /// # Returns
    ///
    /// Entries in document order with page-local indices starting at 1. The
    /// page number is left for the caller to fill in.
    pub fn extract(&self, page_bytes: &[u8], page_url: &str) -> Vec<Entry> {
        let base_url = match Url::parse(page_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot resolve links against '{}': {}", page_url, e);
                return Vec::new();
            }
        };

        let document = Html::parse_document(&String::from_utf8_lossy(page_bytes));

        let mut entries = self.extract_structural(&document, &base_url);
        if entries.is_empty() {
            entries = self.scripts.scan(&document, &base_url);
            if !entries.is_empty() {
                tracing::debug!(
                    "{}: {} entries from script fallback",
                    page_url,
                    entries.len()
                );
            }
        }
        entries
    }

    fn extract_structural(&self, document: &Html, base_url: &Url) -> Vec<Entry> {
        let Some((description, fragments)) = self.fragments.iter().find_map(|matcher| {
            matcher
                .try_match(document)
                .map(|found| (matcher.describe(), found))
        }) else {
            tracing::debug!("{}: no structural matcher hit", base_url);
            return Vec::new();
        };

        tracing::debug!(
            "{}: {} fragments via {}",
            base_url,
            fragments.len(),
            description
        );

        let mut entries = Vec::new();
        for fragment in fragments {
            let Some(candidate) = self
                .sources
                .iter()
                .find_map(|strategy| strategy.try_match(fragment, base_url))
            else {
                continue;
            };

            let title = self.titles.resolve(fragment);
            entries.push(
                Entry::new(
                    entries.len() + 1,
                    title,
                    candidate.source_ref,
                    candidate.origin,
                )
                .with_alternates(candidate.alternates),
            );
        }
        entries
    }

    /// Title used when a fragment offers none
    pub fn placeholder_title(&self) -> &str {
        self.titles.placeholder()
    }
}
