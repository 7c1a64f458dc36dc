//! Asset resolution for discovered entries
//!
//! An entry's source reference is either a direct asset URL or a detail page
//! that has to be fetched and searched. Resolution is best-effort: it always
//! returns a URL, and an unreachable asset only shows up when the download
//! itself fails.

use crate::config::Config;
use crate::crawler::{is_audio_content_type, Fetcher, HeaderProfile};
use crate::extract::parse_selector;
use crate::state::Entry;
use crate::url::{contains_media_extension, has_media_extension, normalize_asset_url};
use crate::HarvestError;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Accept header for detail-page fetches
const DETAIL_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Script matches shorter than this are ignored
const MIN_SCRIPT_MATCH_CHARS: usize = 21;

/// DOM locations that may carry an asset URL, with the attribute to read
const DOM_CANDIDATES: &[(&str, &str)] = &[
    ("audio[src]", "src"),
    ("source[src]", "src"),
    ("a[href]", "href"),
    ("[data-url]", "data-url"),
    ("[data-src]", "data-src"),
    ("[onclick]", "onclick"),
];

/// Turns source references into concrete asset URLs
pub struct AssetResolver {
    fetcher: Fetcher,
    detail_profile: HeaderProfile,
    probe_profile: HeaderProfile,
    extensions: Vec<String>,
    detail_timeout: Duration,
    probe_timeout: Duration,
    script_selector: Selector,
    script_patterns: Vec<Regex>,
    dom_candidates: Vec<(Selector, &'static str)>,
    quoted: Regex,
}

impl AssetResolver {
    /// Creates a resolver sharing `fetcher`'s connection pool
    ///
    /// Detail pages and probes are requested with the primary header profile
    /// plus the site origin as referer.
    pub fn new(config: &Config, fetcher: Fetcher) -> Result<Self, HarvestError> {
        let primary = HeaderProfile::from_config(&config.headers.primary)?;
        let probe_profile = primary.with_referer(&config.site.origin)?;
        let detail_profile = probe_profile.with_accept(DETAIL_ACCEPT)?;
        let extensions = config.extractor.media_extensions.clone();

        Ok(Self {
            fetcher,
            detail_profile,
            probe_profile,
            detail_timeout: Duration::from_secs(config.download.detail_timeout_secs),
            probe_timeout: Duration::from_secs(config.download.probe_timeout_secs),
            script_selector: parse_selector("script")?,
            script_patterns: script_patterns(&extensions)?,
            dom_candidates: DOM_CANDIDATES
                .iter()
                .map(|(selector, attr)| Ok((parse_selector(selector)?, *attr)))
                .collect::<Result<Vec<_>, HarvestError>>()?,
            quoted: compile(r#"["']([^"']+)["']"#)?,
            extensions,
        })
    }

    /// Resolves a bare source reference
    ///
    /// Never fails: when nothing better is found, `source_ref` comes back
    /// unchanged.
    pub async fn resolve(&self, source_ref: &str, title: &str) -> String {
        self.resolve_candidates(source_ref, &[], title).await
    }

    /// Resolves an entry, also probing its alternate guesses
    pub async fn resolve_entry(&self, entry: &Entry) -> String {
        self.resolve_candidates(&entry.source_ref, &entry.alternates, &entry.title)
            .await
    }

    async fn resolve_candidates(
        &self,
        source_ref: &str,
        alternates: &[String],
        title: &str,
    ) -> String {
        if has_media_extension(source_ref, &self.extensions) {
            let candidates =
                std::iter::once(source_ref).chain(alternates.iter().map(String::as_str));
            for candidate in candidates {
                if self.probe(candidate).await {
                    tracing::debug!("'{}': asset confirmed at {}", title, candidate);
                    return candidate.to_string();
                }
            }
        } else if let Some(url) = self.from_detail_page(source_ref).await {
            tracing::debug!("'{}': resolved {} -> {}", title, source_ref, url);
            return url;
        }

        tracing::debug!("'{}': no confident asset, using {}", title, source_ref);
        source_ref.to_string()
    }

    /// HEAD-probes a candidate asset URL
    async fn probe(&self, url: &str) -> bool {
        match self
            .fetcher
            .head(url, &self.probe_profile, self.probe_timeout)
            .await
        {
            Ok(response) => {
                if !response.is_audio() {
                    tracing::debug!(
                        "Probe {} -> {} ({})",
                        url,
                        response.status_code,
                        response.content_type.as_deref().unwrap_or("no content type")
                    );
                }
                response.is_audio()
            }
            Err(e) => {
                tracing::debug!("Probe {} failed: {}", url, e);
                false
            }
        }
    }

    async fn from_detail_page(&self, url: &str) -> Option<String> {
        let response = match self
            .fetcher
            .open(url, &self.detail_profile, self.detail_timeout)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Detail page {} failed: {}", url, e);
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            tracing::debug!("Detail page {} returned HTTP {}", url, response.status());
            return None;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if is_audio_content_type(content_type) {
            tracing::debug!("{} is served as {}", url, content_type);
            return Some(url.to_string());
        }

        let final_url = response.url().to_string();
        match response.bytes().await {
            Ok(body) => self.scan_detail_page(&body, &final_url),
            Err(e) => {
                tracing::debug!("Detail page {} body failed: {}", url, e);
                None
            }
        }
    }

    /// Searches a fetched detail page for an asset URL
    ///
    /// Embedded scripts are searched first, then DOM attributes.
    pub fn scan_detail_page(&self, body: &[u8], page_url: &str) -> Option<String> {
        let base_url = Url::parse(page_url).ok()?;
        let document = Html::parse_document(&String::from_utf8_lossy(body));

        self.scan_scripts(&document, &base_url)
            .or_else(|| self.scan_dom(&document, &base_url))
    }

    /// Finds the best media URL across the page's scripts
    ///
    /// Within a script, absolute URLs win over protocol-relative ones, which
    /// win over relative paths. Ties go to pattern order.
    fn scan_scripts(&self, document: &Html, base_url: &Url) -> Option<String> {
        for script in document.select(&self.script_selector) {
            let content: String = script.text().collect();
            if content.is_empty() {
                continue;
            }

            let mut best: Option<(u8, String)> = None;
            for pattern in &self.script_patterns {
                for caps in pattern.captures_iter(&content) {
                    let Some(raw) = caps.get(1) else {
                        continue;
                    };
                    let raw = raw.as_str();
                    if raw.chars().count() < MIN_SCRIPT_MATCH_CHARS
                        || !contains_media_extension(raw, &self.extensions)
                    {
                        continue;
                    }
                    let Some(url) = normalize_asset_url(raw, base_url) else {
                        continue;
                    };
                    let rank = url_rank(raw);
                    if best.as_ref().map_or(true, |(current, _)| rank < *current) {
                        best = Some((rank, url));
                    }
                }
            }

            if let Some((_, url)) = best {
                return Some(url);
            }
        }
        None
    }

    fn scan_dom(&self, document: &Html, base_url: &Url) -> Option<String> {
        for (selector, attr) in &self.dom_candidates {
            for element in document.select(selector) {
                let Some(value) = element.value().attr(attr) else {
                    continue;
                };
                if !contains_media_extension(value, &self.extensions)
                    || value.to_lowercase().contains("javascript:")
                {
                    continue;
                }

                let url = if *attr == "onclick" {
                    self.quoted
                        .captures_iter(value)
                        .map(|caps| caps[1].to_string())
                        .find(|s| contains_media_extension(s, &self.extensions))
                        .and_then(|s| normalize_asset_url(&s, base_url))
                } else {
                    normalize_asset_url(value, base_url)
                };

                if url.is_some() {
                    return url;
                }
            }
        }
        None
    }
}

/// Media-extension-anchored script patterns in priority order
///
/// Keyed JSON fields come first, then origin-qualified URLs, then
/// protocol-relative ones.
fn script_patterns(extensions: &[String]) -> Result<Vec<Regex>, HarvestError> {
    let alternatives = extensions
        .iter()
        .map(|ext| regex::escape(ext.trim_start_matches('.')))
        .collect::<Vec<_>>()
        .join("|");

    let mut sources: Vec<String> = ["download", "url", "src"]
        .iter()
        .map(|key| {
            format!(
                r#"(?i)"{}"[^"]*"([^"]*\.(?:{})[^"]*)""#,
                key, alternatives
            )
        })
        .collect();
    sources.push(format!(
        r#"(?i)(https?:\\?/\\?/[^"'\s]*\.(?:{}))"#,
        alternatives
    ));
    sources.push(format!(
        r#"(?i)["'](\\?/\\?/[^"'\s]*\.(?:{})[^"']*)["']"#,
        alternatives
    ));

    sources.iter().map(|s| compile(s)).collect()
}

/// Lower is better: 0 absolute, 1 protocol-relative, 2 relative
fn url_rank(raw: &str) -> u8 {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http:") || lower.starts_with("https:") {
        0
    } else if raw.starts_with("//") || raw.starts_with(r"\/\/") {
        1
    } else {
        2
    }
}

fn compile(pattern: &str) -> Result<Regex, HarvestError> {
    Regex::new(pattern)
        .map_err(|e| HarvestError::validation(format!("invalid resolver pattern: {}", e)))
}
