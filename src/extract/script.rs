//! Last-resort extraction from embedded script payloads
//!
//! Only used when the structural cascade found nothing on a page. The
//! patterns target quoted media URLs and loose `{"title": .., "url": ..}`
//! objects; they are best-effort and tied to how sites happen to inline
//! their player data, so a miss here is expected rather than an error.

use super::matchers::parse_selector;
use crate::state::{Entry, SourceOrigin};
use crate::url::normalize_asset_url;
use crate::HarvestError;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Scripts that mention none of these are skipped
const SCRIPT_KEYWORDS: &[&str] = &["mp3", "audio", "music", "track"];

/// Matches shorter than this are treated as noise
const MIN_MATCH_CHARS: usize = 11;

/// Regex-driven scanner over the leading `<script>` elements
pub struct ScriptScanner {
    limit: usize,
    selector: Selector,
    url_patterns: Vec<Regex>,
    json_object: Regex,
    json_title: Regex,
    json_url: Regex,
}

impl ScriptScanner {
    pub fn new(limit: usize, extensions: &[String]) -> Result<Self, HarvestError> {
        let mut sources: Vec<String> = extensions
            .iter()
            .map(|ext| format!(r#"(?i)["']([^"']*{}[^"']*)["']"#, regex::escape(ext)))
            .collect();
        sources.push(r#"(?i)download["']:\s*["']([^"']*)["']"#.to_string());
        sources.push(r#"(?i)src["']:\s*["']([^"']*\.mp3[^"']*)["']"#.to_string());

        Ok(Self {
            limit,
            selector: parse_selector("script")?,
            url_patterns: sources
                .iter()
                .map(|s| compile(s))
                .collect::<Result<_, _>>()?,
            json_object: compile(r#"(?i)\{[^}]*"title"[^}]*"url"[^}]*\}"#)?,
            json_title: compile(r#""title":\s*"([^"]*)""#)?,
            json_url: compile(r#""url":\s*"([^"]*)""#)?,
        })
    }

    /// Scans scripts and returns entries indexed from 1
    ///
    /// Quoted URLs get a generated `Script Track N` title. Title/url objects
    /// keep their own title. A URL already emitted is not repeated.
    pub fn scan(&self, document: &Html, base_url: &Url) -> Vec<Entry> {
        let mut entries: Vec<Entry> = Vec::new();
        let mut seen = HashSet::new();

        for script in document.select(&self.selector).take(self.limit) {
            let content: String = script.text().collect();
            let lower = content.to_lowercase();
            if !SCRIPT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                continue;
            }

            for pattern in &self.url_patterns {
                for caps in pattern.captures_iter(&content) {
                    let raw = &caps[1];
                    if raw.chars().count() < MIN_MATCH_CHARS {
                        continue;
                    }
                    let Some(url) = normalize_asset_url(raw, base_url) else {
                        continue;
                    };
                    if seen.insert(url.clone()) {
                        let index = entries.len() + 1;
                        entries.push(Entry::new(
                            index,
                            format!("Script Track {}", index),
                            url,
                            SourceOrigin::Script,
                        ));
                    }
                }
            }

            for object in self.json_object.find_iter(&content) {
                let object = object.as_str();
                let (Some(title), Some(raw_url)) = (
                    self.json_title.captures(object),
                    self.json_url.captures(object),
                ) else {
                    continue;
                };
                let Some(url) = normalize_asset_url(&raw_url[1], base_url) else {
                    continue;
                };
                if seen.insert(url.clone()) {
                    entries.push(Entry::new(
                        entries.len() + 1,
                        title[1].trim(),
                        url,
                        SourceOrigin::Script,
                    ));
                }
            }
        }

        entries
    }
}

fn compile(pattern: &str) -> Result<Regex, HarvestError> {
    Regex::new(pattern)
        .map_err(|e| HarvestError::validation(format!("invalid script pattern: {}", e)))
}
