//! Structural fragment matchers
//!
//! Each matcher is tried against the whole document in order. The first one
//! that yields at least one element decides the fragment list for the page.

use crate::HarvestError;
use scraper::{ElementRef, Html, Selector};

/// Class-name substrings tried after the purpose-built content markers
const GENERIC_CLASS_HINTS: &[&str] = &["item", "media", "result", "track", "audio", "music"];

/// Generic element selectors tried last, before the bounded scan
const GENERIC_SELECTORS: &[(&str, &str)] = &[
    ("article", "article elements"),
    ("div[data-id]", "div with data-id"),
    (".item", "class item"),
    (".media", "class media"),
    (".track", "class track"),
    ("[data-track]", "elements with data-track"),
    ("[data-audio]", "elements with data-audio"),
];

/// Keywords the bounded scan looks for in class names
const SCAN_CLASS_KEYWORDS: &[&str] = &["item", "media", "track", "music", "audio", "result"];

/// Keywords the bounded scan looks for in `data-*` attribute names
const SCAN_DATA_KEYWORDS: &[&str] = &["id", "track", "audio"];

/// A strategy that picks candidate entry fragments out of a document
pub trait FragmentMatcher: Send + Sync {
    /// Short description used in log output
    fn describe(&self) -> &str;

    /// Returns the matched fragments, or None when nothing matched
    fn try_match<'a>(&self, document: &'a Html) -> Option<Vec<ElementRef<'a>>>;
}

/// Matches every element selected by a CSS selector
pub struct SelectorMatcher {
    description: String,
    selector: Selector,
}

impl SelectorMatcher {
    pub fn new(selector: &str, description: impl Into<String>) -> Result<Self, HarvestError> {
        Ok(Self {
            description: description.into(),
            selector: parse_selector(selector)?,
        })
    }
}

impl FragmentMatcher for SelectorMatcher {
    fn describe(&self) -> &str {
        &self.description
    }

    fn try_match<'a>(&self, document: &'a Html) -> Option<Vec<ElementRef<'a>>> {
        let found: Vec<_> = document.select(&self.selector).collect();
        if found.is_empty() {
            None
        } else {
            Some(found)
        }
    }
}

/// Bounded scan over the leading `div` elements of a page
///
/// Keeps a `div` when one of its classes mentions a download-related keyword,
/// or when it carries a `data-*` attribute naming an id, track or audio.
pub struct KeywordScan {
    limit: usize,
    selector: Selector,
}

impl KeywordScan {
    pub fn new(limit: usize) -> Result<Self, HarvestError> {
        Ok(Self {
            limit,
            selector: parse_selector("div")?,
        })
    }

    fn is_candidate(element: &ElementRef<'_>) -> bool {
        let value = element.value();

        let class_hit = value.classes().any(|class| {
            let class = class.to_lowercase();
            SCAN_CLASS_KEYWORDS.iter().any(|kw| class.contains(kw))
        });
        if class_hit {
            return true;
        }

        value.attrs().any(|(name, _)| {
            let name = name.to_lowercase();
            name.starts_with("data-") && SCAN_DATA_KEYWORDS.iter().any(|kw| name.contains(kw))
        })
    }
}

impl FragmentMatcher for KeywordScan {
    fn describe(&self) -> &str {
        "bounded div scan"
    }

    fn try_match<'a>(&self, document: &'a Html) -> Option<Vec<ElementRef<'a>>> {
        let found: Vec<_> = document
            .select(&self.selector)
            .take(self.limit)
            .filter(Self::is_candidate)
            .collect();
        if found.is_empty() {
            None
        } else {
            Some(found)
        }
    }
}

/// Builds the full matcher cascade, most specific first
///
/// `content_markers` become `div[class*="marker"]` matchers ahead of the
/// generic class hints and element selectors. The bounded scan is always last.
pub fn default_cascade(
    content_markers: &[String],
    scan_limit: usize,
) -> Result<Vec<Box<dyn FragmentMatcher>>, HarvestError> {
    let mut cascade: Vec<Box<dyn FragmentMatcher>> = Vec::new();

    for marker in content_markers {
        cascade.push(Box::new(SelectorMatcher::new(
            &format!("div[class*=\"{}\"]", marker),
            format!("content marker '{}'", marker),
        )?));
    }

    for hint in GENERIC_CLASS_HINTS {
        cascade.push(Box::new(SelectorMatcher::new(
            &format!("div[class*=\"{}\"]", hint),
            format!("div class containing '{}'", hint),
        )?));
    }

    for (selector, description) in GENERIC_SELECTORS {
        cascade.push(Box::new(SelectorMatcher::new(selector, *description)?));
    }

    cascade.push(Box::new(KeywordScan::new(scan_limit)?));
    Ok(cascade)
}

/// Parses a CSS selector into the crate error type
pub(crate) fn parse_selector(selector: &str) -> Result<Selector, HarvestError> {
    Selector::parse(selector).map_err(|e| HarvestError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}
