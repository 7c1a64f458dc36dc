//! Title cascade for a single fragment

use super::matchers::parse_selector;
use crate::HarvestError;
use scraper::{ElementRef, Selector};

/// Candidates shorter than this (in chars) are ignored
const MIN_TITLE_CHARS: usize = 3;

/// Resolves a display title from a fragment
///
/// Selectors are tried in order: title-flavored classes, headings, labelled
/// attributes, the first detail link, then any text-bearing element. Only the
/// first element each selector finds inside the fragment is considered.
pub struct TitleCascade {
    selectors: Vec<Selector>,
    placeholder: String,
}

impl TitleCascade {
    pub fn new(detail_path: &str, placeholder: impl Into<String>) -> Result<Self, HarvestError> {
        let detail_link = format!("a[href*=\"{}\"]", detail_path);
        let sources = [
            "a[class*=\"title\"]",
            "[class*=\"title\"]",
            "h1",
            "h2",
            "h3",
            "h4",
            "h5",
            "h6",
            "[title]",
            "[alt]",
            detail_link.as_str(),
            "span",
            "div",
            "p",
        ];

        Ok(Self {
            selectors: sources
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_, _>>()?,
            placeholder: placeholder.into(),
        })
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Returns the first acceptable title, or the placeholder
    pub fn resolve(&self, fragment: ElementRef<'_>) -> String {
        self.selectors
            .iter()
            .filter_map(|selector| {
                fragment
                    .select(selector)
                    .find(|el| el.id() != fragment.id())
            })
            .filter_map(|el| self.candidate(el))
            .next()
            .unwrap_or_else(|| self.placeholder.clone())
    }

    /// Text, then `title`, then `alt` of one element
    fn candidate(&self, element: ElementRef<'_>) -> Option<String> {
        let text = element_text(element);
        let raw = if !text.is_empty() {
            text
        } else {
            let value = element.value();
            value
                .attr("title")
                .filter(|s| !s.trim().is_empty())
                .or_else(|| value.attr("alt"))
                .unwrap_or("")
                .trim()
                .to_string()
        };

        if raw.chars().count() >= MIN_TITLE_CHARS && raw != self.placeholder {
            Some(raw)
        } else {
            None
        }
    }
}

/// Collapses an element's text nodes into one trimmed line
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
