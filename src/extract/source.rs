//! Source-reference cascade for a single fragment
//!
//! Strategies are ordered from most to least confident. The first one that
//! returns a candidate wins; a fragment no strategy accepts yields no entry.

use super::matchers::parse_selector;
use crate::state::SourceOrigin;
use crate::url::{contains_media_extension, normalize_asset_url, resolve_link};
use crate::HarvestError;
use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

/// A source reference proposed by one strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCandidate {
    pub source_ref: String,
    pub origin: SourceOrigin,
    pub alternates: Vec<String>,
}

impl SourceCandidate {
    fn single(source_ref: String, origin: SourceOrigin) -> Self {
        Self {
            source_ref,
            origin,
            alternates: Vec::new(),
        }
    }
}

/// One step of the source cascade
pub trait SourceStrategy: Send + Sync {
    fn try_match(&self, fragment: ElementRef<'_>, base_url: &Url) -> Option<SourceCandidate>;
}

/// `src` of an embedded `<audio>` element
pub struct MediaElementSource {
    selector: Selector,
}

impl MediaElementSource {
    pub fn new() -> Result<Self, HarvestError> {
        Ok(Self {
            selector: parse_selector("audio[src]")?,
        })
    }
}

impl SourceStrategy for MediaElementSource {
    fn try_match(&self, fragment: ElementRef<'_>, base_url: &Url) -> Option<SourceCandidate> {
        let src = fragment.select(&self.selector).next()?.value().attr("src")?;
        let url = resolve_link(src, base_url)?;
        Some(SourceCandidate::single(url, SourceOrigin::MediaElement))
    }
}

/// First link into the content-detail path
pub struct DetailLinkSource {
    selector: Selector,
    detail_path: String,
}

impl DetailLinkSource {
    pub fn new(detail_path: &str) -> Result<Self, HarvestError> {
        Ok(Self {
            selector: parse_selector("a[href]")?,
            detail_path: detail_path.to_string(),
        })
    }
}

impl SourceStrategy for DetailLinkSource {
    fn try_match(&self, fragment: ElementRef<'_>, base_url: &Url) -> Option<SourceCandidate> {
        fragment
            .select(&self.selector)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| href.contains(&self.detail_path))
            .find_map(|href| resolve_link(href, base_url))
            .map(|url| SourceCandidate::single(url, SourceOrigin::DetailPage))
    }
}

/// Content identifier on a `data-*` attribute, expanded through URL templates
///
/// The first template becomes the source reference, the rest are kept as
/// alternates for the resolver to probe.
pub struct DataIdSource {
    templates: Vec<String>,
    trailing_id: Regex,
}

impl DataIdSource {
    pub fn new(templates: &[String]) -> Result<Self, HarvestError> {
        let trailing_id = Regex::new(r"-(\d+)/?$").map_err(|e| {
            HarvestError::validation(format!("invalid identifier pattern: {}", e))
        })?;
        Ok(Self {
            templates: templates.to_vec(),
            trailing_id,
        })
    }

    /// Pulls a numeric id out of an attribute value
    ///
    /// Accepts either a bare number or a slug ending in `-<digits>`.
    pub fn numeric_id(&self, value: &str) -> Option<String> {
        let value = value.trim();
        if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
            return Some(value.to_string());
        }
        self.trailing_id
            .captures(value)
            .map(|caps| caps[1].to_string())
    }

    fn is_id_attribute(name: &str) -> bool {
        let name = name.to_lowercase();
        name.contains("data") && (name.contains("id") || name.contains("track"))
    }
}

impl SourceStrategy for DataIdSource {
    fn try_match(&self, fragment: ElementRef<'_>, _base_url: &Url) -> Option<SourceCandidate> {
        if self.templates.is_empty() {
            return None;
        }

        let id = fragment
            .value()
            .attrs()
            .filter(|(name, _)| Self::is_id_attribute(name))
            .find_map(|(_, value)| self.numeric_id(value))?;

        let mut urls = self.templates.iter().map(|t| t.replace("{id}", &id));
        let source_ref = urls.next()?;
        Some(SourceCandidate {
            source_ref,
            origin: SourceOrigin::SynthesizedId,
            alternates: urls.collect(),
        })
    }
}

/// Absolute media URL on any descendant attribute
pub struct DescendantAttributeSource {
    extensions: Vec<String>,
    embedded_url: Regex,
}

impl DescendantAttributeSource {
    pub fn new(extensions: &[String]) -> Result<Self, HarvestError> {
        let embedded_url = Regex::new(r#"https?://[^\s"'()<>]+"#).map_err(|e| {
            HarvestError::validation(format!("invalid url pattern: {}", e))
        })?;
        Ok(Self {
            extensions: extensions.to_vec(),
            embedded_url,
        })
    }

    /// Picks the media URL out of an attribute value
    ///
    /// Handles both plain URLs and URLs embedded in handler code such as
    /// `play('https://...')`.
    fn url_in(&self, value: &str, base_url: &Url) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.to_lowercase().starts_with("http") {
            return normalize_asset_url(trimmed, base_url);
        }
        self.embedded_url
            .find_iter(trimmed)
            .map(|m| m.as_str())
            .find(|candidate| contains_media_extension(candidate, &self.extensions))
            .and_then(|candidate| normalize_asset_url(candidate, base_url))
    }
}

impl SourceStrategy for DescendantAttributeSource {
    fn try_match(&self, fragment: ElementRef<'_>, base_url: &Url) -> Option<SourceCandidate> {
        fragment
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .flat_map(|el| el.value().attrs().map(|(_, value)| value))
            .filter(|value| {
                value.contains("http") && contains_media_extension(value, &self.extensions)
            })
            .find_map(|value| self.url_in(value, base_url))
            .map(|url| SourceCandidate::single(url, SourceOrigin::DescendantAttribute))
    }
}

/// Builds the source cascade in confidence order
pub fn default_cascade(
    detail_path: &str,
    templates: &[String],
    extensions: &[String],
) -> Result<Vec<Box<dyn SourceStrategy>>, HarvestError> {
    Ok(vec![
        Box::new(MediaElementSource::new()?),
        Box::new(DetailLinkSource::new(detail_path)?),
        Box::new(DataIdSource::new(templates)?),
        Box::new(DescendantAttributeSource::new(extensions)?),
    ])
}
