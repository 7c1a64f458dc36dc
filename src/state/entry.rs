/// Entry definitions for discovered media items
use std::fmt;

/// Which heuristic produced an entry's source reference
///
/// Ordered from most to least confident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceOrigin {
    /// `src` of an embedded playable-media element
    MediaElement,

    /// Link to a content-detail page, resolved later
    DetailPage,

    /// Guessed from a numeric content identifier and URL templates
    SynthesizedId,

    /// Media-extension value found on a descendant attribute
    DescendantAttribute,

    /// Quoted URL or title/url pair found in an embedded script
    Script,

    /// Supplied directly by the operator
    Direct,
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MediaElement => "media-element",
            Self::DetailPage => "detail-page",
            Self::SynthesizedId => "synthesized-id",
            Self::DescendantAttribute => "descendant-attribute",
            Self::Script => "script",
            Self::Direct => "direct",
        };
        write!(f, "{}", s)
    }
}

/// A discovered media listing item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// 1-based position in the merged crawl result
    pub index: usize,

    /// Display title (placeholder when no heuristic found one)
    pub title: String,

    /// Direct asset URL or a detail page that needs resolution
    pub source_ref: String,

    /// Originating listing page number (display grouping only)
    pub page: u32,

    /// Heuristic that produced `source_ref`
    pub origin: SourceOrigin,

    /// Further guessed asset URLs, probed after `source_ref`
    pub alternates: Vec<String>,
}

impl Entry {
    /// Creates an entry with no alternates
    pub fn new(
        index: usize,
        title: impl Into<String>,
        source_ref: impl Into<String>,
        origin: SourceOrigin,
    ) -> Self {
        Self {
            index,
            title: title.into(),
            source_ref: source_ref.into(),
            page: 1,
            origin,
            alternates: Vec::new(),
        }
    }

    /// Builds an entry from an operator-supplied URL
    ///
    /// ```
    /// use audio_harvest::Entry;
    ///
    /// let entry = Entry::direct(2, "https://cdn.example.com/a.mp3");
    /// assert_eq!(entry.title, "Direct Download 2");
    /// ```
    pub fn direct(index: usize, url: impl Into<String>) -> Self {
        Self::new(
            index,
            format!("Direct Download {}", index),
            url,
            SourceOrigin::Direct,
        )
    }

    /// Builds a list of direct entries indexed from 1
    pub fn direct_list<I, S>(urls: I) -> Vec<Entry>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .enumerate()
            .map(|(i, url)| Entry::direct(i + 1, url))
            .collect()
    }

    /// Tags the entry with its listing page
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Attaches lower-confidence alternate URLs
    pub fn with_alternates(mut self, alternates: Vec<String>) -> Self {
        self.alternates = alternates;
        self
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:3}. {} (page {})", self.index, self.title, self.page)
    }
}
