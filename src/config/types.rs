use serde::Deserialize;

/// Main configuration structure for Audio-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub headers: HeadersConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

/// Listing-page crawl configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Width of the listing-page worker pool
    pub concurrency: u32,

    /// Query parameter carrying the page number
    #[serde(rename = "page-param")]
    pub page_param: String,

    /// Delay a worker waits before each listing fetch (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Per-request timeout for listing pages (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            page_param: "pagi".to_string(),
            request_delay_ms: 2000,
            timeout_secs: 30,
        }
    }
}

/// Download batch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Width of the download worker pool
    pub concurrency: u32,

    /// Default destination directory
    pub destination: String,

    /// Timeout for the asset transfer itself (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Timeout for detail-page fetches during resolution (seconds)
    #[serde(rename = "detail-timeout-secs")]
    pub detail_timeout_secs: u64,

    /// Timeout for HEAD probes of candidate asset URLs (seconds)
    #[serde(rename = "probe-timeout-secs")]
    pub probe_timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            destination: "downloads".to_string(),
            timeout_secs: 30,
            detail_timeout_secs: 15,
            probe_timeout_secs: 8,
        }
    }
}

/// Heuristic knobs for entry extraction and asset resolution
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Purpose-built class-name markers, tried before the generic matchers
    #[serde(rename = "content-markers")]
    pub content_markers: Vec<String>,

    /// Path fragment identifying a content-detail page link
    #[serde(rename = "detail-path")]
    pub detail_path: String,

    /// Recognized media file extensions (with leading dot)
    #[serde(rename = "media-extensions")]
    pub media_extensions: Vec<String>,

    /// Guessed asset URL templates containing an `{id}` placeholder
    #[serde(rename = "asset-templates")]
    pub asset_templates: Vec<String>,

    /// Number of leading `div` elements inspected by the fallback scan
    #[serde(rename = "fallback-scan-limit")]
    pub fallback_scan_limit: usize,

    /// Number of leading `script` elements inspected by the script pass
    #[serde(rename = "script-scan-limit")]
    pub script_scan_limit: usize,

    /// Title used when no heuristic yields one
    #[serde(rename = "placeholder-title")]
    pub placeholder_title: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            content_markers: vec!["audioRow".to_string(), "Row".to_string()],
            detail_path: "/music/".to_string(),
            media_extensions: vec![".mp3".to_string(), ".wav".to_string(), ".m4a".to_string()],
            asset_templates: vec![
                "https://cdn.pixabay.com/audio/2023/{id}.mp3".to_string(),
                "https://cdn.pixabay.com/audio/2024/{id}.mp3".to_string(),
                "https://pixabay.com/get/{id}.mp3".to_string(),
                "https://pixabay.com/music/download/{id}.mp3".to_string(),
            ],
            fallback_scan_limit: 50,
            script_scan_limit: 10,
            placeholder_title: "Unknown Track".to_string(),
        }
    }
}

/// The two header profiles used for requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeadersConfig {
    pub primary: HeaderProfileConfig,
    pub alternate: HeaderProfileConfig,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            primary: HeaderProfileConfig {
                name: "browser".to_string(),
                user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8".to_string(),
                accept_language: "en-US,en;q=0.9".to_string(),
                referer: None,
                origin: None,
            },
            alternate: HeaderProfileConfig {
                name: "alternate".to_string(),
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/119.0".to_string(),
                accept: "*/*".to_string(),
                accept_language: "en-US,en;q=0.5".to_string(),
                referer: Some("https://pixabay.com/".to_string()),
                origin: Some("https://pixabay.com".to_string()),
            },
        }
    }
}

/// A named set of request headers
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderProfileConfig {
    /// Short name used in log output
    pub name: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    pub accept: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,

    #[serde(default)]
    pub referer: Option<String>,

    #[serde(default)]
    pub origin: Option<String>,
}

/// Site-level settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin sent as referer on detail-page fetches and asset probes
    pub origin: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: "https://pixabay.com/".to_string(),
        }
    }
}
