//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the pipeline, including:
//! - Building the shared HTTP client
//! - Header profiles applied per request
//! - GET requests returning the whole body
//! - HEAD probes for asset reachability
//! - Streaming GET for downloads
//! - Error classification
//!
//! The fetcher owns no retry policy. `get_with_fallback` is the single
//! alternate-profile retry the orchestrators ask for.

use crate::config::{HeaderProfileConfig, HeadersConfig};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, ORIGIN, REFERER,
    USER_AGENT,
};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use thiserror::Error;

/// Classified failure of a single request
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid header {name}: {message}")]
    InvalidHeader { name: String, message: String },
}

impl FetchError {
    /// Classifies a reqwest error for `url`
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            Self::Connect {
                url: url.to_string(),
                message: error.to_string(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                source: error,
            }
        }
    }

    /// Returns true for failures worth one retry with another header profile
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } => true,
            Self::Status { status, .. } => *status == 403 || *status == 429 || *status >= 500,
            Self::Request { source, .. } => source.is_request() || source.is_body(),
            Self::InvalidHeader { .. } => false,
        }
    }
}

/// A named set of request headers
#[derive(Debug, Clone)]
pub struct HeaderProfile {
    name: String,
    headers: HeaderMap,
}

impl HeaderProfile {
    /// Builds a profile from its configuration
    pub fn from_config(config: &HeaderProfileConfig) -> Result<Self, FetchError> {
        let mut profile = Self {
            name: config.name.clone(),
            headers: HeaderMap::new(),
        };
        profile.insert(USER_AGENT, &config.user_agent)?;
        profile.insert(ACCEPT, &config.accept)?;
        profile.insert(ACCEPT_LANGUAGE, &config.accept_language)?;
        if let Some(referer) = &config.referer {
            profile.insert(REFERER, referer)?;
        }
        if let Some(origin) = &config.origin {
            profile.insert(ORIGIN, origin)?;
        }
        Ok(profile)
    }

    /// Returns a copy of this profile sending `referer`
    pub fn with_referer(&self, referer: &str) -> Result<Self, FetchError> {
        let mut profile = self.clone();
        profile.insert(REFERER, referer)?;
        Ok(profile)
    }

    /// Returns a copy of this profile with a different Accept header
    pub fn with_accept(&self, accept: &str) -> Result<Self, FetchError> {
        let mut profile = self.clone();
        profile.insert(ACCEPT, accept)?;
        Ok(profile)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn insert(&mut self, name: HeaderName, value: &str) -> Result<(), FetchError> {
        let value = HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        self.headers.insert(name, value);
        Ok(())
    }
}

/// Primary profile plus the alternate tried once after a failure
#[derive(Debug, Clone)]
pub struct HeaderProfiles {
    pub primary: HeaderProfile,
    pub alternate: HeaderProfile,
}

impl HeaderProfiles {
    pub fn from_config(config: &HeadersConfig) -> Result<Self, FetchError> {
        Ok(Self {
            primary: HeaderProfile::from_config(&config.primary)?,
            alternate: HeaderProfile::from_config(&config.alternate)?,
        })
    }
}

/// Body and metadata of a completed GET
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Status and content type of a HEAD probe
#[derive(Debug, Clone)]
pub struct HeadResponse {
    pub status_code: u16,
    pub content_type: Option<String>,
}

impl HeadResponse {
    /// True when the probe answered 200 with an audio content type
    pub fn is_audio(&self) -> bool {
        self.status_code == 200
            && self
                .content_type
                .as_deref()
                .map(is_audio_content_type)
                .unwrap_or(false)
    }
}

/// Returns true if a Content-Type value denotes audio
pub fn is_audio_content_type(content_type: &str) -> bool {
    let lower = content_type.to_lowercase();
    lower.contains("audio") || lower.contains("mpeg")
}

/// Builds the shared HTTP client
///
/// Identity headers are not set here; every request carries a
/// `HeaderProfile` instead.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Thin wrapper around a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with a freshly built client
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Issues a GET and reads the whole body
    ///
    /// Non-2xx statuses are returned as a response, not as an error.
    pub async fn get(
        &self,
        url: &str,
        profile: &HeaderProfile,
        timeout: Duration,
    ) -> Result<FetchResponse, FetchError> {
        let response = self.send_get(url, profile, timeout).await?;
        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = content_type_of(&response);

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?
            .to_vec();

        tracing::trace!(
            "GET {} [{}] -> {} ({} bytes)",
            url,
            profile.name(),
            status_code,
            body.len()
        );

        Ok(FetchResponse {
            final_url,
            status_code,
            content_type,
            body,
        })
    }

    /// Sends a HEAD request without downloading a body
    pub async fn head(
        &self,
        url: &str,
        profile: &HeaderProfile,
        timeout: Duration,
    ) -> Result<HeadResponse, FetchError> {
        let response = self
            .client
            .head(url)
            .headers(profile.headers().clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(HeadResponse {
            status_code: response.status().as_u16(),
            content_type: content_type_of(&response),
        })
    }

    /// Opens a GET for streaming
    ///
    /// Unlike `get`, a non-2xx status is an error here, since the caller is
    /// about to write the body to disk.
    pub async fn open(
        &self,
        url: &str,
        profile: &HeaderProfile,
        timeout: Duration,
    ) -> Result<Response, FetchError> {
        let response = self.send_get(url, profile, timeout).await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    /// GET with one alternate-profile retry
    ///
    /// The alternate profile is tried after a request error or a 4xx/5xx
    /// status from the primary profile, after waiting `retry_delay`.
    /// A 4xx/5xx from the alternate is returned as `FetchError::Status`.
    pub async fn get_with_fallback(
        &self,
        url: &str,
        profiles: &HeaderProfiles,
        timeout: Duration,
        retry_delay: Duration,
    ) -> Result<FetchResponse, FetchError> {
        match self.get(url, &profiles.primary, timeout).await {
            Ok(response) if response.status_code < 400 => return Ok(response),
            Ok(response) => {
                tracing::warn!(
                    "HTTP {} from {} with profile '{}', retrying with '{}'",
                    response.status_code,
                    url,
                    profiles.primary.name(),
                    profiles.alternate.name()
                );
            }
            Err(e) => {
                tracing::warn!(
                    "{} with profile '{}', retrying with '{}'",
                    e,
                    profiles.primary.name(),
                    profiles.alternate.name()
                );
            }
        }

        if !retry_delay.is_zero() {
            tokio::time::sleep(retry_delay).await;
        }

        let response = self.get(url, &profiles.alternate, timeout).await?;
        if response.status_code >= 400 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status_code,
            });
        }
        Ok(response)
    }

    async fn send_get(
        &self,
        url: &str,
        profile: &HeaderProfile,
        timeout: Duration,
    ) -> Result<Response, FetchError> {
        self.client
            .get(url)
            .headers(profile.headers().clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}

fn content_type_of(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
