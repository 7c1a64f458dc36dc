use crate::config::types::{
    Config, CrawlerConfig, DownloadConfig, ExtractorConfig, HeaderProfileConfig, SiteConfig,
};
use crate::ConfigError;
use url::Url;

/// Upper bound for either worker pool
const MAX_WORKERS: u32 = 16;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_download_config(&config.download)?;
    validate_extractor_config(&config.extractor)?;
    validate_header_profile(&config.headers.primary)?;
    validate_header_profile(&config.headers.alternate)?;
    validate_site_config(&config.site)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_concurrency("crawler.concurrency", config.concurrency)?;

    if config.page_param.is_empty()
        || !config
            .page_param
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "page-param must be a non-empty query key, got '{}'",
            config.page_param
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "crawler.timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates download configuration
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    validate_concurrency("download.concurrency", config.concurrency)?;

    if config.destination.is_empty() {
        return Err(ConfigError::Validation(
            "download.destination cannot be empty".to_string(),
        ));
    }

    for (key, value) in [
        ("download.timeout-secs", config.timeout_secs),
        ("download.detail-timeout-secs", config.detail_timeout_secs),
        ("download.probe-timeout-secs", config.probe_timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be >= 1", key)));
        }
    }

    Ok(())
}

fn validate_concurrency(key: &str, value: u32) -> Result<(), ConfigError> {
    if value < 1 || value > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            key, MAX_WORKERS, value
        )));
    }
    Ok(())
}

/// Validates extractor heuristics
///
/// Markers are spliced into attribute selectors, so quoting and bracket
/// characters are rejected up front.
fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    for marker in &config.content_markers {
        if marker.is_empty()
            || marker
                .chars()
                .any(|c| matches!(c, '"' | '\'' | '[' | ']' | '\\') || c.is_whitespace())
        {
            return Err(ConfigError::InvalidPattern(format!(
                "content marker '{}' must be a bare class-name fragment",
                marker
            )));
        }
    }

    if config.detail_path.is_empty() {
        return Err(ConfigError::Validation(
            "extractor.detail-path cannot be empty".to_string(),
        ));
    }

    if config.media_extensions.is_empty() {
        return Err(ConfigError::Validation(
            "extractor.media-extensions needs at least one extension".to_string(),
        ));
    }

    for ext in &config.media_extensions {
        if ext.len() < 2 || !ext.starts_with('.') {
            return Err(ConfigError::InvalidPattern(format!(
                "media extension '{}' must start with '.'",
                ext
            )));
        }
    }

    for template in &config.asset_templates {
        if !template.contains("{id}") {
            return Err(ConfigError::InvalidPattern(format!(
                "asset template '{}' has no {{id}} placeholder",
                template
            )));
        }
        Url::parse(&template.replace("{id}", "0")).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid asset template '{}': {}", template, e))
        })?;
    }

    if config.placeholder_title.trim().is_empty() {
        return Err(ConfigError::Validation(
            "extractor.placeholder-title cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a header profile
fn validate_header_profile(profile: &HeaderProfileConfig) -> Result<(), ConfigError> {
    if profile.name.is_empty() {
        return Err(ConfigError::Validation(
            "header profile name cannot be empty".to_string(),
        ));
    }

    if profile.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "header profile '{}' has an empty user-agent",
            profile.name
        )));
    }

    let values = [
        Some(&profile.user_agent),
        Some(&profile.accept),
        Some(&profile.accept_language),
        profile.referer.as_ref(),
        profile.origin.as_ref(),
    ];
    for value in values.into_iter().flatten() {
        if value.chars().any(|c| c.is_control()) {
            return Err(ConfigError::Validation(format!(
                "header profile '{}' contains a control character",
                profile.name
            )));
        }
    }

    if let Some(referer) = &profile.referer {
        Url::parse(referer).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid referer '{}': {}", referer, e))
        })?;
    }

    Ok(())
}

/// Validates site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.origin)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site origin: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "site origin '{}' must use http or https",
            config.origin
        )));
    }

    Ok(())
}
