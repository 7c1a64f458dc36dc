use url::Url;

/// Returns true if the URL's path ends in one of `extensions`
///
/// Query string and fragment are ignored; comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use audio_harvest::url::has_media_extension;
///
/// let exts = vec![".mp3".to_string()];
/// assert!(has_media_extension("https://cdn.example.com/a/b.MP3?x=1", &exts));
/// assert!(!has_media_extension("https://example.com/music/rain-123/", &exts));
/// ```
pub fn has_media_extension(url: &str, extensions: &[String]) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_lowercase(),
    };

    extensions
        .iter()
        .any(|ext| path.ends_with(&ext.to_lowercase()))
}

/// Returns true if `value` mentions one of `extensions` anywhere
pub fn contains_media_extension(value: &str, extensions: &[String]) -> bool {
    let lower = value.to_lowercase();
    extensions
        .iter()
        .any(|ext| lower.contains(&ext.to_lowercase()))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Turns a raw asset reference found in markup or script into an absolute URL
///
/// JSON-escaped slashes are unescaped, protocol-relative references become
/// `https:` URLs, and anything else is resolved against `base_url`.
///
/// # Examples
///
/// ```
/// use audio_harvest::url::normalize_asset_url;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/music/rain-1/").unwrap();
/// assert_eq!(
///     normalize_asset_url(r"\/\/cdn.example.com\/a.mp3", &base).as_deref(),
///     Some("https://cdn.example.com/a.mp3")
/// );
/// ```
pub fn normalize_asset_url(raw: &str, base_url: &Url) -> Option<String> {
    let unescaped = raw.trim().replace("\\/", "/");

    if let Some(rest) = unescaped.strip_prefix("//") {
        return Url::parse(&format!("https://{}", rest))
            .ok()
            .map(|u| u.to_string());
    }

    resolve_link(&unescaped, base_url)
}
