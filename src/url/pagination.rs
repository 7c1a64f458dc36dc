use crate::state::CrawlJob;
use crate::HarvestError;
use url::Url;

/// Builds the URL of one listing page
///
/// The page number is written into `param`, replacing an existing value in
/// place or appending it. Page 1 of a base URL that carries no page
/// parameter is the base URL itself, returned unchanged.
///
/// # Examples
///
/// ```
/// use audio_harvest::url::page_url;
///
/// let url = page_url("https://example.com/music/?genre=piano", "pagi", 3).unwrap();
/// assert_eq!(url, "https://example.com/music/?genre=piano&pagi=3");
///
/// let url = page_url("https://example.com/music/?pagi=1&genre=piano", "pagi", 2).unwrap();
/// assert_eq!(url, "https://example.com/music/?pagi=2&genre=piano");
/// ```
pub fn page_url(base_url: &str, param: &str, page: u32) -> Result<String, HarvestError> {
    let mut url = Url::parse(base_url)?;

    let mut found = false;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            if key == param {
                found = true;
                (key.into_owned(), page.to_string())
            } else {
                (key.into_owned(), value.into_owned())
            }
        })
        .collect();

    if page == 1 && !found {
        return Ok(base_url.to_string());
    }

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if !found {
            query.append_pair(param, &page.to_string());
        }
    }

    Ok(url.to_string())
}

/// Builds one crawl job per page in `start_page..=end_page`
pub fn build_crawl_jobs(
    base_url: &str,
    param: &str,
    start_page: u32,
    end_page: u32,
) -> Result<Vec<CrawlJob>, HarvestError> {
    (start_page..=end_page)
        .map(|page_number| {
            Ok(CrawlJob {
                page_url: page_url(base_url, param, page_number)?,
                page_number,
            })
        })
        .collect()
}
