//! Sitemap discovery: turns a `sitemap.xml` into the identifier list for a batch.

use mdify_logging::{mdify_info, mdify_warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::decode::{decode_text, DecodeError};
use crate::fetch::{Fetcher, NullProgressSink};
use crate::types::FetchError;

const URLSET_ROOT: &str = "urlset";

#[derive(Debug, Deserialize)]
struct UrlSet {
    #[serde(rename = "url", default)]
    urls: Vec<UrlEntry>,
}

#[derive(Debug, Deserialize)]
struct UrlEntry {
    #[serde(default)]
    loc: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SitemapError {
    #[error("failed to fetch sitemap: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to decode sitemap: {0}")]
    Decode(#[from] DecodeError),
    #[error("failed to parse sitemap XML: {0}")]
    Xml(String),
}

/// Fetches a sitemap (single attempt) and lists its page URLs.
pub struct SitemapSource<F> {
    fetcher: F,
}

impl<F: Fetcher> SitemapSource<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// All `<loc>` entries, optionally narrowed to those containing `path_filter`.
    pub async fn identifiers(
        &self,
        sitemap_url: &str,
        path_filter: Option<&str>,
    ) -> Result<Vec<String>, SitemapError> {
        mdify_info!("Fetching sitemap: {}", sitemap_url);
        let output = self.fetcher.fetch(0, sitemap_url, &NullProgressSink).await?;
        let decoded = decode_text(&output.bytes, output.metadata.content_type.as_deref())?;
        let urls = parse_sitemap(&decoded.text)?;
        mdify_info!("Found {} URLs in sitemap", urls.len());
        Ok(filter_by_path(urls, path_filter))
    }
}

/// Parse `<urlset>` XML into trimmed, non-empty locations.
///
/// A well-formed document with some other root (an RSS feed, an HTML page)
/// yields an empty list and a warning; malformed XML is an error.
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>, SitemapError> {
    let root = root_element(xml)?;
    if root != URLSET_ROOT {
        mdify_warn!("Document is not a sitemap (root <{}>), found 0 URLs", root);
        return Ok(Vec::new());
    }

    let set: UrlSet =
        quick_xml::de::from_str(xml).map_err(|err| SitemapError::Xml(err.to_string()))?;
    Ok(set
        .urls
        .into_iter()
        .map(|entry| entry.loc.trim().to_string())
        .filter(|loc| !loc.is_empty())
        .collect())
}

/// Keep URLs containing `path_filter`; `None` or an empty filter keeps all.
pub fn filter_by_path(urls: Vec<String>, path_filter: Option<&str>) -> Vec<String> {
    let Some(filter) = path_filter.filter(|f| !f.is_empty()) else {
        return urls;
    };
    let filtered: Vec<String> = urls.into_iter().filter(|url| url.contains(filter)).collect();
    mdify_info!(
        "Filtered to {} URLs matching path filter '{}'",
        filtered.len(),
        filter
    );
    filtered
}

fn root_element(xml: &str) -> Result<String, SitemapError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                return Ok(String::from_utf8_lossy(element.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => return Err(SitemapError::Xml("document has no root element".into())),
            Ok(_) => continue,
            Err(err) => return Err(SitemapError::Xml(err.to_string())),
        }
    }
}
