use scraper::{Html, Selector};

use crate::convert::{Converter, Html2MdConverter};
use crate::decode::{decode_text, DecodeError};
use crate::types::ScrapeError;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("failed to parse document: {0}")]
    Parse(#[from] DecodeError),
    #[error("selector '{selector}' matched no elements")]
    NoMatch { selector: String },
}

impl From<ExtractError> for ScrapeError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::InvalidSelector { selector, message } => {
                ScrapeError::InvalidSelector { selector, message }
            }
            ExtractError::Parse(err) => ScrapeError::Parse(err),
            ExtractError::NoMatch { selector } => ScrapeError::SelectorNoMatch { selector },
        }
    }
}

/// Parse a CSS selector, keeping the error message but not the borrow.
pub fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|err| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

/// Pulls the region matched by a selector out of a document and converts it.
///
/// Only the inner HTML of the first matching element is converted; the rest of
/// the document never reaches the converter.
#[derive(Debug, Default, Clone)]
pub struct ContentExtractor<C = Html2MdConverter> {
    converter: C,
}

impl<C: Converter> ContentExtractor<C> {
    pub fn new(converter: C) -> Self {
        Self { converter }
    }

    /// Decode raw bytes, then extract and convert.
    pub fn extract(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
        selector: &str,
    ) -> Result<String, ExtractError> {
        let decoded = decode_text(bytes, content_type)?;
        self.extract_html(&decoded.text, selector)
    }

    pub fn extract_html(&self, html: &str, selector: &str) -> Result<String, ExtractError> {
        let parsed = parse_selector(selector)?;
        let region = select_inner_html(html, &parsed).ok_or_else(|| ExtractError::NoMatch {
            selector: selector.to_string(),
        })?;
        Ok(self.converter.to_markdown(&region))
    }
}

fn select_inner_html(html: &str, selector: &Selector) -> Option<String> {
    let doc = Html::parse_document(html);
    let node = doc.select(selector).next()?;
    Some(node.inner_html())
}
