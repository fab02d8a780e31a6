use std::path::{Path, PathBuf};

use url::Url;

pub const INDEX_STEM: &str = "index";
pub const MARKDOWN_EXTENSION: &str = ".md";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("path is not valid utf-8 once decoded: {0}")]
    Encoding(String),
    #[error("path escapes the output root: {0}")]
    UnsafePath(String),
}

/// Map a URL path (or request path) to a relative Markdown file path.
///
/// - percent-encoded bytes are decoded
/// - empty and `.` segments are dropped, `..` is rejected
/// - an empty path or a trailing `/` maps to `index`
/// - `.md` is appended unless already present
pub fn relative_markdown_path(url_path: &str) -> Result<PathBuf, PathError> {
    let decoded =
        urlencoding::decode(url_path).map_err(|_| PathError::Encoding(url_path.to_string()))?;

    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(PathError::UnsafePath(url_path.to_string())),
            s if s.contains(['\\', '\0']) => {
                return Err(PathError::UnsafePath(url_path.to_string()))
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() || decoded.ends_with('/') {
        segments.push(INDEX_STEM);
    }

    let mut relative = PathBuf::new();
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| PathError::UnsafePath(url_path.to_string()))?;
    for parent in parents {
        relative.push(parent);
    }
    if last.ends_with(MARKDOWN_EXTENSION) {
        relative.push(last);
    } else {
        relative.push(format!("{last}{MARKDOWN_EXTENSION}"));
    }
    Ok(relative)
}

/// Deterministic output location for `identifier` under `output_root`.
///
/// Only the URL path takes part; host, query and fragment are ignored.
pub fn output_path_for(identifier: &str, output_root: &Path) -> Result<PathBuf, PathError> {
    let url = Url::parse(identifier).map_err(|err| PathError::InvalidUrl {
        url: identifier.to_string(),
        message: err.to_string(),
    })?;
    let relative = relative_markdown_path(url.path())?;
    Ok(output_root.join(relative))
}
