use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::Context;
use mdify_core::parse_identifier_lines;

/// URLs from `path`, or from stdin when no path is given. Blank lines are skipped.
pub fn read_identifiers(path: Option<&Path>) -> anyhow::Result<Vec<String>> {
    let raw = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read URLs from {}", path.display()))?,
        None => read_all(io::stdin().lock()).context("failed to read URLs from stdin")?,
    };
    Ok(parse_identifier_lines(&raw))
}

fn read_all(mut reader: impl Read) -> io::Result<String> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    Ok(raw)
}
