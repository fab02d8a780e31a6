/// Split raw text into identifiers: one per line, trimmed, blank lines dropped.
pub fn parse_identifier_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
