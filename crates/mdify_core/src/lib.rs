//! mdify core: pure domain types and path mapping, no IO.
mod input;
mod job;
mod path;
mod summary;

pub use input::parse_identifier_lines;
pub use job::{Job, JobId};
pub use path::{output_path_for, relative_markdown_path, PathError, INDEX_STEM, MARKDOWN_EXTENSION};
pub use summary::Summary;
