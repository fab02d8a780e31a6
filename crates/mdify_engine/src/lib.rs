//! mdify engine: fetch, extract, convert and persist pages, one batch at a time.
mod batch;
mod convert;
mod decode;
mod extract;
mod fetch;
mod output_path;
mod persist;
mod processor;
mod retry;
mod serve;
mod sitemap;
mod types;

pub use batch::{BatchError, BatchRunner, ScrapeConfig};
pub use convert::{Converter, Html2MdConverter};
pub use decode::{decode_text, DecodeError, DecodedText};
pub use extract::{parse_selector, ContentExtractor, ExtractError};
pub use fetch::{FetchSettings, Fetcher, NullProgressSink, ProgressSink, ReqwestFetcher};
pub use output_path::resolve_output_path;
pub use persist::{ensure_output_dir, write_atomic, PersistError};
pub use processor::ItemProcessor;
pub use retry::{RetryPolicy, RetryingFetcher, Sleeper, TokioSleeper};
pub use serve::{resolve_request_path, router, serve, ServeError};
pub use sitemap::{filter_by_path, parse_sitemap, SitemapError, SitemapSource};
pub use types::{
    EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, JobProgress, Outcome,
    ScrapeError, Stage,
};
