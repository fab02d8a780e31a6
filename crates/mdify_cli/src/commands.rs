use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use mdify_core::Summary;
use mdify_engine::{ensure_output_dir, BatchError, BatchRunner, ReqwestFetcher, SitemapSource};
use mdify_logging::{mdify_info, mdify_warn};
use tokio_util::sync::CancellationToken;

use crate::input::read_identifiers;
use crate::settings::{FileSettings, ScrapeSettings, ServeSettings};

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// File with one URL per line; read from stdin when omitted.
    #[arg(value_name = "URLS_FILE", conflicts_with = "sitemap")]
    pub urls_file: Option<PathBuf>,

    /// CSS selector for the content to extract.
    #[arg(long, short)]
    pub selector: String,

    /// Output directory for markdown files [default: ./docs].
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// URL of a sitemap.xml listing the pages to scrape.
    #[arg(long, value_name = "URL")]
    pub sitemap: Option<String>,

    /// Keep only sitemap URLs containing this text (e.g. "/docs/").
    #[arg(long, requires = "sitemap")]
    pub filter: Option<String>,

    /// Number of concurrent workers; 1 runs sequentially [default: 4].
    #[arg(long, short)]
    pub workers: Option<usize>,

    /// Per-request timeout in seconds [default: 30].
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Retries after a failed fetch [default: 3].
    #[arg(long)]
    pub retries: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Directory containing markdown files [default: ./docs].
    #[arg(long, short)]
    pub dir: Option<PathBuf>,

    /// Port to listen on [default: 8080].
    #[arg(long, short)]
    pub port: Option<u16>,
}

pub async fn scrape(args: ScrapeArgs, file: &FileSettings) -> anyhow::Result<Summary> {
    let settings =
        ScrapeSettings::resolve(args.output, args.workers, args.timeout, args.retries, file);
    let config = settings.engine_config();

    let identifiers = match args.sitemap.as_deref() {
        Some(sitemap_url) => {
            let fetcher = ReqwestFetcher::new(config.fetch.clone())?;
            SitemapSource::new(fetcher)
                .identifiers(sitemap_url, args.filter.as_deref())
                .await
                .context("failed to get URLs from sitemap")?
        }
        None => read_identifiers(args.urls_file.as_deref())?,
    };
    if identifiers.is_empty() {
        return Err(BatchError::NoIdentifiers.into());
    }

    ensure_output_dir(&settings.output)
        .with_context(|| format!("cannot use output directory {}", settings.output.display()))?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let runner = BatchRunner::from_config(config)?.with_cancellation(cancel);
    let summary = runner
        .run(&identifiers, &args.selector, &settings.output)
        .await?;
    Ok(summary)
}

pub async fn serve(args: ServeArgs, file: &FileSettings) -> anyhow::Result<()> {
    let settings = ServeSettings::resolve(args.dir, args.port, file);
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    mdify_engine::serve(&settings.dir, addr, shutdown_signal())
        .await
        .context("server failed")?;
    mdify_info!("Server stopped");
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        mdify_warn!("Interrupted, cancelling pending jobs");
        cancel.cancel();
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => mdify_info!("Shutting down"),
        Err(err) => {
            mdify_warn!("Could not listen for ctrl-c, serving until killed: {}", err);
            std::future::pending::<()>().await;
        }
    }
}
