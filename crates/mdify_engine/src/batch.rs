use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures_util::FutureExt;
use mdify_core::{Job, JobId, Summary};
use mdify_logging::{mdify_error, mdify_info, mdify_trace, mdify_warn};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::convert::{Converter, Html2MdConverter};
use crate::extract::{parse_selector, ContentExtractor, ExtractError};
use crate::fetch::{FetchSettings, Fetcher, NullProgressSink, ProgressSink, ReqwestFetcher};
use crate::processor::ItemProcessor;
use crate::retry::{RetryPolicy, RetryingFetcher, Sleeper, TokioSleeper};
use crate::types::{EngineEvent, FetchError, JobProgress, Outcome, ScrapeError, Stage};

/// Everything a batch run reads; shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub fetch: FetchSettings,
    pub retry: RetryPolicy,
    pub workers: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            retry: RetryPolicy::default(),
            workers: 4,
        }
    }
}

/// Problems with the batch as a whole. Per-item failures never show up here.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("no URLs found to scrape")]
    NoIdentifiers,
    #[error(transparent)]
    InvalidSelector(#[from] ExtractError),
}

type JobQueue = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

pub struct BatchRunner<F, S, C = Html2MdConverter> {
    processor: Arc<ItemProcessor<F, S, C>>,
    workers: usize,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
}

impl BatchRunner<ReqwestFetcher, TokioSleeper> {
    /// Production wiring: reqwest transport, tokio sleeps, html2md conversion.
    pub fn from_config(config: ScrapeConfig) -> Result<Self, FetchError> {
        let fetcher = ReqwestFetcher::new(config.fetch)?;
        let processor = ItemProcessor::new(
            RetryingFetcher::new(fetcher, TokioSleeper, config.retry),
            ContentExtractor::default(),
        );
        Ok(Self::new(processor, config.workers))
    }
}

impl<F, S, C> BatchRunner<F, S, C>
where
    F: Fetcher + 'static,
    S: Sleeper + 'static,
    C: Converter + 'static,
{
    pub fn new(processor: ItemProcessor<F, S, C>, workers: usize) -> Self {
        Self {
            processor: Arc::new(processor),
            workers,
            sink: Arc::new(NullProgressSink),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Jobs that have not started when `token` fires are reported as cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Process every identifier and report aggregate counts.
    ///
    /// `workers <= 1` runs in input order on the calling task; otherwise a
    /// pool of `min(workers, identifiers)` tasks drains a pre-filled queue.
    /// Either way exactly one outcome is counted per identifier; a job that
    /// panics is counted as failed with [`ScrapeError::Aborted`].
    pub async fn run(
        &self,
        identifiers: &[String],
        selector: &str,
        output_root: &Path,
    ) -> Result<Summary, BatchError> {
        if identifiers.is_empty() {
            return Err(BatchError::NoIdentifiers);
        }
        parse_selector(selector)?;

        let jobs = Job::batch(identifiers, selector, output_root);
        for job in &jobs {
            self.sink.emit(EngineEvent::Progress(JobProgress {
                job_id: job.id,
                stage: Stage::Queued,
                bytes: None,
            }));
        }

        let summary = if self.workers <= 1 {
            self.run_sequential(jobs).await
        } else {
            self.run_concurrent(jobs).await
        };

        mdify_info!("Completed: {}", summary);
        Ok(summary)
    }

    async fn run_sequential(&self, jobs: Vec<Job>) -> Summary {
        let mut summary = Summary::new();
        for job in jobs {
            let outcome = process_unless_cancelled(
                self.processor.as_ref(),
                job,
                self.sink.as_ref(),
                &self.cancel,
            )
            .await;
            record(&mut summary, &outcome);
        }
        summary
    }

    async fn run_concurrent(&self, jobs: Vec<Job>) -> Summary {
        let worker_count = self.workers.min(jobs.len());
        mdify_info!(
            "Starting {} workers to process {} URLs",
            worker_count,
            jobs.len()
        );

        let mut pending: BTreeMap<JobId, String> = jobs
            .iter()
            .map(|job| (job.id, job.identifier.clone()))
            .collect();

        let (job_tx, job_rx) = mpsc::unbounded_channel();
        for job in jobs {
            // The receiver is alive until the workers below are spawned.
            let _ = job_tx.send(job);
        }
        drop(job_tx);
        let queue: JobQueue = Arc::new(Mutex::new(job_rx));

        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            workers.spawn(worker_loop(
                worker_id,
                self.processor.clone(),
                queue.clone(),
                outcome_tx.clone(),
                self.sink.clone(),
                self.cancel.clone(),
            ));
        }
        drop(outcome_tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                mdify_error!("Worker task failed: {}", err);
            }
        }

        let mut summary = Summary::new();
        while let Some(outcome) = outcome_rx.recv().await {
            pending.remove(&outcome.job_id);
            record(&mut summary, &outcome);
        }

        // Jobs lost with a failed worker still get exactly one outcome.
        for (job_id, identifier) in pending {
            let outcome = Outcome::failure(job_id, identifier, ScrapeError::Aborted);
            record(&mut summary, &outcome);
        }
        summary
    }
}

async fn worker_loop<F, S, C>(
    worker_id: usize,
    processor: Arc<ItemProcessor<F, S, C>>,
    queue: JobQueue,
    outcomes: mpsc::UnboundedSender<Outcome>,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
) where
    F: Fetcher,
    S: Sleeper,
    C: Converter,
{
    loop {
        let next = queue.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };
        mdify_trace!("Worker {} picked job {}", worker_id, job.id);
        let outcome =
            process_unless_cancelled(processor.as_ref(), job, sink.as_ref(), &cancel).await;
        if outcomes.send(outcome).is_err() {
            break;
        }
    }
    mdify_trace!("Worker {} finished", worker_id);
}

async fn process_unless_cancelled<F, S, C>(
    processor: &ItemProcessor<F, S, C>,
    job: Job,
    sink: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> Outcome
where
    F: Fetcher,
    S: Sleeper,
    C: Converter,
{
    let (job_id, identifier) = (job.id, job.identifier.clone());
    if cancel.is_cancelled() {
        sink.emit(EngineEvent::JobCompleted {
            job_id,
            success: false,
        });
        return Outcome::failure(job_id, identifier, ScrapeError::Cancelled);
    }

    // A panic inside the job becomes an Aborted outcome.
    match AssertUnwindSafe(processor.process(job, sink))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(payload) => {
            mdify_error!(
                "Job {} for {} panicked: {}",
                job_id,
                identifier,
                panic_message(payload.as_ref())
            );
            sink.emit(EngineEvent::JobCompleted {
                job_id,
                success: false,
            });
            Outcome::failure(job_id, identifier, ScrapeError::Aborted)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn record(summary: &mut Summary, outcome: &Outcome) {
    match &outcome.result {
        Ok(path) => mdify_info!("✓ Saved: {}", path.display()),
        Err(err) => mdify_warn!("Error scraping {}: {}", outcome.identifier, err),
    }
    summary.record(outcome.is_success());
}
