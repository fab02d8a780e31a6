use std::path::PathBuf;

use mdify_core::Job;
use mdify_logging::mdify_info;

use crate::convert::{Converter, Html2MdConverter};
use crate::extract::ContentExtractor;
use crate::fetch::{Fetcher, ProgressSink};
use crate::output_path::resolve_output_path;
use crate::persist::write_atomic;
use crate::retry::{RetryingFetcher, Sleeper};
use crate::types::{EngineEvent, JobProgress, Outcome, ScrapeError, Stage};

/// Runs one job end to end: fetch, extract, resolve path, write.
///
/// The first failing step ends the job. Nothing is written unless every
/// earlier step succeeded, and the write itself is atomic.
pub struct ItemProcessor<F, S, C = Html2MdConverter> {
    fetcher: RetryingFetcher<F, S>,
    extractor: ContentExtractor<C>,
}

impl<F, S, C> ItemProcessor<F, S, C>
where
    F: Fetcher,
    S: Sleeper,
    C: Converter,
{
    pub fn new(fetcher: RetryingFetcher<F, S>, extractor: ContentExtractor<C>) -> Self {
        Self { fetcher, extractor }
    }

    pub async fn process(&self, job: Job, sink: &dyn ProgressSink) -> Outcome {
        mdify_info!("Scraping: {}", job.identifier);
        let result = self.run_pipeline(&job, sink).await;
        sink.emit(EngineEvent::JobCompleted {
            job_id: job.id,
            success: result.is_ok(),
        });
        Outcome {
            job_id: job.id,
            identifier: job.identifier,
            result,
        }
    }

    async fn run_pipeline(
        &self,
        job: &Job,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, ScrapeError> {
        let fetched = self
            .fetcher
            .fetch_with_retries(job.id, &job.identifier, sink)
            .await?;

        emit_stage(sink, job, Stage::Extracting, Some(fetched.metadata.byte_len));
        let markdown = self.extractor.extract(
            &fetched.bytes,
            fetched.metadata.content_type.as_deref(),
            &job.selector,
        )?;

        let path = resolve_output_path(&job.identifier, &job.output_root)?;

        emit_stage(sink, job, Stage::Writing, Some(markdown.len() as u64));
        write_atomic(&path, &markdown).map_err(|source| ScrapeError::Persist {
            path: path.clone(),
            source,
        })?;

        emit_stage(sink, job, Stage::Done, None);
        Ok(path)
    }
}

fn emit_stage(sink: &dyn ProgressSink, job: &Job, stage: Stage, bytes: Option<u64>) {
    sink.emit(EngineEvent::Progress(JobProgress {
        job_id: job.id,
        stage,
        bytes,
    }));
}
