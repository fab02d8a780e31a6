mod common;

use std::fs;

use common::{page, processor, RecordingSleeper, Reply, ScriptedFetcher, TestSink};
use mdify_core::Job;
use mdify_engine::{EngineEvent, JobProgress, ScrapeError, Stage};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const URL: &str = "https://docs.example.com/guide/start";

fn stages(sink: &TestSink) -> Vec<Stage> {
    sink.take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Progress(JobProgress { stage, .. }) => Some(stage),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn successful_job_walks_every_stage_and_writes_the_file() {
    let temp = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new();
    fetcher.script(URL, vec![page("<h2>Start</h2><p>Read me</p>")]);
    let sink = TestSink::new();
    let job = Job::new(7, URL, ".content", temp.path());

    let outcome = processor(fetcher, RecordingSleeper::default(), 3)
        .process(job, &sink)
        .await;

    let expected = temp.path().join("guide/start.md");
    assert!(outcome.is_success());
    assert_eq!(outcome.job_id, 7);
    assert_eq!(outcome.identifier, URL);
    assert_eq!(outcome.output_path(), Some(expected.as_path()));
    let written = fs::read_to_string(&expected).unwrap();
    assert!(written.contains("Start"));
    assert!(written.contains("Read me"));
    assert!(!written.contains("Menu"));
    assert_eq!(
        stages(&sink),
        vec![Stage::Extracting, Stage::Writing, Stage::Done]
    );
}

#[tokio::test]
async fn failed_extraction_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new();
    fetcher.script(URL, vec![Reply::Html("<p>no container</p>".into())]);
    let sink = TestSink::new();
    let job = Job::new(1, URL, ".content", temp.path());

    let outcome = processor(fetcher, RecordingSleeper::default(), 3)
        .process(job, &sink)
        .await;

    assert!(matches!(
        outcome.error(),
        Some(ScrapeError::SelectorNoMatch { selector }) if selector == ".content"
    ));
    assert_eq!(outcome.output_path(), None);
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    let events = sink.take();
    assert!(events.contains(&EngineEvent::JobCompleted {
        job_id: 1,
        success: false
    }));
}

#[tokio::test]
async fn fetch_failure_ends_the_job_before_extraction() {
    let temp = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new();
    fetcher.script(URL, vec![Reply::Status(404)]);
    let sink = TestSink::new();

    let outcome = processor(fetcher.clone(), RecordingSleeper::default(), 3)
        .process(Job::new(2, URL, ".content", temp.path()), &sink)
        .await;

    assert!(matches!(outcome.error(), Some(ScrapeError::NotFound { .. })));
    assert_eq!(fetcher.calls(URL), 1);
    assert!(stages(&sink).is_empty());
}

#[tokio::test]
async fn blocked_output_directory_is_a_job_failure() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("guide"), "file in the way").unwrap();
    let fetcher = ScriptedFetcher::new();
    fetcher.script(URL, vec![page("<p>x</p>")]);

    let outcome = processor(fetcher, RecordingSleeper::default(), 0)
        .process(Job::new(3, URL, ".content", temp.path()), &TestSink::new())
        .await;

    match outcome.error() {
        Some(ScrapeError::DirectoryCreation { path, .. }) => {
            assert_eq!(path, &temp.path().join("guide"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}
