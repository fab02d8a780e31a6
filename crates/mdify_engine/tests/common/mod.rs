#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mdify_core::JobId;
use mdify_engine::{
    ContentExtractor, EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, Fetcher,
    ItemProcessor, ProgressSink, RetryPolicy, RetryingFetcher, Sleeper,
};

#[derive(Debug, Clone)]
pub enum Reply {
    Html(String),
    Status(u16),
    Transport,
}

#[derive(Default)]
struct Script {
    replies: HashMap<String, VecDeque<Reply>>,
    calls: HashMap<String, usize>,
}

/// Fake network: per-URL scripted replies, the last one repeating forever.
/// Unscripted URLs answer 404.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    script: Arc<Mutex<Script>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, url: &str, replies: Vec<Reply>) {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(url.to_string(), replies.into());
    }

    pub fn calls(&self, url: &str) -> usize {
        self.script.lock().unwrap().calls.get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.script.lock().unwrap().calls.values().sum()
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        _job_id: JobId,
        url: &str,
        _sink: &dyn ProgressSink,
    ) -> Result<FetchOutput, FetchError> {
        let reply = {
            let mut script = self.script.lock().unwrap();
            *script.calls.entry(url.to_string()).or_default() += 1;
            let next = match script.replies.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            };
            next.unwrap_or(Reply::Status(404))
        };

        match reply {
            Reply::Html(body) => Ok(FetchOutput {
                metadata: FetchMetadata {
                    original_url: url.to_string(),
                    final_url: url.to_string(),
                    content_type: Some("text/html; charset=utf-8".to_string()),
                    byte_len: body.len() as u64,
                },
                bytes: body.into_bytes(),
            }),
            Reply::Status(code) => Err(FetchError::new(
                FailureKind::HttpStatus(code),
                format!("HTTP {code}"),
            )),
            Reply::Transport => Err(FetchError::new(FailureKind::Network, "connection refused")),
        }
    }
}

/// Records requested delays and returns immediately.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn durations(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

#[derive(Default)]
pub struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn page(body: &str) -> Reply {
    Reply::Html(format!(
        "<html><head><title>T</title></head><body><nav>Menu</nav><div class=\"content\">{body}</div></body></html>"
    ))
}

pub fn processor(
    fetcher: ScriptedFetcher,
    sleeper: RecordingSleeper,
    max_retries: u32,
) -> ItemProcessor<ScriptedFetcher, RecordingSleeper> {
    ItemProcessor::new(
        RetryingFetcher::new(fetcher, sleeper, RetryPolicy::new(max_retries)),
        ContentExtractor::default(),
    )
}
