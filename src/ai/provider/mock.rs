//! Scripted provider for tests.
//!
//! Each call consumes the next script; the last script repeats once the
//! queue is down to one entry.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{ChunkStream, LlmProvider, LlmResponse, StreamEvent, TokenUsage};
use crate::types::{ErrorCategory, LlmError, PromptRequest};

#[derive(Debug, Clone)]
pub(crate) enum Script {
    /// Single-shot answer; streamed as one fragment
    Complete {
        delay: Duration,
        result: Result<String, LlmError>,
    },
    /// Streamed answer; answered whole by `complete`
    Stream(Vec<StreamStep>),
    /// Opening the stream fails
    FailOpen(LlmError),
}

#[derive(Debug, Clone)]
pub(crate) enum StreamStep {
    Chunk(String),
    Delay(Duration),
    Fail(LlmError),
    /// Close the stream without a completion event
    End,
}

impl Script {
    pub(crate) fn text(text: &str) -> Self {
        Script::Complete {
            delay: Duration::ZERO,
            result: Ok(text.to_string()),
        }
    }

    pub(crate) fn error(category: ErrorCategory) -> Self {
        Script::Complete {
            delay: Duration::ZERO,
            result: Err(LlmError::new(category, format!("scripted {}", category))),
        }
    }

    pub(crate) fn chunks(chunks: &[&str]) -> Self {
        Script::Stream(
            chunks
                .iter()
                .map(|c| StreamStep::Chunk(c.to_string()))
                .collect(),
        )
    }
}

#[derive(Debug)]
pub(crate) struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    calls: AtomicU32,
    caching: bool,
    saw_caching_hint: AtomicBool,
}

impl ScriptedProvider {
    pub(crate) fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            calls: AtomicU32::new(0),
            caching: false,
            saw_caching_hint: AtomicBool::new(false),
        }
    }

    pub(crate) fn with_caching(mut self) -> Self {
        self.caching = true;
        self
    }

    /// Calls made so far, single-shot and streaming
    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether any request so far carried a caching hint
    pub(crate) fn saw_caching_hint(&self) -> bool {
        self.saw_caching_hint.load(Ordering::SeqCst)
    }

    fn next_script(&self) -> Script {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.len() > 1 {
            scripts.pop_front().unwrap()
        } else {
            scripts
                .front()
                .cloned()
                .unwrap_or_else(|| Script::error(ErrorCategory::Unknown))
        }
    }

    fn usage(&self, request: &PromptRequest, output_tokens: u32) -> TokenUsage {
        if request.caching_hint {
            self.saw_caching_hint.store(true, Ordering::SeqCst);
        }
        let cached = self.caching && request.caching_hint;
        TokenUsage {
            input_tokens: 100,
            output_tokens,
            cache_read_tokens: cached.then_some(80),
            cache_write_tokens: None,
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(&self, request: &PromptRequest) -> Result<LlmResponse, LlmError> {
        let text = match self.next_script() {
            Script::Complete { delay, result } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result?
            }
            Script::Stream(steps) => {
                let mut text = String::new();
                for step in steps {
                    match step {
                        StreamStep::Chunk(chunk) => text.push_str(&chunk),
                        StreamStep::Delay(delay) => tokio::time::sleep(delay).await,
                        StreamStep::Fail(err) => return Err(err),
                        StreamStep::End => break,
                    }
                }
                text
            }
            Script::FailOpen(err) => return Err(err),
        };

        Ok(LlmResponse {
            usage: self.usage(request, 1),
            model: "scripted-model".to_string(),
            text,
        })
    }

    async fn stream(&self, request: &PromptRequest) -> Result<ChunkStream, LlmError> {
        let steps = match self.next_script() {
            Script::Complete { delay, result } => {
                let mut steps = vec![StreamStep::Delay(delay)];
                match result {
                    Ok(text) => steps.push(StreamStep::Chunk(text)),
                    Err(err) => steps.push(StreamStep::Fail(err)),
                }
                steps
            }
            Script::Stream(steps) => steps,
            Script::FailOpen(err) => return Err(err),
        };

        let chunk_count = steps
            .iter()
            .filter(|s| matches!(s, StreamStep::Chunk(_)))
            .count() as u32;
        let usage = self.usage(request, chunk_count);

        Ok(Box::pin(async_stream::stream! {
            let mut finished = true;
            for step in steps {
                match step {
                    StreamStep::Chunk(chunk) => yield Ok(StreamEvent::Delta(chunk)),
                    StreamStep::Delay(delay) => tokio::time::sleep(delay).await,
                    StreamStep::Fail(err) => {
                        yield Err(err);
                        finished = false;
                        break;
                    }
                    StreamStep::End => {
                        finished = false;
                        break;
                    }
                }
            }
            if finished {
                yield Ok(StreamEvent::Usage(usage));
                yield Ok(StreamEvent::Done);
            }
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn supports_caching(&self) -> bool {
        self.caching
    }
}
