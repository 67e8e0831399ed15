//! 脚本化 LLM 客户端（用于测试，无需 API）
//!
//! 按顺序回放预设结果；脚本用完后返回最后一个结果的副本。可选每次调用的延迟，用于测试取消。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::GenerationRequest;
use crate::llm::{CompletionClient, LlmError};

#[derive(Debug, Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    last: Mutex<Option<Result<String, LlmError>>>,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(script: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// 每次调用都返回同一个结果
    pub fn always(result: Result<String, LlmError>) -> Self {
        Self::new([result])
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_result(&self) -> Result<String, LlmError> {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = script.pop_front() {
            *last = Some(next.clone());
            return next;
        }
        last.clone()
            .unwrap_or_else(|| Err(LlmError::Api("script exhausted".to_string())))
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.next_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ModelId, Tone};

    #[tokio::test]
    async fn test_replays_then_repeats_last() {
        let client = ScriptedClient::new([
            Err(LlmError::Network("reset".into())),
            Ok("hello".to_string()),
        ]);
        let req = GenerationRequest::new("some message here", Tone::Polite, ModelId::default());

        assert!(client.complete(&req).await.is_err());
        assert_eq!(client.complete(&req).await.unwrap(), "hello");
        assert_eq!(client.complete(&req).await.unwrap(), "hello");
        assert_eq!(client.calls(), 3);
    }
}
