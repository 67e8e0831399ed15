//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；Bearer Key 由设置提供。
//! 整个调用受 request_timeout 约束，超时与重试退避相互独立。
//! async_openai 自带的 429/5xx 退避重试被关闭，每次 complete 只发一个 HTTP 请求，重试只由编排器决定。

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::config::LlmSection;
use crate::core::GenerationRequest;
use crate::llm::{build_messages, CompletionClient, LlmError, Message, Role};

/// OpenAI 兼容客户端：complete 时把请求转为 Chat Completion 消息，取首条 choice 的 content
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    max_tokens: u32,
    temperature: f32,
    request_timeout: Duration,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, api_key: &str) -> Self {
        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config).with_backoff(single_attempt()),
            max_tokens: 300,
            temperature: 0.7,
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn from_config(llm: &LlmSection, api_key: &str) -> Self {
        Self::new(llm.base_url.as_deref(), api_key)
            .with_sampling(llm.max_tokens, llm.temperature)
            .with_timeout(Duration::from_secs(llm.timeouts.request))
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn to_openai_messages(
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
        messages
            .iter()
            .map(|m| {
                let built = match m.role {
                    Role::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map(ChatCompletionRequestMessage::System),
                    Role::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map(ChatCompletionRequestMessage::User),
                };
                built.map_err(|e| LlmError::Api(e.to_string()))
            })
            .collect()
    }

    async fn send(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let body = CreateChatCompletionRequestArgs::default()
            .model(request.model.as_str())
            .messages(Self::to_openai_messages(&build_messages(request))?)
            .max_completion_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build()
            .map_err(|e| LlmError::Api(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(body)
            .await
            .map_err(map_openai_error)?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}

/// 已耗时必然大于零，第一次失败后 next_backoff 即返回 None
fn single_attempt() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// 先看服务端结构化的 type/code，再回落到文本归类
fn map_openai_error(err: OpenAIError) -> LlmError {
    if let OpenAIError::ApiError(api) = &err {
        let tag = |v: &Option<String>| v.as_deref().unwrap_or_default().to_lowercase();
        let (kind, code) = (tag(&api.r#type), tag(&api.code));
        if code == "invalid_api_key" || kind == "invalid_api_key" {
            return LlmError::Unauthorized(api.message.clone());
        }
        if code == "rate_limit_exceeded"
            || code == "insufficient_quota"
            || matches!(kind.as_str(), "requests" | "tokens" | "insufficient_quota")
        {
            return LlmError::RateLimited(api.message.clone());
        }
    }
    LlmError::classify(err.to_string())
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        match tokio::time::timeout(self.request_timeout, self.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.request_timeout)),
        }
    }
}
