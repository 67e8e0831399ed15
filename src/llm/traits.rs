//! 补全客户端抽象
//!
//! 编排器只依赖 CompletionClient；真实后端（OpenAI 兼容）与测试用的脚本客户端都实现它。
//! 取消由编排器在外层 select 并丢弃 future 完成，客户端无需感知。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::{ErrorKind, GenerationRequest};

/// 传输层错误，已按是否可重试分类
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum LlmError {
    #[error("Invalid API key: {0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("API error: {0}")]
    Api(String),
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::Unauthorized(_) => ErrorKind::Unauthorized,
            LlmError::RateLimited(_) => ErrorKind::RateLimited,
            LlmError::Network(_) | LlmError::Timeout(_) => ErrorKind::Network,
            LlmError::Api(_) => ErrorKind::Other,
        }
    }

    /// 从原始错误文本归类（HTTP 状态码或服务端消息）
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&["401", "unauthorized", "invalid api key", "incorrect api key", "invalid_api_key"]) {
            LlmError::Unauthorized(message)
        } else if has(&["429", "rate limit", "rate_limit", "too many requests", "quota"]) {
            LlmError::RateLimited(message)
        } else if has(&[
            "timed out",
            "timeout",
            "error sending request",
            "connect",
            "dns",
            "network",
        ]) {
            LlmError::Network(message)
        } else {
            LlmError::Api(message)
        }
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// 非流式完成，返回回复正文
    async fn complete(&self, request: &GenerationRequest) -> Result<String, LlmError>;
}
