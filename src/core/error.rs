//! 生成错误分类与结果类型
//!
//! 与 RetryPolicy 配合：ErrorKind 决定是否重试；GenerationOutcome 是编排器对调用方的唯一返回值，
//! 取消不是错误，调用方需单独处理以免弹出错误提示。

use std::fmt;

use thiserror::Error;

/// 错误分类：本地校验（不重试）、远端（调用后分类）、循环放弃
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyInput,
    TooShort,
    TooLong,
    MissingCredential,
    Unauthorized,
    RateLimited,
    Network,
    Other,
    ExhaustedRetries,
}

impl ErrorKind {
    /// 仅网络 / 服务端瞬时错误与限流可重试
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::Network | ErrorKind::Other)
    }

    /// 本地校验错误：同步返回，无副作用
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            ErrorKind::EmptyInput
                | ErrorKind::TooShort
                | ErrorKind::TooLong
                | ErrorKind::MissingCredential
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::EmptyInput => "empty input",
            ErrorKind::TooShort => "input too short",
            ErrorKind::TooLong => "input too long",
            ErrorKind::MissingCredential => "missing API key",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::RateLimited => "rate limited",
            ErrorKind::Network => "network error",
            ErrorKind::Other => "API error",
            ErrorKind::ExhaustedRetries => "retries exhausted",
        };
        f.write_str(s)
    }
}

/// 带原始信息的失败
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct GenerationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// 面向用户的可读原因
    pub fn friendly_message(&self) -> String {
        let lower = self.message.to_lowercase();
        match self.kind {
            ErrorKind::EmptyInput => "Please enter a message to generate a reply.".to_string(),
            ErrorKind::TooShort => {
                "Please enter at least 10 characters for better results.".to_string()
            }
            ErrorKind::TooLong => self.message.clone(),
            ErrorKind::MissingCredential => {
                "OpenAI API key is not configured. Set it with /key or enable offline mode."
                    .to_string()
            }
            ErrorKind::Unauthorized => "Invalid API key. Please check your settings.".to_string(),
            ErrorKind::RateLimited => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            _ if lower.contains("timeout") || lower.contains("timed out") => {
                "Request timed out. Please check your internet connection.".to_string()
            }
            ErrorKind::Network => {
                "Network error. Please check your internet connection.".to_string()
            }
            _ => self.message.clone(),
        }
    }
}

/// 一次生成的结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(String),
    Cancelled,
    Failed(GenerationError),
}

impl GenerationOutcome {
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failed(GenerationError::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed(e) => Some(e.kind),
            _ => None,
        }
    }
}
