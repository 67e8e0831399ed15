//! LLM 层：补全客户端抽象与实现（OpenAI 兼容 / 脚本化 Mock）、Prompt 组装

pub mod message;
pub mod mock;
pub mod openai;
pub mod prompt;
pub mod traits;

pub use message::{Message, Role};
pub use mock::ScriptedClient;
pub use openai::OpenAiClient;
pub use prompt::{build_messages, offline_reply};
pub use traits::{CompletionClient, LlmError};
