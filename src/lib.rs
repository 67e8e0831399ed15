//! Reply Helper - Rust 智能回复助手
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 生成编排、错误分类、重试策略、阶段投影、取消监管
//! - **llm**: 补全客户端抽象与实现（OpenAI 兼容 / 脚本化 Mock）
//! - **memory**: 撤销栈、历史账本、持久化与导出
//! - **observability**: 日志初始化
//! - **settings**: 用户设置（API Key、默认语气、离线模式）

pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod settings;

pub use crate::core::{GenerationOrchestrator, GenerationOutcome, GenerationRequest, Tone};
