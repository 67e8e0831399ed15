//! 核心编排层：请求与语气、错误分类、重试策略、阶段投影、取消监管、生成编排器

pub mod error;
pub mod orchestrator;
pub mod request;
pub mod retry;
pub mod state;
pub mod supervisor;

pub use error::{ErrorKind, GenerationError, GenerationOutcome};
pub use orchestrator::{GenerationOrchestrator, InputLimits};
pub use request::{estimate_cost, CostEstimate, GenerationRequest, ModelId, Tone};
pub use retry::{RetryDecision, RetryPolicy};
pub use state::GenerationPhase;
pub use supervisor::GenerationSupervisor;
