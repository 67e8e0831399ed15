//! 生成阶段（供界面投影）
//!
//! Idle -> Validating -> Submitting -> {Calling <-> Retrying} -> {Succeeded | Cancelled | Failed} -> Idle

use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum GenerationPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Calling {
        attempt: u32,
        max_attempts: u32,
    },
    /// 等待退避结束；rate_limited 区分「限流重试」与普通重试的提示文案
    Retrying {
        attempt: u32,
        max_attempts: u32,
        delay_ms: u64,
        rate_limited: bool,
    },
    Succeeded,
    Cancelled,
    Failed,
}

impl GenerationPhase {
    pub fn is_busy(&self) -> bool {
        !matches!(
            self,
            GenerationPhase::Idle
                | GenerationPhase::Succeeded
                | GenerationPhase::Cancelled
                | GenerationPhase::Failed
        )
    }

    /// 状态栏文案
    pub fn status_text(&self) -> Option<String> {
        match self {
            GenerationPhase::Retrying {
                attempt,
                max_attempts,
                delay_ms,
                rate_limited: true,
            } => Some(format!(
                "Rate limited, retrying in {}s... (Attempt {}/{})",
                delay_ms / 1000,
                attempt,
                max_attempts
            )),
            GenerationPhase::Retrying {
                attempt,
                max_attempts,
                ..
            } => Some(format!("Retrying... (Attempt {}/{})", attempt, max_attempts)),
            GenerationPhase::Cancelled => Some("Generation cancelled".to_string()),
            GenerationPhase::Failed => Some("Generation failed".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_rate_limited() {
        let phase = GenerationPhase::Retrying {
            attempt: 1,
            max_attempts: 3,
            delay_ms: 2000,
            rate_limited: true,
        };
        assert_eq!(
            phase.status_text().as_deref(),
            Some("Rate limited, retrying in 2s... (Attempt 1/3)")
        );
        assert!(phase.is_busy());
        assert!(!GenerationPhase::Idle.is_busy());
    }
}
