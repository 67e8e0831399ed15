//! 重试策略
//!
//! 纯函数：根据尝试次数与错误分类给出 RetryDecision。限流按指数退避（2s、4s、8s…），
//! 其它可重试错误固定 1s；凭证错误与本地校验错误第一次就停止。

use std::time::Duration;

use crate::config::RetrySection;
use crate::core::ErrorKind;

/// 重试决策
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    Stop,
    RetryAfter(Duration),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limit_base_delay: Duration,
    pub transient_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_base_delay: Duration::from_millis(2000),
            transient_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&RetrySection> for RetryPolicy {
    fn from(section: &RetrySection) -> Self {
        Self {
            max_attempts: section.max_attempts.max(1),
            rate_limit_base_delay: Duration::from_millis(section.rate_limit_base_delay_ms),
            transient_delay: Duration::from_millis(section.transient_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// attempt 从 1 开始；attempt >= max_attempts 时一律 Stop
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts || !kind.is_retryable() {
            return RetryDecision::Stop;
        }
        match kind {
            ErrorKind::RateLimited => RetryDecision::RetryAfter(self.rate_limit_delay(attempt)),
            _ => RetryDecision::RetryAfter(self.transient_delay),
        }
    }

    /// base * 2^(attempt-1)，溢出时饱和
    fn rate_limit_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.rate_limit_base_delay.saturating_mul(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [ErrorKind; 9] = [
        ErrorKind::EmptyInput,
        ErrorKind::TooShort,
        ErrorKind::TooLong,
        ErrorKind::MissingCredential,
        ErrorKind::Unauthorized,
        ErrorKind::RateLimited,
        ErrorKind::Network,
        ErrorKind::Other,
        ErrorKind::ExhaustedRetries,
    ];

    #[test]
    fn test_last_attempt_always_stops() {
        let policy = RetryPolicy::default();
        for kind in ALL_KINDS {
            assert_eq!(policy.decide(policy.max_attempts, kind), RetryDecision::Stop);
            assert_eq!(policy.decide(policy.max_attempts + 1, kind), RetryDecision::Stop);
        }
    }

    #[test]
    fn test_rate_limit_doubles() {
        let policy = RetryPolicy {
            max_attempts: 5,
            ..RetryPolicy::default()
        };
        assert_eq!(
            policy.decide(1, ErrorKind::RateLimited),
            RetryDecision::RetryAfter(Duration::from_millis(2000))
        );
        assert_eq!(
            policy.decide(2, ErrorKind::RateLimited),
            RetryDecision::RetryAfter(Duration::from_millis(4000))
        );
        assert_eq!(
            policy.decide(3, ErrorKind::RateLimited),
            RetryDecision::RetryAfter(Duration::from_millis(8000))
        );
    }

    #[test]
    fn test_transient_delay_is_flat() {
        let policy = RetryPolicy::default();
        for attempt in 1..policy.max_attempts {
            assert_eq!(
                policy.decide(attempt, ErrorKind::Network),
                RetryDecision::RetryAfter(Duration::from_millis(1000))
            );
            assert_eq!(
                policy.decide(attempt, ErrorKind::Other),
                RetryDecision::RetryAfter(Duration::from_millis(1000))
            );
        }
    }

    #[test]
    fn test_terminal_kinds_stop_on_first_attempt() {
        let policy = RetryPolicy::default();
        for kind in ALL_KINDS.into_iter().filter(|k| !k.is_retryable()) {
            assert_eq!(policy.decide(1, kind), RetryDecision::Stop);
        }
    }

    #[test]
    fn test_huge_attempt_saturates() {
        let policy = RetryPolicy {
            max_attempts: u32::MAX,
            ..RetryPolicy::default()
        };
        assert!(matches!(
            policy.decide(200, ErrorKind::RateLimited),
            RetryDecision::RetryAfter(_)
        ));
    }

    #[test]
    fn test_from_config_section() {
        let section = RetrySection {
            max_attempts: 0,
            rate_limit_base_delay_ms: 500,
            transient_delay_ms: 250,
        };
        let policy = RetryPolicy::from(&section);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.rate_limit_base_delay, Duration::from_millis(500));
        assert_eq!(policy.transient_delay, Duration::from_millis(250));
    }
}
