//! 生成监管：中断管理
//!
//! 持有会话级 CancellationToken；每次生成取一个子 token 登记为「当前生成」。
//! 整个会话只装一个 Ctrl+C 监听：有生成在跑时只取消它，空闲时取消会话本身（退出）。

use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

/// Clone 出的句柄共享会话 token 与当前生成槽位，可交给信号监听任务
#[derive(Clone, Debug, Default)]
pub struct GenerationSupervisor {
    session: CancellationToken,
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl GenerationSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 为一次生成创建子 token 并登记
    pub fn begin(&self) -> CancellationToken {
        let token = self.session.child_token();
        *self.slot() = Some(token.clone());
        token
    }

    /// 生成结束，清空登记
    pub fn end(&self) {
        self.slot().take();
    }

    /// 取消正在进行的生成；没有生成在跑时返回 false
    pub fn cancel_current(&self) -> bool {
        match self.slot().take() {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// 结束整个会话（连带取消当前生成）
    pub fn cancel(&self) {
        self.session.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.session.is_cancelled()
    }

    pub fn session_token(&self) -> CancellationToken {
        self.session.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_propagates_to_child() {
        let supervisor = GenerationSupervisor::new();
        let child = supervisor.begin();
        supervisor.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_cancel_current_leaves_session_running() {
        let supervisor = GenerationSupervisor::new();
        let watcher = supervisor.clone();

        let first = supervisor.begin();
        assert!(watcher.cancel_current());
        assert!(first.is_cancelled());
        assert!(!supervisor.is_cancelled());

        // 同一个会话可以继续下一次生成
        let second = supervisor.begin();
        assert!(!second.is_cancelled());
        supervisor.end();
        assert!(!watcher.cancel_current());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_cancel_current_when_idle() {
        let supervisor = GenerationSupervisor::new();
        assert!(!supervisor.cancel_current());
        assert!(!supervisor.session_token().is_cancelled());
    }
}
