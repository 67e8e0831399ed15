//! 生成编排器：校验 -> 撤销快照 -> 可取消、可重试的补全调用 -> 写入历史
//!
//! 撤销栈与历史账本由编排器持有，界面层只通过这里的方法读写。
//! generate 需要 &mut self，同一实例同时只有一次生成；由调用方禁用触发控件保证。

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::core::{
    ErrorKind, GenerationError, GenerationOutcome, GenerationPhase, GenerationRequest,
    RetryDecision, RetryPolicy,
};
use crate::llm::{offline_reply, CompletionClient};
use crate::memory::{HistoryEntry, HistoryLedger, UndoSnapshot, UndoStack};
use crate::settings::AppSettings;

/// 输入长度限制（按字符计）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputLimits {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            min_chars: 10,
            max_chars: 2000,
        }
    }
}

pub struct GenerationOrchestrator {
    client: Arc<dyn CompletionClient>,
    policy: RetryPolicy,
    limits: InputLimits,
    offline_delay: Duration,
    settings: AppSettings,
    undo: UndoStack,
    history: HistoryLedger,
    phase_tx: watch::Sender<GenerationPhase>,
}

impl GenerationOrchestrator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        history: HistoryLedger,
        settings: AppSettings,
    ) -> Self {
        let (phase_tx, _) = watch::channel(GenerationPhase::Idle);
        Self {
            client,
            policy: RetryPolicy::default(),
            limits: InputLimits::default(),
            offline_delay: Duration::from_millis(2000),
            settings,
            undo: UndoStack::new(10),
            history,
            phase_tx,
        }
    }

    /// 按配置文件设定重试、容量、长度限制与离线延迟
    pub fn from_config(
        cfg: &AppConfig,
        client: Arc<dyn CompletionClient>,
        history: HistoryLedger,
        settings: AppSettings,
    ) -> Self {
        Self::new(client, history, settings)
            .with_policy(RetryPolicy::from(&cfg.retry))
            .with_undo_capacity(cfg.app.max_undo_states)
            .with_limits(InputLimits {
                min_chars: cfg.app.min_input_length,
                max_chars: cfg.app.max_input_length,
            })
            .with_offline_delay(Duration::from_millis(cfg.offline.delay_ms))
    }

    /// 至少尝试一次
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = RetryPolicy {
            max_attempts: policy.max_attempts.max(1),
            ..policy
        };
        self
    }

    pub fn with_undo_capacity(mut self, capacity: usize) -> Self {
        self.undo = UndoStack::new(capacity);
        self
    }

    pub fn with_limits(mut self, limits: InputLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_offline_delay(mut self, delay: Duration) -> Self {
        self.offline_delay = delay;
        self
    }

    /// 换 Key 或端点后替换传输客户端
    pub fn replace_client(&mut self, client: Arc<dyn CompletionClient>) {
        self.client = client;
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut AppSettings {
        &mut self.settings
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        tracing::info!("History cleared");
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    /// 弹出最近的快照，由调用方恢复到编辑区
    pub fn undo(&mut self) -> Option<UndoSnapshot> {
        self.undo.pop()
    }

    /// 生成以外的编辑（如从历史载入）也要可撤销
    pub fn record_snapshot(&mut self, snapshot: UndoSnapshot) {
        self.undo.push(snapshot);
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationPhase> {
        self.phase_tx.subscribe()
    }

    fn set_phase(&self, phase: GenerationPhase) {
        self.phase_tx.send_replace(phase);
    }

    /// 本地校验：空、过短、过长、缺少凭证（离线模式不需要凭证）
    pub fn validate(&self, request: &GenerationRequest) -> Result<(), GenerationError> {
        let len = request.char_len();
        if request.message.trim().is_empty() {
            return Err(GenerationError::new(
                ErrorKind::EmptyInput,
                "Please enter a message to generate a reply.",
            ));
        }
        if len < self.limits.min_chars {
            return Err(GenerationError::new(
                ErrorKind::TooShort,
                format!(
                    "Input has {} characters, at least {} are required.",
                    len, self.limits.min_chars
                ),
            ));
        }
        if len > self.limits.max_chars {
            return Err(GenerationError::new(
                ErrorKind::TooLong,
                format!(
                    "Input has {} characters, at most {} are allowed.",
                    len, self.limits.max_chars
                ),
            ));
        }
        if !self.settings.offline_mode && self.settings.api_key.trim().is_empty() {
            return Err(GenerationError::new(
                ErrorKind::MissingCredential,
                "OpenAI API key is not configured.",
            ));
        }
        Ok(())
    }

    /// 一次完整生成
    ///
    /// `current` 是调用前编辑区的状态，校验通过后（无论结果如何）入撤销栈。
    /// 取消在调用中或退避中都会立即生效；只要取消信号先于完成被观察到，结果就是 Cancelled。
    pub async fn generate(
        &mut self,
        request: &GenerationRequest,
        current: UndoSnapshot,
        cancel: &CancellationToken,
    ) -> GenerationOutcome {
        let started = Instant::now();
        // 任一路径退出都会取消并释放子 token
        let token = cancel.child_token();
        let _release = token.clone().drop_guard();

        self.set_phase(GenerationPhase::Validating);
        if let Err(e) = self.validate(request) {
            tracing::debug!("Validation rejected input: {}", e);
            self.finish(GenerationPhase::Failed);
            return GenerationOutcome::Failed(e);
        }

        self.set_phase(GenerationPhase::Submitting);
        self.undo.push(current);

        let outcome = if self.settings.offline_mode {
            self.offline(request, &token).await
        } else {
            self.call_with_retry(request, &token).await
        };

        let elapsed = started.elapsed().as_secs();
        match &outcome {
            GenerationOutcome::Success(reply) => {
                tracing::info!(tone = %request.tone, model = %request.model, "Reply generated in {}s", elapsed);
                self.history.add(HistoryEntry::new(
                    request.message.clone(),
                    reply.clone(),
                    request.tone.label(),
                ));
                self.finish(GenerationPhase::Succeeded);
            }
            GenerationOutcome::Cancelled => {
                tracing::info!("Generation cancelled after {}s", elapsed);
                self.finish(GenerationPhase::Cancelled);
            }
            GenerationOutcome::Failed(e) => {
                tracing::warn!(kind = ?e.kind, "Generation failed: {}", e.message);
                self.finish(GenerationPhase::Failed);
            }
        }
        outcome
    }

    fn finish(&self, terminal: GenerationPhase) {
        self.set_phase(terminal);
        self.set_phase(GenerationPhase::Idle);
    }

    /// 离线模式：不走网络与重试，固定延迟后返回占位回复
    async fn offline(
        &self,
        request: &GenerationRequest,
        token: &CancellationToken,
    ) -> GenerationOutcome {
        self.set_phase(GenerationPhase::Calling {
            attempt: 1,
            max_attempts: 1,
        });
        tokio::select! {
            biased;
            _ = token.cancelled() => GenerationOutcome::Cancelled,
            _ = tokio::time::sleep(self.offline_delay) => {
                GenerationOutcome::Success(offline_reply(request.tone))
            }
        }
    }

    async fn call_with_retry(
        &self,
        request: &GenerationRequest,
        token: &CancellationToken,
    ) -> GenerationOutcome {
        let client = Arc::clone(&self.client);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_message = None;

        for attempt in 1..=max_attempts {
            self.set_phase(GenerationPhase::Calling {
                attempt,
                max_attempts,
            });

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return GenerationOutcome::Cancelled,
                r = client.complete(request) => r,
            };
            if token.is_cancelled() {
                return GenerationOutcome::Cancelled;
            }

            let err = match result {
                Ok(reply) => return GenerationOutcome::Success(reply),
                Err(e) => e,
            };
            let kind = err.kind();
            tracing::warn!(attempt, max_attempts, ?kind, "Completion attempt failed: {}", err);

            match self.policy.decide(attempt, kind) {
                RetryDecision::Stop if kind.is_retryable() => {
                    return GenerationOutcome::failed(ErrorKind::ExhaustedRetries, err.to_string());
                }
                RetryDecision::Stop => return GenerationOutcome::failed(kind, err.to_string()),
                RetryDecision::RetryAfter(delay) => {
                    self.set_phase(GenerationPhase::Retrying {
                        attempt,
                        max_attempts,
                        delay_ms: delay.as_millis() as u64,
                        rate_limited: kind == ErrorKind::RateLimited,
                    });
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return GenerationOutcome::Cancelled,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
            last_message = Some(err.to_string());
        }

        GenerationOutcome::failed(
            ErrorKind::ExhaustedRetries,
            last_message.unwrap_or_else(|| "Failed after multiple retries".to_string()),
        )
    }
}
