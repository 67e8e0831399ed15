//! 历史账本：有界、最新在前、每次修改立即持久化
//!
//! 持久化失败只记日志，账本本身继续可用；错误不会传到生成结果里。

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::memory::HistoryStore;

/// 一次成功生成的记录，创建后不可变
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub original_message: String,
    pub generated_reply: String,
    pub tone: String,
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    pub fn new(
        original_message: impl Into<String>,
        generated_reply: impl Into<String>,
        tone: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_message: original_message.into(),
            generated_reply: generated_reply.into(),
            tone: tone.into(),
            timestamp: Local::now(),
        }
    }
}

pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
    capacity: usize,
    store: Box<dyn HistoryStore>,
}

impl std::fmt::Debug for HistoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryLedger")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl HistoryLedger {
    /// 从存储加载；加载失败时记日志并以空账本启动，超出容量的尾部丢弃
    pub fn open(store: impl HistoryStore + 'static, capacity: usize) -> Self {
        let mut entries = store.load().unwrap_or_else(|e| {
            tracing::warn!("History load failed ({}), starting empty", e);
            Vec::new()
        });
        entries.truncate(capacity);
        Self {
            entries,
            capacity,
            store: Box::new(store),
        }
    }

    /// 插入到最前；超出容量时截掉最旧的
    pub fn add(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(self.capacity);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// 最新在前
    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.entries) {
            tracing::warn!("History save failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::MemoryHistoryStore;

    struct FailingStore;

    impl HistoryStore for FailingStore {
        fn load(&self) -> anyhow::Result<Vec<HistoryEntry>> {
            anyhow::bail!("disk unavailable")
        }

        fn save(&self, _entries: &[HistoryEntry]) -> anyhow::Result<()> {
            anyhow::bail!("disk unavailable")
        }
    }

    fn entry(i: usize) -> HistoryEntry {
        HistoryEntry::new(format!("message {i}"), format!("reply {i}"), "Polite")
    }

    #[test]
    fn test_overflow_drops_oldest() {
        for capacity in 1..=20 {
            let mut ledger = HistoryLedger::open(MemoryHistoryStore::new(), capacity);
            let added: Vec<_> = (0..=capacity).map(entry).collect();
            for e in &added {
                ledger.add(e.clone());
            }
            assert_eq!(ledger.len(), capacity);
            assert_eq!(ledger.list()[0], added[capacity]);
            assert!(!ledger.list().contains(&added[0]));
            // 最新在前
            let expected: Vec<_> = added[1..].iter().rev().cloned().collect();
            assert_eq!(ledger.list(), expected.as_slice());
        }
    }

    #[test]
    fn test_every_mutation_persists() {
        let store = Arc::new(MemoryHistoryStore::new());
        let mut ledger = HistoryLedger::open(store.clone(), 20);
        for i in 0..5 {
            ledger.add(entry(i));
        }
        assert_eq!(store.save_count(), 5);
        assert_eq!(store.snapshot().len(), 5);

        ledger.clear();
        assert!(ledger.list().is_empty());
        assert_eq!(store.save_count(), 6);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_open_truncates_loaded_entries() {
        let store = MemoryHistoryStore::with_entries((0..8).map(entry).collect());
        let ledger = HistoryLedger::open(store, 3);
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.get(0).unwrap().original_message, "message 0");
    }

    #[test]
    fn test_usable_when_persistence_fails() {
        let mut ledger = HistoryLedger::open(FailingStore, 2);
        assert!(ledger.is_empty());
        ledger.add(entry(1));
        ledger.add(entry(2));
        ledger.add(entry(3));
        assert_eq!(ledger.len(), 2);
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
