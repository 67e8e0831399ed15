//! 历史持久化
//!
//! HistoryStore 是账本与存储之间的接缝：JSON 文件实现用于正式运行，内存实现用于测试与离线演示。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::memory::HistoryEntry;

pub trait HistoryStore: Send + Sync {
    fn load(&self) -> anyhow::Result<Vec<HistoryEntry>>;
    fn save(&self, entries: &[HistoryEntry]) -> anyhow::Result<()>;
}

/// 单文件 JSON，整表覆盖写
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonHistoryStore {
    /// 文件不存在时返回空 Vec
    fn load(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// 父目录不存在时自动创建
    fn save(&self, entries: &[HistoryEntry]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

/// 内存存储，记录 save 次数
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
    saves: AtomicUsize,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        Ok(self.snapshot())
    }

    fn save(&self, entries: &[HistoryEntry]) -> anyhow::Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("history store poisoned"))?;
        *guard = entries.to_vec();
        Ok(())
    }
}

/// 共享引用也可作为存储（测试中保留句柄以检查 save 次数）
impl<T: HistoryStore + ?Sized> HistoryStore for std::sync::Arc<T> {
    fn load(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        (**self).load()
    }

    fn save(&self, entries: &[HistoryEntry]) -> anyhow::Result<()> {
        (**self).save(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_store_roundtrip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("nested").join("history.json"));
        assert!(store.load().unwrap().is_empty());

        let entries = vec![
            HistoryEntry::new("Could you send the report?", "Sure, sending it now.", "Polite"),
            HistoryEntry::new("Thanks for lunch yesterday", "Anytime!", "Friendly"),
        ];
        store.save(&entries).unwrap();
        assert_eq!(store.load().unwrap(), entries);
    }

    #[test]
    fn test_json_store_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(JsonHistoryStore::new(&path).load().is_err());
    }
}
