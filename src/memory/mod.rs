//! 记忆层：撤销栈（会话内）、历史账本（跨会话持久化）与导出

pub mod export;
pub mod history;
pub mod persistence;
pub mod undo;

pub use export::{default_export_file_name, export_json, export_text, export_to_file, ExportFormat};
pub use history::{HistoryEntry, HistoryLedger};
pub use persistence::{HistoryStore, JsonHistoryStore, MemoryHistoryStore};
pub use undo::{UndoSnapshot, UndoStack};
