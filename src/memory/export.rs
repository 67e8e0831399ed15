//! 历史导出：JSON（保留全部字段）或可读文本

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::memory::HistoryEntry;

const RULE_WIDTH: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
}

impl ExportFormat {
    /// `.json` 导出为 JSON，其余一律文本
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Text,
        }
    }
}

pub fn default_export_file_name(now: DateTime<Local>) -> String {
    format!("reply_history_{}", now.format("%Y%m%d_%H%M%S"))
}

pub fn export_json(entries: &[HistoryEntry]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(entries)
}

pub fn export_text(entries: &[HistoryEntry], exported_at: DateTime<Local>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Reply Helper - Exported History");
    let _ = writeln!(out, "Export Date: {}", exported_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    out.push('\n');

    for entry in entries {
        let _ = writeln!(out, "Date: {}", entry.timestamp.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "Tone: {}", entry.tone);
        let _ = writeln!(out, "Original: {}", entry.original_message);
        let _ = writeln!(out, "Reply: {}", entry.generated_reply);
        let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
        out.push('\n');
    }
    out
}

/// 按扩展名选择格式并写文件
pub fn export_to_file(entries: &[HistoryEntry], path: &Path) -> anyhow::Result<ExportFormat> {
    let format = ExportFormat::from_path(path);
    let content = match format {
        ExportFormat::Json => export_json(entries)?,
        ExportFormat::Text => export_text(entries, Local::now()),
    };
    std::fs::write(path, content)?;
    Ok(format)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(&PathBuf::from("a.JSON")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(&PathBuf::from("a.txt")), ExportFormat::Text);
        assert_eq!(ExportFormat::from_path(&PathBuf::from("noext")), ExportFormat::Text);
    }

    #[test]
    fn test_text_export_layout() {
        let at = Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let mut entry = HistoryEntry::new("Are you free tomorrow?", "Yes, I am!", "Friendly");
        entry.timestamp = at;

        let text = export_text(&[entry], at);
        assert!(text.starts_with("Reply Helper - Exported History\nExport Date: 2024-03-01 09:30:00\n"));
        assert!(text.contains("Tone: Friendly\nOriginal: Are you free tomorrow?\nReply: Yes, I am!\n"));
        assert!(text.contains(&"-".repeat(50)));
    }

    #[test]
    fn test_json_export_keeps_fields() {
        let entry = HistoryEntry::new("Please review the PR", "Will do today.", "Professional");
        let json = export_json(std::slice::from_ref(&entry)).unwrap();
        let parsed: Vec<HistoryEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![entry]);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let entry = HistoryEntry::new("Please review the PR", "Will do today.", "Professional");
        assert_eq!(export_to_file(&[entry], &path).unwrap(), ExportFormat::Text);
        assert!(std::fs::read_to_string(&path).unwrap().contains("Will do today."));
    }

    #[test]
    fn test_default_file_name() {
        let at = Local.with_ymd_and_hms(2024, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(default_export_file_name(at), "reply_history_20241231_235958");
    }
}
