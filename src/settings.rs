//! 用户设置：API Key、默认语气、离线模式、模型
//!
//! 以 JSON 存在数据目录下；读写失败只记日志，不影响生成流程。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{ModelId, Tone};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub api_key: String,
    /// Tone 下标
    pub default_tone: usize,
    pub offline_mode: bool,
    pub model: ModelId,
}

impl AppSettings {
    /// 设置中的 Key 为空时回落到环境变量 OPENAI_API_KEY
    pub fn resolved_api_key(&self) -> Option<String> {
        let key = self.api_key.trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }
        std::env::var("OPENAI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    pub fn set_api_key(&mut self, key: &str) {
        self.api_key = key.trim().to_string();
    }

    pub fn default_tone(&self) -> Tone {
        Tone::from_index(self.default_tone)
    }
}

#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 文件缺失或损坏时返回默认设置
    pub fn load(&self) -> AppSettings {
        if !self.path.exists() {
            return AppSettings::default();
        }
        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Settings load failed ({}), using defaults", e);
                AppSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &AppSettings) {
        if let Err(e) = self.try_save(settings) {
            tracing::warn!("Settings save failed: {}", e);
        }
    }

    fn try_load(&self) -> anyhow::Result<AppSettings> {
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn try_save(&self, settings: &AppSettings) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(settings)?)?;
        Ok(())
    }
}
