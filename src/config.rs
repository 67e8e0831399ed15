//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `REPLY__*` 覆盖（双下划线表示嵌套，如 `REPLY__RETRY__MAX_ATTEMPTS=5`）。
//! 用户可在运行时修改的设置（API Key、默认语气、离线模式）不在这里，见 [`crate::settings`]。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub offline: OfflineSection,
}

/// [app] 段：应用名、数据目录、容量上限与输入长度限制
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// 历史与设置文件所在目录，未设置时用 ./data
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_max_history_items")]
    pub max_history_items: usize,
    #[serde(default = "default_max_undo_states")]
    pub max_undo_states: usize,
    /// 输入最大字符数（按 char 计）
    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,
    /// 输入最小字符数，少于此值视为过短
    #[serde(default = "default_min_input_length")]
    pub min_input_length: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            data_dir: default_data_dir(),
            max_history_items: default_max_history_items(),
            max_undo_states: default_max_undo_states(),
            max_input_length: default_max_input_length(),
            min_input_length: default_min_input_length(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_max_history_items() -> usize {
    20
}

fn default_max_undo_states() -> usize {
    10
}

fn default_max_input_length() -> usize {
    2000
}

fn default_min_input_length() -> usize {
    10
}

/// [llm] 段：端点、默认模型、采样参数与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// OpenAI 兼容端点；None 时使用官方地址
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: None,
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_temperature() -> f32 {
    0.7
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次请求上限（秒），由传输层强制，与重试退避无关
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// [retry] 段：最大尝试次数与两类退避延迟
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 限流错误的基础延迟，每次重试翻倍
    #[serde(default = "default_rate_limit_base_delay_ms")]
    pub rate_limit_base_delay_ms: u64,
    /// 其它可重试错误的固定延迟
    #[serde(default = "default_transient_delay_ms")]
    pub transient_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            rate_limit_base_delay_ms: default_rate_limit_base_delay_ms(),
            transient_delay_ms: default_transient_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_rate_limit_base_delay_ms() -> u64 {
    2000
}

fn default_transient_delay_ms() -> u64 {
    1000
}

/// [offline] 段：离线模式下模拟生成的延迟
#[derive(Debug, Clone, Deserialize)]
pub struct OfflineSection {
    #[serde(default = "default_offline_delay_ms")]
    pub delay_ms: u64,
}

impl Default for OfflineSection {
    fn default() -> Self {
        Self {
            delay_ms: default_offline_delay_ms(),
        }
    }
}

fn default_offline_delay_ms() -> u64 {
    2000
}

/// 从 config 目录加载配置，环境变量 REPLY__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 REPLY__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("REPLY")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
