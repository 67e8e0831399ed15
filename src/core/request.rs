//! 生成请求：语气、模型与单次调用参数
//!
//! GenerationRequest 每次调用时构造，不持久化；消息在构造时 trim。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 回复语气（下拉框顺序即 index，设置中的默认语气按 index 保存）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Polite,
    Friendly,
    Professional,
    Casual,
    Formal,
    Empathetic,
}

impl Tone {
    pub const ALL: [Tone; 6] = [
        Tone::Polite,
        Tone::Friendly,
        Tone::Professional,
        Tone::Casual,
        Tone::Formal,
        Tone::Empathetic,
    ];

    /// 越界时回落到 Polite
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn label(self) -> &'static str {
        match self {
            Tone::Polite => "Polite",
            Tone::Friendly => "Friendly",
            Tone::Professional => "Professional",
            Tone::Casual => "Casual",
            Tone::Formal => "Formal",
            Tone::Empathetic => "Empathetic",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tone {
    type Err = String;

    /// 大小写不敏感；带装饰的标签（如 "😊 Friendly"）取最后一个词
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.split_whitespace().last().unwrap_or_default();
        Self::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(word))
            .ok_or_else(|| format!("unknown tone: {s}"))
    }
}

/// 模型名（OpenAI 兼容端点上的 model 字段）
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 每 1K token 单价（美元），未知模型按 gpt-3.5-turbo 估算
    pub fn price_per_1k(&self) -> f64 {
        match self.0.as_str() {
            "gpt-4o-mini" => 0.00015,
            "gpt-4o" => 0.005,
            "gpt-3.5-turbo" => 0.0005,
            _ => 0.0005,
        }
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new("gpt-4o-mini")
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 单次生成请求
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub message: String,
    pub tone: Tone,
    pub model: ModelId,
}

impl GenerationRequest {
    pub fn new(message: impl AsRef<str>, tone: Tone, model: ModelId) -> Self {
        Self {
            message: message.as_ref().trim().to_string(),
            tone,
            model,
        }
    }

    /// 按字符（非字节）计的长度，用于长度校验
    pub fn char_len(&self) -> usize {
        self.message.chars().count()
    }
}

/// 费用估算：约 4 字符 / token，输入 + 输出按 2 倍计
#[derive(Clone, Debug, PartialEq)]
pub struct CostEstimate {
    pub model: ModelId,
    pub chars: usize,
    pub tokens: usize,
    pub usd: f64,
}

pub fn estimate_cost(model: &ModelId, char_count: usize) -> CostEstimate {
    let tokens = (char_count / 4).max(1);
    let usd = tokens as f64 / 1000.0 * model.price_per_1k() * 2.0;
    CostEstimate {
        model: model.clone(),
        chars: char_count,
        tokens,
        usd,
    }
}

impl fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Model: {} | Estimated: ${:.6} | {} chars",
            self.model, self.usd, self.chars
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_parse_decorated_label() {
        assert_eq!("😊 Friendly".parse::<Tone>().unwrap(), Tone::Friendly);
        assert_eq!("formal".parse::<Tone>().unwrap(), Tone::Formal);
        assert!("sarcastic".parse::<Tone>().is_err());
    }

    #[test]
    fn test_tone_index_roundtrip_and_fallback() {
        for tone in Tone::ALL {
            assert_eq!(Tone::from_index(tone.index()), tone);
        }
        assert_eq!(Tone::from_index(99), Tone::Polite);
    }

    #[test]
    fn test_request_trims_message() {
        let req = GenerationRequest::new("  hello there  \n", Tone::Polite, ModelId::default());
        assert_eq!(req.message, "hello there");
        assert_eq!(req.char_len(), 11);
    }

    #[test]
    fn test_cost_estimate() {
        let est = estimate_cost(&ModelId::new("gpt-4o"), 4000);
        assert_eq!(est.tokens, 1000);
        assert!((est.usd - 0.01).abs() < 1e-12);

        // 空输入至少按 1 token 计
        let est = estimate_cost(&ModelId::default(), 0);
        assert_eq!(est.tokens, 1);
        assert!(est.to_string().contains("gpt-4o-mini"));
    }
}
