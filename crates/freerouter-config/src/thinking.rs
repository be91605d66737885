use serde::{Deserialize, Serialize};

/// Extended-thinking configuration for Anthropic upstreams
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThinkingConfig {
    /// Model-id substrings that select adaptive thinking at COMPLEX/REASONING
    pub adaptive: Vec<String>,
    /// Budgeted thinking applied at MEDIUM
    pub enabled: EnabledThinkingConfig,
}

/// Budgeted-thinking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnabledThinkingConfig {
    /// Model-id substrings this applies to; empty means any Anthropic model
    pub models: Vec<String>,
    /// Thinking token budget
    pub budget: u32,
}

impl Default for ThinkingConfig {
    fn default() -> Self {
        Self {
            adaptive: vec!["opus-4-6".to_owned(), "opus-4.6".to_owned()],
            enabled: EnabledThinkingConfig::default(),
        }
    }
}

impl Default for EnabledThinkingConfig {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            budget: 4096,
        }
    }
}

impl ThinkingConfig {
    /// Whether a model supports adaptive thinking
    pub fn is_adaptive(&self, model: &str) -> bool {
        self.adaptive.iter().any(|pattern| model.contains(pattern.as_str()))
    }

    /// Whether budgeted thinking applies to a model
    pub fn is_enabled(&self, model: &str) -> bool {
        self.enabled.models.is_empty() || self.enabled.models.iter().any(|p| model.contains(p.as_str()))
    }
}
