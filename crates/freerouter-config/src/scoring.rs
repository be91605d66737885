//! Classifier scoring configuration
//!
//! Per-dimension weights, tier boundaries, confidence calibration, and the
//! multilingual keyword lists driving the complexity classifier. Everything
//! here is overridable from the config file; the defaults below are the
//! shipped calibration.

use serde::{Deserialize, Serialize};

use crate::tiers::Tier;

/// Weights for the fourteen scoring dimensions
///
/// The weights sum to 1.0. Positive dimension signals push toward higher
/// tiers, negative ones toward SIMPLE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DimensionWeights {
    pub token_count: f64,
    pub code_presence: f64,
    pub reasoning_markers: f64,
    pub technical_terms: f64,
    pub creative_markers: f64,
    pub simple_indicators: f64,
    pub multi_step_patterns: f64,
    pub question_complexity: f64,
    pub imperative_verbs: f64,
    pub constraint_count: f64,
    pub output_format: f64,
    pub reference_complexity: f64,
    pub negation_complexity: f64,
    pub domain_specificity: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            token_count: 0.08,
            code_presence: 0.12,
            reasoning_markers: 0.16,
            technical_terms: 0.10,
            creative_markers: 0.04,
            simple_indicators: 0.10,
            multi_step_patterns: 0.10,
            question_complexity: 0.05,
            imperative_verbs: 0.04,
            constraint_count: 0.05,
            output_format: 0.04,
            reference_complexity: 0.03,
            negation_complexity: 0.03,
            domain_specificity: 0.06,
        }
    }
}

/// Score boundaries separating the four tiers
///
/// `score < simple_medium` is SIMPLE, `< medium_complex` MEDIUM,
/// `< complex_reasoning` COMPLEX, and everything above REASONING.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TierBoundaries {
    pub simple_medium: f64,
    pub medium_complex: f64,
    pub complex_reasoning: f64,
}

impl Default for TierBoundaries {
    fn default() -> Self {
        Self {
            simple_medium: 0.0,
            medium_complex: 0.03,
            complex_reasoning: 0.15,
        }
    }
}

impl TierBoundaries {
    /// The boundaries as an ordered array
    pub fn as_array(&self) -> [f64; 3] {
        [self.simple_medium, self.medium_complex, self.complex_reasoning]
    }
}

/// Keyword lists for the classification dimensions
///
/// Lists cover English, Chinese, Japanese, Russian, and German. Matching is
/// case-insensitive substring search over the lowercased prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeywordLists {
    pub code: Vec<String>,
    pub reasoning: Vec<String>,
    pub simple: Vec<String>,
    pub technical: Vec<String>,
    pub creative: Vec<String>,
    pub imperative: Vec<String>,
    pub constraint: Vec<String>,
    pub output_format: Vec<String>,
    pub reference: Vec<String>,
    pub negation: Vec<String>,
    pub domain: Vec<String>,
    pub agentic: Vec<String>,
}

fn list(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_owned()).collect()
}

impl Default for KeywordLists {
    fn default() -> Self {
        Self {
            code: list(&[
                "function", "class ", "import ", "def ", "select ", "async", "await", "const ", "return ", "```",
                "函数", "代码", "関数", "コード", "функция", "код", "funktion", "quellcode",
            ]),
            reasoning: list(&[
                "prove", "theorem", "derive", "step by step", "chain of thought", "formally", "proof", "logically",
                "证明", "推理", "証明", "推論", "докажи", "доказательство", "beweise", "herleite",
            ]),
            simple: list(&[
                "what is", "define ", "translate", "hello", "yes or no", "capital of", "who is", "when was",
                "什么是", "你好", "とは", "こんにちは", "что такое", "привет", "was ist", "hallo",
            ]),
            technical: list(&[
                "algorithm", "optimize", "architecture", "distributed", "kubernetes", "microservice", "database",
                "infrastructure", "concurrency", "算法", "架构", "アルゴリズム", "алгоритм", "архитектура",
                "algorithmus", "datenbank",
            ]),
            creative: list(&[
                "story", "poem", "compose", "brainstorm", "creative", "imagine", "write a", "故事", "诗", "物語",
                "詩", "история", "стихотворение", "geschichte", "gedicht",
            ]),
            imperative: list(&[
                "build", "create", "implement", "design", "develop", "construct", "generate", "deploy", "configure",
                "set up", "实现", "构建", "実装", "作成", "реализуй", "создай", "implementiere", "erstelle",
            ]),
            constraint: list(&[
                "under ", "at most", "at least", "within", "no more than", "maximum", "minimum", "limit", "budget",
                "最多", "至少", "以内", "не более", "минимум", "höchstens", "mindestens",
            ]),
            output_format: list(&[
                "json", "yaml", "xml", "table", "csv", "markdown", "schema", "format as", "structured", "表格",
                "表形式", "таблица", "tabelle",
            ]),
            reference: list(&[
                "above", "below", "previous", "following", "the docs", "the api", "the code", "earlier", "attached",
                "上面", "前面", "上記", "выше", "ранее", "oben", "zuvor",
            ]),
            negation: list(&[
                "don't", "do not", "avoid", "never", "without", "except", "exclude", "不要", "避免", "しないで",
                "не надо", "избегай", "nicht", "vermeide",
            ]),
            domain: list(&[
                "quantum", "fpga", "vlsi", "risc-v", "asic", "photonics", "genomics", "proteomics", "topological",
                "homomorphic", "zero-knowledge", "lattice-based", "量子", "квантовый", "quanten",
            ]),
            agentic: list(&[
                "read file", "read the file", "look at", "check the", "open the", "edit", "modify", "update the",
                "change the", "write to", "create file", "execute", "deploy", "install", "npm", "pip", "compile",
                "after that", "and also", "once done", "step 1", "step 2", "fix", "debug", "until it works",
                "keep trying", "iterate", "make sure", "verify", "confirm", "读取文件", "修改", "部署",
                "ファイルを読んで", "修正", "исправь", "разверни", "behebe", "stelle sicher",
            ]),
        }
    }
}

/// Full classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    /// Per-dimension weights
    pub weights: DimensionWeights,
    /// Score boundaries between tiers
    pub boundaries: TierBoundaries,
    /// Steepness of the confidence sigmoid
    pub sigmoid_steepness: f64,
    /// Confidence below which the classification is treated as ambiguous
    pub confidence_threshold: f64,
    /// User-token count at or below which the token dimension pulls toward SIMPLE
    pub simple_token_band: u64,
    /// User-token count at or above which the token dimension pushes upward
    pub complex_token_band: u64,
    /// Agentic score at or above which the agentic tier table is used
    pub agentic_threshold: f64,
    /// Always use the agentic tier table, regardless of classification
    pub force_agentic: bool,
    /// Tier used when classification confidence falls below the threshold
    pub ambiguous_default_tier: Tier,
    /// Total-token count above which the request is forced to COMPLEX
    pub max_tokens_force_complex: u64,
    /// Minimum tier when the user prompt requests structured output
    pub structured_output_min_tier: Tier,
    /// Keyword lists per dimension
    pub keywords: KeywordLists,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: DimensionWeights::default(),
            boundaries: TierBoundaries::default(),
            sigmoid_steepness: 8.0,
            confidence_threshold: 0.50,
            simple_token_band: 5,
            complex_token_band: 40,
            agentic_threshold: 0.69,
            force_agentic: false,
            ambiguous_default_tier: Tier::Medium,
            max_tokens_force_complex: 100_000,
            structured_output_min_tier: Tier::Medium,
            keywords: KeywordLists::default(),
        }
    }
}
