use serde::{Deserialize, Serialize};

/// Complexity tier a request is classified into
///
/// Ordering is ascending capability; it is used only for minimum-tier
/// upgrades (e.g. structured-output detection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Simple,
    Medium,
    Complex,
    Reasoning,
}

impl Tier {
    /// All tiers in ascending order
    pub const ALL: [Self; 4] = [Self::Simple, Self::Medium, Self::Complex, Self::Reasoning];
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "SIMPLE"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Complex => write!(f, "COMPLEX"),
            Self::Reasoning => write!(f, "REASONING"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "medium" => Ok(Self::Medium),
            "complex" => Ok(Self::Complex),
            "reasoning" => Ok(Self::Reasoning),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// One tier's model assignment: primary plus ordered fallbacks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierEntry {
    /// Model tried first
    pub primary: String,
    /// Models tried in order when the primary fails before any client bytes
    #[serde(default)]
    pub fallback: Vec<String>,
}

/// Mapping from every tier to its model assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierTable {
    pub simple: TierEntry,
    pub medium: TierEntry,
    pub complex: TierEntry,
    pub reasoning: TierEntry,
}

impl TierTable {
    /// Look up the entry for a tier
    pub fn entry(&self, tier: Tier) -> &TierEntry {
        match tier {
            Tier::Simple => &self.simple,
            Tier::Medium => &self.medium,
            Tier::Complex => &self.complex,
            Tier::Reasoning => &self.reasoning,
        }
    }

    /// Iterate over all entries with their tiers
    pub fn entries(&self) -> impl Iterator<Item = (Tier, &TierEntry)> {
        Tier::ALL.into_iter().map(|t| (t, self.entry(t)))
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            simple: TierEntry {
                primary: "anthropic/claude-haiku-4.5".to_owned(),
                fallback: vec!["openai/gpt-5-nano".to_owned()],
            },
            medium: TierEntry {
                primary: "anthropic/claude-sonnet-4".to_owned(),
                fallback: vec!["openai/gpt-5-mini".to_owned(), "anthropic/claude-haiku-4.5".to_owned()],
            },
            complex: TierEntry {
                primary: "anthropic/claude-opus-4.6".to_owned(),
                fallback: vec!["anthropic/claude-sonnet-4".to_owned(), "openai/gpt-5.2".to_owned()],
            },
            reasoning: TierEntry {
                primary: "anthropic/claude-opus-4.6".to_owned(),
                fallback: vec!["anthropic/claude-sonnet-4".to_owned(), "openai/gpt-5.2".to_owned()],
            },
        }
    }
}
