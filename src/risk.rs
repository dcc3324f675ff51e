use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Severity verdict for a scanned page.
///
/// Variants are declared in severity order so the derived `Ord` gives
/// `Safe < Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

/// Extension badge styling for a risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub text: &'static str,
    pub color: &'static str,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Safe,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Case-insensitive match against the five canonical tokens. No trimming:
    /// `" low "` is not a token.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
    }

    /// Like [`RiskLevel::parse`], but anything unrecognized becomes `Medium`.
    pub fn coerce(s: Option<&str>) -> Self {
        s.and_then(Self::parse).unwrap_or(RiskLevel::Medium)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn badge(&self) -> Badge {
        let (text, color) = match self {
            RiskLevel::Safe => ("SAFE", "#33CC66"),
            RiskLevel::Low => ("LOW", "#99CC33"),
            RiskLevel::Medium => ("WARN", "#FFCC00"),
            RiskLevel::High => ("RISK", "#FF6633"),
            RiskLevel::Critical => ("RISK", "#CC3333"),
        };
        Badge { text, color }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Accept any casing on the way in; serialize lowercase on the way out.
impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RiskLevel::parse(&raw).ok_or_else(|| {
            serde::de::Error::unknown_variant(&raw, &["safe", "low", "medium", "high", "critical"])
        })
    }
}
