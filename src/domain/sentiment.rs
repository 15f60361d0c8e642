use serde::{Deserialize, Serialize};
use std::fmt;

/// Polarity above which a text is labelled positive.
pub const DEFAULT_POSITIVE_THRESHOLD: f64 = 0.1;
/// Polarity below which a text is labelled negative.
pub const DEFAULT_NEGATIVE_THRESHOLD: f64 = -0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentClassification {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for SentimentClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "Positive"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Negative => write!(f, "Negative"),
        }
    }
}

/// Cut-offs mapping a polarity score to a classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentThresholds {
    pub positive: f64,
    pub negative: f64,
}

impl Default for SentimentThresholds {
    fn default() -> Self {
        Self {
            positive: DEFAULT_POSITIVE_THRESHOLD,
            negative: DEFAULT_NEGATIVE_THRESHOLD,
        }
    }
}

impl SentimentThresholds {
    pub fn new(positive: f64, negative: f64) -> Result<Self, String> {
        if !(-1.0..=1.0).contains(&positive) || !(-1.0..=1.0).contains(&negative) {
            return Err(format!(
                "thresholds must lie in [-1, 1], got positive={} negative={}",
                positive, negative
            ));
        }
        if negative > positive {
            return Err(format!(
                "negative threshold {} exceeds positive threshold {}",
                negative, positive
            ));
        }
        Ok(Self { positive, negative })
    }

    pub fn classify(&self, polarity: f64) -> SentimentClassification {
        if polarity > self.positive {
            SentimentClassification::Positive
        } else if polarity < self.negative {
            SentimentClassification::Negative
        } else {
            SentimentClassification::Neutral
        }
    }
}

/// Classification plus the polarity score (in [-1, 1]) that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentLabel {
    pub classification: SentimentClassification,
    pub polarity: f64,
}

impl SentimentLabel {
    pub fn from_polarity(polarity: f64, thresholds: &SentimentThresholds) -> Self {
        let polarity = polarity.clamp(-1.0, 1.0);
        Self {
            classification: thresholds.classify(polarity),
            polarity,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:+.2})", self.classification, self.polarity)
    }
}
