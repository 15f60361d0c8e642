//! Local NLP-based sentiment scoring using VADER
//!
//! Headlines are scored with the VADER (Valence Aware Dictionary and sEntiment
//! Reasoner) compound score, enhanced with financial-specific keyword boosting,
//! then mapped to a [`SentimentLabel`] through configurable thresholds.
//!
//! # Example
//! ```rust,ignore
//! use candlecast::infrastructure::news::VaderSentimentScorer;
//!
//! let scorer = VaderSentimentScorer::default();
//! let label = scorer.score("Bitcoin surges to new all-time high!");
//! assert!(label.polarity > 0.1);
//! ```

use crate::domain::ports::SentimentScorer;
use crate::domain::sentiment::{SentimentLabel, SentimentThresholds};
use vader_sentiment::SentimentIntensityAnalyzer;

/// Weight applied to the summed keyword boost before it is added to the VADER score.
const BOOST_WEIGHT: f64 = 0.5;

/// Financial keywords VADER's general lexicon misses or underweights.
const BULLISH_KEYWORDS: &[(&str, f64)] = &[
    ("surge", 0.4),
    ("surges", 0.4),
    ("surging", 0.4),
    ("rally", 0.4),
    ("rallies", 0.4),
    ("soar", 0.5),
    ("soars", 0.5),
    ("skyrocket", 0.6),
    ("skyrockets", 0.6),
    ("bullish", 0.5),
    ("bull run", 0.5),
    ("all-time high", 0.5),
    ("ath", 0.4),
    ("breakout", 0.3),
    ("mooning", 0.5),
    ("adoption", 0.2),
    ("inflows", 0.2),
    ("upgrade", 0.3),
    ("record high", 0.4),
];

const BEARISH_KEYWORDS: &[(&str, f64)] = &[
    ("crash", -0.5),
    ("crashes", -0.5),
    ("plunge", -0.5),
    ("plunges", -0.5),
    ("dump", -0.4),
    ("dumps", -0.4),
    ("bearish", -0.5),
    ("collapse", -0.5),
    ("collapses", -0.5),
    ("lawsuit", -0.4),
    ("ban", -0.4),
    ("hack", -0.5),
    ("hacked", -0.5),
    ("exploit", -0.4),
    ("stolen", -0.5),
    ("scam", -0.6),
    ("fraud", -0.5),
    ("sell-off", -0.4),
    ("selloff", -0.4),
    ("liquidations", -0.3),
    ("panic", -0.4),
    ("outflows", -0.2),
];

/// Lowercases and re-joins the words of `text` with single spaces, padded at
/// both ends so keywords can be matched on word boundaries.
fn word_normalize(text: &str) -> String {
    let words: Vec<String> = text
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();
    format!(" {} ", words.join(" "))
}

/// VADER compound score plus financial keyword boosting, clamped to [-1, 1].
pub struct VaderSentimentScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
    thresholds: SentimentThresholds,
}

impl VaderSentimentScorer {
    pub fn new(thresholds: SentimentThresholds) -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
            thresholds,
        }
    }

    /// Sum of keyword scores found as whole words ("ath" does not match "bath").
    fn financial_boost(&self, text: &str) -> f64 {
        let normalized = word_normalize(text);

        BULLISH_KEYWORDS
            .iter()
            .chain(BEARISH_KEYWORDS.iter())
            .filter(|(keyword, _)| normalized.contains(&format!(" {} ", keyword)))
            .map(|(_, score)| score)
            .sum()
    }

    /// Raw polarity in [-1, 1].
    pub fn polarity(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        let scores = self.analyzer.polarity_scores(text);
        let vader_score = scores["compound"];
        let combined = vader_score + self.financial_boost(text) * BOOST_WEIGHT;
        combined.clamp(-1.0, 1.0)
    }
}

impl Default for VaderSentimentScorer {
    fn default() -> Self {
        Self::new(SentimentThresholds::default())
    }
}

impl SentimentScorer for VaderSentimentScorer {
    fn score(&self, text: &str) -> SentimentLabel {
        SentimentLabel::from_polarity(self.polarity(text), &self.thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sentiment::SentimentClassification;

    #[test]
    fn test_reference_headlines() {
        let scorer = VaderSentimentScorer::default();

        assert_eq!(
            scorer.score("great news, prices surging").classification,
            SentimentClassification::Positive
        );
        assert_eq!(
            scorer.score("market crashes, investors panic").classification,
            SentimentClassification::Negative
        );
        assert_eq!(
            scorer.score("price unchanged today").classification,
            SentimentClassification::Neutral
        );
    }

    #[test]
    fn test_bullish_headlines() {
        let scorer = VaderSentimentScorer::default();

        let bullish_headlines = [
            "Bitcoin surges to new all-time high as adoption grows",
            "Crypto market rallies 15% in massive bull run",
            "Dogecoin skyrockets after endorsement",
        ];

        for headline in bullish_headlines {
            let label = scorer.score(headline);
            assert!(
                label.polarity > 0.0,
                "Expected bullish score for '{}', got {}",
                headline,
                label
            );
        }
    }

    #[test]
    fn test_bearish_headlines() {
        let scorer = VaderSentimentScorer::default();

        let bearish_headlines = [
            "Bitcoin crashes 20% in devastating market collapse",
            "Crypto exchange hacked, millions stolen",
            "Massive sell-off triggers fear and uncertainty",
        ];

        for headline in bearish_headlines {
            let label = scorer.score(headline);
            assert!(
                label.polarity < 0.0,
                "Expected bearish score for '{}', got {}",
                headline,
                label
            );
        }
    }

    #[test]
    fn test_empty_text() {
        let scorer = VaderSentimentScorer::default();
        for text in ["", "   "] {
            let label = scorer.score(text);
            assert_eq!(label.polarity, 0.0);
            assert_eq!(label.classification, SentimentClassification::Neutral);
        }
    }

    #[test]
    fn test_whole_word_matching() {
        let scorer = VaderSentimentScorer::default();
        // "ath" inside "bath", "ban" inside "bank"
        assert_eq!(scorer.financial_boost("bath bank"), 0.0);
        assert_eq!(scorer.financial_boost("New ATH!"), 0.4);
        assert_eq!(scorer.financial_boost("Bitcoin hits an all-time high"), 0.5);
    }

    #[test]
    fn test_polarity_is_clamped_and_deterministic() {
        let scorer = VaderSentimentScorer::default();
        let text = "bullish rally surge soars skyrockets record high mooning breakout";
        let first = scorer.polarity(text);
        assert!(first <= 1.0);
        assert_eq!(first, scorer.polarity(text));
    }

    #[test]
    fn test_custom_thresholds_change_label() {
        let strict = VaderSentimentScorer::new(SentimentThresholds::new(0.99, -0.99).unwrap());
        assert_eq!(
            strict.score("great news, prices surging").classification,
            SentimentClassification::Neutral
        );
    }
}
