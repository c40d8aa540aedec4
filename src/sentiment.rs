use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Ratio-policy band: polarity beyond ±0.2 resolves to a definite label.
const RATIO_BAND: f64 = 0.2;
/// Magnitude-policy confidence: 0.5 base + 0.15 per distinct keyword, capped.
const CONFIDENCE_BASE: f64 = 0.5;
const CONFIDENCE_STEP: f64 = 0.15;
const CONFIDENCE_CAP: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    /// Keyword matches occurred but were balanced. Distinct from `Neutral`,
    /// which means no keywords matched at all.
    Mixed,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Mixed => "mixed",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Positive/negative keyword sets. Entries are literal phrases or single
/// tokens, matched case-insensitively as substrings.
#[derive(Debug, Clone, Deserialize)]
pub struct SentimentLexicon {
    pub positive: BTreeSet<String>,
    pub negative: BTreeSet<String>,
}

/// NFC-fold and lowercase, so keyword containment is stable across input
/// sources that encode accents differently.
pub fn fold(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}

/// Count of distinct keywords present in the text. Each keyword contributes
/// at most once no matter how often it occurs.
fn distinct_hits(folded: &str, words: &BTreeSet<String>) -> usize {
    words
        .iter()
        .filter(|w| folded.contains(fold(w).as_str()))
        .count()
}

/// Magnitude policy, used for raw API mentions: whichever keyword set matches
/// more wins, and confidence grows with the winning count.
pub fn classify_magnitude(text: &str, lexicon: &SentimentLexicon) -> (SentimentLabel, f64) {
    let folded = fold(text);
    let pos = distinct_hits(&folded, &lexicon.positive);
    let neg = distinct_hits(&folded, &lexicon.negative);

    let confidence =
        |count: usize| (CONFIDENCE_BASE + count as f64 * CONFIDENCE_STEP).min(CONFIDENCE_CAP);

    if pos > neg {
        (SentimentLabel::Positive, confidence(pos))
    } else if neg > pos {
        (SentimentLabel::Negative, confidence(neg))
    } else {
        (SentimentLabel::Neutral, CONFIDENCE_BASE)
    }
}

/// Ratio policy, used for pre-scored/merged posts: polarity in [-1, 1] from
/// the match counts, with a dead band that resolves to `mixed` rather than
/// `neutral` when matches exist on both sides.
pub fn classify_ratio(text: &str, lexicon: &SentimentLexicon) -> (SentimentLabel, f64) {
    let folded = fold(text);
    let pos = distinct_hits(&folded, &lexicon.positive);
    let neg = distinct_hits(&folded, &lexicon.negative);
    let total = pos + neg;
    if total == 0 {
        return (SentimentLabel::Neutral, 0.0);
    }
    let polarity = (pos as f64 - neg as f64) / total as f64;
    let label = if polarity > RATIO_BAND {
        SentimentLabel::Positive
    } else if polarity < -RATIO_BAND {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Mixed
    };
    (label, polarity)
}
