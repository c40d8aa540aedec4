use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

use crate::engagement::ReachTier;
use crate::sentiment::SentimentLexicon;

/// Everything the scoring passes are parameterized on. Defaults carry the
/// production constants; a JSON file passed via `--config` overrides any
/// subset of fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tracked account handles, written into dashboard meta.
    pub targets: Vec<String>,
    /// Brand phrases, written into dashboard meta.
    pub keywords: Vec<String>,
    /// Recent-search queries issued by the fetch collaborator.
    pub queries: Vec<String>,
    pub lexicon: SentimentLexicon,
    /// Risk-indicative keywords; any match flags the mention.
    pub risk_words: Vec<String>,
    /// Conspiracy keywords; any match triggers a HIGH alert.
    pub conspiracy_words: Vec<String>,
    pub engagement_weights: BTreeMap<String, f64>,
    /// Ordered largest threshold first.
    pub reach_tiers: Vec<ReachTier>,
    /// Reply:like ratio above which a mention becomes an alert.
    pub reply_ratio_alert: f64,
    /// Reply:like ratio above which an alert is HIGH.
    pub reply_ratio_high: f64,
    /// Ranking reach above which a negative mention alerts on visibility alone.
    pub high_visibility_reach: u64,
    /// Days of the score series to retain.
    pub score_history_days: usize,
    pub alert_cap: usize,
    pub top_mention_cap: usize,
    /// Per-query result cap; the API allows at most 100.
    pub max_results: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            targets: strings(&["@rainmakercorp", "@ADoricko"]),
            keywords: strings(&[
                "rain maker",
                "rainmaker corp",
                "cloud seeding",
                "weather modification",
            ]),
            queries: strings(&[
                "@rainmakercorp -is:retweet",
                "@ADoricko -is:retweet",
                "\"rain maker\" OR \"rainmaker corp\" OR \"cloud seeding\" -is:retweet",
            ]),
            lexicon: SentimentLexicon {
                positive: word_set(&[
                    "great", "amazing", "excellent", "love", "brilliant", "innovative",
                    "solve", "solving", "solution", "hero", "impressive", "breakthrough",
                    "future", "real deal", "incredible", "fantastic", "support", "proud",
                    "exciting", "hope", "helpful", "progress", "success", "positive",
                    "good", "awesome", "transformative", "revolutionary", "game changer",
                    "life saving", "recommend", "best", "impressed",
                ]),
                negative: word_set(&[
                    "scam", "fraud", "dangerous", "flood", "drought", "blame",
                    "held accountable", "conspiracy", "hoax", "unproven", "destroy",
                    "damage", "harm", "risk", "lawsuit", "corrupt", "chemtrail",
                    "poison", "terrible", "awful", "worst", "reckless", "irresponsible",
                    "fake", "lie", "lies", "grift", "grifter", "catastrophe", "disaster",
                    "toxic", "threat", "threatening", "complaint", "ripped off", "sued",
                    "criminal", "ponzi", "ripoff", "avoid",
                ]),
            },
            risk_words: strings(&[
                "scam", "fraud", "lawsuit", "complaint", "ripped off", "terrible",
                "sued", "criminal", "ponzi", "ripoff", "avoid", "worst", "fake",
            ]),
            conspiracy_words: strings(&[
                "chemtrail",
                "weather control",
                "government",
                "conspiracy",
                "hoax",
                "geo-engineer",
                "haarp",
            ]),
            engagement_weights: BTreeMap::from([
                ("likes".to_string(), 1.0),
                ("retweets".to_string(), 3.0),
                ("reposts".to_string(), 3.0),
                ("replies".to_string(), 5.0),
                ("views".to_string(), 0.001),
            ]),
            reach_tiers: vec![
                ReachTier { min_followers: 100_000, multiplier: 3.0 },
                ReachTier { min_followers: 10_000, multiplier: 2.0 },
                ReachTier { min_followers: 1_000, multiplier: 1.5 },
            ],
            reply_ratio_alert: 0.15,
            reply_ratio_high: 0.25,
            high_visibility_reach: 50_000,
            score_history_days: 90,
            alert_cap: 50,
            top_mention_cap: 20,
            max_results: 100,
        }
    }
}

impl PipelineConfig {
    /// Defaults, or defaults overlaid with a JSON override file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(PipelineConfig::default()),
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("Reading config {}", p.display()))?;
                let cfg: PipelineConfig = serde_json::from_str(&raw)
                    .with_context(|| format!("Parsing config {}", p.display()))?;
                debug!("Loaded config overrides from {}", p.display());
                Ok(cfg)
            }
        }
    }
}

/// Bearer token for the search API: a `TWITTER_BEARER_TOKEN=` line in the env
/// file wins, then the process environment.
pub fn bearer_token(env_file: &Path) -> Option<String> {
    if let Ok(contents) = std::fs::read_to_string(env_file) {
        for line in contents.lines() {
            if let Some(token) = line.strip_prefix("TWITTER_BEARER_TOKEN=") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    std::env::var("TWITTER_BEARER_TOKEN").ok().filter(|t| !t.is_empty())
}

fn strings(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

fn word_set(xs: &[&str]) -> BTreeSet<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_tiers_are_ordered_largest_first() {
        let cfg = PipelineConfig::default();
        for pair in cfg.reach_tiers.windows(2) {
            assert!(pair[0].min_followers > pair[1].min_followers);
        }
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"alert_cap": 10, "reply_ratio_alert": 0.3}}"#).unwrap();
        let cfg = PipelineConfig::load(Some(f.path())).unwrap();
        assert_eq!(cfg.alert_cap, 10);
        assert_eq!(cfg.reply_ratio_alert, 0.3);
        assert_eq!(cfg.score_history_days, 90);
        assert!(!cfg.lexicon.positive.is_empty());
    }

    #[test]
    fn env_file_token_wins_over_missing() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "SOMETHING_ELSE=1").unwrap();
        writeln!(f, "TWITTER_BEARER_TOKEN=abc123").unwrap();
        assert_eq!(bearer_token(f.path()).as_deref(), Some("abc123"));
    }
}
