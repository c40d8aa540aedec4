use serde::Deserialize;
use std::collections::BTreeMap;

use crate::models::Mention;

/// Ranking-reach weights. This is the visibility notion used for top-mention
/// ordering, alerting and the brand-score blend, not the engagement
/// composite.
const REACH_W_RETWEET: u64 = 10;
const REACH_W_LIKE: u64 = 2;
const REACH_W_REPLY: u64 = 5;
const REACH_W_QUOTE: u64 = 8;

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Weighted engagement score over named interaction counts. Counts without a
/// configured weight are ignored; weights without a count contribute 0.
/// Non-negative for non-negative counts and weights.
pub fn engagement_score(counts: &BTreeMap<String, f64>, weights: &BTreeMap<String, f64>) -> f64 {
    let total: f64 = counts
        .iter()
        .filter_map(|(name, value)| weights.get(name).map(|w| w * value))
        .sum();
    round2(total)
}

/// One step of the audience-size multiplier function.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReachTier {
    pub min_followers: u64,
    pub multiplier: f64,
}

/// Step function over follower count. Tiers are ordered largest threshold
/// first; anything below the smallest tier gets 1.0.
pub fn reach_multiplier(followers: u64, tiers: &[ReachTier]) -> f64 {
    tiers
        .iter()
        .find(|t| followers >= t.min_followers)
        .map(|t| t.multiplier)
        .unwrap_or(1.0)
}

pub fn composite_score(engagement: f64, multiplier: f64) -> f64 {
    round2(engagement * multiplier)
}

/// Ranking reach: weighted interactions plus raw follower count.
pub fn ranking_reach(m: &Mention) -> u64 {
    m.retweets * REACH_W_RETWEET
        + m.likes * REACH_W_LIKE
        + m.replies * REACH_W_REPLY
        + m.quotes * REACH_W_QUOTE
        + m.author_followers
}
