use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::sentiment::SentimentLabel;

/// A normalized social-media mention, regardless of which collector produced it.
/// Every field beyond `text`/`author` is optional in the raw inputs and defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mention {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub author_followers: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default, alias = "reposts")]
    pub retweets: u64,
    #[serde(default)]
    pub replies: u64,
    #[serde(default)]
    pub quotes: u64,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub timestamp: String, // ISO-8601, may be empty
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub url: String,
}

impl Mention {
    /// Named interaction counts for the engagement scorer. Quotes only feed
    /// the ranking-reach formula and are not listed here.
    pub fn interaction_counts(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("likes".to_string(), self.likes as f64),
            ("retweets".to_string(), self.retweets as f64),
            ("replies".to_string(), self.replies as f64),
            ("views".to_string(), self.views as f64),
        ])
    }
}

/// A mention plus everything the scoring passes derive from it.
/// Pure projection of a `Mention`; discarded after the merge.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMention {
    #[serde(flatten)]
    pub mention: Mention,
    pub sentiment: SentimentLabel,
    pub confidence: f64,
    pub engagement_score: f64,
    pub reach_multiplier: f64,
    pub composite_score: f64,
    /// Ranking reach - the visibility estimate used for top-mention ordering,
    /// alerting, and the brand-score reach blend. Not the composite score.
    pub reach: u64,
    pub risk_keywords: Vec<String>,
    pub risk_flag: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
        })
    }
}

/// Interaction counts snapshot carried inside a persisted alert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionMetrics {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub retweets: u64,
    #[serde(default)]
    pub replies: u64,
    #[serde(default)]
    pub quotes: u64,
    #[serde(default)]
    pub views: u64,
}

impl From<&Mention> for InteractionMetrics {
    fn from(m: &Mention) -> Self {
        InteractionMetrics {
            likes: m.likes,
            retweets: m.retweets,
            replies: m.replies,
            quotes: m.quotes,
            views: m.views,
        }
    }
}

/* Dashboard wire format. Field names below are the persisted contract the
   display tooling reads; they are spelled exactly as the consumer expects. */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyScore {
    pub date: String, // "YYYY-MM-DD", unique within the series
    pub score: u32,
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    #[serde(default)]
    pub totalTweets: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAlert {
    pub severity: Severity,
    pub r#type: String,
    /// Deduplication key: "{author} — {date}". First-seen wins.
    pub post: String,
    pub text: String,
    #[serde(default)]
    pub metrics: InteractionMetrics,
    pub replyLikeRatio: f64,
    pub reason: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopMention {
    pub user: String,
    pub text: String,
    pub sentiment: SentimentLabel,
    pub reach: u64,
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardMeta {
    #[serde(default)]
    pub lastUpdated: String,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// The persisted dashboard document. The only artifact with multi-run lifetime:
/// loaded whole, mutated in memory, written back whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardState {
    #[serde(default)]
    pub meta: DashboardMeta,
    #[serde(default)]
    pub scores: Vec<DailyScore>,
    #[serde(default)]
    pub riskAlerts: Vec<RiskAlert>,
    /// Opaque blobs owned by other tooling; read and rewritten unchanged.
    #[serde(default)]
    pub accountProfiles: Map<String, Value>,
    #[serde(default)]
    pub aggregate: Map<String, Value>,
    #[serde(default)]
    pub topMentions: Vec<TopMention>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/* Posts archive - the second persisted shape. Accumulate-and-resort, no date
   keying. Kept structurally separate from DashboardState on purpose. */

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, u64>,
    /// None/empty means "not yet classified"; scoring fills it in but never
    /// overwrites a label that was already present.
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub engagement_score: f64,
    #[serde(default)]
    pub risk_flag: Option<bool>,
    #[serde(default)]
    pub risk_keywords: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PostRecord {
    /// Convert a scored raw mention into the posts-archive shape.
    pub fn from_scored(s: &ScoredMention) -> PostRecord {
        let m = &s.mention;
        PostRecord {
            account: m.author.clone(),
            date: day_of(&m.timestamp, ""),
            content: m.text.clone(),
            metrics: BTreeMap::from([
                ("replies".to_string(), m.replies),
                ("reposts".to_string(), m.retweets),
                ("likes".to_string(), m.likes),
            ]),
            sentiment: Some(s.sentiment.to_string()),
            engagement_score: s.engagement_score,
            risk_flag: Some(s.risk_flag),
            risk_keywords: s.risk_keywords.clone(),
            topics: Vec::new(),
            source: "mention".to_string(),
            url: m.url.clone(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostArchive {
    #[serde(default)]
    pub recentPosts: Vec<PostRecord>,
    #[serde(default)]
    pub accounts: Map<String, Value>,
    #[serde(default)]
    pub riskSignals: Vec<String>,
    #[serde(default)]
    pub pulled_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Calendar-day prefix of an ISO-8601 timestamp, or `fallback` when the
/// timestamp is empty or too short to carry one.
pub fn day_of(timestamp: &str, fallback: &str) -> String {
    let day: String = timestamp.chars().take(10).collect();
    if day.chars().count() == 10 {
        day
    } else {
        fallback.to_string()
    }
}

/// Char-boundary-safe prefix truncation for persisted excerpts.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
