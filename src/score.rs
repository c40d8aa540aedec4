use crate::config::PipelineConfig;
use crate::engagement::{composite_score, engagement_score, ranking_reach, reach_multiplier, round2};
use crate::models::{day_of, truncate_chars, DailyScore, Mention, ScoredMention, TopMention};
use crate::risk::matched_keywords;
use crate::models::PostRecord;
use crate::sentiment::{classify_magnitude, classify_ratio, SentimentLabel};

/// Brand index returned for an empty batch.
pub const NEUTRAL_BRAND_SCORE: u32 = 50;

/// Blend weights: high-visibility sentiment outweighs raw volume.
const COUNT_BLEND: f64 = 0.4;
const REACH_BLEND: f64 = 0.6;

/// Score one raw mention. Pure function of the mention and the config; raw
/// mentions get the magnitude sentiment policy.
pub fn score_mention(m: &Mention, cfg: &PipelineConfig) -> ScoredMention {
    let (sentiment, confidence) = classify_magnitude(&m.text, &cfg.lexicon);
    let engagement = engagement_score(&m.interaction_counts(), &cfg.engagement_weights);
    let multiplier = reach_multiplier(m.author_followers, &cfg.reach_tiers);
    let risk_keywords = matched_keywords(&m.text, &cfg.risk_words);
    ScoredMention {
        mention: m.clone(),
        sentiment,
        confidence: round2(confidence),
        engagement_score: engagement,
        reach_multiplier: multiplier,
        composite_score: composite_score(engagement, multiplier),
        reach: ranking_reach(m),
        risk_flag: !risk_keywords.is_empty(),
        risk_keywords,
    }
}

/// Score an archived post in place. Posts get the ratio sentiment policy, and
/// a label or risk flag that is already present is left alone.
pub fn score_post(post: &mut PostRecord, cfg: &PipelineConfig) {
    let counts = post
        .metrics
        .iter()
        .map(|(k, v)| (k.clone(), *v as f64))
        .collect();
    post.engagement_score = engagement_score(&counts, &cfg.engagement_weights);

    let risks = matched_keywords(&post.content, &cfg.risk_words);
    if post.sentiment.as_deref().map_or(true, str::is_empty) {
        let (label, _) = classify_ratio(&post.content, &cfg.lexicon);
        post.sentiment = Some(label.to_string());
    }
    if post.risk_flag.is_none() {
        post.risk_flag = Some(!risks.is_empty());
    }
    post.risk_keywords = risks;
}

/// Reduce a scored batch to the 0-100 brand index: a 40/60 blend of the
/// sentiment-count ratio and the ranking-reach-weighted ratio.
pub fn brand_score(batch: &[ScoredMention]) -> u32 {
    if batch.is_empty() {
        return NEUTRAL_BRAND_SCORE;
    }

    let total = batch.len() as f64;
    let pos = label_count(batch, SentimentLabel::Positive) as f64;
    let neg = label_count(batch, SentimentLabel::Negative) as f64;

    let reach_of = |label: SentimentLabel| -> f64 {
        batch
            .iter()
            .filter(|s| s.sentiment == label)
            .map(|s| s.reach as f64)
            .sum()
    };
    // floor at 1 so a zero-reach batch cannot divide by zero
    let total_reach = batch.iter().map(|s| s.reach as f64).sum::<f64>().max(1.0);

    let count_score = (pos - neg) / total * 50.0 + 50.0;
    let reach_score =
        (reach_of(SentimentLabel::Positive) - reach_of(SentimentLabel::Negative)) / total_reach
            * 50.0
            + 50.0;

    let blended = count_score * COUNT_BLEND + reach_score * REACH_BLEND;
    blended.round().clamp(0.0, 100.0) as u32
}

/// The day's entry for the dashboard score series. Percentages are integers
/// summing to 100 up to rounding; all zero for an empty batch. The neutral
/// bucket absorbs everything that is neither positive nor negative.
pub fn daily_score(date: &str, batch: &[ScoredMention], score: u32) -> DailyScore {
    let total = batch.len();
    let pos = label_count(batch, SentimentLabel::Positive);
    let neg = label_count(batch, SentimentLabel::Negative);
    let neu = total - pos - neg;

    let pct = |n: usize| -> u32 {
        if total == 0 {
            0
        } else {
            (n as f64 / total as f64 * 100.0).round() as u32
        }
    };

    DailyScore {
        date: date.to_string(),
        score,
        positive: pct(pos),
        negative: pct(neg),
        neutral: pct(neu),
        totalTweets: total,
    }
}

/// Current batch's top mentions by descending ranking reach; ties keep batch
/// order. This snapshot replaces, never extends, the persisted list.
pub fn top_mentions(batch: &[ScoredMention], cap: usize, today: &str) -> Vec<TopMention> {
    let mut ranked: Vec<&ScoredMention> = batch.iter().collect();
    ranked.sort_by(|a, b| b.reach.cmp(&a.reach));
    ranked
        .into_iter()
        .take(cap)
        .map(|s| TopMention {
            user: s.mention.author.clone(),
            text: truncate_chars(&s.mention.text, 280),
            sentiment: s.sentiment,
            reach: s.reach,
            date: day_of(&s.mention.timestamp, today),
        })
        .collect()
}

/// Free-form reporting counts for the end-of-run summary.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub mixed: usize,
    pub flagged: usize,
    pub brand_score: u32,
}

pub fn summarize(batch: &[ScoredMention]) -> BatchSummary {
    BatchSummary {
        total: batch.len(),
        positive: label_count(batch, SentimentLabel::Positive),
        negative: label_count(batch, SentimentLabel::Negative),
        neutral: label_count(batch, SentimentLabel::Neutral),
        mixed: label_count(batch, SentimentLabel::Mixed),
        flagged: batch.iter().filter(|s| s.risk_flag).count(),
        brand_score: brand_score(batch),
    }
}

fn label_count(batch: &[ScoredMention], label: SentimentLabel) -> usize {
    batch.iter().filter(|s| s.sentiment == label).count()
}
