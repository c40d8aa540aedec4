use crate::config::PipelineConfig;
use crate::models::{day_of, truncate_chars, InteractionMetrics, RiskAlert, ScoredMention, Severity};
use crate::sentiment::{fold, SentimentLabel};

/// Alert text excerpt cap (chars).
const ALERT_TEXT_MAX: usize = 200;

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Which of the configured keywords occur in the text. A non-empty result is
/// what sets the risk flag on a scored mention.
pub fn matched_keywords(text: &str, words: &[String]) -> Vec<String> {
    let folded = fold(text);
    words
        .iter()
        .filter(|w| folded.contains(fold(w).as_str()))
        .cloned()
        .collect()
}

/// Reply:like ratio with the zero-likes case pinned to 0.
pub fn reply_like_ratio(replies: u64, likes: u64) -> f64 {
    if likes == 0 {
        0.0
    } else {
        replies as f64 / likes as f64
    }
}

/// Decide whether a scored mention warrants a risk alert.
///
/// Triggers: reply:like ratio above the alert threshold, negative sentiment
/// with ranking reach above the visibility threshold, or any conspiracy
/// keyword. Severity is HIGH on a steep ratio or a conspiracy match.
pub fn evaluate(scored: &ScoredMention, cfg: &PipelineConfig, today: &str) -> Option<RiskAlert> {
    let m = &scored.mention;
    let ratio = reply_like_ratio(m.replies, m.likes);
    let conspiracies = matched_keywords(&m.text, &cfg.conspiracy_words);

    let hot_ratio = ratio > cfg.reply_ratio_alert;
    let high_visibility_negative = scored.sentiment == SentimentLabel::Negative
        && scored.reach > cfg.high_visibility_reach;
    if !hot_ratio && !high_visibility_negative && conspiracies.is_empty() {
        return None;
    }

    let severity = if ratio > cfg.reply_ratio_high || !conspiracies.is_empty() {
        Severity::High
    } else {
        Severity::Medium
    };

    let date = day_of(&m.timestamp, today);
    let mut reason = format!("Reply:like ratio {:.2}. Reach {}.", ratio, scored.reach);
    if !conspiracies.is_empty() {
        reason.push_str(" Conspiracy keywords detected.");
    }

    Some(RiskAlert {
        severity,
        r#type: "auto_detected".to_string(),
        post: format!("{} — {}", m.author, date),
        text: truncate_chars(&m.text, ALERT_TEXT_MAX),
        metrics: InteractionMetrics::from(m),
        replyLikeRatio: round3(ratio),
        reason,
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mention;
    use crate::score::score_mention;

    fn scored(text: &str, likes: u64, replies: u64, followers: u64) -> ScoredMention {
        let m = Mention {
            id: "m1".to_string(),
            text: text.to_string(),
            author: "@somebody".to_string(),
            author_followers: followers,
            likes,
            replies,
            timestamp: "2026-08-06T10:00:00Z".to_string(),
            ..Default::default()
        };
        score_mention(&m, &PipelineConfig::default())
    }

    #[test]
    fn matched_keywords_lists_every_hit() {
        let cfg = PipelineConfig::default();
        let hits = matched_keywords("total scam, lawsuit incoming", &cfg.risk_words);
        assert_eq!(hits, vec!["scam".to_string(), "lawsuit".to_string()]);
    }

    #[test]
    fn ratio_is_zero_when_likes_are_zero() {
        assert_eq!(reply_like_ratio(40, 0), 0.0);
    }

    #[test]
    fn calm_mention_produces_no_alert() {
        let cfg = PipelineConfig::default();
        let s = scored("pleasant and unremarkable", 100, 2, 50);
        assert!(evaluate(&s, &cfg, "2026-08-06").is_none());
    }

    #[test]
    fn hot_reply_ratio_is_medium_then_high() {
        let cfg = PipelineConfig::default();

        let s = scored("just a crowded thread", 100, 20, 50);
        let alert = evaluate(&s, &cfg, "2026-08-06").unwrap();
        assert_eq!(alert.severity, Severity::Medium);
        assert_eq!(alert.replyLikeRatio, 0.2);

        let s = scored("just a crowded thread", 100, 30, 50);
        let alert = evaluate(&s, &cfg, "2026-08-06").unwrap();
        assert_eq!(alert.severity, Severity::High);
    }

    #[test]
    fn conspiracy_keyword_forces_high() {
        let cfg = PipelineConfig::default();
        let s = scored("classic chemtrail operation", 1000, 1, 10);
        let alert = evaluate(&s, &cfg, "2026-08-06").unwrap();
        assert_eq!(alert.severity, Severity::High);
        assert!(alert.reason.contains("Conspiracy keywords detected."));
    }

    #[test]
    fn high_visibility_negative_alerts_at_medium() {
        let cfg = PipelineConfig::default();
        // negative sentiment, reach dominated by followers, tame ratio
        let s = scored("this is a fraud", 100, 1, 60_000);
        assert_eq!(s.sentiment, SentimentLabel::Negative);
        assert!(s.reach > cfg.high_visibility_reach);
        let alert = evaluate(&s, &cfg, "2026-08-06").unwrap();
        assert_eq!(alert.severity, Severity::Medium);
    }

    #[test]
    fn alert_key_and_date_come_from_author_and_timestamp() {
        let cfg = PipelineConfig::default();
        let s = scored("chemtrail talk", 0, 0, 0);
        let alert = evaluate(&s, &cfg, "2026-09-01").unwrap();
        assert_eq!(alert.post, "@somebody — 2026-08-06");
        assert_eq!(alert.date, "2026-08-06");
    }
}
