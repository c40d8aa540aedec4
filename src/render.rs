// src/render.rs
use crate::models::{truncate_chars, ScoredMention};
use crate::score::BatchSummary;

/// End-of-run console report. Free-form; nothing downstream parses it.
pub fn render_summary(summary: &BatchSummary, scored: &[ScoredMention]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Brand score: {}/100\n", summary.brand_score));
    out.push_str(&format!(
        "Mentions: {} total | positive={} negative={} neutral={} mixed={} | flagged={}\n",
        summary.total,
        summary.positive,
        summary.negative,
        summary.neutral,
        summary.mixed,
        summary.flagged
    ));

    let mut ranked: Vec<&ScoredMention> = scored.iter().collect();
    ranked.sort_by(|a, b| b.reach.cmp(&a.reach));
    if !ranked.is_empty() {
        out.push_str("\nTop mentions by reach:\n");
        for s in ranked.iter().take(5) {
            out.push_str(&format!(
                "  [{:8}] reach={:>8} | {} | {}\n",
                s.sentiment,
                s.reach,
                s.mention.author,
                truncate_chars(&s.mention.text, 80)
            ));
        }
    }

    out
}
