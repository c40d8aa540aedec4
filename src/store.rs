use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::models::{
    DailyScore, DashboardState, PostArchive, PostRecord, RiskAlert, ScoredMention, TopMention,
};

/// Keep only the `cap` most recent entries, evicting from the front.
/// Shared by the score series and the alert list.
pub fn retain_tail<T>(items: &mut Vec<T>, cap: usize) {
    if items.len() > cap {
        let overflow = items.len() - cap;
        items.drain(..overflow);
    }
}

/// Load persisted state leniently: a missing or unreadable file and a corrupt
/// document all degrade to the empty default. A bad state file must never
/// abort a run.
fn load_lenient<T: DeserializeOwned + Default>(path: &Path, what: &str) -> T {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            debug!("No existing {} at {} ({}), starting fresh", what, path.display(), err);
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(state) => state,
        Err(err) => {
            warn!(
                "Corrupt {} at {} ({}), treating as absent",
                what,
                path.display(),
                err
            );
            T::default()
        }
    }
}

pub fn load_dashboard(path: &Path) -> DashboardState {
    load_lenient(path, "dashboard state")
}

pub fn load_posts(path: &Path) -> PostArchive {
    load_lenient(path, "posts archive")
}

/// Whole-document write via a temp sibling and rename, so a crash mid-write
/// leaves the previous state intact.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("Writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Renaming {} into place", tmp.display()))?;
    Ok(())
}

/// Reconcile one run's results into the dashboard state.
///
/// The score series is date-keyed: an entry for the same day is replaced,
/// never duplicated. Alerts dedup on their `post` key, first-seen wins. The
/// top-mentions list is a snapshot of this batch only. `accountProfiles`,
/// `aggregate` and any unknown fields ride through untouched.
pub fn merge_dashboard(
    state: &mut DashboardState,
    cfg: &PipelineConfig,
    now_iso: &str,
    daily: DailyScore,
    alerts: Vec<RiskAlert>,
    top: Vec<TopMention>,
) {
    state.scores.retain(|s| s.date != daily.date);
    state.scores.push(daily);
    retain_tail(&mut state.scores, cfg.score_history_days);

    for alert in alerts {
        if state.riskAlerts.iter().any(|a| a.post == alert.post) {
            debug!("Dropping duplicate alert - key={}", alert.post);
            continue;
        }
        state.riskAlerts.push(alert);
    }
    retain_tail(&mut state.riskAlerts, cfg.alert_cap);

    state.topMentions = top;

    state.meta.lastUpdated = now_iso.to_string();
    state.meta.targets = cfg.targets.clone();
    state.meta.keywords = cfg.keywords.clone();
}

/// Score every archived post in place, then restore the engagement ordering.
pub fn score_archive(archive: &mut PostArchive, cfg: &PipelineConfig) {
    for post in archive.recentPosts.iter_mut() {
        crate::score::score_post(post, cfg);
    }
    sort_posts(&mut archive.recentPosts);
    archive.riskSignals = collect_risk_signals(archive);
}

/// Append scored raw mentions to the archive in post form and re-sort. This
/// mode accumulates; it never replaces by date.
pub fn merge_mentions_into_posts(
    archive: &mut PostArchive,
    scored: &[ScoredMention],
    now_iso: &str,
) {
    archive
        .recentPosts
        .extend(scored.iter().map(PostRecord::from_scored));
    sort_posts(&mut archive.recentPosts);
    archive.riskSignals = collect_risk_signals(archive);
    archive.pulled_at = now_iso.to_string();
}

/// Stable descending sort by engagement score; equal scores keep their
/// existing order.
fn sort_posts(posts: &mut [PostRecord]) {
    posts.sort_by(|a, b| b.engagement_score.total_cmp(&a.engagement_score));
}

/// Union of risk keywords and topics across every flagged post, plus whatever
/// signals were already recorded. Deduplicated and sorted, so re-runs are
/// byte-stable.
fn collect_risk_signals(archive: &PostArchive) -> Vec<String> {
    let mut signals: BTreeSet<String> = archive.riskSignals.iter().cloned().collect();
    for post in &archive.recentPosts {
        if post.risk_flag == Some(true) {
            signals.extend(post.risk_keywords.iter().cloned());
            signals.extend(post.topics.iter().cloned());
        }
    }
    signals.into_iter().collect()
}
