use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{self, PipelineConfig};
use crate::fetch;
use crate::models::{RiskAlert, ScoredMention};
use crate::render::render_summary;
use crate::risk;
use crate::score::{daily_score, score_mention, summarize, top_mentions};
use crate::store;

/// Filesystem surface of one run.
pub struct RunPaths {
    pub data_file: PathBuf,
    pub raw_dir: PathBuf,
    pub scored_dir: PathBuf,
    pub posts_file: Option<PathBuf>,
    pub env_file: PathBuf,
}

pub async fn run_daily(cfg: &PipelineConfig, paths: &RunPaths, offline: bool) -> Result<()> {
    let pipeline_start = std::time::Instant::now();
    let now = Utc::now();
    let today = now.format("%Y-%m-%d").to_string();
    info!("Pipeline started - date={}, offline={}", today, offline);

    // 1) collect a batch: network queries, or previously dropped raw files
    let fetch_start = std::time::Instant::now();
    let pooled = if offline {
        fetch::read_raw_dir(&paths.raw_dir)?
    } else {
        let token = config::bearer_token(&paths.env_file).ok_or_else(|| {
            anyhow!(
                "No TWITTER_BEARER_TOKEN found in {} or the environment.\n\
                 Add TWITTER_BEARER_TOKEN=... to the env file, or run with --offline \
                 to ingest raw files from {}.",
                paths.env_file.display(),
                paths.raw_dir.display()
            )
        })?;
        let client = Client::builder().build()?;
        let batch = fetch::collect_batch(&client, &token, cfg).await?;
        if !batch.is_empty() {
            let stamp = now.format("%Y%m%d_%H%M%S").to_string();
            fetch::write_snapshot(&paths.raw_dir, "raw", &stamp, &json!({ "mentions": &batch }))?;
        }
        batch
    };
    let fetch_elapsed = fetch_start.elapsed();
    info!(
        "Collection completed - duration={:.2}s, mentions={}",
        fetch_elapsed.as_secs_f32(),
        pooled.len()
    );

    // 2) identity must be unique within the batch before scoring
    let mentions = fetch::dedup_mentions(pooled);

    // 3) score every mention (magnitude policy for raw mentions)
    let score_start = std::time::Instant::now();
    let scored: Vec<ScoredMention> = mentions.iter().map(|m| score_mention(m, cfg)).collect();
    debug!(
        "Scoring completed - duration={:.2}s, mentions={}",
        score_start.elapsed().as_secs_f32(),
        scored.len()
    );
    if !offline && !scored.is_empty() {
        let stamp = now.format("%Y%m%d_%H%M%S").to_string();
        fetch::write_snapshot(&paths.scored_dir, "scored", &stamp, &scored)?;
    }

    // 4) aggregate: brand index, daily breakdown, alerts, top mentions
    let summary = summarize(&scored);
    let daily = daily_score(&today, &scored, summary.brand_score);
    let alerts: Vec<RiskAlert> = scored
        .iter()
        .filter_map(|s| risk::evaluate(s, cfg, &today))
        .collect();
    let top = top_mentions(&scored, cfg.top_mention_cap, &today);
    info!(
        "Aggregation - brand_score={}, alerts={}, top_mentions={}",
        summary.brand_score,
        alerts.len(),
        top.len()
    );

    // 5) merge into the rolling dashboard state and persist atomically
    let persist_start = std::time::Instant::now();
    let mut state = store::load_dashboard(&paths.data_file);
    store::merge_dashboard(&mut state, cfg, &now.to_rfc3339(), daily, alerts, top);
    store::write_json_atomic(&paths.data_file, &state)?;
    info!(
        "Dashboard persisted - duration={:.2}s, file={}, days={}, alerts={}",
        persist_start.elapsed().as_secs_f32(),
        paths.data_file.display(),
        state.scores.len(),
        state.riskAlerts.len()
    );

    // 6) optional posts-archive merge (separate shape, separate semantics)
    if let Some(posts_file) = &paths.posts_file {
        run_posts(cfg, posts_file, &scored, &now)?;
    }

    // 7) operator-facing summary
    println!("{}", render_summary(&summary, &scored));

    info!(
        "Pipeline completed - total_duration={:.2}s, mentions={}, brand_score={}",
        pipeline_start.elapsed().as_secs_f32(),
        scored.len(),
        summary.brand_score
    );
    Ok(())
}

/// Posts mode: score whatever the archive already holds, fold this run's
/// mentions in as posts, and write the archive back. Accumulate-and-resort;
/// no date-keyed replacement here.
pub fn run_posts(
    cfg: &PipelineConfig,
    posts_file: &Path,
    scored: &[ScoredMention],
    now: &DateTime<Utc>,
) -> Result<()> {
    let start = std::time::Instant::now();
    let mut archive = store::load_posts(posts_file);
    let existing = archive.recentPosts.len();

    store::score_archive(&mut archive, cfg);
    store::merge_mentions_into_posts(&mut archive, scored, &now.to_rfc3339());
    store::write_json_atomic(posts_file, &archive)?;

    info!(
        "Posts archive merged - duration={:.2}s, file={}, existing={}, appended={}, risk_signals={}",
        start.elapsed().as_secs_f32(),
        posts_file.display(),
        existing,
        scored.len(),
        archive.riskSignals.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store;
    use serde_json::json;

    fn run_paths(dir: &Path, posts: bool) -> RunPaths {
        RunPaths {
            data_file: dir.join("data.json"),
            raw_dir: dir.join("raw"),
            scored_dir: dir.join("scored"),
            posts_file: posts.then(|| dir.join("initial-pull.json")),
            env_file: dir.join(".env"),
        }
    }

    fn write_raw(dir: &Path, name: &str, mentions: serde_json::Value) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(
            dir.join(name),
            serde_json::to_vec(&json!({ "mentions": mentions })).unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn offline_run_builds_dashboard_and_rerun_replaces_the_day() {
        let dir = tempfile::tempdir().unwrap();
        let paths = run_paths(dir.path(), false);
        let cfg = PipelineConfig::default();

        write_raw(
            &paths.raw_dir,
            "batch.json",
            json!([
                {"id": "1", "text": "this is amazing and a total breakthrough", "author": "@fan", "author_followers": 100},
                {"id": "2", "text": "total scam, lawsuit incoming", "author": "@critic", "author_followers": 50},
                {"id": "3", "text": "weather today is mild", "author": "@obs", "author_followers": 10}
            ]),
        );
        run_daily(&cfg, &paths, true).await.unwrap();

        let state = store::load_dashboard(&paths.data_file);
        assert_eq!(state.scores.len(), 1);
        assert_eq!(state.scores[0].totalTweets, 3);
        assert!(state.scores[0].score > 50 && state.scores[0].score < 100);
        assert_eq!(state.topMentions.len(), 3);
        assert_eq!(state.meta.targets, cfg.targets);
        assert!(!state.meta.lastUpdated.is_empty());

        // second run on the same calendar date, different batch: the day's
        // entry reflects only the second batch
        write_raw(
            &paths.raw_dir,
            "batch.json",
            json!([{"id": "9", "text": "neutral note", "author": "@obs"}]),
        );
        run_daily(&cfg, &paths, true).await.unwrap();

        let state = store::load_dashboard(&paths.data_file);
        assert_eq!(state.scores.len(), 1);
        assert_eq!(state.scores[0].totalTweets, 1);
        assert_eq!(state.topMentions.len(), 1);
    }

    #[tokio::test]
    async fn empty_offline_run_is_neutral_and_preserves_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let paths = run_paths(dir.path(), false);
        let cfg = PipelineConfig::default();

        std::fs::write(
            &paths.data_file,
            serde_json::to_vec(&json!({
                "accountProfiles": {"@rainmakercorp": {"bio": "weather"}},
                "aggregate": {"allTime": 77}
            }))
            .unwrap(),
        )
        .unwrap();

        run_daily(&cfg, &paths, true).await.unwrap();

        let state = store::load_dashboard(&paths.data_file);
        assert_eq!(state.scores.len(), 1);
        assert_eq!(state.scores[0].score, 50);
        assert_eq!(state.scores[0].totalTweets, 0);
        assert_eq!(state.scores[0].positive, 0);
        assert_eq!(state.scores[0].negative, 0);
        assert_eq!(state.scores[0].neutral, 0);
        assert!(state.topMentions.is_empty());

        let out = serde_json::to_value(&state).unwrap();
        assert_eq!(out["accountProfiles"]["@rainmakercorp"]["bio"], "weather");
        assert_eq!(out["aggregate"]["allTime"], 77);
    }

    #[tokio::test]
    async fn posts_mode_accumulates_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = run_paths(dir.path(), true);
        let cfg = PipelineConfig::default();
        let posts_file = paths.posts_file.clone().unwrap();

        std::fs::write(
            &posts_file,
            serde_json::to_vec(&json!({
                "recentPosts": [
                    {"account": "@old", "content": "love this product", "metrics": {"likes": 4}}
                ],
                "accounts": {"@old": {"note": "kept"}}
            }))
            .unwrap(),
        )
        .unwrap();

        write_raw(
            &paths.raw_dir,
            "batch.json",
            json!([{"id": "1", "text": "total scam", "author": "@critic", "likes": 2, "replies": 10}]),
        );
        run_daily(&cfg, &paths, true).await.unwrap();

        let archive = store::load_posts(&posts_file);
        assert_eq!(archive.recentPosts.len(), 2);
        // mention engagement 2 + 50 = 52 outranks the old post's 4
        assert_eq!(archive.recentPosts[0].account, "@critic");
        assert_eq!(archive.recentPosts[1].sentiment.as_deref(), Some("positive"));
        assert!(archive.riskSignals.contains(&"scam".to_string()));
        assert!(!archive.pulled_at.is_empty());

        let out = serde_json::to_value(&archive).unwrap();
        assert_eq!(out["accounts"]["@old"]["note"], "kept");

        // run again with the same raw file: the archive accumulates
        run_daily(&cfg, &paths, true).await.unwrap();
        let archive = store::load_posts(&posts_file);
        assert_eq!(archive.recentPosts.len(), 3);
    }
}

