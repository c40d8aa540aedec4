use anyhow::{Context, Result};
use itertools::Itertools;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::api_types::{ApiSearchResponse, ApiUser};
use crate::config::PipelineConfig;
use crate::models::Mention;

const SEARCH_URL: &str = "https://api.twitter.com/2/tweets/search/recent";
const USER_AGENT: &str = "BrandPulse/1.0";

/// Offline ingestion shape: one file per collector drop.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RawBatch {
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

fn synth_mention_id(m: &Mention) -> String {
    let seed = format!("{}|{}|{}", m.author, m.text, m.timestamp);
    format!("{:016x}", xxh3_64(seed.as_bytes()))
}

/// Run one recent-search query; `Ok(None)` when the API has nothing for it
/// (404). Other HTTP failures surface as errors for the caller to downgrade.
pub async fn search_recent(
    client: &Client,
    token: &str,
    query: &str,
    max_results: u32,
) -> Result<Option<ApiSearchResponse>> {
    let start = std::time::Instant::now();
    let max = max_results.min(100).to_string();
    let params = [
        ("query", query),
        ("max_results", max.as_str()),
        ("tweet.fields", "created_at,public_metrics,author_id,lang"),
        ("expansions", "author_id"),
        ("user.fields", "username,name,public_metrics"),
    ];

    debug!("Searching - query={}", query);

    let resp = client
        .get(SEARCH_URL)
        .query(&params)
        .bearer_auth(token)
        .header("User-Agent", USER_AGENT)
        .send()
        .await
        .with_context(|| format!("Request failed for query {}", query))?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        warn!("Search endpoint returned 404 - query={}", query);
        return Ok(None);
    }

    let resp = resp
        .error_for_status()
        .with_context(|| format!("HTTP error for query {}", query))?;

    let body: ApiSearchResponse = resp
        .json()
        .await
        .with_context(|| format!("Decoding JSON for query {}", query))?;

    let elapsed = start.elapsed();
    info!(
        "Search completed - query={}, duration={:.2}s, tweets={}",
        query,
        elapsed.as_secs_f32(),
        body.data.len()
    );

    Ok(Some(body))
}

/// Run every configured query concurrently and pool the normalized mentions.
/// A failed query is "no data for this query", not a failed run - partial
/// results are valid results.
pub async fn collect_batch(
    client: &Client,
    token: &str,
    cfg: &PipelineConfig,
) -> Result<Vec<Mention>> {
    let tasks = cfg
        .queries
        .iter()
        .map(|q| search_recent(client, token, q, cfg.max_results));
    let results = futures::future::join_all(tasks).await;

    let mut users: HashMap<String, ApiUser> = HashMap::new();
    let mut responses = Vec::new();
    for (query, result) in cfg.queries.iter().zip(results) {
        match result {
            Ok(Some(resp)) => {
                for user in &resp.includes.users {
                    users.insert(user.id.clone(), user.clone());
                }
                responses.push((query.clone(), resp));
            }
            Ok(None) => warn!("No data for query - {}", query),
            Err(err) => warn!("Query failed, continuing without it - query={}, error={:#}", query, err),
        }
    }

    let mut mentions = Vec::new();
    for (query, resp) in responses {
        for tweet in resp.data {
            let user = users.get(&tweet.author_id);
            let username = user.map(|u| u.username.as_str()).unwrap_or("unknown");
            let pm = &tweet.public_metrics;
            mentions.push(Mention {
                id: tweet.id.clone(),
                text: tweet.text,
                author: format!("@{}", username),
                author_id: tweet.author_id.clone(),
                author_followers: user
                    .map(|u| u.public_metrics.followers_count)
                    .unwrap_or(0),
                likes: pm.like_count,
                retweets: pm.retweet_count,
                replies: pm.reply_count,
                quotes: pm.quote_count,
                views: pm.impression_count,
                timestamp: tweet.created_at,
                query: query.clone(),
                url: format!("https://twitter.com/{}/status/{}", username, tweet.id),
            });
        }
    }

    info!("Collection pooled {} mentions across {} queries", mentions.len(), cfg.queries.len());
    Ok(mentions)
}

/// Drop repeated identities, first occurrence wins. Identity must be unique
/// within a batch before scoring; mentions arriving without one get a stable
/// synthesized id first.
pub fn dedup_mentions(mentions: Vec<Mention>) -> Vec<Mention> {
    let before = mentions.len();
    let unique: Vec<Mention> = mentions
        .into_iter()
        .map(|mut m| {
            if m.id.is_empty() {
                m.id = synth_mention_id(&m);
            }
            m
        })
        .unique_by(|m| m.id.clone())
        .collect();

    let removed = before - unique.len();
    if removed > 0 {
        info!(
            "Deduplication - removed={} duplicates, retained={} unique mentions",
            removed,
            unique.len()
        );
    } else {
        debug!("Deduplication - no duplicates found, retained={} mentions", unique.len());
    }
    unique
}

/// Ingest collector drops from a directory, sorted by filename. A file that
/// fails to parse is skipped with a warning; the rest of the batch stands.
pub fn read_raw_dir(dir: &Path) -> Result<Vec<Mention>> {
    if !dir.exists() {
        debug!("Raw directory {} does not exist, nothing to ingest", dir.display());
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Reading raw directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
        .collect();
    paths.sort();

    let mut mentions = Vec::new();
    for path in paths {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("Skipping unreadable raw file {} ({})", path.display(), err);
                continue;
            }
        };
        match serde_json::from_str::<RawBatch>(&raw) {
            Ok(batch) => {
                info!("Ingested {} - {} mentions", path.display(), batch.mentions.len());
                mentions.extend(batch.mentions);
            }
            Err(err) => warn!("Skipping malformed raw file {} ({})", path.display(), err),
        }
    }
    Ok(mentions)
}

/// Date-stamped JSON snapshot under `dir`; used for the raw and scored drops
/// of each online run.
pub fn write_snapshot<T: Serialize>(
    dir: &Path,
    prefix: &str,
    stamp: &str,
    value: &T,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("Creating {}", dir.display()))?;
    let path = dir.join(format!("{}_{}.json", prefix, stamp));
    std::fs::write(&path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("Writing {}", path.display()))?;
    debug!("Snapshot written - {}", path.display());
    Ok(path)
}
