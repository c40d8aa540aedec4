use serde::{Deserialize, Serialize};

/* Twitter API v2 recent-search wire shapes. Only the fields the pipeline
   reads; everything is defaulted because the API omits empty sections. */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSearchResponse {
    #[serde(default)]
    pub data: Vec<ApiTweet>,
    #[serde(default)]
    pub includes: ApiIncludes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiTweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub created_at: String, // ISO-8601
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub public_metrics: ApiTweetMetrics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiTweetMetrics {
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub quote_count: u64,
    #[serde(default)]
    pub impression_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiIncludes {
    #[serde(default)]
    pub users: Vec<ApiUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub public_metrics: ApiUserMetrics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiUserMetrics {
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub tweet_count: u64,
}
