use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::article::RawArticle;

/// Selection criteria passed to a news fetcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchFilter {
    pub country: Option<String>,
    pub category: Option<String>,
    pub page_size: Option<u32>,
}

/// Source of raw articles for the pipeline.
///
/// Fetch errors are returned as-is; callers decide what to do with them.
#[async_trait::async_trait]
pub trait NewsFetcher: Send + Sync {
    async fn fetch(&self, filter: &FetchFilter) -> Result<Vec<RawArticle>>;
}

/// Top-headlines client for NewsAPI (https://newsapi.org)
pub struct NewsApiFetcher {
    base_url: String,
    api_key: String,
    client: Client,
}

impl NewsApiFetcher {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("newsjudge/0.1.0")
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        })
    }

    fn headlines_url(&self, filter: &FetchFilter) -> Result<url::Url> {
        let mut params: Vec<(&str, String)> = vec![
            ("country", filter.country.clone().unwrap_or_else(|| "us".to_string())),
            ("pageSize", filter.page_size.unwrap_or(20).to_string()),
        ];
        if let Some(category) = &filter.category {
            params.push(("category", category.clone()));
        }

        let endpoint = format!("{}/top-headlines", self.base_url.trim_end_matches('/'));
        url::Url::parse_with_params(&endpoint, &params)
            .with_context(|| format!("invalid news API url: {}", endpoint))
    }
}

#[async_trait::async_trait]
impl NewsFetcher for NewsApiFetcher {
    async fn fetch(&self, filter: &FetchFilter) -> Result<Vec<RawArticle>> {
        let url = self.headlines_url(filter)?;
        debug!("fetching headlines from {}", url.path());

        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .context("network error during news fetch")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("news fetch failed with status {}: {}", status, body);
        }

        let body: NewsApiResponse = response
            .json()
            .await
            .context("failed to parse news API response")?;

        if body.status != "ok" {
            anyhow::bail!(
                "news API returned status '{}': {}",
                body.status,
                body.message.unwrap_or_default()
            );
        }

        let category = filter.category.as_deref().unwrap_or("general");
        let articles = into_raw_articles(body.articles, category, Utc::now());
        info!("Fetched {} articles from news API", articles.len());
        Ok(articles)
    }
}

/// Map feed records to raw articles, then apply [`retain_unique_urls`].
fn into_raw_articles(records: Vec<NewsApiArticle>, category: &str, fetched_at: DateTime<Utc>) -> Vec<RawArticle> {
    let articles = records
        .into_iter()
        .map(|record| {
            let url = record.url.unwrap_or_default();
            let published_at = match record.published_at.as_deref().map(DateTime::parse_from_rfc3339) {
                Some(Ok(ts)) => ts.with_timezone(&Utc),
                Some(Err(e)) => {
                    warn!("Unparseable publishedAt for {}: {}", url, e);
                    fetched_at
                }
                None => fetched_at,
            };

            RawArticle {
                title: record.title.unwrap_or_default(),
                content: record.content.unwrap_or_default(),
                author: record.author.unwrap_or_default(),
                description: record.description.unwrap_or_default(),
                url,
                published_at,
                source_name: record.source.and_then(|s| s.name).unwrap_or_default(),
                category: category.to_string(),
            }
        })
        .collect();

    retain_unique_urls(articles)
}

/// Drop articles without a url and keep only the first article for each url,
/// so `url` identifies an article within a batch.
pub fn retain_unique_urls(articles: Vec<RawArticle>) -> Vec<RawArticle> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| {
            if article.url.trim().is_empty() {
                debug!("Skipping entry without URL: {:?}", article.title);
                return false;
            }
            if !seen.insert(article.url.clone()) {
                warn!("Skipping duplicate URL: {}", article.url);
                return false;
            }
            true
        })
        .collect()
}

/// Load raw articles from a JSON array on disk (the CLI's `--input`).
pub async fn read_articles_file(path: &Path) -> Result<Vec<RawArticle>> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read input file: {}", path.display()))?;
    let records: Vec<RawArticle> =
        serde_json::from_str(&data).context("input file is not a JSON array of articles")?;

    let total = records.len();
    let articles = retain_unique_urls(records);
    info!(path = ?path, count = articles.len(), skipped = total - articles.len(), "loaded raw articles");
    Ok(articles)
}

// NewsAPI response structures
#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    #[serde(default)]
    source: Option<NewsApiSource>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    #[serde(default)]
    name: Option<String>,
}
