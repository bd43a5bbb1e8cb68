//! Article processing: neutralize with every judge, extract claims, verify
//! every claim with every judge, aggregate into a fact-check status.

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use common::PipelineConfig;

use crate::article::{Article, FactCheckStatus, RawArticle};
use crate::claims::{ClaimExtractor, DEFAULT_MIN_WORDS};
use crate::judge::Judge;
use crate::verdict::{article_status, ClaimCheck, Verdict};

/// Tuning knobs for [`ArticlePipeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub min_claim_words: usize,
    /// Upper bound for every single judge call
    pub judge_timeout: Duration,
    /// Articles processed at the same time within a batch
    pub article_concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            min_claim_words: DEFAULT_MIN_WORDS,
            judge_timeout: Duration::from_secs(60),
            article_concurrency: 4,
        }
    }
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        let defaults = PipelineOptions::default();
        Self {
            min_claim_words: config.min_claim_words.unwrap_or(defaults.min_claim_words),
            judge_timeout: config
                .judge_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.judge_timeout),
            article_concurrency: config
                .article_concurrency
                .unwrap_or(defaults.article_concurrency)
                .max(1),
        }
    }
}

/// Full result of checking one article
#[derive(Debug, Clone)]
pub struct ArticleReport {
    pub article: Article,
    /// Per-claim verdict table; empty when neutralization failed or was cancelled
    pub claims: Vec<ClaimCheck>,
}

enum Outcome {
    Checked {
        content: String,
        claims: Vec<ClaimCheck>,
        status: FactCheckStatus,
    },
    AllJudgesFailed,
}

/// Runs articles through the judge ensemble.
///
/// Holds the judges read-only; never creates or drops them on its own.
pub struct ArticlePipeline {
    judges: Vec<Arc<dyn Judge>>,
    extractor: ClaimExtractor,
    options: PipelineOptions,
}

impl ArticlePipeline {
    pub fn new(judges: Vec<Arc<dyn Judge>>) -> Self {
        let options = PipelineOptions::default();
        Self {
            judges,
            extractor: ClaimExtractor::new(options.min_claim_words),
            options,
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.extractor = ClaimExtractor::new(options.min_claim_words);
        self.options = options;
        self
    }

    /// Process a single article. Never fails: problems end up in
    /// `fact_check_status` and in the logs.
    pub async fn process(&self, article: Article) -> Article {
        self.process_cancellable(article, &CancellationToken::new()).await
    }

    /// Like [`process`](Self::process), but drops every in-flight judge call
    /// once `cancel` fires. A cancelled article keeps its original content and
    /// gets status `Error`.
    pub async fn process_cancellable(&self, article: Article, cancel: &CancellationToken) -> Article {
        self.check_cancellable(article, cancel).await.article
    }

    /// Process an article and keep the per-claim verdict table
    pub async fn check(&self, article: Article) -> ArticleReport {
        self.check_cancellable(article, &CancellationToken::new()).await
    }

    pub async fn check_cancellable(&self, mut article: Article, cancel: &CancellationToken) -> ArticleReport {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            outcome = self.run(&article) => Some(outcome),
        };

        let claims = match outcome {
            Some(Outcome::Checked { content, claims, status }) => {
                article.content = content;
                article.fact_check_status = status;
                claims
            }
            Some(Outcome::AllJudgesFailed) => {
                article.fact_check_status = FactCheckStatus::Error;
                Vec::new()
            }
            None => {
                warn!(url = %article.url, "processing cancelled");
                article.fact_check_status = FactCheckStatus::Error;
                Vec::new()
            }
        };

        ArticleReport { article, claims }
    }

    /// Process a batch. Output order matches input order, one article per input.
    pub async fn process_batch(&self, raw_articles: Vec<RawArticle>) -> Vec<Article> {
        self.process_batch_cancellable(raw_articles, &CancellationToken::new())
            .await
    }

    pub async fn process_batch_cancellable(
        &self,
        raw_articles: Vec<RawArticle>,
        cancel: &CancellationToken,
    ) -> Vec<Article> {
        self.check_batch_cancellable(raw_articles, cancel)
            .await
            .into_iter()
            .map(|report| report.article)
            .collect()
    }

    /// Batch variant of [`check`](Self::check)
    pub async fn check_batch_cancellable(
        &self,
        raw_articles: Vec<RawArticle>,
        cancel: &CancellationToken,
    ) -> Vec<ArticleReport> {
        if raw_articles.is_empty() {
            return Vec::new();
        }

        let total = raw_articles.len();
        info!(
            "Processing {} articles with {} judges",
            total,
            self.judges.len()
        );

        let reports: Vec<ArticleReport> = stream::iter(raw_articles.into_iter().map(Article::from_raw))
            .map(|article| self.check_cancellable(article, cancel))
            .buffered(self.options.article_concurrency.max(1))
            .collect()
            .await;

        let mut tally: HashMap<FactCheckStatus, usize> = HashMap::new();
        for report in &reports {
            *tally.entry(report.article.fact_check_status).or_default() += 1;
        }
        let failed = tally.get(&FactCheckStatus::Error).copied().unwrap_or(0);
        info!(
            "Processed {}/{} articles ({} verified, {} partially verified, {} uncertain)",
            total - failed,
            total,
            tally.get(&FactCheckStatus::Verified).copied().unwrap_or(0),
            tally.get(&FactCheckStatus::PartiallyVerified).copied().unwrap_or(0),
            tally.get(&FactCheckStatus::Uncertain).copied().unwrap_or(0),
        );

        reports
    }

    async fn run(&self, article: &Article) -> Outcome {
        // 1. Neutralize with every judge
        let neutralized = self.neutralize_all(article).await;
        if neutralized.is_empty() {
            error!(
                url = %article.url,
                judges = self.judges.len(),
                "all judges failed to neutralize article"
            );
            return Outcome::AllJudgesFailed;
        }
        let content = neutralized.join("\n");

        // 2. Extract claims from the neutral text
        let claims = self.extractor.extract(&content);
        debug!(url = %article.url, claims = claims.len(), "extracted claims");

        // 3. Verify every claim with every judge
        let checks = join_all(claims.into_iter().map(|claim| self.check_claim(article, claim))).await;

        // 4. Aggregate
        let status = article_status(checks.iter().map(|c| c.merged));
        info!(url = %article.url, status = %status, claims = checks.len(), "article checked");

        Outcome::Checked {
            content,
            claims: checks,
            status,
        }
    }

    /// Successful neutralizations in judge order; failed judges are skipped
    async fn neutralize_all(&self, article: &Article) -> Vec<String> {
        let text = article.analysis_text();
        let timeout = self.options.judge_timeout;

        let results = join_all(self.judges.iter().map(|judge| {
            let text = text.as_str();
            async move { (judge.name(), tokio::time::timeout(timeout, judge.neutralize(text)).await) }
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(judge, result)| match result {
                Ok(Ok(content)) => Some(content),
                Ok(Err(e)) => {
                    warn!(judge, url = %article.url, error = %e, "neutralization failed");
                    None
                }
                Err(_) => {
                    warn!(judge, url = %article.url, ?timeout, "neutralization timed out");
                    None
                }
            })
            .collect()
    }

    async fn check_claim(&self, article: &Article, claim: String) -> ClaimCheck {
        let timeout = self.options.judge_timeout;

        let verdicts = join_all(self.judges.iter().map(|judge| {
            let claim = claim.as_str();
            async move {
                let verdict = match tokio::time::timeout(timeout, judge.verify(claim)).await {
                    Ok(verdict) => {
                        if !verdict.is_defined() {
                            debug!(judge = judge.name(), url = %article.url, claim, "judge gave no verdict");
                        }
                        verdict
                    }
                    Err(_) => {
                        warn!(judge = judge.name(), url = %article.url, claim, "verification timed out");
                        Verdict::Unknown
                    }
                };
                (judge.name().to_string(), verdict)
            }
        }))
        .await;

        let check = ClaimCheck::new(claim, verdicts);
        if check.is_conflict() {
            info!(url = %article.url, claim = %check.claim, "judges disagree on claim");
        }
        debug!(url = %article.url, claim = %check.claim, merged = ?check.merged, "claim verified");
        check
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_config_apply_defaults() {
        let options = PipelineOptions::from(&PipelineConfig {
            min_claim_words: None,
            judge_timeout_seconds: Some(5),
            article_concurrency: Some(0),
        });
        assert_eq!(options.min_claim_words, DEFAULT_MIN_WORDS);
        assert_eq!(options.judge_timeout, Duration::from_secs(5));
        assert_eq!(options.article_concurrency, 1);
    }

    #[tokio::test]
    async fn no_judges_means_error_status() {
        let pipeline = ArticlePipeline::new(Vec::new());
        let raw = RawArticle {
            title: "Title".to_string(),
            content: "Content".to_string(),
            author: String::new(),
            description: String::new(),
            url: "https://example.com/x".to_string(),
            published_at: chrono::Utc::now(),
            source_name: String::new(),
            category: "general".to_string(),
        };
        let article = pipeline.process(Article::from_raw(raw)).await;
        assert_eq!(article.fact_check_status, FactCheckStatus::Error);
        assert_eq!(article.content, "Content");
    }
}
