//! GitHub provider (REST v3) for PR lookup and discussion retrieval.
//!
//! Endpoints used:
//!   * GET /search/issues?q=repo:{owner}/{repo}+sha:{sha}+type:pr
//!   * GET /repos/{owner}/{repo}/pulls/{number}
//!   * GET /repos/{owner}/{repo}/pulls/{number}/reviews
//!   * GET /repos/{owner}/{repo}/pulls/{number}/comments
//!   * GET /repos/{owner}/{repo}/issues/{number}/comments
//!
//! A token is optional (public repositories work unauthenticated, with a much
//! lower rate limit); when present it is sent as a Bearer header.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::GitBlockResult;

/// Runtime configuration for the GitHub client.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base, e.g. "https://api.github.com".
    pub base_api: String,
    /// Personal access token; optional for public repositories.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_api: "https://api.github.com".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// GitHub HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Constructs a GitHub client from configuration.
    pub fn from_config(cfg: GitHubConfig) -> GitBlockResult<Self> {
        debug!(base_api = %cfg.base_api, "initializing GitHub client");
        let http = Client::builder()
            .user_agent("git-block-engine/0.1")
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_api: cfg.base_api.trim_end_matches('/').to_string(),
            token: cfg.token,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> GitBlockResult<T> {
        let mut req = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .query(query);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let out = req.send().await?.error_for_status()?.json::<T>().await?;
        Ok(out)
    }

    /// Maps each commit SHA to the PRs that contain it, via the search API.
    ///
    /// Best-effort per SHA: a failed search (common for commits that never
    /// went through a PR) leaves that SHA mapped to an empty list.
    pub async fn find_prs_for_commits(
        &self,
        owner: &str,
        repo: &str,
        shas: &[String],
    ) -> HashMap<String, Vec<PrRecord>> {
        let mut commit_to_prs: HashMap<String, Vec<PrRecord>> =
            shas.iter().map(|s| (s.clone(), Vec::new())).collect();

        for sha in shas {
            let query = format!("repo:{owner}/{repo} sha:{sha} type:pr");
            let url = format!("{}/search/issues", self.base_api);
            let found: SearchIssuesResponse = match self
                .get_json(&url, &[("q", query.as_str()), ("per_page", "10")])
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(sha = %sha, error = %e, "PR search failed, skipping commit");
                    continue;
                }
            };

            let mut seen: Vec<u64> = Vec::new();
            for item in found.items {
                if seen.contains(&item.number) {
                    continue;
                }
                match self.get_pull_request(owner, repo, item.number).await {
                    Ok(pr) => {
                        seen.push(item.number);
                        if let Some(prs) = commit_to_prs.get_mut(sha) {
                            prs.push(pr);
                        }
                    }
                    Err(e) => {
                        debug!(number = item.number, error = %e, "PR fetch failed, skipping");
                    }
                }
            }
        }

        commit_to_prs
    }

    /// Fetches one pull request by number.
    pub async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> GitBlockResult<PrRecord> {
        let url = format!("{}/repos/{owner}/{repo}/pulls/{number}", self.base_api);
        self.get_json(&url, &[]).await
    }

    /// Fetches the full discussion for a PR: reviews, review comments (on
    /// code) and issue comments (general). Each sub-fetch is independently
    /// best-effort; a failure leaves that list empty.
    pub async fn get_pr_discussion(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        max_comments: usize,
    ) -> GitBlockResult<PrDiscussion> {
        let pr = self.get_pull_request(owner, repo, number).await?;

        let reviews_url = format!(
            "{}/repos/{owner}/{repo}/pulls/{number}/reviews",
            self.base_api
        );
        let reviews = match self.get_json::<Vec<GhReview>>(&reviews_url, &[]).await {
            Ok(mut v) => {
                v.truncate(max_comments);
                v
            }
            Err(e) => {
                warn!(number, error = %e, "failed to fetch PR reviews");
                Vec::new()
            }
        };

        let review_comments_url = format!(
            "{}/repos/{owner}/{repo}/pulls/{number}/comments",
            self.base_api
        );
        let review_comments = match self
            .get_json::<Vec<GhComment>>(&review_comments_url, &[])
            .await
        {
            Ok(mut v) => {
                v.truncate(max_comments);
                v
            }
            Err(e) => {
                warn!(number, error = %e, "failed to fetch PR review comments");
                Vec::new()
            }
        };

        let issue_comments_url = format!(
            "{}/repos/{owner}/{repo}/issues/{number}/comments",
            self.base_api
        );
        let issue_comments = match self
            .get_json::<Vec<GhComment>>(&issue_comments_url, &[])
            .await
        {
            Ok(mut v) => {
                v.truncate(max_comments);
                v
            }
            Err(e) => {
                warn!(number, error = %e, "failed to fetch PR issue comments");
                Vec::new()
            }
        };

        Ok(PrDiscussion {
            pr,
            reviews,
            review_comments,
            issue_comments,
        })
    }
}

/* ---------------------------------------------------------------------- */
/* Wire types                                                             */
/* ---------------------------------------------------------------------- */

/// Pull request as returned by the GitHub REST API (fields we consume).
#[derive(Debug, Clone, Deserialize)]
pub struct PrRecord {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub state: String,
    pub merged_at: Option<String>,
    pub body: Option<String>,
    pub user: Option<GhUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhUser {
    pub login: String,
}

/// One PR review (top-level verdict with an optional body).
#[derive(Debug, Clone, Deserialize)]
pub struct GhReview {
    pub body: Option<String>,
    #[serde(default)]
    pub state: String,
    pub user: Option<GhUser>,
}

/// One review or issue comment.
#[derive(Debug, Clone, Deserialize)]
pub struct GhComment {
    pub body: Option<String>,
    pub user: Option<GhUser>,
}

#[derive(Debug, Deserialize)]
struct SearchIssuesResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    number: u64,
}

/// Aggregated raw discussion for one PR.
#[derive(Debug, Clone)]
pub struct PrDiscussion {
    pub pr: PrRecord,
    pub reviews: Vec<GhReview>,
    pub review_comments: Vec<GhComment>,
    pub issue_comments: Vec<GhComment>,
}
