//! GitHub REST client for the aggregates the statistics pipeline needs.

use super::location::RemoteRepo;
use super::transport::{HttpResponse, ReqwestTransport, Transport};
use crate::config::{QueryOptions, RetryPolicy, USER_AGENT};
use crate::error::{PulseError, Result};
use crate::model::RepositoryMetadata;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const API_VERSION: &str = "2022-11-28";

/// Aggregate numbers GitHub reports for one contributor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteContributor {
    pub login: String,
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
}

impl RemoteContributor {
    /// GitHub never exposes author emails through the statistics API.
    pub fn email(&self) -> String {
        format!("{}@users.noreply.github.com", self.login)
    }
}

#[derive(Debug, Deserialize)]
struct ContributorActivity {
    author: Option<Author>,
    #[serde(default)]
    weeks: Vec<WeeklyActivity>,
}

#[derive(Debug, Deserialize)]
struct Author {
    login: String,
}

#[derive(Debug, Deserialize)]
struct WeeklyActivity {
    #[serde(rename = "a", default)]
    additions: u64,
    #[serde(rename = "d", default)]
    deletions: u64,
    #[serde(rename = "c", default)]
    commits: u64,
}

#[derive(Debug, Deserialize)]
struct GitHubRepository {
    full_name: String,
    description: Option<String>,
    default_branch: String,
    language: Option<String>,
    stargazers_count: u64,
    forks_count: u64,
    open_issues_count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

pub struct GitHubClient {
    transport: Box<dyn Transport>,
    api_url: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl GitHubClient {
    pub fn new(options: &QueryOptions, token: Option<String>) -> Result<Self> {
        let transport = ReqwestTransport::new(options.timeout, USER_AGENT)?;
        info!(api_url = %options.api_url, authenticated = token.is_some(), "created GitHub client");
        Ok(Self::with_transport(
            Box::new(transport),
            &options.api_url,
            token,
            options.retry,
        ))
    }

    pub fn with_transport(
        transport: Box<dyn Transport>,
        api_url: &str,
        token: Option<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            retry,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("accept", "application/vnd.github+json".to_string()),
            ("x-github-api-version", API_VERSION.to_string()),
        ];
        if let Some(token) = &self.token {
            headers.push(("authorization", format!("Bearer {token}")));
        }
        headers
    }

    /// GET `url`, turning every non-2xx status into a typed error.
    fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!(url, "GitHub API request");
        let response = self.transport.get(url, &self.headers())?;
        check_status(&response)?;
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(&self.endpoint(path))?;
        Ok(serde_json::from_str(&response.body)?)
    }

    pub fn repository(&self, repo: &RemoteRepo) -> Result<RepositoryMetadata> {
        let raw: GitHubRepository = self.get_json(&format!("repos/{}/{}", repo.owner, repo.name))?;
        let open_pull_requests = self.open_pull_requests(repo)?;

        Ok(RepositoryMetadata {
            full_name: raw.full_name,
            description: raw.description,
            default_branch: raw.default_branch,
            language: raw.language,
            stars: raw.stargazers_count,
            forks: raw.forks_count,
            // GitHub counts open pull requests as issues.
            open_issues: raw.open_issues_count.saturating_sub(open_pull_requests),
            open_pull_requests,
        })
    }

    /// Count open pull requests by following `Link: rel="next"` pages.
    pub fn open_pull_requests(&self, repo: &RemoteRepo) -> Result<u64> {
        let mut next = Some(self.endpoint(&format!(
            "repos/{}/{}/pulls?state=open&per_page=100",
            repo.owner, repo.name
        )));
        let mut count = 0u64;
        let mut pages = 0u32;

        while let Some(url) = next {
            let response = self.get(&url)?;
            let page: Vec<serde_json::Value> = serde_json::from_str(&response.body)?;
            count += page.len() as u64;
            pages += 1;
            next = response.header("link").and_then(next_page_url);
        }

        debug!(repo = %repo, count, pages, "counted open pull requests");
        Ok(count)
    }

    /// Byte totals per language as reported by GitHub's linguist.
    pub fn languages(&self, repo: &RemoteRepo) -> Result<BTreeMap<String, u64>> {
        self.get_json(&format!("repos/{}/{}/languages", repo.owner, repo.name))
    }

    /// Per-contributor commit, addition and deletion totals.
    ///
    /// GitHub computes these out of band and answers `202 Accepted` until they
    /// are ready. Pending answers are retried after a fixed delay up to the
    /// policy's attempt budget, after which `StatsUnavailable` is returned.
    pub fn contributor_stats(&self, repo: &RemoteRepo) -> Result<Vec<RemoteContributor>> {
        let url = self.endpoint(&format!("repos/{}/{}/stats/contributors", repo.owner, repo.name));
        let max_attempts = self.retry.max_attempts;

        for attempt in 1..=max_attempts {
            let response = self.get(&url)?;
            match response.status {
                202 => {
                    if attempt < max_attempts {
                        warn!(
                            repo = %repo,
                            attempt,
                            max_attempts,
                            delay = %humantime::format_duration(self.retry.delay),
                            "contributor statistics are still being computed, retrying"
                        );
                        std::thread::sleep(self.retry.delay);
                    }
                }
                204 => return Ok(Vec::new()),
                _ => {
                    let activity: Vec<ContributorActivity> = if response.body.trim().is_empty() {
                        Vec::new()
                    } else {
                        serde_json::from_str(&response.body)?
                    };
                    return Ok(summarize(activity));
                }
            }
        }

        Err(PulseError::StatsUnavailable {
            attempts: max_attempts,
        })
    }
}

fn summarize(activity: Vec<ContributorActivity>) -> Vec<RemoteContributor> {
    activity
        .into_iter()
        .filter_map(|entry| {
            let Some(author) = entry.author else {
                warn!("skipping contributor statistics without an author account");
                return None;
            };
            let (commits, additions, deletions) = entry
                .weeks
                .iter()
                .fold((0, 0, 0), |(c, a, d), w| (c + w.commits, a + w.additions, d + w.deletions));
            Some(RemoteContributor {
                login: author.login,
                commits,
                additions,
                deletions,
            })
        })
        .collect()
}

fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }

    let message = serde_json::from_str::<ApiMessage>(&response.body)
        .map(|m| m.message)
        .unwrap_or_else(|_| response.body.trim().to_string());

    match response.status {
        401 => Err(PulseError::AccessDenied(message)),
        403 | 429 if is_rate_limited(response) => Err(PulseError::RateLimited {
            retry_after: retry_after(response),
        }),
        403 => Err(PulseError::AccessDenied(message)),
        404 => Err(PulseError::InvalidLocation(format!(
            "repository not found or not accessible: {message}"
        ))),
        status => Err(PulseError::Api { status, message }),
    }
}

fn is_rate_limited(response: &HttpResponse) -> bool {
    response.status == 429
        || response.header("x-ratelimit-remaining") == Some("0")
        || response.header("retry-after").is_some()
}

fn retry_after(response: &HttpResponse) -> Option<Duration> {
    if let Some(secs) = response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        return Some(Duration::from_secs(secs));
    }

    let reset = response
        .header("x-ratelimit-reset")
        .and_then(|v| v.trim().parse::<i64>().ok())?;
    let now = chrono::Utc::now().timestamp();
    Some(Duration::from_secs(reset.saturating_sub(now).max(0) as u64))
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header.
fn next_page_url(link: &str) -> Option<String> {
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
        is_next.then(|| {
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
    })
}
