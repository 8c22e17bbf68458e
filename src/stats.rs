//! One entry point for both local and remote statistics.
//!
//! A [`RepositoryQuery`] names a repository and how to reach it;
//! [`StatsSource::open`] turns it into a handle that can answer contributor,
//! language and metadata questions. The free functions at the bottom open a
//! fresh source for every call.

use crate::aggregate::{self, ContributorAccumulator};
use crate::config::QueryOptions;
use crate::error::Result;
use crate::git::{GitRepo, SnapshotStats, WalkOptions};
use crate::model::{
    AnalysisReport, CodebaseReport, CommitRecord, Contributor, ContributorId, ContributorReport,
    LanguageReport, LanguageUnit, Mode, RepositoryInfo, RepositoryMetadata,
};
use crate::remote::{GitHubClient, RemoteRepo};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Rows kept in the largest and most-changed file rankings.
const TOP_FILES: usize = 10;

#[derive(Debug, Clone)]
pub struct RepositoryQuery {
    pub location: String,
    pub mode: Mode,
    /// Bearer token, remote only. Never logged.
    pub credential: Option<String>,
    pub options: QueryOptions,
}

impl RepositoryQuery {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            location: path.into().to_string_lossy().into_owned(),
            mode: Mode::Local,
            credential: None,
            options: QueryOptions::default(),
        }
    }

    pub fn remote(reference: impl Into<String>, credential: Option<String>) -> Self {
        Self {
            location: reference.into(),
            mode: Mode::Remote,
            credential,
            options: QueryOptions::default(),
        }
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }
}

pub struct LocalSource {
    repo: GitRepo,
    options: QueryOptions,
}

impl LocalSource {
    pub fn open(path: &str, options: QueryOptions) -> Result<Self> {
        let repo = GitRepo::open(path)?;
        Ok(Self { repo, options })
    }

    pub fn repo(&self) -> &GitRepo {
        &self.repo
    }

    fn walk(&self) -> Result<Vec<CommitRecord>> {
        let range = self
            .repo
            .resolve_range(self.options.since.as_deref(), self.options.until.as_deref())?;
        let walk = WalkOptions {
            range,
            include_merges: self.options.include_merges,
            show_progress: self.options.show_progress,
            exclusions: self.options.exclusions(),
        };
        self.repo.collect_commits(&walk)
    }

    pub fn contributors(&self) -> Result<ContributorReport> {
        Ok(contributor_report(&self.walk()?))
    }

    pub fn languages(&self, by_lines: bool) -> Result<LanguageReport> {
        let snapshot = self.repo.snapshot(&self.options.exclusions())?;
        Ok(language_report(snapshot, by_lines))
    }

    pub fn codebase(&self) -> Result<CodebaseReport> {
        let commits = self.walk()?;
        let snapshot = self.repo.snapshot(&self.options.exclusions())?;
        Ok(self.codebase_from(&commits, &snapshot))
    }

    /// Walks history and the tree once for all three sections.
    pub fn analyze(&self, by_lines: bool) -> Result<AnalysisReport> {
        let commits = self.walk()?;
        let snapshot = self.repo.snapshot(&self.options.exclusions())?;
        Ok(AnalysisReport {
            codebase: self.codebase_from(&commits, &snapshot),
            contributors: contributor_report(&commits),
            languages: language_report(snapshot, by_lines),
        })
    }

    fn info_from(&self, commits: &[CommitRecord], snapshot: &SnapshotStats) -> RepositoryInfo {
        RepositoryInfo {
            name: self.repo.name(),
            path: self.repo.path().display().to_string(),
            remote_url: self.repo.origin_url(),
            default_branch: self.repo.current_branch(),
            first_commit: commits.iter().map(|c| c.timestamp).min(),
            last_commit: commits.iter().map(|c| c.timestamp).max(),
            total_commits: commits.len() as u64,
            total_files: snapshot.file_count(),
        }
    }

    fn codebase_from(&self, commits: &[CommitRecord], snapshot: &SnapshotStats) -> CodebaseReport {
        CodebaseReport {
            info: Some(self.info_from(commits, snapshot)),
            metadata: None,
            activity: Some(aggregate::commit_activity(commits)),
            files: Some(aggregate::file_stats(snapshot, commits, TOP_FILES)),
        }
    }
}

fn contributor_report(commits: &[CommitRecord]) -> ContributorReport {
    let mut acc = ContributorAccumulator::new();
    acc.extend(commits);
    let report = acc.finish();
    info!(
        commits = report.total_commits,
        contributors = report.contributors.len(),
        "local contributor pass complete"
    );
    report
}

fn language_report(snapshot: SnapshotStats, by_lines: bool) -> LanguageReport {
    let unit = if by_lines {
        LanguageUnit::Lines
    } else {
        LanguageUnit::Bytes
    };
    aggregate::languages_from_snapshot(snapshot, unit)
}

pub struct RemoteSource {
    client: GitHubClient,
    repo: RemoteRepo,
}

impl RemoteSource {
    pub fn open(reference: &str, credential: Option<String>, options: &QueryOptions) -> Result<Self> {
        let repo = RemoteRepo::parse(reference)?;
        repo.check_host(&options.api_url)?;
        if options.since.is_some() || options.until.is_some() {
            warn!(repo = %repo, "date ranges are not supported for remote statistics, ignoring");
        }
        let client = GitHubClient::new(options, credential)?;
        Ok(Self::with_client(client, repo))
    }

    pub fn with_client(client: GitHubClient, repo: RemoteRepo) -> Self {
        Self { client, repo }
    }

    pub fn repo(&self) -> &RemoteRepo {
        &self.repo
    }

    pub fn contributors(&self) -> Result<ContributorReport> {
        let stats = self.client.contributor_stats(&self.repo)?;
        let report = aggregate::from_remote(stats);
        info!(
            repo = %self.repo,
            contributors = report.contributors.len(),
            "remote contributor pass complete"
        );
        Ok(report)
    }

    pub fn languages(&self) -> Result<LanguageReport> {
        Ok(aggregate::languages_from_remote(self.client.languages(&self.repo)?))
    }

    pub fn metadata(&self) -> Result<RepositoryMetadata> {
        self.client.repository(&self.repo)
    }

    /// Only hosting metadata is available remotely; history and tree
    /// sections stay empty.
    pub fn codebase(&self) -> Result<CodebaseReport> {
        Ok(CodebaseReport {
            info: None,
            metadata: Some(self.metadata()?),
            activity: None,
            files: None,
        })
    }

    pub fn analyze(&self) -> Result<AnalysisReport> {
        Ok(AnalysisReport {
            codebase: self.codebase()?,
            contributors: self.contributors()?,
            languages: self.languages()?,
        })
    }
}

pub enum StatsSource {
    Local(LocalSource),
    Remote(RemoteSource),
}

impl StatsSource {
    pub fn open(query: &RepositoryQuery) -> Result<Self> {
        info!(location = %query.location, mode = %query.mode, "opening repository");
        match query.mode {
            Mode::Local => {
                if query.credential.is_some() {
                    warn!("credential ignored for local repositories");
                }
                Ok(Self::Local(LocalSource::open(&query.location, query.options.clone())?))
            }
            Mode::Remote => Ok(Self::Remote(RemoteSource::open(
                &query.location,
                query.credential.clone(),
                &query.options,
            )?)),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Local(_) => Mode::Local,
            Self::Remote(_) => Mode::Remote,
        }
    }

    /// Human-readable name of the analysed repository.
    pub fn display_name(&self) -> String {
        match self {
            Self::Local(source) => source.repo().path().display().to_string(),
            Self::Remote(source) => source.repo().full_name(),
        }
    }

    pub fn contributors(&self) -> Result<ContributorReport> {
        match self {
            Self::Local(source) => source.contributors(),
            Self::Remote(source) => source.contributors(),
        }
    }

    /// Lines are only available locally; remote queries always report bytes.
    pub fn languages(&self, by_lines: bool) -> Result<LanguageReport> {
        match self {
            Self::Local(source) => source.languages(by_lines),
            Self::Remote(source) => source.languages(),
        }
    }

    pub fn codebase(&self) -> Result<CodebaseReport> {
        match self {
            Self::Local(source) => source.codebase(),
            Self::Remote(source) => source.codebase(),
        }
    }

    pub fn analyze(&self, by_lines: bool) -> Result<AnalysisReport> {
        match self {
            Self::Local(source) => source.analyze(by_lines),
            Self::Remote(source) => source.analyze(),
        }
    }
}

/// Contributors ordered by total changes, most active first.
pub fn get_contributor_stats(query: &RepositoryQuery) -> Result<Vec<Contributor>> {
    Ok(StatsSource::open(query)?.contributors()?.contributors)
}

pub fn get_language_stats(query: &RepositoryQuery, by_lines: bool) -> Result<LanguageReport> {
    StatsSource::open(query)?.languages(by_lines)
}

pub fn get_contribution_percentages(query: &RepositoryQuery) -> Result<BTreeMap<ContributorId, f64>> {
    Ok(StatsSource::open(query)?.contributors()?.percentages())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::error::PulseError;
    use crate::remote::transport::scripted::ScriptedTransport;
    use crate::remote::HttpResponse;
    use pretty_assertions::assert_eq;

    fn remote_source(transport: &ScriptedTransport) -> StatsSource {
        let client = GitHubClient::with_transport(
            Box::new(transport.clone()),
            "https://api.example.test",
            None,
            RetryPolicy::immediate(3),
        );
        StatsSource::Remote(RemoteSource::with_client(
            client,
            RemoteRepo::parse("octo/widgets").unwrap(),
        ))
    }

    const STATS: &str = r#"[
        {"author": {"login": "hubot"}, "weeks": [{"w": 1, "a": 10, "d": 10, "c": 1}]},
        {"author": {"login": "octocat"}, "weeks": [{"w": 1, "a": 50, "d": 10, "c": 3}]}
    ]"#;

    #[test]
    fn remote_language_lines_fall_back_to_bytes() {
        let transport = ScriptedTransport::new([HttpResponse::new(200, r#"{"Rust": 750, "Shell": 250}"#)]);
        let report = remote_source(&transport).languages(true).unwrap();

        assert_eq!(report.mode, Mode::Remote);
        assert_eq!(report.unit, LanguageUnit::Bytes);
        assert_eq!(report.value_of("Rust"), Some(750));
        assert_eq!(report.languages[0].percentage, 75.0);
    }

    #[test]
    fn remote_contributors_are_ordered_and_normalized() {
        let transport = ScriptedTransport::new([
            HttpResponse::new(202, "{}"),
            HttpResponse::new(200, STATS),
        ]);
        let report = remote_source(&transport).contributors().unwrap();

        let logins: Vec<&str> = report.contributors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(logins, vec!["octocat", "hubot"]);
        assert_eq!(report.total_changes, 80);
        assert_eq!(report.contributors[0].percentage, 75.0);
        assert_eq!(report.percentages().len(), 2);
    }

    #[test]
    fn analyze_combines_all_three_passes() {
        let repo_body = r#"{"full_name": "octo/widgets", "description": null, "default_branch": "main",
            "language": "Rust", "stargazers_count": 1, "forks_count": 0, "open_issues_count": 0}"#;
        let transport = ScriptedTransport::new([
            HttpResponse::new(200, repo_body),
            HttpResponse::new(200, "[]"),
            HttpResponse::new(200, STATS),
            HttpResponse::new(200, r#"{"Rust": 10}"#),
        ]);
        let source = remote_source(&transport);
        let analysis = source.analyze(false).unwrap();

        assert_eq!(analysis.codebase.info, None);
        assert_eq!(analysis.codebase.activity, None);
        let meta = analysis.codebase.metadata.unwrap();
        assert_eq!(meta.full_name, "octo/widgets");
        assert_eq!(meta.open_pull_requests, 0);
        assert_eq!(analysis.contributors.contributors.len(), 2);
        assert_eq!(analysis.languages.total, 10);
        assert_eq!(source.display_name(), "octo/widgets");
    }

    #[test]
    fn remote_query_rejects_bad_reference_before_any_request() {
        let query = RepositoryQuery::remote("not a repo", None);
        assert!(matches!(
            StatsSource::open(&query),
            Err(PulseError::InvalidLocation(_))
        ));
    }

    #[test]
    fn remote_query_for_another_host_needs_an_api_url() {
        let query = RepositoryQuery::remote("https://gitlab.com/o/r", None);
        assert!(matches!(
            StatsSource::open(&query),
            Err(PulseError::InvalidLocation(_))
        ));

        let options = QueryOptions {
            api_url: "https://git.corp.example/api/v3".to_string(),
            ..QueryOptions::default()
        };
        let query = RepositoryQuery::remote("git.corp.example/o/r", None).with_options(options);
        assert!(StatsSource::open(&query).is_ok());
    }

    #[test]
    fn local_query_on_missing_path_is_invalid_location() {
        let query = RepositoryQuery::local("/definitely/not/here");
        assert!(matches!(
            get_contributor_stats(&query),
            Err(PulseError::InvalidLocation(_))
        ));
    }

    #[test]
    fn query_constructors_set_mode() {
        let remote = RepositoryQuery::remote("a/b", Some("t".into()));
        assert_eq!(remote.mode, Mode::Remote);
        assert_eq!(remote.credential.as_deref(), Some("t"));
        assert_eq!(RepositoryQuery::local(".").mode, Mode::Local);
        assert!(RepositoryQuery::local(".").options.include_merges);
    }
}
