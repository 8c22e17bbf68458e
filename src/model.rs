use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Local,
    Remote,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Local => f.write_str("local"),
            Mode::Remote => f.write_str("remote"),
        }
    }
}

/// A contributor identity. Two records belong to the same contributor only
/// when both fields match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContributorId {
    pub name: String,
    pub email: String,
}

impl ContributorId {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for ContributorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub email: String,
    pub commit_count: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    /// Distinct paths touched. `None` in remote mode, where the API does not
    /// expose per-contributor file lists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_changed: Option<u64>,
    /// Distinct paths touched per language label (local mode only).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub languages: BTreeMap<String, u64>,
    pub percentage: f64,
}

impl Contributor {
    pub fn id(&self) -> ContributorId {
        ContributorId::new(&self.name, &self.email)
    }

    pub fn total_changes(&self) -> u64 {
        self.lines_added + self.lines_deleted
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDelta {
    pub path: String,
    pub added_lines: u64,
    pub deleted_lines: u64,
    pub is_binary: bool,
}

/// One walked commit with its non-excluded file deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: String,
    pub author: ContributorId,
    pub timestamp: DateTime<Utc>,
    /// Committer's UTC offset, used to bucket activity by local hour.
    #[serde(default)]
    pub offset_seconds: i32,
    pub is_merge: bool,
    pub files: Vec<FileDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorReport {
    pub mode: Mode,
    pub contributors: Vec<Contributor>,
    pub total_commits: u64,
    pub total_lines_added: u64,
    pub total_lines_deleted: u64,
    pub total_changes: u64,
}

impl ContributorReport {
    pub fn percentages(&self) -> BTreeMap<ContributorId, f64> {
        self.contributors
            .iter()
            .map(|c| (c.id(), c.percentage))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageUnit {
    Lines,
    Bytes,
}

impl fmt::Display for LanguageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageUnit::Lines => f.write_str("lines"),
            LanguageUnit::Bytes => f.write_str("bytes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageStat {
    pub language: String,
    pub value: u64,
    pub percentage: f64,
    /// Files in this bucket (local snapshot only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTally {
    pub code_files: u64,
    pub non_code_files: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageReport {
    pub mode: Mode,
    pub unit: LanguageUnit,
    pub total: u64,
    pub languages: Vec<LanguageStat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<FileTally>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
}

impl LanguageReport {
    pub fn as_map(&self) -> BTreeMap<String, u64> {
        self.languages
            .iter()
            .map(|l| (l.language.clone(), l.value))
            .collect()
    }

    pub fn value_of(&self, language: &str) -> Option<u64> {
        self.languages
            .iter()
            .find(|l| l.language == language)
            .map(|l| l.value)
    }
}

/// Hosting metadata. Only remote queries produce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub full_name: String,
    pub description: Option<String>,
    pub default_branch: String,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub open_pull_requests: u64,
}

/// What a local clone says about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub path: String,
    pub remote_url: Option<String>,
    /// Branch HEAD points at; `None` when detached.
    pub default_branch: Option<String>,
    pub first_commit: Option<DateTime<Utc>>,
    pub last_commit: Option<DateTime<Utc>>,
    pub total_commits: u64,
    pub total_files: u64,
}

/// Commit counts bucketed by calendar month, weekday and hour of day, in
/// each committer's own time zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitActivity {
    /// `YYYY-MM` keys.
    pub by_month: BTreeMap<String, u64>,
    /// Monday first.
    pub by_weekday: [u64; 7],
    pub by_hour: [u64; 24],
}

impl Default for CommitActivity {
    fn default() -> Self {
        Self {
            by_month: BTreeMap::new(),
            by_weekday: [0; 7],
            by_hour: [0; 24],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLines {
    pub path: String,
    pub lines: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChurn {
    pub path: String,
    pub commits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub file_count: u64,
    /// Lowercased extension with its dot, or `(none)`.
    pub by_extension: BTreeMap<String, u64>,
    pub largest_files: Vec<FileLines>,
    pub most_changed_files: Vec<FileChurn>,
}

/// Structure and history of a repository, independent of who wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodebaseReport {
    /// Local clones only.
    pub info: Option<RepositoryInfo>,
    /// Remote only.
    pub metadata: Option<RepositoryMetadata>,
    pub activity: Option<CommitActivity>,
    pub files: Option<FileStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub codebase: CodebaseReport,
    pub contributors: ContributorReport,
    pub languages: LanguageReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributorsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository: String,
    pub since: Option<String>,
    pub until: Option<String>,
    #[serde(flatten)]
    pub report: ContributorReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagesOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository: String,
    #[serde(flatten)]
    pub report: LanguageReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository: String,
    pub mode: Mode,
    #[serde(flatten)]
    pub report: AnalysisReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodebaseOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository: String,
    pub mode: Mode,
    #[serde(flatten)]
    pub report: CodebaseReport,
}

#[derive(Debug, Clone)]
pub struct DateRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new() -> Self {
        Self { since: None, until: None }
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        if let Some(since) = self.since {
            if timestamp < &since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if timestamp > &until {
                return false;
            }
        }
        true
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::new()
    }
}
