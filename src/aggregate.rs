use crate::git::SnapshotStats;
use crate::language;
use crate::model::{
    CommitActivity, CommitRecord, Contributor, ContributorId, ContributorReport, FileChurn,
    FileLines, FileStats, FileTally, LanguageReport, LanguageStat, LanguageUnit, Mode,
};
use chrono::{Datelike, FixedOffset, Timelike};
use crate::remote::RemoteContributor;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Default)]
struct Tally {
    commits: u64,
    added: u64,
    deleted: u64,
    paths: HashSet<String>,
}

/// Folds walked commits into per-contributor totals.
#[derive(Debug, Default)]
pub struct ContributorAccumulator {
    tallies: HashMap<ContributorId, Tally>,
}

impl ContributorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_commit(&mut self, commit: &CommitRecord) {
        let tally = self.tallies.entry(commit.author.clone()).or_default();
        tally.commits += 1;
        for file in &commit.files {
            tally.added += file.added_lines;
            tally.deleted += file.deleted_lines;
            tally.paths.insert(file.path.clone());
        }
    }

    pub fn extend<'a, I: IntoIterator<Item = &'a CommitRecord>>(&mut self, commits: I) {
        for commit in commits {
            self.record_commit(commit);
        }
    }

    pub fn finish(self) -> ContributorReport {
        let contributors = self
            .tallies
            .into_iter()
            .map(|(id, tally)| {
                let mut languages: BTreeMap<String, u64> = BTreeMap::new();
                for path in &tally.paths {
                    *languages
                        .entry(language::classify(path).name.to_string())
                        .or_insert(0) += 1;
                }
                Contributor {
                    name: id.name,
                    email: id.email,
                    commit_count: tally.commits,
                    lines_added: tally.added,
                    lines_deleted: tally.deleted,
                    files_changed: Some(tally.paths.len() as u64),
                    languages,
                    percentage: 0.0,
                }
            })
            .collect();
        finalize(Mode::Local, contributors)
    }
}

/// Build a report from GitHub's per-login aggregates.
pub fn from_remote(stats: Vec<RemoteContributor>) -> ContributorReport {
    let contributors = stats
        .into_iter()
        .map(|s| Contributor {
            email: s.email(),
            name: s.login,
            commit_count: s.commits,
            lines_added: s.additions,
            lines_deleted: s.deletions,
            files_changed: None,
            languages: BTreeMap::new(),
            percentage: 0.0,
        })
        .collect();
    finalize(Mode::Remote, contributors)
}

/// Assign percentages and order the result. Callers hand in one entry per
/// identity.
fn finalize(mode: Mode, mut contributors: Vec<Contributor>) -> ContributorReport {
    let total_commits = contributors.iter().map(|c| c.commit_count).sum();
    let total_lines_added: u64 = contributors.iter().map(|c| c.lines_added).sum();
    let total_lines_deleted: u64 = contributors.iter().map(|c| c.lines_deleted).sum();
    let total_changes = total_lines_added + total_lines_deleted;

    for c in &mut contributors {
        c.percentage = percentage(c.total_changes(), total_changes);
    }
    contributors.sort_by(contributor_order);

    ContributorReport {
        mode,
        contributors,
        total_commits,
        total_lines_added,
        total_lines_deleted,
        total_changes,
    }
}

fn contributor_order(a: &Contributor, b: &Contributor) -> Ordering {
    b.total_changes()
        .cmp(&a.total_changes())
        .then_with(|| b.commit_count.cmp(&a.commit_count))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.email.cmp(&b.email))
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Language distribution of a local snapshot, measured in `unit`.
pub fn languages_from_snapshot(snapshot: SnapshotStats, unit: LanguageUnit) -> LanguageReport {
    let entries = snapshot
        .languages
        .iter()
        .map(|(name, tally)| {
            let value = match unit {
                LanguageUnit::Lines => tally.lines,
                LanguageUnit::Bytes => tally.bytes,
            };
            (name.clone(), value, Some(tally.files))
        })
        .collect();

    let mut report = language_report(Mode::Local, unit, entries);
    report.files = Some(FileTally {
        code_files: snapshot.code_files,
        non_code_files: snapshot.non_code_files,
    });
    report.skipped = snapshot.skipped;
    report
}

/// Language distribution as reported by the hosting service, in bytes.
pub fn languages_from_remote(bytes: BTreeMap<String, u64>) -> LanguageReport {
    let entries = bytes
        .into_iter()
        .map(|(name, value)| (name, value, None))
        .collect();
    language_report(Mode::Remote, LanguageUnit::Bytes, entries)
}

/// Bucket commits by month, weekday and hour in the committer's local time.
pub fn commit_activity(commits: &[CommitRecord]) -> CommitActivity {
    let mut activity = CommitActivity::default();
    for commit in commits {
        let local = match FixedOffset::east_opt(commit.offset_seconds) {
            Some(tz) => commit.timestamp.with_timezone(&tz).naive_local(),
            None => commit.timestamp.naive_utc(),
        };
        *activity
            .by_month
            .entry(local.format("%Y-%m").to_string())
            .or_insert(0) += 1;
        activity.by_weekday[local.weekday().num_days_from_monday() as usize] += 1;
        activity.by_hour[local.hour() as usize] += 1;
    }
    activity
}

/// Extension counts and the `top` largest and most frequently changed files.
pub fn file_stats(snapshot: &SnapshotStats, commits: &[CommitRecord], top: usize) -> FileStats {
    let mut largest_files: Vec<FileLines> = snapshot.file_lines.clone();
    largest_files.sort_by(|a, b| b.lines.cmp(&a.lines).then_with(|| a.path.cmp(&b.path)));
    largest_files.truncate(top);

    let mut churn: HashMap<&str, u64> = HashMap::new();
    for commit in commits {
        let paths: HashSet<&str> = commit.files.iter().map(|f| f.path.as_str()).collect();
        for path in paths {
            *churn.entry(path).or_insert(0) += 1;
        }
    }
    let mut most_changed_files: Vec<FileChurn> = churn
        .into_iter()
        .map(|(path, commits)| FileChurn {
            path: path.to_string(),
            commits,
        })
        .collect();
    most_changed_files.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.path.cmp(&b.path)));
    most_changed_files.truncate(top);

    FileStats {
        file_count: snapshot.file_count(),
        by_extension: snapshot.by_extension.clone(),
        largest_files,
        most_changed_files,
    }
}

fn language_report(
    mode: Mode,
    unit: LanguageUnit,
    entries: Vec<(String, u64, Option<u64>)>,
) -> LanguageReport {
    let total: u64 = entries.iter().map(|(_, v, _)| v).sum();
    let mut languages: Vec<LanguageStat> = entries
        .into_iter()
        .map(|(language, value, files)| LanguageStat {
            percentage: percentage(value, total),
            language,
            value,
            files,
        })
        .collect();
    languages.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.language.cmp(&b.language)));

    LanguageReport {
        mode,
        unit,
        total,
        languages,
        files: None,
        skipped: Vec::new(),
    }
}
