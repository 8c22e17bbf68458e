mod common;

use common::*;
use gitpulse::config::QueryOptions;
use gitpulse::model::{ContributorId, FileChurn, LanguageUnit, Mode};
use gitpulse::stats::{
    get_contribution_percentages, get_contributor_stats, get_language_stats, RepositoryQuery,
    StatsSource,
};
use gitpulse::PulseError;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const ALICE: (&str, &str) = ("Alice", "alice@example.com");
const BOB: (&str, &str) = ("Bob", "bob@example.com");
const MERGER: (&str, &str) = ("Merger", "merger@example.com");

#[test]
fn files_changed_counts_distinct_paths() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_as(dir.path(), ALICE, "a.py", &lines(3, "a ="));
    commit_as(dir.path(), ALICE, "a.py", &lines(5, "a ="));
    commit_as(dir.path(), ALICE, "notes.md", "# notes\n");

    let contributors = get_contributor_stats(&RepositoryQuery::local(dir.path())).unwrap();
    assert_eq!(contributors.len(), 1);
    let alice = &contributors[0];
    assert_eq!(alice.commit_count, 3);
    assert_eq!(alice.files_changed, Some(2));
    assert_eq!(alice.lines_added, 3 + 2 + 1);
    assert_eq!(alice.languages.get("Python"), Some(&1));
    assert_eq!(alice.languages.get("Markdown"), Some(&1));
}

#[test]
fn modified_lines_count_as_one_deletion_and_one_addition() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_as(dir.path(), ALICE, "main.rs", "fn main() {}\n");
    commit_as(dir.path(), BOB, "main.rs", "fn main() { run(); }\n");

    let contributors = get_contributor_stats(&RepositoryQuery::local(dir.path())).unwrap();
    let bob = contributors.iter().find(|c| c.name == "Bob").unwrap();
    assert_eq!((bob.lines_added, bob.lines_deleted), (1, 1));
    assert_eq!(bob.percentage, 200.0 / 3.0);
}

#[test]
fn clean_merge_contributes_no_lines() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    merged_history(dir.path());

    let report = StatsSource::open(&RepositoryQuery::local(dir.path()))
        .unwrap()
        .contributors()
        .unwrap();
    assert_eq!(report.mode, Mode::Local);
    assert_eq!(report.total_commits, 4);
    assert_eq!(report.total_lines_added, 3);
    assert_eq!(report.total_lines_deleted, 0);
}

#[test]
fn auto_merged_edits_to_one_file_stay_with_their_authors() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    let base = lines(10, "line");
    init_git_repo(dir.path());
    commit_as(dir.path(), ALICE, "f.txt", &base);
    git(dir.path(), &["checkout", "--quiet", "-b", "feat"]);
    commit_as(dir.path(), BOB, "f.txt", &base.replace("line 9\n", "feature 9\n"));
    git(dir.path(), &["checkout", "--quiet", "main"]);
    commit_as(dir.path(), ALICE, "f.txt", &base.replace("line 0\n", "main 0\n"));
    assert!(merge_as(dir.path(), MERGER, "feat"));

    let contributors = get_contributor_stats(&RepositoryQuery::local(dir.path())).unwrap();
    let merger = contributors.iter().find(|c| c.name == "Merger").unwrap();
    assert_eq!(merger.commit_count, 1);
    assert_eq!((merger.lines_added, merger.lines_deleted), (0, 0));
    assert_eq!(merger.files_changed, Some(0));
    let bob = contributors.iter().find(|c| c.name == "Bob").unwrap();
    assert_eq!((bob.lines_added, bob.lines_deleted), (1, 1));
    let alice = contributors.iter().find(|c| c.name == "Alice").unwrap();
    assert_eq!((alice.lines_added, alice.lines_deleted), (11, 1));
}

#[test]
fn conflict_resolution_is_credited_to_the_merger() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_as(dir.path(), ALICE, "f.txt", "head\nbase\ntail\n");
    git(dir.path(), &["checkout", "--quiet", "-b", "feat"]);
    commit_as(dir.path(), BOB, "f.txt", "head\ntheirs\ntail\n");
    git(dir.path(), &["checkout", "--quiet", "main"]);
    commit_as(dir.path(), ALICE, "f.txt", "head\nours\ntail\n");
    assert!(!merge_as(dir.path(), MERGER, "feat"));
    commit_as(dir.path(), MERGER, "f.txt", "head\nresolved\nextra\ntail\n");
    assert_eq!(git_output(dir.path(), &["rev-list", "--count", "--merges", "HEAD"]), "1");

    let contributors = get_contributor_stats(&RepositoryQuery::local(dir.path())).unwrap();
    let merger = contributors.iter().find(|c| c.name == "Merger").unwrap();
    assert_eq!(merger.commit_count, 1);
    assert_eq!((merger.lines_added, merger.lines_deleted), (2, 0));
    assert_eq!(merger.files_changed, Some(1));
}

#[test]
fn missing_blob_is_corrupt_history() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_as(dir.path(), ALICE, "f.txt", "one\n");
    commit_as(dir.path(), ALICE, "f.txt", "one\ntwo\n");
    let blob = git_output(dir.path(), &["rev-parse", "HEAD~1:f.txt"]);
    let object = dir.path().join(".git/objects").join(&blob[..2]).join(&blob[2..]);
    std::fs::remove_file(object).unwrap();

    let err = get_contributor_stats(&RepositoryQuery::local(dir.path())).unwrap_err();
    assert!(matches!(err, PulseError::CorruptHistory(_)), "{err}");
}

#[test]
fn codebase_report_covers_history_and_tree() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    git(dir.path(), &["remote", "add", "origin", "https://example.com/team/app.git"]);
    commit_as(dir.path(), ALICE, "src/main.rs", &lines(20, "//"));
    commit_as(dir.path(), BOB, "README.md", &lines(2, "#"));
    commit_as(dir.path(), ALICE, "src/main.rs", &lines(25, "//"));

    let source = StatsSource::open(&RepositoryQuery::local(dir.path())).unwrap();
    let codebase = source.codebase().unwrap();
    assert_eq!(codebase.metadata, None);

    let info = codebase.info.unwrap();
    assert_eq!(info.default_branch.as_deref(), Some("main"));
    assert_eq!(info.remote_url.as_deref(), Some("https://example.com/team/app.git"));
    assert_eq!(info.total_commits, 3);
    assert_eq!(info.total_files, 2);
    assert!(info.first_commit.unwrap() <= info.last_commit.unwrap());

    let activity = codebase.activity.unwrap();
    assert_eq!(activity.by_month.values().sum::<u64>(), 3);
    assert_eq!(activity.by_weekday.iter().sum::<u64>(), 3);
    assert_eq!(activity.by_hour.iter().sum::<u64>(), 3);

    let files = codebase.files.unwrap();
    assert_eq!(files.file_count, 2);
    assert_eq!(files.by_extension.get(".rs"), Some(&1));
    assert_eq!(files.by_extension.get(".md"), Some(&1));
    assert_eq!(files.largest_files[0].path, "src/main.rs");
    assert_eq!(files.largest_files[0].lines, 25);
    assert_eq!(
        files.most_changed_files[0],
        FileChurn { path: "src/main.rs".to_string(), commits: 2 }
    );

    let analysis = source.analyze(false).unwrap();
    assert_eq!(analysis.codebase.info.map(|i| i.total_commits), Some(3));
    assert_eq!(analysis.contributors.total_commits, 3);
}

#[test]
fn lockfiles_never_reach_the_statistics() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_as(dir.path(), ALICE, "app.py", &lines(50, "print"));
    commit_as(dir.path(), BOB, "package-lock.json", &lines(10_000, "\"dep\":"));
    commit_as(dir.path(), BOB, "web/yarn.lock", &lines(500, "dep"));

    let query = RepositoryQuery::local(dir.path());
    let contributors = get_contributor_stats(&query).unwrap();
    let bob = contributors.iter().find(|c| c.name == "Bob").unwrap();
    assert_eq!(bob.commit_count, 2);
    assert_eq!(bob.lines_added, 0);
    assert_eq!(bob.files_changed, Some(0));

    let percentages = get_contribution_percentages(&query).unwrap();
    assert_eq!(percentages[&ContributorId::new("Alice", "alice@example.com")], 100.0);
    assert_eq!(percentages[&ContributorId::new("Bob", "bob@example.com")], 0.0);

    let languages = get_language_stats(&query, true).unwrap();
    assert_eq!(languages.unit, LanguageUnit::Lines);
    assert_eq!(languages.as_map().into_iter().collect::<Vec<_>>(), vec![("Python".to_string(), 50u64)]);
}

#[test]
fn extra_exclusions_apply_to_history_and_snapshot() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_as(dir.path(), ALICE, "gen/schema.rs", &lines(100, "// generated"));
    commit_as(dir.path(), ALICE, "src/lib.rs", &lines(10, "// code"));

    let query = RepositoryQuery::local(dir.path()).with_options(QueryOptions {
        extra_exclusions: vec!["schema.rs".to_string()],
        ..QueryOptions::default()
    });
    let contributors = get_contributor_stats(&query).unwrap();
    assert_eq!(contributors[0].lines_added, 10);
    assert_eq!(get_language_stats(&query, true).unwrap().total, 10);
}

#[test]
fn byte_totals_are_reported_when_lines_not_requested() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_file(dir.path(), "main.go", "package main\n");

    let report = get_language_stats(&RepositoryQuery::local(dir.path()), false).unwrap();
    assert_eq!(report.unit, LanguageUnit::Bytes);
    assert_eq!(report.value_of("Go"), Some("package main\n".len() as u64));
}

#[test]
fn repository_without_commits_yields_empty_report() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());

    let report = StatsSource::open(&RepositoryQuery::local(dir.path()))
        .unwrap()
        .contributors()
        .unwrap();
    assert!(report.is_empty());
    assert_eq!(report.total_changes, 0);
}

#[test]
fn absurd_relative_dates_are_invalid() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_file(dir.path(), "a.txt", "a\n");

    for since in ["100000000 days ago", "99999999999999999999 weeks ago"] {
        let query = RepositoryQuery::local(dir.path()).with_options(QueryOptions {
            since: Some(since.to_string()),
            ..QueryOptions::default()
        });
        let err = get_contributor_stats(&query).unwrap_err();
        assert!(matches!(err, PulseError::InvalidDate(_)), "{since}: {err}");
    }
}

#[test]
fn plain_directory_is_invalid_location() {
    let dir = tempdir().unwrap();
    let err = get_contributor_stats(&RepositoryQuery::local(dir.path())).unwrap_err();
    assert!(matches!(err, PulseError::InvalidLocation(_)), "{err}");
}
