#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::process::Command;

pub fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

pub fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

/// Run git and report whether it succeeded, for commands expected to fail.
pub fn git_succeeds(dir: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .unwrap()
        .status
        .success()
}

pub fn git_output(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .unwrap();
    assert!(out.status.success(), "git {args:?} failed");
    String::from_utf8(out.stdout).unwrap().trim().to_string()
}

pub fn init_git_repo(dir: &Path) {
    git(dir, &["init", "--quiet"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(dir, &["config", "core.autocrlf", "false"]);
    git(dir, &["config", "core.safecrlf", "false"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    git(dir, &["config", "user.email", "you@example.com"]);
    git(dir, &["config", "user.name", "Your Name"]);
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Write `name` and commit everything as `author <email>`.
pub fn commit_as(dir: &Path, author: (&str, &str), name: &str, content: &str) {
    write_file(dir, name, content);
    git(dir, &["add", "-A"]);
    let status = Command::new("git")
        .args(["commit", "--quiet", "-m", &format!("update {name}")])
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_AUTHOR_NAME", author.0)
        .env("GIT_AUTHOR_EMAIL", author.1)
        .env("GIT_COMMITTER_NAME", author.0)
        .env("GIT_COMMITTER_EMAIL", author.1)
        .status()
        .unwrap();
    assert!(status.success());
}

/// `git merge --no-ff branch` recorded as `author`. Returns false when the
/// merge stopped on a conflict.
pub fn merge_as(dir: &Path, author: (&str, &str), branch: &str) -> bool {
    Command::new("git")
        .args(["merge", "--quiet", "--no-ff", branch, "-m", &format!("merge {branch}")])
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_AUTHOR_NAME", author.0)
        .env("GIT_AUTHOR_EMAIL", author.1)
        .env("GIT_COMMITTER_NAME", author.0)
        .env("GIT_COMMITTER_EMAIL", author.1)
        .output()
        .unwrap()
        .status
        .success()
}

pub fn commit_file(dir: &Path, name: &str, content: &str) {
    commit_as(dir, ("Your Name", "you@example.com"), name, content);
}

/// `main` gains one line in file.txt, a `feat` branch adds feat.txt, and the
/// two are joined by a clean `--no-ff` merge.
pub fn merged_history(dir: &Path) {
    init_git_repo(dir);
    commit_file(dir, "file.txt", "a\n");
    git(dir, &["checkout", "--quiet", "-b", "feat"]);
    commit_file(dir, "feat.txt", "f1\n");
    git(dir, &["checkout", "--quiet", "main"]);
    commit_file(dir, "file.txt", "a\nc\n");
    git(dir, &["merge", "--quiet", "--no-ff", "feat", "-m", "merge feat"]);
}

pub fn lines(n: usize, text: &str) -> String {
    (0..n).map(|i| format!("{text} {i}\n")).collect()
}
