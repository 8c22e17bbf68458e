//! Language distribution of the current tree.
//!
//! Unlike the history walk, this is a snapshot metric: every file present in
//! the working tree (or, for bare repositories, in HEAD) is classified once
//! and its full line count and size are added to its language bucket.

use super::repo::{count_lines, is_binary, GitRepo};
use crate::error::{PulseError, Result};
use crate::exclude::ExclusionFilter;
use crate::language::classify;
use crate::model::{FileLines, SkippedFile};
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

const NO_EXTENSION: &str = "(none)";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanguageTally {
    pub lines: u64,
    pub bytes: u64,
    pub files: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    pub languages: BTreeMap<String, LanguageTally>,
    pub code_files: u64,
    pub non_code_files: u64,
    /// Every non-excluded file by extension, binaries included.
    pub by_extension: BTreeMap<String, u64>,
    /// Line count of every text file.
    pub file_lines: Vec<FileLines>,
    pub skipped: Vec<SkippedFile>,
}

impl SnapshotStats {
    fn note(&mut self, path: &str) {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_else(|| NO_EXTENSION.to_string());
        *self.by_extension.entry(ext).or_insert(0) += 1;
    }

    fn record(&mut self, path: &str, data: &[u8]) {
        if is_binary(data) {
            self.skip(path, "binary content");
            return;
        }

        let lines = count_lines(data);
        self.file_lines.push(FileLines {
            path: path.to_string(),
            lines,
        });

        let language = classify(path);
        let tally = self.languages.entry(language.name.to_string()).or_default();
        tally.lines += lines;
        tally.bytes += data.len() as u64;
        tally.files += 1;

        if language.code {
            self.code_files += 1;
        } else {
            self.non_code_files += 1;
        }
    }

    fn skip(&mut self, path: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(path, reason = %reason, "skipping file in line count");
        self.skipped.push(SkippedFile {
            path: path.to_string(),
            reason,
        });
    }

    pub fn total_lines(&self) -> u64 {
        self.languages.values().map(|t| t.lines).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.languages.values().map(|t| t.bytes).sum()
    }

    /// Non-excluded files seen, readable or not.
    pub fn file_count(&self) -> u64 {
        self.by_extension.values().sum()
    }
}

impl GitRepo {
    /// Classify and measure every file of the current tree. Unreadable files
    /// are skipped and reported; they never fail the scan.
    pub fn snapshot(&self, exclusions: &ExclusionFilter) -> Result<SnapshotStats> {
        let stats = match self.workdir() {
            Some(workdir) => snapshot_workdir(workdir, exclusions),
            None => self.snapshot_head(exclusions)?,
        };
        info!(
            languages = stats.languages.len(),
            lines = stats.total_lines(),
            bytes = stats.total_bytes(),
            skipped = stats.skipped.len(),
            "snapshot complete"
        );
        Ok(stats)
    }

    fn snapshot_head(&self, exclusions: &ExclusionFilter) -> Result<SnapshotStats> {
        let mut stats = SnapshotStats::default();

        let mut head = self.repo.head()?;
        if head.is_unborn() {
            return Ok(stats);
        }
        let tree = head.peel_to_commit_in_place()?.tree()?;

        let mut recorder = gix::traverse::tree::Recorder::default();
        tree.traverse()
            .breadthfirst(&mut recorder)
            .map_err(|e| PulseError::CorruptHistory(e.to_string()))?;

        for entry in recorder.records {
            if !entry.mode.is_blob() {
                continue;
            }
            let path = entry.filepath.to_string();
            if exclusions.is_excluded(&path) {
                continue;
            }
            stats.note(&path);
            match self.repo.find_object(entry.oid) {
                Ok(obj) => stats.record(&path, &obj.data),
                Err(e) => stats.skip(&path, e.to_string()),
            }
        }
        Ok(stats)
    }
}

fn snapshot_workdir(workdir: &Path, exclusions: &ExclusionFilter) -> SnapshotStats {
    let mut stats = SnapshotStats::default();

    let walker = WalkBuilder::new(workdir)
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .require_git(false)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                stats.skip("<walk>", err.to_string());
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let relative = entry.path().strip_prefix(workdir).unwrap_or(entry.path());
        let path = relative.to_string_lossy().replace('\\', "/");
        if exclusions.is_excluded(&path) {
            continue;
        }

        stats.note(&path);
        match std::fs::read(entry.path()) {
            Ok(data) => stats.record(&path, &data),
            Err(err) => stats.skip(&path, err.to_string()),
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lockfiles_do_not_inflate_line_totals() {
        let dir = tempdir().unwrap();
        let lock: String = (0..10_000).map(|i| format!("\"dep{i}\": 1,\n")).collect();
        fs::write(dir.path().join("package-lock.json"), lock).unwrap();
        let code: String = (0..50).map(|i| format!("x{i} = {i}\n")).collect();
        fs::write(dir.path().join("main.py"), code).unwrap();

        let stats = snapshot_workdir(dir.path(), &ExclusionFilter::new());
        assert_eq!(stats.total_lines(), 50);
        assert_eq!(stats.languages["Python"].lines, 50);
        assert!(!stats.languages.contains_key("JSON"));
    }

    #[test]
    fn unknown_extensions_land_in_other_and_binaries_are_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Makefile"), "all:\n\techo hi\n").unwrap();
        fs::write(dir.path().join("notes.md"), "# title\n").unwrap();
        fs::write(dir.path().join("logo.png"), b"\x89PNG\0\0\0data").unwrap();

        let stats = snapshot_workdir(dir.path(), &ExclusionFilter::new());
        assert_eq!(stats.languages["Other"].lines, 2);
        assert_eq!(stats.languages["Markdown"].files, 1);
        assert_eq!(stats.non_code_files, 2);
        assert_eq!(stats.code_files, 0);
        assert_eq!(stats.skipped.len(), 1);
        assert_eq!(stats.skipped[0].path, "logo.png");
        assert_eq!(stats.file_count(), 3);
        assert_eq!(stats.by_extension["(none)"], 1);
        assert_eq!(stats.by_extension[".png"], 1);
        assert_eq!(stats.file_lines.len(), 2);
    }

    #[test]
    fn ignored_files_and_git_dir_are_not_walked() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config"), "[core]\n").unwrap();
        fs::write(dir.path().join(".gitignore"), "build/\n").unwrap();
        fs::create_dir_all(dir.path().join("build")).unwrap();
        fs::write(dir.path().join("build/out.rs"), "fn main() {}\n").unwrap();
        fs::write(dir.path().join("lib.rs"), "pub fn f() {}\n").unwrap();

        let stats = snapshot_workdir(dir.path(), &ExclusionFilter::new());
        assert_eq!(stats.languages["Rust"].files, 1);
        assert_eq!(stats.code_files, 1);
    }
}
