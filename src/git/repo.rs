use crate::error::{PulseError, Result};
use crate::exclude::ExclusionFilter;
use crate::model::{CommitRecord, ContributorId, DateRange, FileDelta};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use gix::object::tree::diff::ChangeDetached;
use gix::objs::tree::EntryMode;
use gix::{discover, ObjectId, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use similar::{ChangeTag, TextDiff};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Bytes inspected when sniffing for binary content.
pub(crate) const BINARY_SNIFF_LEN: usize = 8192;

#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    pub range: DateRange,
    pub include_merges: bool,
    pub show_progress: bool,
    pub exclusions: ExclusionFilter,
}

pub struct GitRepo {
    pub(crate) repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open the repository containing `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo_path = path.as_ref();
        if !repo_path.exists() {
            return Err(PulseError::InvalidLocation(format!(
                "path '{}' does not exist",
                repo_path.display()
            )));
        }

        let repo = discover(repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        debug!(path = %path.display(), "opened repository");

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Directory name of the checkout.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Short name of the branch HEAD points at, `None` when detached.
    pub fn current_branch(&self) -> Option<String> {
        let head = self.repo.head_name().ok().flatten()?;
        Some(head.shorten().to_string())
    }

    /// Fetch URL of `origin`, if configured.
    pub fn origin_url(&self) -> Option<String> {
        let remote = self.repo.find_remote("origin").ok()?;
        remote
            .url(gix::remote::Direction::Fetch)
            .map(|url| url.to_bstring().to_string())
    }

    pub fn resolve_range(&self, since: Option<&str>, until: Option<&str>) -> Result<DateRange> {
        let mut range = DateRange::new();

        let since_dt = since.map(|s| self.parse_commit_or_date(s)).transpose()?;
        let until_dt = until.map(|u| self.parse_commit_or_date(u)).transpose()?;

        if let (Some(s), Some(u)) = (since_dt, until_dt) {
            if s > u {
                return Err(PulseError::InvalidDate(format!(
                    "Invalid range: since ({}) is after until ({})",
                    s, u
                )));
            }
        }

        if let Some(s) = since_dt {
            range = range.with_since(s);
        }
        if let Some(u) = until_dt {
            range = range.with_until(u);
        }

        Ok(range)
    }

    fn parse_commit_or_date(&self, input: &str) -> Result<DateTime<Utc>> {
        // RFC3339
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(dt.with_timezone(&Utc));
        }

        // YYYY-MM-DD
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&datetime));
            }
        }

        // "90 days ago", "2 weeks ago"
        if let Some(duration) = parse_natural_duration(input) {
            return chrono::Duration::from_std(duration)
                .ok()
                .and_then(|d| Utc::now().checked_sub_signed(d))
                .ok_or_else(|| PulseError::InvalidDate(format!("Duration overflow for '{input}'")));
        }

        // Fallback to a revision
        let id = self
            .repo
            .rev_parse_single(input)
            .map_err(|e| PulseError::InvalidDate(format!("Invalid commit or date '{input}': {e}")))?;

        let commit = id
            .object()?
            .try_into_commit()
            .map_err(|_| PulseError::InvalidDate(format!("Not a commit: {input}")))?;

        let secs = commit.time()?.seconds;
        DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| PulseError::InvalidDate(format!("Invalid timestamp: {secs}")))
    }

    /// Walk every commit reachable from HEAD and compute per-file line deltas
    /// against the first parent (or the empty tree for root commits).
    ///
    /// Any object that cannot be read or decoded aborts the walk: a partial
    /// history would skew every percentage computed from it.
    pub fn collect_commits(&self, options: &WalkOptions) -> Result<Vec<CommitRecord>> {
        let mut head = self.repo.head()?;
        if head.is_unborn() {
            info!("repository has no commits yet");
            return Ok(Vec::new());
        }
        let head_commit = head.peel_to_commit_in_place()?;

        let mut records = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut stack: VecDeque<ObjectId> = VecDeque::from([head_commit.id]);

        let pb = if options.show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg} ({pos})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("Walking history...");
            pb
        } else {
            ProgressBar::hidden()
        };

        while let Some(commit_id) = stack.pop_back() {
            if !seen.insert(commit_id) {
                continue;
            }

            let commit = self.repo.find_commit(commit_id)?;
            let time = commit.time()?;
            let secs = time.seconds;
            let timestamp = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| PulseError::CorruptHistory(format!("Invalid timestamp: {secs}")))?;

            let parents: Vec<ObjectId> = commit.parent_ids().map(|id| id.into()).collect();
            let is_merge = parents.len() > 1;

            if !options.range.contains(&timestamp) || (is_merge && !options.include_merges) {
                stack.extend(parents);
                continue;
            }

            let author = commit.author()?;
            let files = self.commit_deltas(commit_id, &parents, &options.exclusions)?;

            records.push(CommitRecord {
                id: commit_id.to_string(),
                author: ContributorId::new(author.name.to_string(), author.email.to_string()),
                timestamp,
                offset_seconds: time.offset,
                is_merge,
                files,
            });

            stack.extend(parents);
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!(commits = records.len(), "history walk complete");
        Ok(records)
    }

    fn tree_of(&self, id: ObjectId) -> Result<gix::Tree<'_>> {
        Ok(self.repo.find_commit(id)?.tree()?)
    }

    fn diff_trees(&self, old: Option<&gix::Tree<'_>>, new: &gix::Tree<'_>) -> Result<Vec<ChangeDetached>> {
        Ok(self.repo.diff_tree_to_tree(old, Some(new), None)?)
    }

    fn commit_deltas(
        &self,
        commit_id: ObjectId,
        parents: &[ObjectId],
        exclusions: &ExclusionFilter,
    ) -> Result<Vec<FileDelta>> {
        let tree = self.tree_of(commit_id)?;

        let mut changes = match parents.first() {
            Some(first) => {
                let parent_tree = self.tree_of(*first)?;
                self.diff_trees(Some(&parent_tree), &tree)?
            }
            None => self.diff_trees(None, &tree)?,
        };

        // A merge only owns the paths whose content differs from every
        // parent. Anything identical to another parent came from that side.
        let others = parents
            .iter()
            .skip(1)
            .map(|id| self.tree_of(*id))
            .collect::<Result<Vec<_>>>()?;
        for other_tree in &others {
            let differs: HashSet<String> = self
                .diff_trees(Some(other_tree), &tree)?
                .iter()
                .map(change_path)
                .collect();
            let before = changes.len();
            changes.retain(|c| differs.contains(&change_path(c)));
            debug!(
                commit = %commit_id,
                inherited = before - changes.len(),
                "dropped paths taken unchanged from merged parent"
            );
        }

        let mut files = Vec::with_capacity(changes.len());
        for change in changes {
            if let Some(delta) = self.file_delta(change, exclusions, &others)? {
                files.push(delta);
            }
        }
        Ok(files)
    }

    /// Line delta of one changed path. `others` holds the trees of every
    /// parent after the first. For merges see [`merge_line_delta`]; a merged
    /// path that adds and removes nothing of its own yields `None`.
    fn file_delta(
        &self,
        change: ChangeDetached,
        exclusions: &ExclusionFilter,
        others: &[gix::Tree<'_>],
    ) -> Result<Option<FileDelta>> {
        let path = change_path(&change);
        if exclusions.is_excluded(&path) {
            return Ok(None);
        }

        let (old_id, new_id, is_text_entry) = match change {
            ChangeDetached::Addition { id, entry_mode, .. } => (None, Some(id), is_file(entry_mode)),
            ChangeDetached::Deletion { id, entry_mode, .. } => (Some(id), None, is_file(entry_mode)),
            ChangeDetached::Modification {
                previous_id,
                id,
                previous_entry_mode,
                entry_mode,
                ..
            } => (
                Some(previous_id),
                Some(id),
                is_file(previous_entry_mode) && is_file(entry_mode),
            ),
            ChangeDetached::Rewrite {
                source_id,
                id,
                entry_mode,
                ..
            } => (Some(source_id), Some(id), is_file(entry_mode)),
        };
        if !is_text_entry {
            return Ok(None);
        }

        let old = self.blob_data(old_id)?;
        let new = self.blob_data(new_id)?;
        let theirs = others
            .iter()
            .map(|tree| self.blob_at(tree, &path))
            .collect::<Result<Vec<_>>>()?;

        let is_binary = is_binary(&old) || is_binary(&new) || theirs.iter().any(|t| is_binary(t));
        let (added_lines, deleted_lines) = if is_binary {
            (0, 0)
        } else if !theirs.is_empty() {
            // Auto-merged text with nothing of the merge's own is not a change.
            match merge_line_delta(&old, &new, &theirs) {
                (0, 0) => return Ok(None),
                delta => delta,
            }
        } else {
            match (old_id, new_id) {
                (None, _) => (count_lines(&new), 0),
                (_, None) => (0, count_lines(&old)),
                _ => line_delta(&old, &new),
            }
        };

        Ok(Some(FileDelta {
            path,
            added_lines,
            deleted_lines,
            is_binary,
        }))
    }

    fn blob_data(&self, id: Option<ObjectId>) -> Result<Vec<u8>> {
        match id {
            Some(id) => Ok(self.repo.find_object(id)?.detach().data),
            None => Ok(Vec::new()),
        }
    }

    /// Content of `path` in `tree`, empty when the path is absent there.
    fn blob_at(&self, tree: &gix::Tree<'_>, path: &str) -> Result<Vec<u8>> {
        match tree.lookup_entry_by_path(path)? {
            Some(entry) if entry.mode().is_blob() => self.blob_data(Some(entry.object_id())),
            _ => Ok(Vec::new()),
        }
    }
}

fn change_path(change: &ChangeDetached) -> String {
    match change {
        ChangeDetached::Addition { location, .. }
        | ChangeDetached::Deletion { location, .. }
        | ChangeDetached::Modification { location, .. }
        | ChangeDetached::Rewrite { location, .. } => location.to_string(),
    }
}

/// Trees and submodule links carry no lines of their own.
fn is_file(mode: EntryMode) -> bool {
    !(mode.is_tree() || mode.is_commit())
}

pub(crate) fn is_binary(data: &[u8]) -> bool {
    data.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}

/// Number of lines, counting a trailing unterminated line.
pub(crate) fn count_lines(data: &[u8]) -> u64 {
    let terminators = data.iter().filter(|&&b| b == b'\n').count() as u64;
    match data.last() {
        Some(b'\n') | None => terminators,
        Some(_) => terminators + 1,
    }
}

fn changed_lines(old: &str, new: &str, tag: ChangeTag) -> HashSet<usize> {
    TextDiff::from_lines(old, new)
        .iter_all_changes()
        .filter(|change| change.tag() == tag)
        .filter_map(|change| match tag {
            ChangeTag::Insert => change.new_index(),
            _ => change.old_index(),
        })
        .collect()
}

/// Lines a merge result introduced relative to all of its parents.
///
/// Added: lines of `merged` that are insertions against `first` and against
/// every other parent. Deleted: lines of `first` that the merge dropped while
/// every other parent still carried them.
pub(crate) fn merge_line_delta(first: &[u8], merged: &[u8], others: &[Vec<u8>]) -> (u64, u64) {
    let first = String::from_utf8_lossy(first);
    let merged = String::from_utf8_lossy(merged);

    let mut fresh = changed_lines(&first, &merged, ChangeTag::Insert);
    let mut dropped = changed_lines(&first, &merged, ChangeTag::Delete);
    for other in others {
        let other = String::from_utf8_lossy(other);
        let inserted = changed_lines(&other, &merged, ChangeTag::Insert);
        fresh.retain(|i| inserted.contains(i));
        let kept = changed_lines(&first, &other, ChangeTag::Equal);
        dropped.retain(|i| kept.contains(i));
    }

    (fresh.len() as u64, dropped.len() as u64)
}

pub(crate) fn line_delta(old: &[u8], new: &[u8]) -> (u64, u64) {
    let old = String::from_utf8_lossy(old);
    let new = String::from_utf8_lossy(new);
    let diff = TextDiff::from_lines(old.as_ref(), new.as_ref());

    diff.iter_all_changes()
        .fold((0, 0), |(added, deleted), change| match change.tag() {
            ChangeTag::Insert => (added + 1, deleted),
            ChangeTag::Delete => (added, deleted + 1),
            ChangeTag::Equal => (added, deleted),
        })
}

fn parse_natural_duration(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();

    let units: [(&str, u64); 3] = [(" days ago", 1), (" weeks ago", 7), (" months ago", 30)];
    for (suffix, days_per_unit) in units {
        if let Some(n) = input.strip_suffix(suffix) {
            let secs = n
                .trim()
                .parse::<u64>()
                .ok()?
                .checked_mul(days_per_unit)?
                .checked_mul(86400)?;
            return Some(Duration::from_secs(secs));
        }
    }

    None
}
