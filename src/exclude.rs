use std::collections::HashSet;
use std::path::Path;

/// Generated dependency manifests. Matched against the basename only.
pub const EXCLUDED_FILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "Cargo.lock",
    "Gemfile.lock",
    "composer.lock",
    "Pipfile.lock",
];

/// Build artefacts recognised by basename suffix.
pub const EXCLUDED_SUFFIXES: &[&str] = &[".min.js", ".min.css", ".map"];

/// True when `path` names a file that must not count towards line or
/// language statistics.
pub fn should_exclude(path: &str) -> bool {
    let name = basename(path);
    EXCLUDED_FILES.contains(&name) || EXCLUDED_SUFFIXES.iter().any(|s| name.ends_with(s))
}

fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// The default denylist plus caller-supplied basenames.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    extra: HashSet<String>,
}

impl ExclusionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extra: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        should_exclude(path) || self.extra.contains(basename(path))
    }
}
