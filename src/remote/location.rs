use crate::config::DEFAULT_API_URL;
use crate::error::{PulseError, Result};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// An `owner/name` reference to a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteRepo {
    pub owner: String,
    pub name: String,
    /// Host named in the reference; bare `owner/repo` has none.
    pub host: Option<String>,
}

impl RemoteRepo {
    /// Accepts `owner/repo`, `https://host/owner/repo(.git)`,
    /// `host/owner/repo` and `git@host:owner/repo.git`.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim().trim_end_matches('/');
        let invalid = || {
            PulseError::InvalidLocation(format!(
                "cannot parse '{reference}' as an owner/repo reference"
            ))
        };

        // Full URLs may point below the repository root (tree/, blob/...).
        let (host, segments, allow_trailing): (Option<String>, Vec<String>, bool) =
            if let Some(rest) = reference.strip_prefix("git@") {
                let (host, path) = rest.split_once(':').ok_or_else(invalid)?;
                let segments = path.split('/').map(str::to_string).collect();
                (Some(host.to_ascii_lowercase()), segments, false)
            } else if reference.contains("://") {
                let (host, segments) = url_segments(reference).ok_or_else(invalid)?;
                (Some(host), segments, true)
            } else if looks_like_host(reference) {
                let with_scheme = format!("https://{reference}");
                let (host, segments) = url_segments(&with_scheme).ok_or_else(invalid)?;
                (Some(host), segments, true)
            } else {
                (None, reference.split('/').map(str::to_string).collect(), false)
            };

        let segments: Vec<&str> = segments
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        let (owner, name) = match segments.as_slice() {
            [owner, name] => (*owner, *name),
            [owner, name, ..] if allow_trailing => (*owner, *name),
            _ => return Err(invalid()),
        };
        let name = name.strip_suffix(".git").unwrap_or(name);

        if !is_valid_name(owner) || !is_valid_name(name) {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            host,
        })
    }

    /// The public API only serves github.com; other hosts need their own
    /// `api_url`.
    pub fn check_host(&self, api_url: &str) -> Result<()> {
        let Some(host) = self.host.as_deref() else {
            return Ok(());
        };
        let host = host.strip_prefix("www.").unwrap_or(host);
        if host != "github.com" && api_url.trim_end_matches('/') == DEFAULT_API_URL {
            return Err(PulseError::InvalidLocation(format!(
                "'{host}' is not github.com; set --api-url to query another GitHub instance"
            )));
        }
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

fn url_segments(input: &str) -> Option<(String, Vec<String>)> {
    let url = Url::parse(input).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    Some((host, url.path_segments()?.map(str::to_string).collect()))
}

fn looks_like_host(reference: &str) -> bool {
    let mut parts = reference.split('/');
    let host = parts.next().unwrap_or_default();
    host.contains('.') && parts.count() >= 2
}

fn is_valid_name(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl FromStr for RemoteRepo {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RemoteRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
