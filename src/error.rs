use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PulseError>;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Invalid repository location: {0}")]
    InvalidLocation(String),
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Rate limit exceeded{}", retry_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },
    #[error("Contributor statistics are still being computed after {attempts} attempts")]
    StatsUnavailable { attempts: u32 },
    #[error("Corrupt history: {0}")]
    CorruptHistory(String),
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

fn retry_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}", humantime::format_duration(*d)),
        None => String::new(),
    }
}

impl PulseError {
    /// Soft failures mean "no data yet" rather than "something is broken".
    pub fn is_soft(&self) -> bool {
        matches!(self, PulseError::StatsUnavailable { .. })
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            PulseError::StatsUnavailable { .. } => Some(
                "GitHub is still computing statistics for this repository; try again shortly"
                    .to_string(),
            ),
            PulseError::RateLimited {
                retry_after: Some(d),
            } => Some(format!(
                "wait {} or supply a token with --token / GITHUB_TOKEN",
                humantime::format_duration(*d)
            )),
            PulseError::RateLimited { retry_after: None } => {
                Some("supply a token with --token / GITHUB_TOKEN to raise the limit".to_string())
            }
            PulseError::AccessDenied(_) => {
                Some("check that the token is valid and has access to the repository".to_string())
            }
            _ => None,
        }
    }

    fn corrupt(err: impl std::fmt::Display) -> Self {
        PulseError::CorruptHistory(err.to_string())
    }
}

// Discovery failures mean the location is wrong; anything raised once the
// repository is open means its data could not be trusted.
impl From<gix::discover::Error> for PulseError {
    fn from(err: gix::discover::Error) -> Self {
        PulseError::InvalidLocation(err.to_string())
    }
}

impl From<gix::object::find::existing::Error> for PulseError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        PulseError::corrupt(err)
    }
}

impl From<gix::object::commit::Error> for PulseError {
    fn from(err: gix::object::commit::Error) -> Self {
        PulseError::corrupt(err)
    }
}

impl From<gix::reference::find::existing::Error> for PulseError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        PulseError::corrupt(err)
    }
}

impl From<gix::head::peel::to_commit::Error> for PulseError {
    fn from(err: gix::head::peel::to_commit::Error) -> Self {
        PulseError::corrupt(err)
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for PulseError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        PulseError::corrupt(err)
    }
}

impl From<gix::objs::decode::Error> for PulseError {
    fn from(err: gix::objs::decode::Error) -> Self {
        PulseError::corrupt(err)
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for PulseError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        PulseError::corrupt(err)
    }
}
