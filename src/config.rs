use crate::exclude::ExclusionFilter;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const USER_AGENT: &str = concat!("gitpulse/", env!("CARGO_PKG_VERSION"));

/// Bounded retry for endpoints that answer "still computing".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Zero delay, for tests and scripted transports.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub since: Option<String>,
    pub until: Option<String>,
    pub include_merges: bool,
    pub show_progress: bool,
    pub extra_exclusions: Vec<String>,
    pub api_url: String,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl QueryOptions {
    pub fn exclusions(&self) -> ExclusionFilter {
        ExclusionFilter::with_extra(self.extra_exclusions.iter().cloned())
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            since: None,
            until: None,
            include_merges: true,
            show_progress: false,
            extra_exclusions: Vec::new(),
            api_url: DEFAULT_API_URL.to_string(),
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
