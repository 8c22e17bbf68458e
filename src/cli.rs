use crate::config::{QueryOptions, RetryPolicy, DEFAULT_API_URL, DEFAULT_MAX_ATTEMPTS};
use crate::model::Mode;
use crate::stats::RepositoryQuery;
use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "gitpulse")]
#[command(about = "Contributor and language statistics for local clones and GitHub repositories")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    #[arg(
        long,
        value_name = "LOCATION",
        default_value = ".",
        help = "Repository path, or owner/repo with --remote (hosts other than github.com need --api-url)"
    )]
    pub repo: String,

    #[arg(long, help = "Query the GitHub API instead of a local clone")]
    pub remote: bool,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "GitHub token for remote queries")]
    pub token: Option<String>,

    #[arg(long, help = "Start from this commit or date (RFC3339, YYYY-MM-DD, or natural language)")]
    pub since: Option<String>,

    #[arg(long, help = "End at this commit or date (RFC3339, YYYY-MM-DD, or natural language)")]
    pub until: Option<String>,

    #[arg(long, help = "Skip merge commits entirely")]
    pub no_merges: bool,

    #[arg(long, value_name = "NAME", help = "Additional file name to leave out of line counts")]
    pub exclude: Vec<String>,

    #[arg(long, env = "GITPULSE_API_URL", default_value = DEFAULT_API_URL, help = "GitHub API base URL")]
    pub api_url: String,

    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, help = "Requests to make while GitHub computes statistics")]
    pub max_attempts: u32,

    #[arg(long, value_parser = humantime::parse_duration, default_value = "3s", help = "Delay between statistics requests")]
    pub retry_delay: Duration,

    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity")]
    pub verbose: u8,

    #[arg(short, long, conflicts_with = "verbose", help = "Only log errors")]
    pub quiet: bool,
}

impl CommonArgs {
    pub fn mode(&self) -> Mode {
        let looks_remote = self.repo.starts_with("https://")
            || self.repo.starts_with("http://")
            || self.repo.starts_with("git@");
        if self.remote || looks_remote {
            Mode::Remote
        } else {
            Mode::Local
        }
    }

    pub fn query(&self, show_progress: bool) -> RepositoryQuery {
        let options = QueryOptions {
            since: self.since.clone(),
            until: self.until.clone(),
            include_merges: !self.no_merges,
            show_progress,
            extra_exclusions: self.exclude.clone(),
            api_url: self.api_url.clone(),
            retry: RetryPolicy::new(self.max_attempts, self.retry_delay),
            ..QueryOptions::default()
        };

        let query = match self.mode() {
            Mode::Local => RepositoryQuery::local(&self.repo),
            Mode::Remote => RepositoryQuery::remote(&self.repo, self.token.clone()),
        };
        query.with_options(options)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Per-contributor commits and line changes
    Contributors {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, conflicts_with = "json", help = "Output as NDJSON")]
        ndjson: bool,

        #[arg(long, help = "Show at most this many contributors")]
        limit: Option<usize>,
    },
    /// Language distribution of the current tree
    Languages {
        #[arg(long, help = "Measure in lines instead of bytes (local only)")]
        lines: bool,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Repository info, commit activity and file rankings
    Codebase {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Codebase, contributors and languages in one report
    Analyze {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Measure languages in lines instead of bytes (local only)")]
        lines: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Contributors { json, ndjson, limit } => {
                crate::contributors::exec(self.common, json, ndjson, limit)
            }
            Commands::Languages { lines, json } => crate::languages::exec(self.common, lines, json),
            Commands::Codebase { json } => crate::codebase::exec(self.common, json),
            Commands::Analyze { json, lines } => crate::summary::exec(self.common, json, lines),
        }
    }
}
