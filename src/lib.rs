//! Contributor and language statistics for Git repositories.
//!
//! Local clones are walked with gix; GitHub repositories are read through the
//! REST API's pre-computed aggregates. Both paths produce the same
//! [`model::ContributorReport`] and [`model::LanguageReport`] shapes. Start
//! from [`stats::RepositoryQuery`].

pub mod aggregate;
pub mod cli;
pub mod codebase;
pub mod config;
pub mod contributors;
pub mod error;
pub mod exclude;
pub mod git;
pub mod language;
pub mod languages;
pub mod logging;
pub mod model;
pub mod remote;
pub mod stats;
pub mod summary;

pub use error::{PulseError, Result};
pub use stats::{
    get_contribution_percentages, get_contributor_stats, get_language_stats, RepositoryQuery,
    StatsSource,
};
