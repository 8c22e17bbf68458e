pub mod repo;
pub mod snapshot;

pub use repo::{GitRepo, WalkOptions};
pub use snapshot::{LanguageTally, SnapshotStats};
