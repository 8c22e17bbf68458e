//! Remote statistics backed by the GitHub REST API.

pub mod github;
pub mod location;
pub mod transport;

pub use github::{GitHubClient, RemoteContributor};
pub use location::RemoteRepo;
pub use transport::{HttpResponse, ReqwestTransport, Transport};
