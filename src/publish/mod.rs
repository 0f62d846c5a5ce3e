// ABOUTME: Atomic multi-file publishing to a site repository.
// ABOUTME: Blob, tree, and commit objects are staged; only the final ref patch is visible.

mod client;
mod error;

pub use client::{CommitPlan, DEFAULT_API_URL, PublishFile, RepoClient};
pub use error::{PublishError, PublishStep};
