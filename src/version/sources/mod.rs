//! Release source implementations

pub mod fake;
pub mod github;

pub use fake::FakeSource;
pub use github::GitHubSource;
