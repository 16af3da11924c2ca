pub mod auth;
pub mod export;
pub mod fetch;
pub mod insight;
pub mod normalize;
pub mod orchestrator;
pub mod scoring;

pub use auth::*;
pub use export::*;
pub use fetch::*;
pub use insight::*;
pub use normalize::*;
pub use orchestrator::*;
pub use scoring::*;

use std::time::Duration;

/// Blocking HTTP client with a whole-request timeout.
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("oncohub/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Join a base URL and a path segment with exactly one slash.
pub(crate) fn join_url(base: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        segment.trim_start_matches('/')
    )
}
