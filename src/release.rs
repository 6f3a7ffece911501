use crate::error::Result;
use crate::models::ReleaseInfo;
use crate::transport::Transport;
use std::sync::Arc;
use tracing::debug;

/// Release metadata capability. Production code talks to the GitHub API;
/// tests return fixed fixtures.
pub trait ReleaseProvider: Send + Sync {
    /// Fetch the newest published release. Called once per upgrade attempt,
    /// never cached across attempts.
    fn latest_release(&self) -> Result<ReleaseInfo>;
}

/// Fetches the latest release of a GitHub repository via the releases API.
pub struct GitHubReleaseProvider {
    repo: String,
    transport: Arc<dyn Transport>,
}

impl GitHubReleaseProvider {
    pub fn new(repo: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            repo: normalize_repo(repo),
            transport,
        }
    }
}

impl ReleaseProvider for GitHubReleaseProvider {
    fn latest_release(&self) -> Result<ReleaseInfo> {
        let url = format!("https://api.github.com/repos/{}/releases/latest", self.repo);
        debug!("fetching release info from {url}");

        let reader = self.transport.get(&url)?;
        let release: ReleaseInfo = serde_json::from_reader(reader)?;
        Ok(release)
    }
}

/// Accept "owner/repo" as well as a full github.com URL
pub fn normalize_repo(source: &str) -> String {
    if source.contains("github.com/") {
        source
            .strip_prefix("https://")
            .or_else(|| source.strip_prefix("http://"))
            .unwrap_or(source)
            .strip_prefix("github.com/")
            .unwrap_or(source)
            .split('/')
            .take(2)
            .collect::<Vec<_>>()
            .join("/")
    } else {
        source.to_string()
    }
}
