use crate::error::{Result, UpgradeError};
use std::io::Read;
use std::time::Duration;
use tracing::debug;

/// Blocking streaming GET capability, used identically for release metadata,
/// binary assets and checksum manifests. Test code substitutes in-memory fakes.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<Box<dyn Read + Send>>;
}

/// Production transport backed by one explicitly constructed `ureq::Agent`.
///
/// The agent's timeout doubles as the deadline for every network step of an
/// upgrade attempt; there are no internal retries.
pub struct HttpTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            user_agent: user_agent.to_string(),
        }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Box<dyn Read + Send>> {
        debug!("GET {url}");

        let response = self
            .agent
            .get(url)
            .set("User-Agent", &self.user_agent)
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(status, _) => UpgradeError::HttpStatus {
                    url: url.to_string(),
                    status,
                },
                other => UpgradeError::Transport {
                    url: url.to_string(),
                    source: Box::new(other),
                },
            })?;

        if response.status() != 200 {
            return Err(UpgradeError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        Ok(Box::new(response.into_reader()))
    }
}
