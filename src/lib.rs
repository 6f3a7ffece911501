// Public modules
pub mod models;
pub mod cli;
pub mod error;
pub mod transport;
pub mod release;
pub mod version;
pub mod checksum;
pub mod download;
pub mod upgrade;

// Re-export commonly used types
pub use error::{Result, UpgradeError};
pub use models::{ReleaseAsset, ReleaseInfo};
pub use release::{GitHubReleaseProvider, ReleaseProvider};
pub use transport::{HttpTransport, Transport};
pub use upgrade::{UpgradeConfig, UpgradeStatus, Upgrader};
