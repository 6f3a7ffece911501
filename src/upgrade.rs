use crate::checksum;
use crate::download;
use crate::error::{Result, UpgradeError};
use crate::release::{GitHubReleaseProvider, ReleaseProvider};
use crate::transport::{HttpTransport, Transport};
use crate::version;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Settings for one upgrade target. Everything defaults at the assembly
/// point: host platform, the running executable, goreleaser-style
/// `checksums.txt`, and the standard architecture alias table.
#[derive(Debug, Clone)]
pub struct UpgradeConfig {
    /// Operating system name as it appears in release asset suffixes
    pub os: String,
    /// Architecture name as it appears in release asset suffixes
    pub arch: String,
    /// Path of the binary to replace
    pub executable_path: PathBuf,
    /// Suffix identifying the checksum manifest asset
    pub checksum_asset_suffix: String,
    /// Canonical arch -> ordered alias spellings, consulted on a lookup miss
    pub arch_aliases: HashMap<String, Vec<String>>,
    /// Deadline applied to every network operation of an attempt
    pub timeout: Duration,
    /// User-Agent header sent with every request (GitHub requires one)
    pub user_agent: String,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            os: default_os(),
            arch: std::env::consts::ARCH.to_string(),
            executable_path: std::env::current_exe()
                .unwrap_or_else(|_| PathBuf::from(env!("CARGO_PKG_NAME"))),
            checksum_asset_suffix: "checksums.txt".to_string(),
            arch_aliases: default_arch_aliases(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("binup/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Release assets follow the Go toolchain's OS naming, so macOS is "darwin"
fn default_os() -> String {
    match std::env::consts::OS {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    }
}

/// Alias spellings tried, in order, when `os_arch` matches nothing.
/// "all" covers single-artifact releases published without an arch.
pub fn default_arch_aliases() -> HashMap<String, Vec<String>> {
    HashMap::from([
        (
            "amd64".to_string(),
            vec!["x86_64".to_string(), "all".to_string()],
        ),
        (
            "x86_64".to_string(),
            vec!["amd64".to_string(), "all".to_string()],
        ),
        (
            "386".to_string(),
            vec!["i386".to_string(), "all".to_string()],
        ),
        (
            "aarch64".to_string(),
            vec!["arm64".to_string(), "all".to_string()],
        ),
        (
            "arm64".to_string(),
            vec!["aarch64".to_string(), "all".to_string()],
        ),
    ])
}

/// Outcome of a completed upgrade attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeStatus {
    /// The latest published release is not newer than the running version
    UpToDate,
    /// The binary was replaced; holds the installed release tag
    Updated(String),
}

/// Drives one upgrade attempt end to end: version gate, asset selection and
/// download, checksum manifest retrieval, digest validation, atomic
/// replacement. No internal retries; a failed attempt can simply be re-run,
/// since nothing is cached between attempts.
pub struct Upgrader {
    config: UpgradeConfig,
    provider: Box<dyn ReleaseProvider>,
    transport: Arc<dyn Transport>,
}

impl Upgrader {
    /// Upgrader for a GitHub repository ("owner/repo" or a github.com URL)
    pub fn new(repo: &str, config: UpgradeConfig) -> Self {
        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(config.timeout, &config.user_agent));
        let provider = Box::new(GitHubReleaseProvider::new(repo, Arc::clone(&transport)));
        Self {
            config,
            provider,
            transport,
        }
    }

    /// Upgrader with injected collaborators, for tests and alternative hosts
    pub fn with_collaborators(
        provider: Box<dyn ReleaseProvider>,
        transport: Arc<dyn Transport>,
        config: UpgradeConfig,
    ) -> Self {
        Self {
            config,
            provider,
            transport,
        }
    }

    fn binary_name(&self) -> String {
        self.config
            .executable_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
    }

    /// Dry run: fetch the latest release tag and compare versions.
    /// Returns the newer tag if one is published, downloading nothing.
    pub fn is_new_version_available(&self, current_version: &str) -> Result<Option<String>> {
        let current = version::parse_version(current_version)?;
        let release = self.provider.latest_release()?;
        let latest = version::parse_version(&release.tag_name)?;

        if latest > current {
            Ok(Some(release.tag_name))
        } else {
            Ok(None)
        }
    }

    /// Run the full pipeline. Side effects happen at most once each per
    /// attempt: one asset GET, one manifest GET, one temp file, one rename.
    pub fn upgrade(&self, current_version: &str) -> Result<UpgradeStatus> {
        // parse before touching the network, so a bad current version
        // costs nothing
        let current = version::parse_version(current_version)?;

        let release = self.provider.latest_release()?;
        let latest = version::parse_version(&release.tag_name)?;

        if latest <= current {
            info!("already up to date ({current_version})");
            return Ok(UpgradeStatus::UpToDate);
        }

        info!("upgrading {current_version} -> {}", release.tag_name);

        let binary_name = self.binary_name();
        let asset = download::select_asset(
            &release.assets,
            &self.config.os,
            &self.config.arch,
            &self.config.arch_aliases,
        )?;
        let artifact = download::download_asset(self.transport.as_ref(), asset, &binary_name)?;

        // a failed manifest fetch drops the artifact, which deletes it
        let manifest = checksum::fetch_manifest(
            self.transport.as_ref(),
            &release.assets,
            &self.config.checksum_asset_suffix,
        )?;

        if !checksum::is_checksum_valid(
            &binary_name,
            &self.config.os,
            &self.config.arch,
            &manifest,
            &artifact.sha256,
            &self.config.arch_aliases,
        ) {
            artifact.release();
            return Err(UpgradeError::InvalidChecksum);
        }

        artifact.persist(&self.config.executable_path)?;
        info!(
            "installed release {} at {}",
            release.tag_name,
            self.config.executable_path.display()
        );
        Ok(UpgradeStatus::Updated(release.tag_name))
    }
}
