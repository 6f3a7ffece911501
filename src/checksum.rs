use crate::error::{Result, UpgradeError};
use crate::models::ReleaseAsset;
use crate::transport::Transport;
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

/// Checksum manifest of one release: published filename -> hex SHA-256 digest.
///
/// Keys are the manifest's own filename tokens, exactly as published.
#[derive(Debug)]
pub struct ChecksumManifest {
    entries: HashMap<String, String>,
}

impl ChecksumManifest {
    /// Parse a manifest body line by line. Each line must split into exactly
    /// `<digest> <filename>` on runs of whitespace; anything else fails the
    /// whole parse, and a body with zero entries is rejected outright.
    pub fn parse(body: &str) -> Result<Self> {
        let mut entries = HashMap::new();

        for line in body.lines() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != 2 {
                return Err(UpgradeError::MalformedManifest {
                    line: line.trim().to_string(),
                });
            }
            entries.insert(tokens[1].to_string(), tokens[0].to_string());
        }

        if entries.is_empty() {
            return Err(UpgradeError::EmptyManifest);
        }

        Ok(Self { entries })
    }

    pub fn digest_for(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Locate the manifest asset by URL suffix and download its body.
pub fn fetch_manifest(
    transport: &dyn Transport,
    assets: &[ReleaseAsset],
    suffix: &str,
) -> Result<ChecksumManifest> {
    let asset = assets
        .iter()
        .find(|asset| asset.download_url.ends_with(suffix))
        .ok_or(UpgradeError::NoChecksumAsset)?;

    debug!("fetching checksum manifest from {}", asset.download_url);

    let mut body = String::new();
    transport.get(&asset.download_url)?.read_to_string(&mut body)?;
    ChecksumManifest::parse(&body)
}

/// Compare a computed digest against the manifest entry for
/// `<binary>_<os>_<arch>`, falling back to the arch's aliases in declared
/// order when the canonical key is absent. A total miss is a validation
/// failure, not an error.
pub fn is_checksum_valid(
    binary: &str,
    os: &str,
    arch: &str,
    manifest: &ChecksumManifest,
    computed: &str,
    aliases: &HashMap<String, Vec<String>>,
) -> bool {
    let arch = arch.to_lowercase();

    let key = format!("{binary}_{os}_{arch}");
    if let Some(expected) = manifest.digest_for(&key) {
        return expected == computed;
    }

    let Some(fallbacks) = aliases.get(&arch) else {
        return false;
    };

    for alias in fallbacks {
        let key = format!("{binary}_{os}_{alias}");
        if let Some(expected) = manifest.digest_for(&key) {
            debug!("checksum key {key} matched via alias {alias}");
            return expected == computed;
        }
    }

    false
}
