use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, UpgradeError>;

/// Everything that can abort an upgrade attempt
#[derive(Debug, Error)]
pub enum UpgradeError {
    /// A version string could not be parsed (after trimming a leading `v`/`V`)
    #[error("failed to parse version {version:?}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    /// No release asset matched `os_arch` or any configured alias suffix
    #[error("no release asset found for os:{os} arch:{arch}")]
    NoAssetFound { os: String, arch: String },

    /// No asset URL ended with the configured checksum manifest suffix
    #[error("no checksum asset found")]
    NoChecksumAsset,

    /// A manifest line did not split into exactly `<digest> <filename>`
    #[error("checksum manifest is malformed at line {line:?}")]
    MalformedManifest { line: String },

    /// The manifest body produced zero entries
    #[error("checksum manifest is empty")]
    EmptyManifest,

    /// The downloaded asset's digest matched no manifest entry
    #[error("invalid checksum for downloaded asset")]
    InvalidChecksum,

    /// The final rename onto the executable failed; the original binary is untouched
    #[error("failed to replace binary at {path}")]
    ReplaceFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A GET completed but with a non-success status
    #[error("GET {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    /// A GET failed before producing a response
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Release metadata did not decode as the expected JSON document
    #[error("failed to decode release metadata")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
