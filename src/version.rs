use crate::error::{Result, UpgradeError};

/// Parse a version string, tolerating a leading `v`/`V` tag prefix
pub fn parse_version(text: &str) -> Result<semver::Version> {
    let trimmed = text.trim().trim_start_matches('v').trim_start_matches('V');
    semver::Version::parse(trimmed).map_err(|source| UpgradeError::InvalidVersion {
        version: text.to_string(),
        source,
    })
}

/// True iff `latest` is strictly newer than `current`.
/// Equal or older is a clean false, never an error.
pub fn is_update_available(current: &str, latest: &str) -> Result<bool> {
    Ok(parse_version(latest)? > parse_version(current)?)
}
