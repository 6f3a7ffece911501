use crate::error::{Result, UpgradeError};
use crate::models::ReleaseAsset;
use crate::transport::Transport;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// A downloaded release binary, privately owned until it is either promoted
/// onto the target executable or released.
///
/// The temp file is deleted when the handle is dropped, so every early-return
/// path releases the artifact without further bookkeeping; [`persist`]
/// consumes the file via rename, after which there is nothing left to clean.
///
/// [`persist`]: DownloadedAsset::persist
#[derive(Debug)]
pub struct DownloadedAsset {
    /// Hex SHA-256 digest of the downloaded bytes
    pub sha256: String,
    file: NamedTempFile,
}

impl DownloadedAsset {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Atomically move the artifact onto `dest`. An external observer sees
    /// either the old or the new file content in full, never a mixture.
    pub fn persist(self, dest: &Path) -> Result<()> {
        match self.file.persist(dest) {
            Ok(_) => Ok(()),
            Err(err) => {
                let tempfile::PersistError { error, file } = err;
                // dropping the handed-back file removes the orphaned artifact
                drop(file);
                Err(UpgradeError::ReplaceFailed {
                    path: dest.to_path_buf(),
                    source: error,
                })
            }
        }
    }

    /// Delete the artifact without installing it
    pub fn release(self) {
        debug!("releasing downloaded artifact {}", self.file.path().display());
    }
}

/// Pick the release asset for the host platform: first asset whose download
/// URL ends with `os_arch`, then each alias of `arch` in declared order.
pub fn select_asset<'a>(
    assets: &'a [ReleaseAsset],
    os: &str,
    arch: &str,
    aliases: &HashMap<String, Vec<String>>,
) -> Result<&'a ReleaseAsset> {
    let suffix = format!("{os}_{arch}");
    if let Some(asset) = asset_for_suffix(assets, &suffix) {
        return Ok(asset);
    }

    for alias in aliases.get(arch).into_iter().flatten() {
        let suffix = format!("{os}_{alias}");
        if let Some(asset) = asset_for_suffix(assets, &suffix) {
            debug!("asset matched via arch alias {alias}");
            return Ok(asset);
        }
    }

    Err(UpgradeError::NoAssetFound {
        os: os.to_string(),
        arch: arch.to_string(),
    })
}

fn asset_for_suffix<'a>(assets: &'a [ReleaseAsset], suffix: &str) -> Option<&'a ReleaseAsset> {
    assets.iter().find(|asset| asset.download_url.ends_with(suffix))
}

/// Stream the asset into a fresh private temp file, feeding the same bytes
/// into a SHA-256 accumulator in the same pass, then mark it executable.
pub fn download_asset(
    transport: &dyn Transport,
    asset: &ReleaseAsset,
    binary_name: &str,
) -> Result<DownloadedAsset> {
    info!("downloading {}", asset.download_url);

    let mut reader = transport.get(&asset.download_url)?;
    let file = tempfile::Builder::new().prefix(binary_name).tempfile()?;

    let mut hasher = Sha256::new();
    let mut out = file.as_file();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        out.write_all(&buffer[..bytes_read])?;
    }

    out.sync_all()?;
    set_executable(file.path())?;

    Ok(DownloadedAsset {
        sha256: format!("{:x}", hasher.finalize()),
        file,
    })
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    // Content downloaded in the tests below. No trailing newline; its SHA-256
    // is the constant underneath.
    const DOWNLOAD_DATA: &str = "#!/bin/sh\n\necho \"Hello, World!\"";
    const DOWNLOAD_DATA_CHECKSUM: &str =
        "88fd602a930bc7c0bb78c385f3cb70e976a0cdc3517020be32f19aae8c8eba17";

    struct FixtureTransport {
        body: Vec<u8>,
    }

    impl Transport for FixtureTransport {
        fn get(&self, _url: &str) -> Result<Box<dyn Read + Send>> {
            Ok(Box::new(Cursor::new(self.body.clone())))
        }
    }

    struct InterruptedTransport;

    impl Transport for InterruptedTransport {
        fn get(&self, _url: &str) -> Result<Box<dyn Read + Send>> {
            Ok(Box::new(FailingReader { served: false }))
        }
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset mid-stream",
                ));
            }
            self.served = true;
            buf[..4].copy_from_slice(b"part");
            Ok(4)
        }
    }

    fn asset(url: &str) -> ReleaseAsset {
        ReleaseAsset {
            name: url.rsplit('/').next().unwrap().to_string(),
            download_url: url.to_string(),
        }
    }

    fn aliases() -> HashMap<String, Vec<String>> {
        HashMap::from([(
            "amd64".to_string(),
            vec!["x86_64".to_string(), "all".to_string()],
        )])
    }

    #[test]
    fn test_select_asset_primary_suffix() {
        let assets = vec![
            asset("https://dl.test/tool_darwin_arm64"),
            asset("https://dl.test/tool_linux_x86_64"),
        ];
        let selected = select_asset(&assets, "linux", "x86_64", &aliases()).unwrap();
        assert_eq!(selected.download_url, "https://dl.test/tool_linux_x86_64");
    }

    #[test]
    fn test_select_asset_first_match_wins() {
        let assets = vec![
            asset("https://dl.test/a/tool_linux_x86_64"),
            asset("https://dl.test/b/tool_linux_x86_64"),
        ];
        let selected = select_asset(&assets, "linux", "x86_64", &aliases()).unwrap();
        assert_eq!(selected.download_url, "https://dl.test/a/tool_linux_x86_64");
    }

    #[test]
    fn test_select_asset_alias_fallback() {
        let assets = vec![asset("https://dl.test/tool_linux_x86_64")];
        let selected = select_asset(&assets, "linux", "amd64", &aliases()).unwrap();
        assert_eq!(selected.download_url, "https://dl.test/tool_linux_x86_64");
    }

    #[test]
    fn test_select_asset_alias_order() {
        // both alias suffixes are present; the first declared alias wins
        let assets = vec![
            asset("https://dl.test/tool_linux_all"),
            asset("https://dl.test/tool_linux_x86_64"),
        ];
        let selected = select_asset(&assets, "linux", "amd64", &aliases()).unwrap();
        assert_eq!(selected.download_url, "https://dl.test/tool_linux_x86_64");
    }

    #[test]
    fn test_select_asset_not_found() {
        let assets = vec![asset("https://dl.test/tool_windows_arm64")];
        let err = select_asset(&assets, "linux", "amd64", &aliases()).unwrap_err();
        match err {
            UpgradeError::NoAssetFound { os, arch } => {
                assert_eq!(os, "linux");
                assert_eq!(arch, "amd64");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_select_asset_unaliased_arch_not_found() {
        let assets = vec![asset("https://dl.test/tool_linux_x86_64")];
        let err = select_asset(&assets, "linux", "riscv64", &aliases()).unwrap_err();
        assert!(matches!(err, UpgradeError::NoAssetFound { .. }));
    }

    #[test]
    fn test_download_preserves_content_and_digest() {
        let transport = FixtureTransport {
            body: DOWNLOAD_DATA.as_bytes().to_vec(),
        };
        let artifact =
            download_asset(&transport, &asset("https://dl.test/tool_os_arch"), "tool").unwrap();

        assert_eq!(artifact.sha256, DOWNLOAD_DATA_CHECKSUM);
        assert_eq!(fs::read(artifact.path()).unwrap(), DOWNLOAD_DATA.as_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn test_download_marks_artifact_executable() {
        use std::os::unix::fs::PermissionsExt;

        let transport = FixtureTransport {
            body: DOWNLOAD_DATA.as_bytes().to_vec(),
        };
        let artifact =
            download_asset(&transport, &asset("https://dl.test/tool_os_arch"), "tool").unwrap();

        let mode = fs::metadata(artifact.path()).unwrap().permissions().mode();
        assert_ne!(mode & 0o111, 0);
    }

    #[test]
    fn test_release_removes_artifact() {
        let transport = FixtureTransport {
            body: DOWNLOAD_DATA.as_bytes().to_vec(),
        };
        let artifact =
            download_asset(&transport, &asset("https://dl.test/tool_os_arch"), "tool").unwrap();

        let path = artifact.path().to_path_buf();
        assert!(path.exists());
        artifact.release();
        assert!(!path.exists());
    }

    #[test]
    fn test_interrupted_download_leaves_no_orphan() {
        let prefix = "binup-test-interrupted";
        let err = download_asset(
            &InterruptedTransport,
            &asset("https://dl.test/tool_os_arch"),
            prefix,
        )
        .unwrap_err();
        assert!(matches!(err, UpgradeError::Io(_)));

        let orphans: Vec<_> = fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
            .collect();
        assert!(orphans.is_empty());
    }

    #[test]
    fn test_persist_replaces_destination() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("tool");
        fs::write(&dest, b"old binary").unwrap();

        let transport = FixtureTransport {
            body: DOWNLOAD_DATA.as_bytes().to_vec(),
        };
        let artifact =
            download_asset(&transport, &asset("https://dl.test/tool_os_arch"), "tool").unwrap();
        let temp_path = artifact.path().to_path_buf();

        artifact.persist(&dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), DOWNLOAD_DATA.as_bytes());
        // consumed by the rename, so nothing is left at the temporary path
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_persist_failure_cleans_up_artifact() {
        let dir = tempfile::TempDir::new().unwrap();
        // destination parent does not exist, so the rename must fail
        let dest = dir.path().join("missing").join("tool");

        let transport = FixtureTransport {
            body: DOWNLOAD_DATA.as_bytes().to_vec(),
        };
        let artifact =
            download_asset(&transport, &asset("https://dl.test/tool_os_arch"), "tool").unwrap();
        let temp_path = artifact.path().to_path_buf();

        let err = artifact.persist(&dest).unwrap_err();
        assert!(matches!(err, UpgradeError::ReplaceFailed { .. }));
        assert!(!dest.exists());
        assert!(!temp_path.exists());
    }
}
