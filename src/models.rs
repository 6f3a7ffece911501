use clap::{Parser, Subcommand};
use serde::Deserialize;

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Check whether a newer release is published, without downloading anything
    Check {
        /// GitHub repository in format "owner/repo" (or a github.com URL)
        repo: String,
        /// Version to compare against (defaults to this binary's build version)
        #[arg(short, long)]
        current: Option<String>,
        /// Request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
    /// Download, verify and install the latest release over the target binary
    Update {
        /// GitHub repository in format "owner/repo" (or a github.com URL)
        repo: String,
        /// Version to compare against (defaults to this binary's build version)
        #[arg(short, long)]
        current: Option<String>,
        /// Path of the executable to replace (defaults to the running binary)
        #[arg(short, long)]
        exe: Option<String>,
        /// Operating system name used in release asset suffixes
        #[arg(long)]
        os: Option<String>,
        /// Architecture name used in release asset suffixes
        #[arg(long)]
        arch: Option<String>,
        /// Suffix identifying the checksum manifest asset
        #[arg(long, default_value = "checksums.txt")]
        checksums: String,
        /// Request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
}

/// One published file of a GitHub release
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// GitHub release information, fetched once per upgrade attempt
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    pub assets: Vec<ReleaseAsset>,
}
