use crate::models::{Args, Commands};
use crate::upgrade::{UpgradeConfig, UpgradeStatus, Upgrader};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Main CLI entry point
pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Check {
            repo,
            current,
            timeout,
        } => {
            let config = UpgradeConfig {
                timeout: Duration::from_secs(timeout),
                ..Default::default()
            };
            let upgrader = Upgrader::new(&repo, config);
            let current = current.unwrap_or_else(built_version);

            match upgrader
                .is_new_version_available(&current)
                .with_context(|| format!("failed to check releases of {repo}"))?
            {
                Some(latest) => println!("Update available: {current} -> {latest}"),
                None => println!("Already up to date ({current})"),
            }
        }
        Commands::Update {
            repo,
            current,
            exe,
            os,
            arch,
            checksums,
            timeout,
        } => {
            let mut config = UpgradeConfig {
                checksum_asset_suffix: checksums,
                timeout: Duration::from_secs(timeout),
                ..Default::default()
            };
            if let Some(exe) = exe {
                config.executable_path = PathBuf::from(exe);
            }
            if let Some(os) = os {
                config.os = os;
            }
            if let Some(arch) = arch {
                config.arch = arch;
            }

            let target = config.executable_path.display().to_string();
            let upgrader = Upgrader::new(&repo, config);
            let current = current.unwrap_or_else(built_version);

            println!("Updating {target} from {repo}...");
            match upgrader
                .upgrade(&current)
                .with_context(|| format!("failed to update {target} from {repo}"))?
            {
                UpgradeStatus::UpToDate => println!("Already up to date ({current})"),
                UpgradeStatus::Updated(tag) => println!("Updated to {tag}"),
            }
        }
    }

    Ok(())
}

fn built_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Map -v occurrences to a tracing filter; RUST_LOG still wins when set
fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
