use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::node::config::{NodeConfig, DEFAULT_CONFIG_FILE};
use crate::node::Node;
use crate::utils::init_logging;

/// CLI for the vote ledger service.
#[derive(Parser)]
#[clap(name = "voteledger", version)]
pub struct Cli {
    /// Path to the TOML config file
    #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Write a default config file
    Init {
        /// overwrite an existing file
        #[clap(long)]
        force: bool,
    },
    /// Run the service
    Run {
        /// rpc bind address (host:port), overrides rpc.bind
        #[clap(long)]
        bind: Option<String>,
    },
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Init { force } => {
            if cli.config.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", cli.config.display());
            }
            if let Some(dir) = cli.config.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&cli.config, NodeConfig::default().to_toml()?)?;
            println!("wrote default config to {}", cli.config.display());
            Ok(())
        }
        Cmd::Run { bind } => {
            let loaded = cli.config.exists();
            let mut config = if loaded {
                NodeConfig::load(&cli.config)?
            } else {
                NodeConfig::default()
            };
            if let Some(b) = bind {
                config.rpc.bind = b;
                config.validate()?;
            }

            init_logging(&config.log_level);
            if !loaded {
                info!("{} not found, running with defaults", cli.config.display());
            }

            let node = Node::new(config);
            let svc = node.start().await?;
            // Wait for Ctrl+C
            tokio::signal::ctrl_c().await?;
            println!("Shutting down...");
            svc.shutdown().await?;
            println!("Stopped");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_bind() {
        let cli = Cli::parse_from(["voteledger", "--config", "/tmp/v.toml", "run", "--bind", "0.0.0.0:9000"]);
        assert_eq!(cli.config, PathBuf::from("/tmp/v.toml"));
        assert!(matches!(cli.cmd, Cmd::Run { bind: Some(ref b) } if b == "0.0.0.0:9000"));
    }

    #[test]
    fn test_parse_init_defaults() {
        let cli = Cli::parse_from(["voteledger", "init"]);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(matches!(cli.cmd, Cmd::Init { force: false }));
    }
}
