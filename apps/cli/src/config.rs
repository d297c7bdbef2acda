//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/chainvid/config.toml`
//! - Windows: `%APPDATA%/chainvid/config.toml`
//!
//! Environment variables prefixed `CHAINVID_` override individual fields
//! after the file is read.

use std::path::{Path, PathBuf};

use chainvid_fees::FeeLimits;
use serde::{Deserialize, Serialize};

/// Target ledger network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn label(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

/// Endpoints and contract for one network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEndpoints {
    /// Publisher node RPC; also serves the settlement base fee.
    pub rpc_url: String,
    /// Fee-signal feed (settlement gas price and publication fee).
    pub fee_feed_url: String,
    /// Address of the video registry contract.
    pub contract_address: String,
}

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Which network uploads go to.
    #[serde(default = "default_network")]
    pub network: Network,

    /// Chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Ceiling for the settlement-layer fee signal, in gwei.
    #[serde(default = "default_settlement_ceiling")]
    pub settlement_ceiling_gwei: f64,

    /// Ceiling for the data-publication fee signal, in gwei.
    #[serde(default = "default_publication_ceiling")]
    pub publication_ceiling_gwei: f64,

    /// Working directory for staged chunks and the progress file.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    #[serde(default = "default_mainnet")]
    pub mainnet: NetworkEndpoints,

    #[serde(default = "default_testnet")]
    pub testnet: NetworkEndpoints,
}

fn default_network() -> Network {
    Network::Testnet
}

fn default_chunk_size() -> usize {
    chainvid_chunks::DEFAULT_CHUNK_SIZE
}

fn default_settlement_ceiling() -> f64 {
    30.0
}

fn default_publication_ceiling() -> f64 {
    1.0
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("temp-chunks")
}

fn default_mainnet() -> NetworkEndpoints {
    NetworkEndpoints {
        rpc_url: "https://rpc.blast.io".into(),
        fee_feed_url: "https://rpc.flashbots.net".into(),
        contract_address: "0x1F00F51E00F10c019617fB4A50d4E893aaf8C98c".into(),
    }
}

fn default_testnet() -> NetworkEndpoints {
    NetworkEndpoints {
        rpc_url: "https://sepolia.blast.io".into(),
        fee_feed_url: "https://rpc.flashbots.net".into(),
        contract_address: "0xe9b1324F531A4603eb5D1a739E4Ee25a5C824890".into(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: default_network(),
            chunk_size: default_chunk_size(),
            settlement_ceiling_gwei: default_settlement_ceiling(),
            publication_ceiling_gwei: default_publication_ceiling(),
            staging_dir: default_staging_dir(),
            mainnet: default_mainnet(),
            testnet: default_testnet(),
        }
    }
}

impl Config {
    /// Loads configuration from `path` (or the platform default), creating
    /// the default file if none exists, then applies env overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            config.save(&path)?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Saves the current configuration to disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CHAINVID_NETWORK") {
            match v.as_str() {
                "mainnet" => self.network = Network::Mainnet,
                "testnet" => self.network = Network::Testnet,
                other => tracing::warn!(value = other, "unknown CHAINVID_NETWORK, ignoring"),
            }
        }
        if let Ok(v) = std::env::var("CHAINVID_CHUNK_SIZE")
            && let Ok(n) = v.parse()
        {
            self.chunk_size = n;
        }
        if let Ok(v) = std::env::var("CHAINVID_SETTLEMENT_CEILING_GWEI")
            && let Ok(n) = v.parse()
        {
            self.settlement_ceiling_gwei = n;
        }
        if let Ok(v) = std::env::var("CHAINVID_PUBLICATION_CEILING_GWEI")
            && let Ok(n) = v.parse()
        {
            self.publication_ceiling_gwei = n;
        }
        if let Ok(v) = std::env::var("CHAINVID_STAGING_DIR") {
            self.staging_dir = PathBuf::from(v);
        }
    }

    /// Endpoints for the selected network.
    pub fn endpoints(&self) -> &NetworkEndpoints {
        match self.network {
            Network::Mainnet => &self.mainnet,
            Network::Testnet => &self.testnet,
        }
    }

    pub fn fee_limits(&self) -> FeeLimits {
        FeeLimits {
            settlement_ceiling_gwei: self.settlement_ceiling_gwei,
            publication_ceiling_gwei: self.publication_ceiling_gwei,
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("chainvid").join("config.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("chainvid")
            .join("config.toml"))
    }
}
