//! Auction Config - Configuration management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub deployment: DeploymentConfig,
    #[serde(default)]
    pub bid: BidConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub private_key: String,
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
}

// The signing key must never reach a log line.
impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("private_key", &"<redacted>")
            .field("rpc_timeout_secs", &self.rpc_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Truffle build output holding `abi` and `bytecode`
    pub artifact_path: String,
    /// Constructor arguments, tokenized against the ABI constructor inputs
    #[serde(default)]
    pub constructor_args: Vec<String>,
    pub gas_limit: u64,
    pub gas_price_gwei: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidConfig {
    pub gas_limit: u64,
    pub gas_price_gwei: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

pub const DEFAULT_RPC_URL: &str = "http://localhost:7545";
pub const DEFAULT_ARTIFACT_PATH: &str = "./build/contracts/SimpleAuction.json";
pub const DEFAULT_CONSTRUCTOR_ARGS: &[&str] = &["3000", "0xb95A8c720bbDD408f97CccF07de6ceD493bDbc74"];

fn default_rpc_timeout_secs() -> u64 {
    10
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            artifact_path: DEFAULT_ARTIFACT_PATH.to_string(),
            constructor_args: DEFAULT_CONSTRUCTOR_ARGS.iter().map(|s| s.to_string()).collect(),
            gas_limit: 1_728_712,
            gas_price_gwei: 21,
        }
    }
}

impl Default for BidConfig {
    fn default() -> Self {
        Self {
            gas_limit: 2_000_000,
            gas_price_gwei: 40,
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            timeout_secs: 120,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            anyhow::bail!("rpc_url must start with http:// or https://, got: {}", self.rpc_url);
        }
        if self.private_key.trim().is_empty() {
            anyhow::bail!("private_key cannot be empty");
        }
        if self.rpc_timeout_secs == 0 {
            anyhow::bail!("rpc_timeout_secs must be greater than 0");
        }
        Ok(())
    }
}

impl DeploymentConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.artifact_path.is_empty() {
            anyhow::bail!("deployment artifact_path cannot be empty");
        }
        if self.gas_limit == 0 {
            anyhow::bail!("deployment gas_limit must be greater than 0");
        }
        Ok(())
    }
}

impl ConfirmationConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_ms == 0 {
            anyhow::bail!("confirmation poll_interval_ms must be greater than 0");
        }
        if self.timeout_secs.saturating_mul(1000) < self.poll_interval_ms {
            anyhow::bail!(
                "confirmation timeout ({}s) is shorter than the poll interval ({}ms)",
                self.timeout_secs,
                self.poll_interval_ms
            );
        }
        Ok(())
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;

        // Keep the key out of the file if possible.
        if config.network.private_key.trim().is_empty() {
            dotenv::dotenv().ok();
            config.network.private_key = std::env::var("PRIVATE_KEY").unwrap_or_default();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn load_from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source; `load_from_env` passes
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str, default: u64| -> anyhow::Result<u64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("{} is not a valid integer: {}", key, e)),
                None => Ok(default),
            }
        };

        let deployment_defaults = DeploymentConfig::default();
        let bid_defaults = BidConfig::default();
        let confirmation_defaults = ConfirmationConfig::default();

        let config = Config {
            network: NetworkConfig {
                rpc_url: lookup("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
                chain_id: parsed("CHAIN_ID", 1337)?,
                private_key: lookup("PRIVATE_KEY").unwrap_or_default(),
                rpc_timeout_secs: parsed("RPC_TIMEOUT_SECS", default_rpc_timeout_secs())?,
            },
            deployment: DeploymentConfig {
                artifact_path: lookup("ARTIFACT_PATH").unwrap_or(deployment_defaults.artifact_path),
                constructor_args: lookup("CONSTRUCTOR_ARGS")
                    .map(|raw| split_args(&raw))
                    .unwrap_or(deployment_defaults.constructor_args),
                gas_limit: parsed("DEPLOY_GAS_LIMIT", deployment_defaults.gas_limit)?,
                gas_price_gwei: parsed("DEPLOY_GAS_PRICE_GWEI", deployment_defaults.gas_price_gwei)?,
            },
            bid: BidConfig {
                gas_limit: parsed("BID_GAS_LIMIT", bid_defaults.gas_limit)?,
                gas_price_gwei: parsed("BID_GAS_PRICE_GWEI", bid_defaults.gas_price_gwei)?,
            },
            confirmation: ConfirmationConfig {
                poll_interval_ms: parsed("POLL_INTERVAL_MS", confirmation_defaults.poll_interval_ms)?,
                timeout_secs: parsed("CONFIRMATION_TIMEOUT_SECS", confirmation_defaults.timeout_secs)?,
            },
            server: ServerConfig {
                listen_addr: lookup("LISTEN_ADDR").unwrap_or_else(|| ServerConfig::default().listen_addr),
            },
            monitoring: MonitoringConfig {
                log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                json_logs: lookup("LOG_JSON")
                    .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                    .unwrap_or(false),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.network.validate()?;
        self.deployment.validate()?;
        if self.bid.gas_limit == 0 {
            anyhow::bail!("bid gas_limit must be greater than 0");
        }
        self.confirmation.validate()?;
        Ok(())
    }
}

fn split_args(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
