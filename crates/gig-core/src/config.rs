//! # Environment Configuration
//!
//! Network selection and fail-fast environment configuration. Required
//! variables are read once at startup and missing values abort before any
//! network call is attempted. There is no process-wide provider or wallet
//! singleton — the resulting [`ChainConfig`] is passed explicitly into the
//! chain connector's constructor.
//!
//! Recognized variables:
//!
//! - `MAINNET_PROVIDER_URL` — JSON-RPC endpoint URL (required)
//! - `DEV_ETH_MNEMONIC` — mnemonic seeding the development node's accounts
//!   (required; the node derives and holds the keys, this process only
//!   records which seed is in play)
//! - `CHAIN_ID` / `NETWORK` — selects the deployed-address table and the
//!   settlement-token address (`CHAIN_ID` wins when both are set)

use std::time::Duration;

use crate::address::Address;
use crate::error::ValidationError;

/// Errors from configuration loading. All fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("required environment variable {name} is not set")]
    MissingVar {
        /// The variable name, for the operator's benefit.
        name: &'static str,
    },

    /// An environment variable is present but malformed.
    #[error("environment variable {name} is invalid: {reason}")]
    InvalidVar {
        /// The variable name.
        name: &'static str,
        /// Description of the problem.
        reason: String,
    },
}

/// Which chain the deployed-address table and token addresses apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// Ethereum mainnet (chain id 1).
    Mainnet,
    /// Public test network (chain id 4).
    Testnet,
    /// Local development node (chain ids 1337 / 31337).
    Development,
}

impl Network {
    /// Resolve a network from a chain id.
    pub fn from_chain_id(chain_id: u64) -> Result<Self, ValidationError> {
        match chain_id {
            1 => Ok(Self::Mainnet),
            4 => Ok(Self::Testnet),
            1337 | 31337 => Ok(Self::Development),
            other => Err(ValidationError::UnknownNetwork {
                value: other.to_string(),
            }),
        }
    }

    /// Resolve a network from its name.
    pub fn from_name(name: &str) -> Result<Self, ValidationError> {
        match name {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "development" | "localhost" => Ok(Self::Development),
            other => Err(ValidationError::UnknownNetwork {
                value: other.to_string(),
            }),
        }
    }

    /// The canonical name of this network.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Development => "development",
        }
    }

    /// The settlement-token (Dai) address for this network, when it is a
    /// well-known deployment. On development networks the token is deployed
    /// fresh and its address lives in the address book instead.
    pub fn settlement_token(&self) -> Option<Address> {
        let hex = match self {
            Self::Mainnet => "0x6b175474e89094c44da98b954eedeac495271d0f",
            Self::Testnet => "0xc7ad46e0b8a400bb3c915120d284aafba8fc4735",
            Self::Development => return None,
        };
        // Infallible: the constants above are well-formed.
        Address::new(hex).ok()
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for the chain connector, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Chain id the endpoint is expected to serve.
    pub chain_id: u64,
    /// Network selection derived from the chain id.
    pub network: Network,
    /// Mnemonic seeding the development node's accounts.
    pub mnemonic: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// How long `send` waits for a transaction to confirm.
    pub confirmation_timeout: Duration,
    /// Receipt polling interval while waiting for confirmation.
    pub poll_interval: Duration,
}

impl ChainConfig {
    /// Create a configuration with default timeouts (30s requests, 60s
    /// confirmation, 500ms polling).
    pub fn new(
        rpc_url: impl Into<String>,
        chain_id: u64,
        mnemonic: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let network = Network::from_chain_id(chain_id).map_err(|e| ConfigError::InvalidVar {
            name: "CHAIN_ID",
            reason: e.to_string(),
        })?;
        Ok(Self {
            rpc_url: rpc_url.into(),
            chain_id,
            network,
            mnemonic: mnemonic.into(),
            request_timeout: Duration::from_secs(30),
            confirmation_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        })
    }

    /// Load configuration from the environment. Fails fast with the name of
    /// the first missing variable; no network call has been made yet.
    pub fn from_env() -> Result<Self, ConfigError> {
        let rpc_url = require_var("MAINNET_PROVIDER_URL")?;
        let mnemonic = require_var("DEV_ETH_MNEMONIC")?;
        let chain_id = match std::env::var("CHAIN_ID") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidVar {
                name: "CHAIN_ID",
                reason: format!("not a decimal integer: {raw}"),
            })?,
            Err(_) => match std::env::var("NETWORK") {
                Ok(name) => match Network::from_name(&name) {
                    Ok(Network::Mainnet) => 1,
                    Ok(Network::Testnet) => 4,
                    Ok(Network::Development) => 1337,
                    Err(e) => {
                        return Err(ConfigError::InvalidVar {
                            name: "NETWORK",
                            reason: e.to_string(),
                        })
                    }
                },
                Err(_) => return Err(ConfigError::MissingVar { name: "CHAIN_ID" }),
            },
        };
        Self::new(rpc_url, chain_id, mnemonic)
    }

    /// Override the confirmation timeout.
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Override the receipt polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar { name }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_from_chain_id() {
        assert_eq!(Network::from_chain_id(1).unwrap(), Network::Mainnet);
        assert_eq!(Network::from_chain_id(4).unwrap(), Network::Testnet);
        assert_eq!(Network::from_chain_id(1337).unwrap(), Network::Development);
        assert_eq!(Network::from_chain_id(31337).unwrap(), Network::Development);
        assert!(Network::from_chain_id(42).is_err());
    }

    #[test]
    fn network_from_name() {
        assert_eq!(Network::from_name("mainnet").unwrap(), Network::Mainnet);
        assert_eq!(Network::from_name("localhost").unwrap(), Network::Development);
        assert!(Network::from_name("rinkeby-classic").is_err());
    }

    #[test]
    fn settlement_token_known_on_public_networks() {
        assert!(Network::Mainnet.settlement_token().is_some());
        assert!(Network::Testnet.settlement_token().is_some());
        assert!(Network::Development.settlement_token().is_none());
    }

    #[test]
    fn config_defaults() {
        let config = ChainConfig::new("http://localhost:8545", 1337, "test test").unwrap();
        assert_eq!(config.network, Network::Development);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.confirmation_timeout, Duration::from_secs(60));
    }

    #[test]
    fn config_rejects_unknown_chain_id() {
        assert!(ChainConfig::new("http://localhost:8545", 42, "m").is_err());
    }

    #[test]
    fn config_builder_overrides() {
        let config = ChainConfig::new("http://localhost:8545", 1337, "m")
            .unwrap()
            .with_confirmation_timeout(Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(50));
        assert_eq!(config.confirmation_timeout, Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn missing_var_error_names_the_variable() {
        let err = ConfigError::MissingVar {
            name: "MAINNET_PROVIDER_URL",
        };
        assert!(err.to_string().contains("MAINNET_PROVIDER_URL"));
    }
}
