//! Configuration management for the BitSwarp gateway
//!
//! Loads configuration from TOML files with environment variable substitution.
//! Token lookup tables live here rather than in code so a testnet deployment
//! only needs a different config file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub intent: IntentConfig,
    pub solana: SolanaConfig,
    pub evm: EvmConfig,
    pub aggregator: AggregatorConfig,
    pub tokens: TokenTables,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for the /admin surface (x-admin-key header)
    pub admin_key: String,
    /// Prefix for issued agent API keys
    #[serde(default = "default_key_prefix")]
    pub agent_key_prefix: String,
}

fn default_key_prefix() -> String {
    "bitswarp_sk_".to_string()
}

/// Intent extractor collaborator (OpenAI-compatible chat endpoint)
#[derive(Debug, Clone, Deserialize)]
pub struct IntentConfig {
    pub extractor_url: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_extractor_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_extractor_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolanaConfig {
    pub rpc_url: String,
    /// Path to the gateway signer keypair; absent means sign-and-send is disabled
    pub keypair_path: Option<String>,
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
}

fn default_confirm_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvmConfig {
    pub rpc_url: String,
    /// Swap pool contract address
    pub pool_address: String,
    /// Env var holding the gateway signer private key; absent means read-only
    pub private_key_env: Option<String>,
    /// Chain id the pool contract and signer operate on
    pub chain_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    pub jupiter_quote_url: String,
    pub jupiter_price_url: String,
    pub openocean_url: String,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u64,
}

fn default_slippage_bps() -> u64 {
    50
}

/// Per-chain-family symbol lookup tables
#[derive(Debug, Clone, Deserialize)]
pub struct TokenTables {
    pub solana: HashMap<String, TokenInfo>,
    pub evm: HashMap<String, TokenInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    /// Mint address (Solana) or checksummed token address (EVM)
    pub address: String,
    pub decimals: u8,
}

/// Result of a symbol lookup: a table hit or a literal-address passthrough
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToken {
    pub address: String,
    pub decimals: u8,
    pub known: bool,
}

impl TokenTables {
    /// Resolve a Solana symbol to a mint; unknown symbols pass through
    /// literally with native 9-decimal scaling.
    pub fn resolve_solana(&self, symbol: &str) -> ResolvedToken {
        Self::resolve(&self.solana, symbol, 9)
    }

    /// Resolve an EVM symbol to a token address; unknown symbols pass through
    /// literally with 18-decimal scaling.
    pub fn resolve_evm(&self, symbol: &str) -> ResolvedToken {
        Self::resolve(&self.evm, symbol, 18)
    }

    fn resolve(table: &HashMap<String, TokenInfo>, symbol: &str, default_decimals: u8) -> ResolvedToken {
        let key = symbol.trim().to_uppercase();
        match table.get(&key) {
            Some(info) => ResolvedToken {
                address: info.address.clone(),
                decimals: info.decimals,
                known: true,
            },
            None => ResolvedToken {
                address: symbol.trim().to_string(),
                decimals: default_decimals,
                known: false,
            },
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = env::var("BITSWARP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from an explicit path
    pub fn load_from(config_path: &PathBuf) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.auth.admin_key.is_empty() {
            anyhow::bail!("auth.admin_key must not be empty");
        }

        if self.tokens.solana.is_empty() {
            anyhow::bail!("tokens.solana table must not be empty");
        }
        if self.tokens.evm.is_empty() {
            anyhow::bail!("tokens.evm table must not be empty");
        }

        if self.evm.pool_address.is_empty() {
            tracing::warn!("evm.pool_address is empty - EVM execution will be unavailable");
        }

        if self.aggregator.slippage_bps == 0 || self.aggregator.slippage_bps > 5_000 {
            anyhow::bail!(
                "aggregator.slippage_bps must be in 1..=5000, got {}",
                self.aggregator.slippage_bps
            );
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
