//! EVM chain client: pool-contract reads and writes over ethers

use crate::adapters::EvmSwapCall;
use crate::config::EvmConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::session::EvmSigner;

use async_trait::async_trait;
use ethers::prelude::*;
use serde::Serialize;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

abigen!(
    SwarmPool,
    r#"[
        function executeSwap(address user, address tokenIn, address tokenOut, uint256 amountIn, uint256 amountOut) external
        function pause() external
        function unpause() external
        function paused() external view returns (bool)
        function maxSwapAmount() external view returns (uint256)
        function owner() external view returns (address)
    ]"#
);

/// Read-only pool state for the admin stats panel
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub paused: bool,
    pub max_swap_amount: String,
    pub owner: String,
}

#[derive(Debug)]
pub struct EvmClient {
    provider: Arc<Provider<Http>>,
    wallet: Option<LocalWallet>,
    pool_address: Option<Address>,
    chain_id: u64,
}

impl EvmClient {
    pub fn new(config: &EvmConfig) -> GatewayResult<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| GatewayError::Config(format!("invalid EVM RPC url: {e}")))?
            .interval(Duration::from_millis(100));

        let pool_address = if config.pool_address.is_empty() {
            None
        } else {
            Some(config.pool_address.parse::<Address>().map_err(|e| {
                GatewayError::Config(format!("invalid pool address {}: {e}", config.pool_address))
            })?)
        };

        let wallet = match config.private_key_env.as_deref() {
            Some(var) => match env::var(var) {
                Ok(key) => {
                    let wallet = key
                        .parse::<LocalWallet>()
                        .map_err(|e| GatewayError::Wallet(format!("invalid private key: {e}")))?
                        .with_chain_id(config.chain_id);
                    Some(wallet)
                }
                Err(_) => {
                    warn!(var, "signer key env var not set - EVM writes disabled");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            provider: Arc::new(provider),
            wallet,
            pool_address,
            chain_id: config.chain_id,
        })
    }

    fn pool_address(&self) -> GatewayResult<Address> {
        self.pool_address
            .ok_or_else(|| GatewayError::Config("no pool address configured".to_string()))
    }

    fn read_pool(&self) -> GatewayResult<SwarmPool<Provider<Http>>> {
        Ok(SwarmPool::new(self.pool_address()?, self.provider.clone()))
    }

    fn signing_pool(&self) -> GatewayResult<SwarmPool<SignerMiddleware<Provider<Http>, LocalWallet>>> {
        let wallet = self
            .wallet
            .clone()
            .ok_or_else(|| GatewayError::Wallet("no signer configured".to_string()))?;
        let client = Arc::new(SignerMiddleware::new((*self.provider).clone(), wallet));
        Ok(SwarmPool::new(self.pool_address()?, client))
    }

    fn connection_error(&self, e: impl std::fmt::Display) -> GatewayError {
        GatewayError::ChainConnection {
            chain: format!("evm:{}", self.chain_id),
            message: e.to_string(),
        }
    }

    /// Native balance of an address, formatted in ether
    pub async fn get_balance(&self, address: &str) -> GatewayResult<String> {
        let address = address
            .parse::<Address>()
            .map_err(|e| GatewayError::Internal(format!("invalid address: {e}")))?;
        let wei = self
            .provider
            .get_balance(address, None)
            .await
            .map_err(|e| self.connection_error(e))?;
        Ok(ethers::utils::format_ether(wei))
    }

    /// Pool state for the admin panel. The three reads are independent, so
    /// they run concurrently.
    pub async fn pool_stats(&self) -> GatewayResult<PoolStats> {
        let pool = self.read_pool()?;

        let paused_call = pool.paused();
        let max_swap_amount_call = pool.max_swap_amount();
        let owner_call = pool.owner();
        let (paused, max_swap_amount, owner) = tokio::try_join!(
            paused_call.call(),
            max_swap_amount_call.call(),
            owner_call.call(),
        )
        .map_err(|e| self.connection_error(e))?;

        Ok(PoolStats {
            paused,
            max_swap_amount: max_swap_amount.to_string(),
            owner: format!("{owner:#x}"),
        })
    }

    /// Pause or unpause the pool contract; returns the transaction hash
    pub async fn toggle_pause(&self, pause: bool) -> GatewayResult<String> {
        let pool = self.signing_pool()?;
        let call = if pause { pool.pause() } else { pool.unpause() };

        let pending = call.send().await.map_err(|e| self.connection_error(e))?;
        let hash = format!("{:#x}", pending.tx_hash());
        info!(%hash, pause, "pool pause toggled");
        Ok(hash)
    }
}

#[async_trait]
impl EvmSigner for EvmClient {
    async fn execute_swap(&self, call: &EvmSwapCall) -> GatewayResult<String> {
        let pool = self.signing_pool()?;

        let parse = |label: &str, s: &str| {
            s.parse::<Address>()
                .map_err(|e| GatewayError::SigningRejected(format!("invalid {label} address: {e}")))
        };
        let user = parse("user", &call.user)?;
        let token_in = parse("token_in", &call.token_in)?;
        let token_out = parse("token_out", &call.token_out)?;

        let amount_in = U256::from_dec_str(&call.amount_in)
            .map_err(|e| GatewayError::SigningRejected(format!("invalid amount: {e}")))?;
        let min_out = U256::from_dec_str(&call.min_amount_out)
            .map_err(|e| GatewayError::SigningRejected(format!("invalid min amount: {e}")))?;

        let swap_call = pool.execute_swap(user, token_in, token_out, amount_in, min_out);
        let pending = swap_call
            .send()
            .await
            .map_err(|e| GatewayError::SigningRejected(e.to_string()))?;

        Ok(format!("{:#x}", pending.tx_hash()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EvmConfig {
        EvmConfig {
            rpc_url: "https://rpc.sepolia.org".into(),
            pool_address: "0x0000000000000000000000000000000000000001".into(),
            private_key_env: None,
            chain_id: 11_155_111,
        }
    }

    #[test]
    fn client_builds_without_a_signer() {
        let client = EvmClient::new(&config()).unwrap();
        assert!(client.wallet.is_none());
        assert!(client.pool_address.is_some());
    }

    #[test]
    fn invalid_pool_address_is_a_config_error() {
        let mut cfg = config();
        cfg.pool_address = "0x...".into();
        let err = EvmClient::new(&cfg).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[tokio::test]
    async fn writes_without_a_signer_are_wallet_errors() {
        let client = EvmClient::new(&config()).unwrap();
        let err = client.toggle_pause(true).await.unwrap_err();
        assert!(matches!(err, GatewayError::Wallet(_)));
    }
}
