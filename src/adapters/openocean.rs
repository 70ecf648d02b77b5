//! OpenOcean aggregator adapter (EVM chains)
//!
//! Returns a quote only; the execution payload is a local pool-contract call,
//! not an aggregator-built transaction.

use super::{ChainQuote, EvmSwapCall, Quote, QuoteAdapter, QuoteParams};
use crate::config::{AggregatorConfig, EvmConfig, TokenTables};
use crate::error::{GatewayError, GatewayResult};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

pub struct OpenOceanAdapter {
    http: reqwest::Client,
    base_url: String,
    pool_address: String,
    tokens: TokenTables,
}

impl OpenOceanAdapter {
    pub fn new(aggregator: &AggregatorConfig, evm: &EvmConfig, tokens: TokenTables) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: aggregator.openocean_url.trim_end_matches('/').to_string(),
            pool_address: evm.pool_address.clone(),
            tokens,
        }
    }

    async fn fetch_quote(
        &self,
        chain_id: u64,
        in_token: &str,
        out_token: &str,
        amount_native: f64,
    ) -> Option<Value> {
        // OpenOcean's v3 quote endpoint takes asset-native amounts
        let url = format!("{}/{}/quote", self.base_url, chain_id);
        let result = self
            .http
            .get(&url)
            .query(&[
                ("inTokenAddress", in_token),
                ("outTokenAddress", out_token),
                ("amount", &amount_native.to_string()),
                ("gasPrice", "5"),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                warn!(chain_id, in_token, out_token, error = %e, "openocean quote request failed");
                return None;
            }
        };

        match resp.json::<Value>().await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "openocean quote response was not JSON");
                None
            }
        }
    }
}

#[async_trait]
impl QuoteAdapter for OpenOceanAdapter {
    async fn get_quote(&self, params: &QuoteParams) -> GatewayResult<Option<ChainQuote>> {
        // Closed chain-id mapping: a chain without aggregator liquidity is
        // rejected before any network call rather than silently defaulted.
        let chain_id = params
            .chain
            .evm_chain_id()
            .ok_or_else(|| GatewayError::UnsupportedChain(params.chain.to_string()))?;

        let token_in = self.tokens.resolve_evm(&params.from_asset);
        let token_out = self.tokens.resolve_evm(&params.to_asset);

        let amount_native =
            params.amount_base_units as f64 / 10f64.powi(token_in.decimals as i32);

        let Some(raw) = self
            .fetch_quote(chain_id, &token_in.address, &token_out.address, amount_native)
            .await
        else {
            return Ok(None);
        };

        let expected_out = raw
            .pointer("/data/outAmount")
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        debug!(chain_id, token_in = %token_in.address, "openocean quote acquired");

        let call = EvmSwapCall {
            chain_id,
            pool: self.pool_address.clone(),
            user: params.user_address.clone().unwrap_or_default(),
            token_in: token_in.address,
            token_out: token_out.address,
            amount_in: params.amount_base_units.to_string(),
            min_amount_out: "0".to_string(),
        };

        Ok(Some(ChainQuote::Evm {
            quote: Quote { expected_out, raw },
            call,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenInfo;
    use crate::intent::Chain;
    use std::collections::HashMap;

    fn adapter() -> OpenOceanAdapter {
        let mut evm = HashMap::new();
        evm.insert(
            "ETH".to_string(),
            TokenInfo {
                address: "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE".into(),
                decimals: 18,
            },
        );
        evm.insert(
            "USDT".to_string(),
            TokenInfo {
                address: "0xdAC17F958D2ee523a2206206994597C13D831ec7".into(),
                decimals: 6,
            },
        );
        OpenOceanAdapter::new(
            &AggregatorConfig {
                jupiter_quote_url: "https://quote.invalid/v6".into(),
                jupiter_price_url: "https://price.invalid/v2".into(),
                openocean_url: "https://openocean.invalid/v3".into(),
                slippage_bps: 50,
            },
            &EvmConfig {
                rpc_url: "https://rpc.invalid".into(),
                pool_address: "0x0000000000000000000000000000000000000001".into(),
                private_key_env: None,
                chain_id: 11_155_111,
            },
            TokenTables { solana: HashMap::new(), evm },
        )
    }

    #[tokio::test]
    async fn chains_without_aggregator_support_fail_loudly() {
        let adapter = adapter();
        let err = adapter
            .get_quote(&QuoteParams {
                from_asset: "ETH".into(),
                to_asset: "USDT".into(),
                amount_base_units: 10u128.pow(18),
                chain: Chain::Monad,
                user_address: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedChain(name) if name == "monad"));
    }

    #[tokio::test]
    async fn aggregator_failure_yields_none() {
        let adapter = adapter();
        let result = adapter
            .get_quote(&QuoteParams {
                from_asset: "ETH".into(),
                to_asset: "USDT".into(),
                amount_base_units: 10u128.pow(18),
                chain: Chain::Sepolia,
                user_address: Some("0xdAC17F958D2ee523a2206206994597C13D831ec7".into()),
            })
            .await;
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn evm_symbols_resolve_to_checksummed_addresses() {
        let adapter = adapter();
        let usdt = adapter.tokens.resolve_evm("usdt");
        assert_eq!(usdt.address, "0xdAC17F958D2ee523a2206206994597C13D831ec7");
        assert_eq!(usdt.decimals, 6);
    }
}
