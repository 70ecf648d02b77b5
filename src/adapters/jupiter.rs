//! Jupiter aggregator adapter (Solana)

use super::{ChainQuote, Quote, QuoteAdapter, QuoteParams};
use crate::config::{AggregatorConfig, TokenTables};
use crate::error::GatewayResult;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

pub struct JupiterAdapter {
    http: reqwest::Client,
    base_url: String,
    slippage_bps: u64,
    tokens: TokenTables,
}

impl JupiterAdapter {
    pub fn new(aggregator: &AggregatorConfig, tokens: TokenTables) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: aggregator.jupiter_quote_url.trim_end_matches('/').to_string(),
            slippage_bps: aggregator.slippage_bps,
            tokens,
        }
    }

    async fn fetch_quote(&self, input_mint: &str, output_mint: &str, amount: u128) -> Option<Value> {
        let url = format!("{}/quote", self.base_url);
        let result = self
            .http
            .get(&url)
            .query(&[
                ("inputMint", input_mint),
                ("outputMint", output_mint),
                ("amount", &amount.to_string()),
                ("slippageBps", &self.slippage_bps.to_string()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                warn!(input_mint, output_mint, error = %e, "jupiter quote request failed");
                return None;
            }
        };

        match resp.json::<Value>().await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "jupiter quote response was not JSON");
                None
            }
        }
    }

    /// Best-effort: a missing swap transaction does not void the quote, it
    /// just means the trade cannot be executed yet.
    async fn fetch_swap_transaction(&self, user_address: &str, quote: &Value) -> Option<String> {
        let url = format!("{}/swap", self.base_url);
        let body = json!({
            "quoteResponse": quote,
            "userPublicKey": user_address,
            "wrapAndUnwrapSol": true,
        });

        let result = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                warn!(user_address, error = %e, "jupiter swap transaction fetch failed");
                return None;
            }
        };

        match resp.json::<Value>().await {
            Ok(value) => value
                .get("swapTransaction")
                .and_then(Value::as_str)
                .map(str::to_string),
            Err(e) => {
                warn!(error = %e, "jupiter swap response was not JSON");
                None
            }
        }
    }
}

#[async_trait]
impl QuoteAdapter for JupiterAdapter {
    async fn get_quote(&self, params: &QuoteParams) -> GatewayResult<Option<ChainQuote>> {
        let input = self.tokens.resolve_solana(&params.from_asset);
        let output = self.tokens.resolve_solana(&params.to_asset);
        if !input.known {
            debug!(symbol = %params.from_asset, "from-asset not in mint table, passing through as address");
        }

        let Some(raw) = self
            .fetch_quote(&input.address, &output.address, params.amount_base_units)
            .await
        else {
            return Ok(None);
        };

        let expected_out = raw
            .get("outAmount")
            .and_then(Value::as_str)
            .map(str::to_string);

        let swap_transaction = match &params.user_address {
            Some(user) => self.fetch_swap_transaction(user, &raw).await,
            None => None,
        };

        debug!(
            input = %input.address,
            output = %output.address,
            has_tx = swap_transaction.is_some(),
            "jupiter quote acquired"
        );

        Ok(Some(ChainQuote::Solana {
            quote: Quote { expected_out, raw },
            swap_transaction,
        }))
    }
}
