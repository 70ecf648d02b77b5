//! Chain-family quote adapters
//!
//! One adapter per chain family, each translating `(from, to, amount)` into an
//! aggregator quote. Failure policy: network and parse failures are swallowed,
//! logged, and returned as `Ok(None)`; only pre-flight rejections such as an
//! unsupported chain id surface as errors.

pub mod jupiter;
pub mod openocean;

pub use jupiter::JupiterAdapter;
pub use openocean::OpenOceanAdapter;

use crate::error::GatewayResult;
use crate::intent::Chain;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Aggregator quote. Opaque to the pipeline beyond existence; `expected_out`
/// is extracted per-adapter from the raw payload for display purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub expected_out: Option<String>,
    pub raw: serde_json::Value,
}

/// Contract-call parameters for an EVM pool swap, built gateway-side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvmSwapCall {
    pub chain_id: u64,
    pub pool: String,
    pub user: String,
    pub token_in: String,
    pub token_out: String,
    /// Smallest-unit amount, decimal string
    pub amount_in: String,
    pub min_amount_out: String,
}

/// Adapter output, tagged by chain family so downstream stages match
/// exhaustively instead of inspecting loose JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ChainQuote {
    Solana {
        quote: Quote,
        /// Base64-encoded unsigned transaction; absent when the best-effort
        /// swap endpoint failed or no user address was supplied.
        swap_transaction: Option<String>,
    },
    Evm {
        quote: Quote,
        call: EvmSwapCall,
    },
}

/// Request handed to an adapter. The amount is already scaled to the
/// from-asset's smallest unit by the caller.
#[derive(Debug, Clone)]
pub struct QuoteParams {
    pub from_asset: String,
    pub to_asset: String,
    pub amount_base_units: u128,
    pub chain: Chain,
    pub user_address: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteAdapter: Send + Sync {
    /// `Ok(None)` means the aggregator could not produce a quote (network or
    /// parse failure, no route). `Err` is reserved for rejections that happen
    /// before any network call.
    async fn get_quote(&self, params: &QuoteParams) -> GatewayResult<Option<ChainQuote>>;
}
