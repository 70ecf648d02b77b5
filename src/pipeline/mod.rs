//! Intent-to-execution pipeline
//!
//! Validates a resolved intent, routes it to the chain-appropriate quote
//! adapter, and assembles the execution payload. Stateless and
//! request-scoped; the confirmation machine in `session` owns anything that
//! outlives a single invocation.

pub mod payload;
pub mod router;

pub use payload::ExecutionPayload;
pub use router::AdapterKind;

use crate::adapters::{QuoteAdapter, QuoteParams};
use crate::config::TokenTables;
use crate::error::{GatewayError, GatewayResult};
use crate::intent::{TradeAction, TradeIntent};

use std::sync::Arc;
use tracing::{debug, info};

pub struct TradePipeline {
    solana: Arc<dyn QuoteAdapter>,
    evm: Arc<dyn QuoteAdapter>,
    tokens: TokenTables,
}

impl TradePipeline {
    pub fn new(
        solana: Arc<dyn QuoteAdapter>,
        evm: Arc<dyn QuoteAdapter>,
        tokens: TokenTables,
    ) -> Self {
        Self { solana, evm, tokens }
    }

    /// Run a swap intent through quote acquisition and payload assembly.
    /// All validation happens before chain routing, so a bad intent never
    /// costs a network call.
    pub async fn execute(
        &self,
        intent: &TradeIntent,
        user_address: Option<&str>,
    ) -> GatewayResult<ExecutionPayload> {
        match intent.action {
            TradeAction::Unknown => {
                return Err(GatewayError::IntentUnresolved(intent.reasoning.clone()));
            }
            TradeAction::Swap => {}
            other => return Err(GatewayError::NotExecutable(other.to_string())),
        }

        if !(intent.amount > 0.0) || !intent.amount.is_finite() {
            return Err(GatewayError::InvalidAmount);
        }

        let params = QuoteParams {
            from_asset: intent.from_asset.clone(),
            to_asset: intent.to_asset.clone(),
            amount_base_units: self.to_base_units(intent),
            chain: intent.chain,
            user_address: user_address.map(str::to_string),
        };

        debug!(chain = %intent.chain, from = %intent.from_asset, to = %intent.to_asset, "requesting quote");

        let adapter = match router::route(intent.chain) {
            AdapterKind::Solana => &self.solana,
            AdapterKind::Evm => &self.evm,
        };

        let chain_quote = adapter.get_quote(&params).await?.ok_or_else(|| {
            GatewayError::QuoteUnavailable {
                chain: intent.chain.to_string(),
                pair: format!("{}->{}", intent.from_asset, intent.to_asset),
            }
        })?;

        let payload = payload::build(intent, chain_quote)?;
        info!(
            chain = %intent.chain,
            executable = payload.can_execute(),
            "execution payload assembled"
        );
        Ok(payload)
    }

    /// Scale the asset-native amount to the from-asset's smallest unit.
    /// Decimal scaling is the pipeline's job, not the adapter's.
    fn to_base_units(&self, intent: &TradeIntent) -> u128 {
        let decimals = if intent.chain.is_solana() {
            self.tokens.resolve_solana(&intent.from_asset).decimals
        } else {
            self.tokens.resolve_evm(&intent.from_asset).decimals
        };
        (intent.amount * 10f64.powi(decimals as i32)).round() as u128
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ChainQuote, MockQuoteAdapter, Quote};
    use crate::config::TokenInfo;
    use crate::intent::Chain;
    use std::collections::HashMap;

    fn tables() -> TokenTables {
        let mut solana = HashMap::new();
        solana.insert(
            "SOL".to_string(),
            TokenInfo {
                address: "So11111111111111111111111111111111111111112".into(),
                decimals: 9,
            },
        );
        let mut evm = HashMap::new();
        evm.insert(
            "ETH".to_string(),
            TokenInfo {
                address: "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE".into(),
                decimals: 18,
            },
        );
        TokenTables { solana, evm }
    }

    fn swap_intent(chain: Chain) -> TradeIntent {
        TradeIntent {
            action: TradeAction::Swap,
            from_asset: "SOL".into(),
            to_asset: "USDC".into(),
            amount: 1.0,
            chain,
            reasoning: "test".into(),
        }
    }

    fn solana_quote() -> ChainQuote {
        ChainQuote::Solana {
            quote: Quote {
                expected_out: Some("1000000".into()),
                raw: serde_json::json!({}),
            },
            swap_transaction: Some("AQID".into()),
        }
    }

    fn pipeline(solana: MockQuoteAdapter, evm: MockQuoteAdapter) -> TradePipeline {
        TradePipeline::new(Arc::new(solana), Arc::new(evm), tables())
    }

    #[tokio::test]
    async fn unknown_intent_makes_no_adapter_calls() {
        let mut solana = MockQuoteAdapter::new();
        let mut evm = MockQuoteAdapter::new();
        solana.expect_get_quote().times(0);
        evm.expect_get_quote().times(0);

        let mut intent = swap_intent(Chain::Solana);
        intent.action = TradeAction::Unknown;
        intent.reasoning = "could not parse".into();

        let err = pipeline(solana, evm).execute(&intent, None).await.unwrap_err();
        assert!(matches!(err, GatewayError::IntentUnresolved(r) if r == "could not parse"));
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected_before_routing() {
        let mut solana = MockQuoteAdapter::new();
        let mut evm = MockQuoteAdapter::new();
        solana.expect_get_quote().times(0);
        evm.expect_get_quote().times(0);

        let mut intent = swap_intent(Chain::Solana);
        intent.amount = 0.0;

        let err = pipeline(solana, evm).execute(&intent, None).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidAmount));
    }

    #[tokio::test]
    async fn solana_intents_hit_the_solana_adapter_with_scaled_amount() {
        let mut solana = MockQuoteAdapter::new();
        let mut evm = MockQuoteAdapter::new();
        evm.expect_get_quote().times(0);
        solana
            .expect_get_quote()
            .withf(|params| params.amount_base_units == 1_000_000_000)
            .times(1)
            .returning(|_| Ok(Some(solana_quote())));

        let payload = pipeline(solana, evm)
            .execute(&swap_intent(Chain::Solana), Some("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"))
            .await
            .unwrap();
        assert!(payload.can_execute());
    }

    #[tokio::test]
    async fn adapter_none_surfaces_as_quote_unavailable() {
        let mut solana = MockQuoteAdapter::new();
        let evm = MockQuoteAdapter::new();
        solana.expect_get_quote().times(1).returning(|_| Ok(None));

        let err = pipeline(solana, evm)
            .execute(&swap_intent(Chain::Solana), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::QuoteUnavailable { .. }));
    }

    #[tokio::test]
    async fn non_swap_actions_never_reach_an_adapter() {
        let mut solana = MockQuoteAdapter::new();
        let mut evm = MockQuoteAdapter::new();
        solana.expect_get_quote().times(0);
        evm.expect_get_quote().times(0);

        let mut intent = swap_intent(Chain::Ethereum);
        intent.action = TradeAction::Bridge;

        let err = pipeline(solana, evm).execute(&intent, None).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotExecutable(a) if a == "bridge"));
    }
}
