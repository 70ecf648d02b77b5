//! Intent resolver: free text or structured fields -> canonical intent
//!
//! The resolver is the single place where symbol casing and the chain default
//! are normalized, so both are unit-testable without UI code in the loop.

use crate::intent::{Chain, IntentExtractor, TradeAction, TradeIntent};

use regex::Regex;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Already-structured trade fields (the form-based fast path)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredFields {
    pub action: Option<String>,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub amount: Option<f64>,
    pub chain: Option<String>,
}

pub struct IntentResolver {
    extractor: Arc<dyn IntentExtractor>,
}

impl IntentResolver {
    pub fn new(extractor: Arc<dyn IntentExtractor>) -> Self {
        Self { extractor }
    }

    /// Resolve free text into an intent. Never fails: extractor errors come
    /// back as an `unknown` intent carrying the diagnostic.
    pub async fn resolve_text(&self, message: &str, default_chain: Chain) -> TradeIntent {
        if let Some(intent) = parse_canonical_swap(message, default_chain) {
            debug!(%message, "resolved via canonical swap pattern");
            return intent;
        }

        match self.extractor.extract(message, default_chain).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "intent extraction failed");
                TradeIntent::unknown(e.to_string(), default_chain)
            }
        }
    }

    /// Resolve structured fields into an intent without touching the
    /// extractor. Malformed fields degrade to `unknown`, never to an error.
    pub fn resolve_structured(&self, fields: &StructuredFields, default_chain: Chain) -> TradeIntent {
        let action = match fields.action.as_deref() {
            Some(a) => match TradeAction::from_str(a) {
                Ok(action) => action,
                Err(e) => return TradeIntent::unknown(e.to_string(), default_chain),
            },
            None => TradeAction::Unknown,
        };

        let chain = match fields.chain.as_deref() {
            Some(c) => match Chain::from_str(c) {
                Ok(chain) => chain,
                Err(e) => return TradeIntent::unknown(e.to_string(), default_chain),
            },
            None => default_chain,
        };

        TradeIntent {
            action,
            from_asset: normalize_symbol(fields.from_token.as_deref()),
            to_asset: normalize_symbol(fields.to_token.as_deref()),
            amount: fields.amount.unwrap_or(0.0),
            chain,
            reasoning: format!("structured request: {action}"),
        }
    }
}

fn normalize_symbol(symbol: Option<&str>) -> String {
    symbol.unwrap_or_default().trim().to_uppercase()
}

fn swap_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*swap\s+([0-9]*\.?[0-9]+)\s+([A-Za-z0-9]+)\s+(?:to|for|into)\s+([A-Za-z0-9]+)(?:\s+on\s+([A-Za-z]+))?\s*$",
        )
        .expect("canonical swap pattern must compile")
    })
}

/// Local fast path for the canonical `swap <amount> <sym> to <sym> [on <chain>]`
/// shape. Anything else goes to the extractor.
fn parse_canonical_swap(message: &str, default_chain: Chain) -> Option<TradeIntent> {
    let caps = swap_pattern().captures(message)?;
    let amount: f64 = caps[1].parse().ok()?;
    let from_asset = caps[2].to_uppercase();
    let to_asset = caps[3].to_uppercase();

    let chain = match caps.get(4) {
        Some(name) => Chain::from_str(name.as_str()).ok()?,
        None => {
            // SOL on either side implies the Solana path
            if from_asset == "SOL" || to_asset == "SOL" {
                Chain::Solana
            } else {
                default_chain
            }
        }
    };

    Some(TradeIntent {
        action: TradeAction::Swap,
        from_asset,
        to_asset,
        amount,
        chain,
        reasoning: format!("parsed swap request from message: {}", message.trim()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::intent::extractor::MockIntentExtractor;

    fn resolver_with_mock(mock: MockIntentExtractor) -> IntentResolver {
        IntentResolver::new(Arc::new(mock))
    }

    #[test]
    fn canonical_swap_pattern_compiles_and_matches_variants() {
        assert!(swap_pattern().is_match("swap 0.5 eth for usdc on sepolia"));
        assert!(swap_pattern().is_match("SWAP 2 SOL into USDC"));
        assert!(!swap_pattern().is_match("please swap things around"));
    }

    #[tokio::test]
    async fn canonical_swap_text_resolves_without_extractor() {
        let mut mock = MockIntentExtractor::new();
        mock.expect_extract().times(0);
        let resolver = resolver_with_mock(mock);

        let intent = resolver.resolve_text("swap 1 sol to usdc", Chain::Ethereum).await;
        assert_eq!(intent.action, TradeAction::Swap);
        assert_eq!(intent.from_asset, "SOL");
        assert_eq!(intent.to_asset, "USDC");
        assert_eq!(intent.amount, 1.0);
        assert_eq!(intent.chain, Chain::Solana);
    }

    #[tokio::test]
    async fn free_text_delegates_to_extractor() {
        let mut mock = MockIntentExtractor::new();
        mock.expect_extract().times(1).returning(|_, chain| {
            Ok(TradeIntent {
                action: TradeAction::Balance,
                from_asset: String::new(),
                to_asset: String::new(),
                amount: 0.0,
                chain,
                reasoning: "balance check".into(),
            })
        });
        let resolver = resolver_with_mock(mock);

        let intent = resolver
            .resolve_text("how much do I have?", Chain::Solana)
            .await;
        assert_eq!(intent.action, TradeAction::Balance);
        assert_eq!(intent.chain, Chain::Solana);
    }

    #[tokio::test]
    async fn extractor_failure_yields_unknown_not_error() {
        let mut mock = MockIntentExtractor::new();
        mock.expect_extract().times(1).returning(|_, _| {
            Err(GatewayError::IntentUnresolved("extractor request failed: timeout".into()))
        });
        let resolver = resolver_with_mock(mock);

        let intent = resolver.resolve_text("do something weird", Chain::Ethereum).await;
        assert_eq!(intent.action, TradeAction::Unknown);
        assert!(intent.reasoning.contains("timeout"));
    }

    #[test]
    fn structured_fields_take_the_fast_path() {
        let resolver = resolver_with_mock(MockIntentExtractor::new());
        let fields = StructuredFields {
            action: Some("swap".into()),
            from_token: Some(" sol ".into()),
            to_token: Some("usdc".into()),
            amount: Some(2.5),
            chain: Some("Solana".into()),
        };

        let intent = resolver.resolve_structured(&fields, Chain::Ethereum);
        assert_eq!(intent.action, TradeAction::Swap);
        assert_eq!(intent.from_asset, "SOL");
        assert_eq!(intent.to_asset, "USDC");
        assert_eq!(intent.amount, 2.5);
        assert_eq!(intent.chain, Chain::Solana);
    }

    #[test]
    fn structured_unknown_chain_degrades_to_unknown_intent() {
        let resolver = resolver_with_mock(MockIntentExtractor::new());
        let fields = StructuredFields {
            action: Some("swap".into()),
            from_token: Some("ETH".into()),
            to_token: Some("USDT".into()),
            amount: Some(1.0),
            chain: Some("fantom".into()),
        };

        let intent = resolver.resolve_structured(&fields, Chain::Ethereum);
        assert_eq!(intent.action, TradeAction::Unknown);
        assert!(intent.reasoning.contains("fantom"));
    }

    #[test]
    fn missing_chain_uses_the_wallet_default() {
        let resolver = resolver_with_mock(MockIntentExtractor::new());
        let fields = StructuredFields {
            action: Some("swap".into()),
            from_token: Some("ETH".into()),
            to_token: Some("USDT".into()),
            amount: Some(1.0),
            chain: None,
        };

        let intent = resolver.resolve_structured(&fields, Chain::Sepolia);
        assert_eq!(intent.chain, Chain::Sepolia);
    }
}
