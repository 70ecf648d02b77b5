//! Chain-specific signing dispatch
//!
//! Consumes a confirmed `PendingTrade` and drives the chain-appropriate
//! signing path behind narrow signer traits, so the state machine can be
//! tested without a wallet or an RPC node.

use crate::adapters::EvmSwapCall;
use crate::error::{GatewayError, GatewayResult};
use crate::intent::Chain;
use crate::pipeline::ExecutionPayload;
use crate::session::PendingTrade;

use async_trait::async_trait;
use base64::Engine as _;
use serde::Serialize;
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;
use tracing::{info, warn};

/// Settled trade: the chain accepted the transaction
#[derive(Debug, Clone, Serialize)]
pub struct TradeOutcome {
    pub chain: Chain,
    /// Solana signature or EVM transaction hash
    pub reference: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SolanaSigner: Send + Sync {
    /// Sign with the connected wallet and broadcast; returns the signature
    async fn sign_and_send(&self, tx: VersionedTransaction) -> GatewayResult<String>;
    /// One-shot confirmation poll keyed by signature
    async fn confirm(&self, signature: &str) -> GatewayResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EvmSigner: Send + Sync {
    /// Submit the pool `executeSwap` call; hash acceptance is settlement
    async fn execute_swap(&self, call: &EvmSwapCall) -> GatewayResult<String>;
}

pub struct TradeExecutor {
    solana: Arc<dyn SolanaSigner>,
    evm: Arc<dyn EvmSigner>,
}

impl TradeExecutor {
    pub fn new(solana: Arc<dyn SolanaSigner>, evm: Arc<dyn EvmSigner>) -> Self {
        Self { solana, evm }
    }

    /// Dispatch a confirmed trade down its chain's signing path
    pub async fn dispatch(&self, trade: &PendingTrade) -> GatewayResult<TradeOutcome> {
        match &trade.payload {
            ExecutionPayload::Solana { swap_transaction, .. } => {
                let blob = swap_transaction.as_ref().ok_or_else(|| {
                    GatewayError::SigningRejected(
                        "quote has no signable transaction yet".to_string(),
                    )
                })?;

                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(blob)
                    .map_err(|e| {
                        GatewayError::SigningRejected(format!("malformed transaction blob: {e}"))
                    })?;
                let tx: VersionedTransaction = bincode::deserialize(&bytes).map_err(|e| {
                    GatewayError::SigningRejected(format!("undecodable transaction: {e}"))
                })?;

                let signature = self.solana.sign_and_send(tx).await?;
                info!(%signature, "solana transaction broadcast, awaiting confirmation");
                self.solana.confirm(&signature).await?;

                Ok(TradeOutcome { chain: trade.chain, reference: signature })
            }
            ExecutionPayload::Evm { call, .. } => {
                if call.user.is_empty() {
                    return Err(GatewayError::SigningRejected(
                        "no EVM user address on the pending trade".to_string(),
                    ));
                }

                // Broadcast, not confirmation depth, defines settlement here
                let hash = self.evm.execute_swap(call).await?;
                info!(%hash, chain_id = call.chain_id, "evm swap submitted");
                Ok(TradeOutcome { chain: trade.chain, reference: hash })
            }
        }
    }
}

/// Soften any signer error into the terminal `SigningRejected`, keeping the
/// message verbatim for the user.
pub fn as_signing_rejection(err: GatewayError) -> GatewayError {
    match err {
        e @ GatewayError::SigningRejected(_) => e,
        other => {
            warn!(error = %other, "signing path failed");
            GatewayError::SigningRejected(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Quote;
    use crate::intent::{TradeAction, TradeIntent};

    fn evm_trade() -> PendingTrade {
        PendingTrade {
            intent: TradeIntent {
                action: TradeAction::Swap,
                from_asset: "ETH".into(),
                to_asset: "USDT".into(),
                amount: 1.0,
                chain: Chain::Sepolia,
                reasoning: "test".into(),
            },
            payload: ExecutionPayload::Evm {
                quote: Quote { expected_out: None, raw: serde_json::json!({}) },
                call: EvmSwapCall {
                    chain_id: 11_155_111,
                    pool: "0x0000000000000000000000000000000000000001".into(),
                    user: "0xdAC17F958D2ee523a2206206994597C13D831ec7".into(),
                    token_in: "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE".into(),
                    token_out: "0xdAC17F958D2ee523a2206206994597C13D831ec7".into(),
                    amount_in: "1000000000000000000".into(),
                    min_amount_out: "0".into(),
                },
            },
            chain: Chain::Sepolia,
            generation: 1,
        }
    }

    fn solana_trade(blob: Option<String>) -> PendingTrade {
        PendingTrade {
            intent: TradeIntent {
                action: TradeAction::Swap,
                from_asset: "SOL".into(),
                to_asset: "USDC".into(),
                amount: 1.0,
                chain: Chain::Solana,
                reasoning: "test".into(),
            },
            payload: ExecutionPayload::Solana {
                quote: Quote { expected_out: None, raw: serde_json::json!({}) },
                swap_transaction: blob,
            },
            chain: Chain::Solana,
            generation: 1,
        }
    }

    #[tokio::test]
    async fn evm_trade_settles_on_hash_acceptance() {
        let solana = MockSolanaSigner::new();
        let mut evm = MockEvmSigner::new();
        evm.expect_execute_swap()
            .times(1)
            .returning(|_| Ok("0xabc123".to_string()));

        let executor = TradeExecutor::new(Arc::new(solana), Arc::new(evm));
        let outcome = executor.dispatch(&evm_trade()).await.unwrap();
        assert_eq!(outcome.reference, "0xabc123");
        assert_eq!(outcome.chain, Chain::Sepolia);
    }

    #[tokio::test]
    async fn solana_trade_without_blob_is_rejected_before_signing() {
        let mut solana = MockSolanaSigner::new();
        solana.expect_sign_and_send().times(0);
        let evm = MockEvmSigner::new();

        let executor = TradeExecutor::new(Arc::new(solana), Arc::new(evm));
        let err = executor.dispatch(&solana_trade(None)).await.unwrap_err();
        assert!(matches!(err, GatewayError::SigningRejected(m) if m.contains("no signable")));
    }

    #[tokio::test]
    async fn malformed_blob_is_a_signing_rejection() {
        let mut solana = MockSolanaSigner::new();
        solana.expect_sign_and_send().times(0);
        let evm = MockEvmSigner::new();

        let executor = TradeExecutor::new(Arc::new(solana), Arc::new(evm));
        let err = executor
            .dispatch(&solana_trade(Some("not-base64!!".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::SigningRejected(_)));
    }

    #[tokio::test]
    async fn wallet_error_surfaces_verbatim() {
        let solana = MockSolanaSigner::new();
        let mut evm = MockEvmSigner::new();
        evm.expect_execute_swap().times(1).returning(|_| {
            Err(GatewayError::SigningRejected("User rejected the request".into()))
        });

        let executor = TradeExecutor::new(Arc::new(solana), Arc::new(evm));
        let err = executor.dispatch(&evm_trade()).await.unwrap_err();
        assert!(matches!(err, GatewayError::SigningRejected(m) if m == "User rejected the request"));
    }
}
