//! Execution payload assembly
//!
//! Pure merge of intent and adapter output; no network calls. Only swap
//! intents produce a payload, and each chain family keeps its own variant so
//! the signing machine can match exhaustively.

use crate::adapters::{ChainQuote, EvmSwapCall, Quote};
use crate::error::{GatewayError, GatewayResult};
use crate::intent::TradeIntent;

use serde::Serialize;

/// The minimal bundle the confirmation step needs
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "chain_family", rename_all = "snake_case")]
pub enum ExecutionPayload {
    Solana {
        quote: Quote,
        /// Base64-encoded unsigned transaction. Absent means "quote present,
        /// cannot execute yet".
        swap_transaction: Option<String>,
    },
    Evm {
        quote: Quote,
        call: EvmSwapCall,
    },
}

impl ExecutionPayload {
    pub fn can_execute(&self) -> bool {
        match self {
            ExecutionPayload::Solana { swap_transaction, .. } => swap_transaction.is_some(),
            ExecutionPayload::Evm { .. } => true,
        }
    }
}

/// Build the execution payload for a swap intent
pub fn build(intent: &TradeIntent, chain_quote: ChainQuote) -> GatewayResult<ExecutionPayload> {
    if !intent.is_executable_action() {
        return Err(GatewayError::NotExecutable(intent.action.to_string()));
    }

    let payload = match chain_quote {
        ChainQuote::Solana { quote, swap_transaction } => ExecutionPayload::Solana {
            quote,
            swap_transaction,
        },
        ChainQuote::Evm { quote, call } => ExecutionPayload::Evm { quote, call },
    };

    Ok(payload)
}
