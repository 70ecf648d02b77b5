//! Trade intent model and resolution
//!
//! Turns raw user input (free text or structured fields) into a canonical
//! [`TradeIntent`]. Resolution never fails: anything the extractor cannot
//! handle comes back as `action = unknown` with a diagnostic, so callers
//! render a message instead of crashing.

pub mod extractor;
pub mod resolver;

pub use extractor::{HttpIntentExtractor, IntentExtractor};
pub use resolver::{IntentResolver, StructuredFields};

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the user wants to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Swap,
    Bridge,
    Stake,
    Balance,
    Unknown,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeAction::Swap => "swap",
            TradeAction::Bridge => "bridge",
            TradeAction::Stake => "stake",
            TradeAction::Balance => "balance",
            TradeAction::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl FromStr for TradeAction {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "swap" => Ok(TradeAction::Swap),
            "bridge" => Ok(TradeAction::Bridge),
            "stake" => Ok(TradeAction::Stake),
            "balance" => Ok(TradeAction::Balance),
            "unknown" | "" => Ok(TradeAction::Unknown),
            other => Err(GatewayError::IntentUnresolved(format!(
                "unrecognized action '{other}'"
            ))),
        }
    }
}

/// Supported chains. Parsing is trim + case-insensitive; anything else is
/// rejected up front rather than silently routed to a default family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Solana,
    Sepolia,
    Monad,
}

impl Chain {
    /// Numeric chain id for EVM members. Closed mapping: chains without
    /// aggregator liquidity return `None` and must fail loudly upstream.
    pub fn evm_chain_id(&self) -> Option<u64> {
        match self {
            Chain::Ethereum => Some(1),
            Chain::Sepolia => Some(11_155_111),
            Chain::Solana | Chain::Monad => None,
        }
    }

    pub fn is_solana(&self) -> bool {
        matches!(self, Chain::Solana)
    }

    /// Chain default applied when the user did not name one: Solana when the
    /// connected address looks like a Solana pubkey, otherwise Ethereum.
    pub fn default_for_address(user_address: Option<&str>) -> Chain {
        match user_address {
            Some(addr) if !addr.trim().is_empty() && !addr.trim().starts_with("0x") => {
                Chain::Solana
            }
            _ => Chain::Ethereum,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Chain::Ethereum => "ethereum",
            Chain::Solana => "solana",
            Chain::Sepolia => "sepolia",
            Chain::Monad => "monad",
        };
        f.write_str(s)
    }
}

impl FromStr for Chain {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ethereum" | "eth" | "mainnet" => Ok(Chain::Ethereum),
            "solana" | "sol" => Ok(Chain::Solana),
            "sepolia" => Ok(Chain::Sepolia),
            "monad" => Ok(Chain::Monad),
            other => Err(GatewayError::UnsupportedChain(other.to_string())),
        }
    }
}

/// Canonical structured representation of a user request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub action: TradeAction,
    pub from_asset: String,
    pub to_asset: String,
    /// Asset-native units, not smallest unit
    pub amount: f64,
    pub chain: Chain,
    pub reasoning: String,
}

impl TradeIntent {
    /// The sentinel intent produced whenever extraction fails
    pub fn unknown(reasoning: impl Into<String>, chain: Chain) -> Self {
        Self {
            action: TradeAction::Unknown,
            from_asset: String::new(),
            to_asset: String::new(),
            amount: 0.0,
            chain,
            reasoning: reasoning.into(),
        }
    }

    pub fn is_executable_action(&self) -> bool {
        self.action == TradeAction::Swap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_parse_normalizes_case_and_whitespace() {
        assert_eq!("  SOLANA ".parse::<Chain>().unwrap(), Chain::Solana);
        assert_eq!("Ethereum".parse::<Chain>().unwrap(), Chain::Ethereum);
        assert_eq!("sepolia".parse::<Chain>().unwrap(), Chain::Sepolia);
    }

    #[test]
    fn chain_parse_fails_closed_on_unknown_names() {
        let err = "fantom".parse::<Chain>().unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedChain(name) if name == "fantom"));
    }

    #[test]
    fn evm_chain_ids_are_a_closed_mapping() {
        assert_eq!(Chain::Ethereum.evm_chain_id(), Some(1));
        assert_eq!(Chain::Sepolia.evm_chain_id(), Some(11_155_111));
        assert_eq!(Chain::Monad.evm_chain_id(), None);
        assert_eq!(Chain::Solana.evm_chain_id(), None);
    }

    #[test]
    fn default_chain_follows_connected_wallet() {
        assert_eq!(
            Chain::default_for_address(Some("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin")),
            Chain::Solana
        );
        assert_eq!(
            Chain::default_for_address(Some("0xdAC17F958D2ee523a2206206994597C13D831ec7")),
            Chain::Ethereum
        );
        assert_eq!(Chain::default_for_address(None), Chain::Ethereum);
    }
}
