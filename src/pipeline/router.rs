//! Chain router: pick the quoting adapter for a resolved intent
//!
//! Routing is total over the closed `Chain` enum. Unknown chain names never
//! get here: they fail closed at parse time with `UnsupportedChain`, instead
//! of the silent EVM fallback the routing policy otherwise invites.

use crate::intent::Chain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Solana,
    Evm,
}

pub fn route(chain: Chain) -> AdapterKind {
    match chain {
        Chain::Solana => AdapterKind::Solana,
        Chain::Ethereum | Chain::Sepolia | Chain::Monad => AdapterKind::Evm,
    }
}
