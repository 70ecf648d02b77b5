//! Chain clients - RPC reads and the gateway-held signing paths
//!
//! Thin wrappers over the chain SDKs: balance reads, pool-contract state, and
//! the concrete `SolanaSigner`/`EvmSigner` implementations used once a trade
//! is confirmed.

pub mod evm;
pub mod solana;

pub use evm::{EvmClient, PoolStats};
pub use solana::SolanaClient;
