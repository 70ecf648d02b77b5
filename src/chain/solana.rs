//! Solana chain client: balance reads, sign-and-send, confirmation poll

use crate::config::SolanaConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::session::SolanaSigner;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature, Signer};
use solana_sdk::transaction::VersionedTransaction;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

const LAMPORTS_PER_SOL: f64 = 1e9;

pub struct SolanaClient {
    rpc: RpcClient,
    keypair_path: Option<String>,
    confirm_timeout: Duration,
}

impl SolanaClient {
    pub fn new(config: &SolanaConfig) -> Self {
        let rpc = RpcClient::new_with_commitment(
            config.rpc_url.clone(),
            CommitmentConfig::confirmed(),
        );
        Self {
            rpc,
            keypair_path: config.keypair_path.clone(),
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
        }
    }

    fn connection_error(e: impl std::fmt::Display) -> GatewayError {
        GatewayError::ChainConnection {
            chain: "solana".to_string(),
            message: e.to_string(),
        }
    }

    fn load_keypair(&self) -> GatewayResult<Keypair> {
        let path = self
            .keypair_path
            .as_deref()
            .ok_or_else(|| GatewayError::Wallet("no Solana keypair configured".to_string()))?;
        read_keypair_file(path)
            .map_err(|e| GatewayError::Wallet(format!("failed to read keypair {path}: {e}")))
    }

    /// Pubkey of the configured signing keypair, when one is present. Quotes
    /// must be built for this account for the signature to be valid.
    pub fn signer_pubkey(&self) -> Option<String> {
        self.load_keypair().ok().map(|k| k.pubkey().to_string())
    }

    /// Native balance in SOL
    pub async fn get_balance(&self, address: &str) -> GatewayResult<f64> {
        let pubkey = Pubkey::from_str(address)
            .map_err(|e| GatewayError::Internal(format!("invalid address: {e}")))?;
        let lamports = self
            .rpc
            .get_balance(&pubkey)
            .await
            .map_err(Self::connection_error)?;
        Ok(lamports as f64 / LAMPORTS_PER_SOL)
    }
}

#[async_trait]
impl SolanaSigner for SolanaClient {
    async fn sign_and_send(&self, tx: VersionedTransaction) -> GatewayResult<String> {
        let keypair = self.load_keypair()?;

        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(Self::connection_error)?;

        // Re-sign the aggregator-built message with a fresh blockhash
        let mut message = tx.message;
        message.set_recent_blockhash(blockhash);
        let signed = VersionedTransaction::try_new(message, &[&keypair])
            .map_err(|e| GatewayError::SigningRejected(e.to_string()))?;

        let signature = self
            .rpc
            .send_transaction_with_config(
                &signed,
                RpcSendTransactionConfig {
                    skip_preflight: false,
                    preflight_commitment: Some(CommitmentConfig::processed().commitment),
                    ..RpcSendTransactionConfig::default()
                },
            )
            .await
            .map_err(|e| GatewayError::SigningRejected(e.to_string()))?;

        info!(%signature, "solana transaction sent");
        Ok(signature.to_string())
    }

    /// One-shot confirmation poll keyed by the signature; no retry beyond the
    /// configured timeout.
    async fn confirm(&self, signature: &str) -> GatewayResult<()> {
        let signature = Signature::from_str(signature)
            .map_err(|e| GatewayError::Internal(format!("invalid signature: {e}")))?;

        let deadline = Instant::now() + self.confirm_timeout;
        loop {
            let statuses = self
                .rpc
                .get_signature_statuses(&[signature])
                .await
                .map_err(Self::connection_error)?;

            if let Some(Some(status)) = statuses.value.first() {
                if let Some(err) = &status.err {
                    return Err(GatewayError::SigningRejected(format!(
                        "transaction failed on chain: {err:?}"
                    )));
                }
                if status.satisfies_commitment(CommitmentConfig::confirmed()) {
                    debug!(%signature, "solana transaction confirmed");
                    return Ok(());
                }
            }

            if Instant::now() >= deadline {
                return Err(GatewayError::Timeout {
                    operation: format!("confirmation of {signature}"),
                });
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(keypair_path: Option<String>) -> SolanaClient {
        SolanaClient::new(&SolanaConfig {
            rpc_url: "https://api.mainnet-beta.solana.com".into(),
            keypair_path,
            confirm_timeout_secs: 1,
        })
    }

    #[tokio::test]
    async fn invalid_address_is_rejected_without_an_rpc_call() {
        let err = client(None).get_balance("not-a-pubkey").await.unwrap_err();
        assert!(matches!(err, GatewayError::Internal(_)));
    }

    #[test]
    fn missing_keypair_is_a_wallet_error() {
        let err = client(None).load_keypair().unwrap_err();
        assert!(matches!(err, GatewayError::Wallet(_)));
        assert_eq!(client(None).signer_pubkey(), None);
    }

    #[test]
    fn signer_pubkey_comes_from_the_configured_keypair() {
        let keypair = Keypair::new();
        let file = tempfile::NamedTempFile::new().unwrap();
        solana_sdk::signature::write_keypair_file(&keypair, file.path()).unwrap();

        let client = client(Some(file.path().to_string_lossy().into_owned()));
        assert_eq!(client.signer_pubkey(), Some(keypair.pubkey().to_string()));
    }
}
