//! Confirmation/signing state machine
//!
//! Holds the single pending trade per caller, surfaces it for explicit human
//! confirmation, and hands it to the signing executor on approval. Every
//! transition is explicit; nothing auto-executes and nothing retries.
//!
//! Each pipeline run carries a monotonically increasing generation so a
//! superseded quote response can never overwrite a newer pending trade.

pub mod signer;

pub use signer::{EvmSigner, SolanaSigner, TradeExecutor, TradeOutcome};

use crate::error::{GatewayError, GatewayResult};
use crate::intent::{Chain, TradeIntent};
use crate::pipeline::ExecutionPayload;

use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// States of the confirm/sign/broadcast machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    QuoteFetched,
    AwaitingConfirmation,
    Signing,
    Settled,
    Failed,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::QuoteFetched => "quote_fetched",
            SessionState::AwaitingConfirmation => "awaiting_confirmation",
            SessionState::Signing => "signing",
            SessionState::Settled => "settled",
            SessionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The single in-flight trade awaiting confirmation and signature.
/// Replaced wholesale, never partially mutated.
#[derive(Debug, Clone)]
pub struct PendingTrade {
    pub intent: TradeIntent,
    pub payload: ExecutionPayload,
    pub chain: Chain,
    pub generation: u64,
}

/// Human-readable summary surfaced for confirmation
#[derive(Debug, Clone, Serialize)]
pub struct TradeSummary {
    pub action: String,
    pub amount: f64,
    pub from_asset: String,
    pub to_asset: String,
    pub chain: String,
    pub expected_out: Option<String>,
}

impl fmt::Display for TradeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} -> {} on {}",
            self.action, self.amount, self.from_asset, self.to_asset, self.chain
        )
    }
}

#[derive(Debug, Default)]
pub struct TradeSession {
    state: SessionState,
    pending: Option<PendingTrade>,
    generation: u64,
    /// Outcome of the last completed attempt, for rendering
    last_error: Option<String>,
}

impl TradeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending(&self) -> Option<&PendingTrade> {
        self.pending.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start a new pipeline run. Any pending trade is discarded first
    /// (last-intent-wins, no queueing) and the returned generation must
    /// accompany the eventual quote.
    pub fn begin(&mut self) -> u64 {
        self.pending = None;
        self.state = SessionState::Idle;
        self.last_error = None;
        self.generation += 1;
        self.generation
    }

    /// Accept a successful pipeline result. Stale generations are rejected so
    /// an abandoned run cannot clobber a newer one.
    pub fn accept_quote(
        &mut self,
        generation: u64,
        intent: TradeIntent,
        payload: ExecutionPayload,
    ) -> GatewayResult<()> {
        if generation != self.generation {
            return Err(GatewayError::StaleGeneration { generation });
        }

        let chain = intent.chain;
        self.pending = Some(PendingTrade { intent, payload, chain, generation });
        self.state = SessionState::QuoteFetched;
        Ok(())
    }

    /// Surface the fetched quote for explicit confirmation. Immediate after
    /// `accept_quote`; confirmation itself is always a separate user action.
    pub fn surface_for_confirmation(&mut self) -> GatewayResult<TradeSummary> {
        if self.state != SessionState::QuoteFetched {
            return Err(self.invalid_transition(SessionState::AwaitingConfirmation));
        }
        let trade = self
            .pending
            .as_ref()
            .ok_or_else(|| GatewayError::Internal("quote_fetched with no pending trade".into()))?;

        let summary = summarize(trade);
        self.state = SessionState::AwaitingConfirmation;
        Ok(summary)
    }

    /// User cancelled: discard the pending trade, no side effect
    pub fn cancel(&mut self) -> GatewayResult<()> {
        if self.state != SessionState::AwaitingConfirmation {
            return Err(self.invalid_transition(SessionState::Idle));
        }
        self.pending = None;
        self.state = SessionState::Idle;
        Ok(())
    }

    /// User confirmed: hand the trade to the signer. The trade leaves the
    /// session so a concurrent cancel cannot race the signature.
    pub fn begin_signing(&mut self) -> GatewayResult<PendingTrade> {
        if self.state != SessionState::AwaitingConfirmation {
            return Err(self.invalid_transition(SessionState::Signing));
        }
        let trade = self
            .pending
            .take()
            .ok_or_else(|| GatewayError::Internal("awaiting_confirmation with no pending trade".into()))?;
        self.state = SessionState::Signing;
        Ok(trade)
    }

    /// Chain accepted the transaction. Returns false when a newer run has
    /// superseded the dispatched trade; the session then belongs to that run
    /// and is left untouched, while the outcome still goes to the caller.
    pub fn settled(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state != SessionState::Signing {
            return false;
        }
        self.state = SessionState::Settled;
        true
    }

    /// Wallet rejection, RPC error, or confirmation timeout. The message is
    /// kept verbatim for the user; there is no retry loop. Superseded runs are
    /// ignored, as in `settled`.
    pub fn failed(&mut self, generation: u64, error: impl Into<String>) -> bool {
        if generation != self.generation || self.state != SessionState::Signing {
            return false;
        }
        self.last_error = Some(error.into());
        self.state = SessionState::Failed;
        true
    }

    /// Terminal states fall back to idle; a new intent starts from scratch
    pub fn reset(&mut self) {
        self.pending = None;
        self.state = SessionState::Idle;
    }

    fn invalid_transition(&self, to: SessionState) -> GatewayError {
        GatewayError::InvalidStateTransition {
            from: self.state.to_string(),
            to: to.to_string(),
        }
    }
}

fn summarize(trade: &PendingTrade) -> TradeSummary {
    let expected_out = match &trade.payload {
        ExecutionPayload::Solana { quote, .. } => quote.expected_out.clone(),
        ExecutionPayload::Evm { quote, .. } => quote.expected_out.clone(),
    };
    TradeSummary {
        action: trade.intent.action.to_string(),
        amount: trade.intent.amount,
        from_asset: trade.intent.from_asset.clone(),
        to_asset: trade.intent.to_asset.clone(),
        chain: trade.chain.to_string(),
        expected_out,
    }
}

/// Per-agent sessions; each holds at most one pending trade
#[derive(Default)]
pub struct SessionManager {
    sessions: DashMap<String, Arc<Mutex<TradeSession>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self, agent_id: &str) -> Arc<Mutex<TradeSession>> {
        self.sessions
            .entry(agent_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(TradeSession::new())))
            .clone()
    }
}
