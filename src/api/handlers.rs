//! Route handlers

use super::auth::{require_admin, require_agent};
use super::{ApiError, AppState};
use crate::error::{GatewayError, GatewayResult};
use crate::intent::{Chain, TradeAction, TradeIntent};
use crate::pipeline::ExecutionPayload;
use crate::registry::AgentIdentity;
use crate::session::{signer, SessionState, TradeSummary};

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::info;

// Request / response types

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub owner: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub api_key: String,
    pub agent_id: String,
}

#[derive(Deserialize)]
pub struct TradeIntentRequest {
    pub message: String,
    pub user_address: Option<String>,
}

#[derive(Deserialize)]
pub struct TradeExecuteRequest {
    pub chain: Option<String>,
    pub action: Option<String>,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub amount: Option<f64>,
    pub user_address: Option<String>,
}

#[derive(Serialize)]
pub struct TradeResponse {
    pub success: bool,
    pub state: SessionState,
    pub intent: TradeIntent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TradeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_payload: Option<ExecutionPayload>,
    pub can_execute: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub chain: String,
    /// Solana signature or EVM transaction hash
    pub reference: String,
}

#[derive(Deserialize)]
pub struct PricesQuery {
    pub symbols: Option<String>,
}

#[derive(Deserialize)]
pub struct TogglePauseRequest {
    pub pause: bool,
}

// Handlers

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "BitSwarp gateway online",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn register_agent(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> impl IntoResponse {
    let (api_key, agent) = state.registry.register(&body.name, &body.owner);
    Json(RegisterResponse {
        success: true,
        api_key,
        agent_id: agent.id,
    })
}

/// Free-text entrypoint: resolve the message, then run the trade flow
pub async fn trade_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TradeIntentRequest>,
) -> Result<Json<TradeResponse>, ApiError> {
    let agent = require_agent(&state, &headers)?;

    let default_chain = Chain::default_for_address(body.user_address.as_deref());
    let intent = state.resolver.resolve_text(&body.message, default_chain).await;

    run_trade(&state, &agent, intent, body.user_address.as_deref()).await
}

/// Structured entrypoint: same flow without the extractor in the loop
pub async fn trade_execute(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TradeExecuteRequest>,
) -> Result<Json<TradeResponse>, ApiError> {
    let agent = require_agent(&state, &headers)?;

    let default_chain = Chain::default_for_address(body.user_address.as_deref());
    let fields = crate::intent::StructuredFields {
        action: body.action,
        from_token: body.from_token,
        to_token: body.to_token,
        amount: body.amount,
        chain: body.chain,
    };
    let intent = state.resolver.resolve_structured(&fields, default_chain);

    run_trade(&state, &agent, intent, body.user_address.as_deref()).await
}

/// Shared quote-and-surface flow behind both trade entrypoints
async fn run_trade(
    state: &AppState,
    agent: &AgentIdentity,
    intent: TradeIntent,
    user_address: Option<&str>,
) -> Result<Json<TradeResponse>, ApiError> {
    match intent.action {
        TradeAction::Unknown => {
            // Non-fatal: rendered as a message, never an exception
            return Ok(Json(TradeResponse {
                success: false,
                state: SessionState::Idle,
                message: intent.reasoning.clone(),
                intent,
                summary: None,
                execution_payload: None,
                can_execute: false,
            }));
        }
        TradeAction::Swap => {}
        other => {
            // Acknowledged but not executable by this pipeline
            return Ok(Json(TradeResponse {
                success: true,
                state: SessionState::Idle,
                message: format!("{other} requests are not executable here: {}", intent.reasoning),
                intent,
                summary: None,
                execution_payload: None,
                can_execute: false,
            }));
        }
    }

    // The Jupiter swap transaction is built for the user address while the
    // gateway keypair signs it; those must be the same account, or signing is
    // guaranteed to fail after the user approves.
    let user_address = if intent.chain.is_solana() {
        solana_user_address(state.solana.signer_pubkey(), user_address)?
    } else {
        user_address.map(str::to_string)
    };

    let session = state.sessions.session(&agent.id);

    // Bump the generation first: any earlier in-flight run for this agent is
    // superseded and its result will be rejected as stale.
    let generation = session.lock().await.begin();

    let payload = state.pipeline.execute(&intent, user_address.as_deref()).await?;

    let mut session = session.lock().await;
    session.accept_quote(generation, intent.clone(), payload.clone())?;
    let summary = session.surface_for_confirmation()?;

    info!(agent = %agent.id, %summary, "trade awaiting confirmation");

    Ok(Json(TradeResponse {
        success: true,
        state: session.state(),
        can_execute: payload.can_execute(),
        message: intent.reasoning.clone(),
        intent,
        summary: Some(summary),
        execution_payload: Some(payload),
    }))
}

/// Pick the address Solana quotes are built for. A missing address defaults
/// to the configured signer; an address that is not the signer is rejected
/// before any quote is fetched.
fn solana_user_address(
    signer: Option<String>,
    requested: Option<&str>,
) -> GatewayResult<Option<String>> {
    match (signer, requested) {
        (Some(signer), Some(user)) if user != signer => {
            Err(GatewayError::SigningRejected(format!(
                "transaction would be built for {user} but the gateway signs as {signer}"
            )))
        }
        (Some(signer), _) => Ok(Some(signer)),
        (None, requested) => Ok(requested.map(str::to_string)),
    }
}

/// Explicit user approval: dispatch the chain-appropriate signing path
pub async fn trade_confirm(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let agent = require_agent(&state, &headers)?;
    let session = state.sessions.session(&agent.id);

    let trade = session.lock().await.begin_signing()?;

    let result = state.executor.dispatch(&trade).await;

    // A run begun while the signature was in flight owns the session; the
    // outcome of the dispatched trade still goes back to the caller.
    let mut session = session.lock().await;
    match result {
        Ok(outcome) => {
            if session.settled(trade.generation) {
                session.reset();
            }
            info!(agent = %agent.id, reference = %outcome.reference, "trade settled");
            Ok(Json(ConfirmResponse {
                success: true,
                chain: outcome.chain.to_string(),
                reference: outcome.reference,
            }))
        }
        Err(e) => {
            let rejection = signer::as_signing_rejection(e);
            if session.failed(trade.generation, rejection.to_string()) {
                session.reset();
            }
            Err(rejection.into())
        }
    }
}

/// User cancelled: the pending trade is discarded, no side effect
pub async fn trade_cancel(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let agent = require_agent(&state, &headers)?;
    let session = state.sessions.session(&agent.id);

    session.lock().await.cancel()?;
    info!(agent = %agent.id, "pending trade cancelled");

    Ok(Json(serde_json::json!({ "success": true, "state": "idle" })))
}

pub async fn market_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> impl IntoResponse {
    let price = state.prices.get_price(&symbol).await;
    Json(serde_json::json!({ "success": true, "symbol": symbol, "price": price }))
}

pub async fn market_prices(
    State(state): State<AppState>,
    Query(query): Query<PricesQuery>,
) -> impl IntoResponse {
    let symbols: Vec<String> = query
        .symbols
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let data = state.prices.get_prices(&symbols).await;
    Json(serde_json::json!({ "success": true, "data": data }))
}

pub async fn wallet_balance(
    State(state): State<AppState>,
    Path((chain, address)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let chain = Chain::from_str(&chain)?;

    let body = if chain.is_solana() {
        let balance = state.solana.get_balance(&address).await?;
        serde_json::json!({ "success": true, "balance": balance, "symbol": "SOL" })
    } else {
        let balance = state.evm.get_balance(&address).await?;
        serde_json::json!({ "success": true, "balance": balance, "symbol": "ETH" })
    };
    Ok(Json(body))
}

/// Aggregated read-only chain state; the pool reads run concurrently
pub async fn admin_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_admin(&state, &headers)?;

    let evm_stats = state.evm.pool_stats().await.ok();

    Ok(Json(serde_json::json!({
        "success": true,
        "agents": state.registry.agent_count(),
        "chains": {
            "evm": evm_stats,
            "solana": { "status": "online" },
        },
    })))
}

/// Pause/unpause the pool contract. Auth happens before any chain write.
pub async fn admin_toggle_pause(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TogglePauseRequest>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&state, &headers)?;

    let tx_hash = state.evm.toggle_pause(body.pause).await?;
    Ok(Json(serde_json::json!({ "success": true, "tx_hash": tx_hash })))
}
