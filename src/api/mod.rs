//! HTTP API for trade execution, market passthroughs, and admin controls

pub mod auth;
pub mod handlers;

use crate::chain::{EvmClient, SolanaClient};
use crate::config::ApiConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::intent::IntentResolver;
use crate::market::PriceService;
use crate::pipeline::TradePipeline;
use crate::registry::AgentRegistry;
use crate::session::{SessionManager, TradeExecutor};

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AgentRegistry>,
    pub resolver: Arc<IntentResolver>,
    pub pipeline: Arc<TradePipeline>,
    pub sessions: Arc<SessionManager>,
    pub executor: Arc<TradeExecutor>,
    pub solana: Arc<SolanaClient>,
    pub evm: Arc<EvmClient>,
    pub prices: Arc<PriceService>,
    pub admin_key: String,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/v1/agents/register", post(handlers::register_agent))
        .route("/v1/trade/intent", post(handlers::trade_intent))
        .route("/v1/trade/execute", post(handlers::trade_execute))
        .route("/v1/trade/confirm", post(handlers::trade_confirm))
        .route("/v1/trade/cancel", post(handlers::trade_cancel))
        .route("/v1/market/price/:symbol", get(handlers::market_price))
        .route("/v1/market/prices", get(handlers::market_prices))
        .route(
            "/v1/wallet/balance/:chain/:address",
            get(handlers::wallet_balance),
        )
        .route("/admin/stats", get(handlers::admin_stats))
        .route(
            "/admin/protocol/toggle-pause",
            post(handlers::admin_toggle_pause),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP API server
pub async fn run_server(config: ApiConfig, state: AppState) -> GatewayResult<()> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| GatewayError::Internal(format!("failed to bind {addr}: {e}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))?;

    Ok(())
}

/// Gateway error rendered at the HTTP boundary
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let body = Json(json!({
            "success": false,
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
