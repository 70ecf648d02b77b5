//! Header-based authentication for the agent and admin surfaces
//!
//! Both checks run before any network or chain call; a missing or unknown
//! key is a hard 401 with no retry.

use super::AppState;
use crate::error::{GatewayError, GatewayResult};
use crate::registry::AgentIdentity;

use axum::http::HeaderMap;

pub const AGENT_KEY_HEADER: &str = "x-agent-key";
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Resolve the caller identity behind `x-agent-key`
pub fn require_agent(state: &AppState, headers: &HeaderMap) -> GatewayResult<AgentIdentity> {
    let key = headers
        .get(AGENT_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(GatewayError::Unauthorized)?;
    state.registry.authenticate(key)
}

/// Check the shared admin secret in `x-admin-key`
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> GatewayResult<()> {
    let key = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(GatewayError::Unauthorized)?;
    if key != state.admin_key {
        return Err(GatewayError::Unauthorized);
    }
    Ok(())
}
