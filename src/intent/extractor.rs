//! Natural-language intent extraction boundary
//!
//! The extractor is an external collaborator: text in, structured intent out.
//! The trait keeps the pipeline testable without a live model endpoint.

use crate::config::IntentConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::intent::{Chain, TradeAction, TradeIntent};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    /// Extract a structured intent from free text. `default_chain` fills in a
    /// missing chain field. Errors are the caller's to soften into an
    /// `unknown` intent.
    async fn extract(&self, message: &str, default_chain: Chain) -> GatewayResult<TradeIntent>;
}

/// Production extractor: OpenAI-compatible chat completion with a JSON
/// response format.
pub struct HttpIntentExtractor {
    http: reqwest::Client,
    config: IntentConfig,
}

/// Wire shape the model is instructed to produce
#[derive(Debug, Deserialize)]
struct RawIntent {
    action: String,
    #[serde(default)]
    from_token: Option<String>,
    #[serde(default)]
    to_token: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    chain: Option<String>,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

const SYSTEM_PROMPT: &str = "Extract the trading intent from the user message. \
Respond with a single JSON object: {\"action\": \"swap|bridge|stake|balance|unknown\", \
\"from_token\": string, \"to_token\": string, \"amount\": number, \
\"chain\": \"ethereum|solana|sepolia|monad\", \"reasoning\": string}. \
Use \"unknown\" when the request is not a trade.";

impl HttpIntentExtractor {
    pub fn new(config: IntentConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    fn into_intent(&self, raw: RawIntent, default_chain: Chain) -> TradeIntent {
        let action = TradeAction::from_str(&raw.action).unwrap_or(TradeAction::Unknown);
        let chain = raw
            .chain
            .as_deref()
            .and_then(|c| Chain::from_str(c).ok())
            .unwrap_or(default_chain);

        TradeIntent {
            action,
            from_asset: raw.from_token.unwrap_or_default().trim().to_uppercase(),
            to_asset: raw.to_token.unwrap_or_default().trim().to_uppercase(),
            amount: raw.amount.unwrap_or(0.0),
            chain,
            reasoning: raw.reasoning,
        }
    }
}

#[async_trait]
impl IntentExtractor for HttpIntentExtractor {
    async fn extract(&self, message: &str, default_chain: Chain) -> GatewayResult<TradeIntent> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": message },
            ],
            "response_format": { "type": "json_object" },
        });

        let resp = self
            .http
            .post(&self.config.extractor_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::IntentUnresolved(format!("extractor request failed: {e}")))?
            .error_for_status()
            .map_err(|e| GatewayError::IntentUnresolved(format!("extractor rejected request: {e}")))?;

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::IntentUnresolved(format!("malformed extractor response: {e}")))?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| {
                GatewayError::IntentUnresolved("extractor returned no choices".to_string())
            })?;

        let raw: RawIntent = serde_json::from_str(content).map_err(|e| {
            GatewayError::IntentUnresolved(format!("extractor returned non-intent JSON: {e}"))
        })?;

        debug!(?raw, "intent extracted");
        Ok(self.into_intent(raw, default_chain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> HttpIntentExtractor {
        HttpIntentExtractor::new(IntentConfig {
            extractor_url: "https://example.invalid/v1/chat/completions".into(),
            api_key: "sk-test".into(),
            model: "gpt-4o-mini".into(),
            timeout_ms: 10,
        })
    }

    #[test]
    fn raw_intent_normalizes_symbols_and_defaults_chain() {
        let raw = RawIntent {
            action: "swap".into(),
            from_token: Some("sol".into()),
            to_token: Some("usdc".into()),
            amount: Some(1.0),
            chain: None,
            reasoning: "user asked for a swap".into(),
        };
        let intent = extractor().into_intent(raw, Chain::Solana);
        assert_eq!(intent.action, TradeAction::Swap);
        assert_eq!(intent.from_asset, "SOL");
        assert_eq!(intent.to_asset, "USDC");
        assert_eq!(intent.chain, Chain::Solana);
    }

    #[test]
    fn unrecognized_action_degrades_to_unknown() {
        let raw = RawIntent {
            action: "lambo".into(),
            from_token: None,
            to_token: None,
            amount: None,
            chain: Some("ethereum".into()),
            reasoning: String::new(),
        };
        let intent = extractor().into_intent(raw, Chain::Solana);
        assert_eq!(intent.action, TradeAction::Unknown);
        assert_eq!(intent.chain, Chain::Ethereum);
    }
}
