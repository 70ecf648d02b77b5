//! Price lookup passthrough (Jupiter price API)
//!
//! Simple key-value quote fetch; failures degrade to empty results and a
//! warning, matching the adapter failure policy.

use crate::config::AggregatorConfig;

use serde_json::Value;
use tracing::warn;

pub struct PriceService {
    http: reqwest::Client,
    base_url: String,
}

impl PriceService {
    pub fn new(aggregator: &AggregatorConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: aggregator.jupiter_price_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, ids: &str) -> Option<Value> {
        let result = self
            .http
            .get(&self.base_url)
            .query(&[("ids", ids)])
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                warn!(ids, error = %e, "price fetch failed");
                return None;
            }
        };

        match resp.json::<Value>().await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "price response was not JSON");
                None
            }
        }
    }

    pub async fn get_price(&self, symbol: &str) -> f64 {
        let Some(data) = self.fetch(symbol).await else {
            return 0.0;
        };
        data.pointer(&format!("/data/{symbol}/price"))
            .and_then(|p| match p {
                Value::String(s) => s.parse().ok(),
                Value::Number(n) => n.as_f64(),
                _ => None,
            })
            .unwrap_or(0.0)
    }

    pub async fn get_prices(&self, symbols: &[String]) -> Value {
        let Some(data) = self.fetch(&symbols.join(",")).await else {
            return Value::Object(Default::default());
        };
        data.get("data").cloned().unwrap_or(Value::Object(Default::default()))
    }
}
