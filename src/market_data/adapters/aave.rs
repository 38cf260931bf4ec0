// Aave v3 GraphQL adapter: one POST per descriptor, whole-market or single-reserve

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use super::aave_types::{GraphQlResponse, MarketData, ReserveData, MARKET_QUERY, RESERVE_QUERY};
use super::{MarketContext, ReserveBatch, ReserveSource};
use crate::error::{PipelineError, PipelineResult};
use crate::market_data::types::MarketDescriptor;

pub const DEFAULT_API_URL: &str = "https://api.v3.aave.com/graphql";

pub struct AaveAdapter {
    pub api_url: String,
    client: reqwest::Client,
}

impl AaveAdapter {
    /// `max_connections` caps idle pooled connections per host; `timeout` bounds each call.
    pub fn new(api_url: &str, max_connections: usize, timeout: Duration) -> PipelineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(max_connections.max(1))
            .build()
            .map_err(|e| PipelineError::config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            api_url: api_url.to_string(),
            client,
        })
    }

    // POST {query, variables} and unwrap the GraphQL envelope
    async fn post<T: DeserializeOwned>(
        &self,
        descriptor: &MarketDescriptor,
        query: &str,
        request: serde_json::Value,
    ) -> PipelineResult<T> {
        let transport = |source: reqwest::Error| PipelineError::Transport {
            descriptor: descriptor.to_string(),
            source,
        };

        let res = self
            .client
            .post(&self.api_url)
            .json(&json!({ "query": query, "variables": { "request": request } }))
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;

        let payload: GraphQlResponse<T> = res.json().await.map_err(transport)?;

        if let Some(errors) = payload.errors.filter(|e| !e.is_empty()) {
            let messages = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(PipelineError::GraphQl {
                descriptor: descriptor.to_string(),
                messages,
            });
        }

        payload.data.ok_or_else(|| PipelineError::NotFound {
            descriptor: descriptor.to_string(),
            kind: "data",
        })
    }

    #[instrument(skip_all, fields(descriptor = %descriptor))]
    pub async fn fetch_market(&self, descriptor: &MarketDescriptor) -> PipelineResult<ReserveBatch> {
        let request = json!({
            "chainId": descriptor.chain_id,
            "address": descriptor.market_address,
        });
        let data: MarketData = self.post(descriptor, MARKET_QUERY, request).await?;
        let market = data.market.ok_or_else(|| PipelineError::NotFound {
            descriptor: descriptor.to_string(),
            kind: "market",
        })?;

        // Chain info from the API wins over the descriptor
        let mut context = MarketContext::from_descriptor(descriptor);
        if let Some(chain) = market.chain {
            if let Some(id) = chain.chain_id {
                context.chain_id = id;
            }
            if let Some(name) = chain.name {
                context.chain_name = name.trim().to_lowercase();
            }
        }
        context.symbol_hint = None;
        context.underlying_hint = None;

        let reserves = market.reserves.unwrap_or_default();
        debug!(chain = %context.chain_name, reserves = reserves.len(), "Market fetched");
        Ok(ReserveBatch { context, reserves })
    }

    #[instrument(skip_all, fields(descriptor = %descriptor))]
    pub async fn fetch_reserve(&self, descriptor: &MarketDescriptor) -> PipelineResult<ReserveBatch> {
        let request = json!({
            "chainId": descriptor.chain_id,
            "market": descriptor.market_address,
            "underlyingToken": descriptor.underlying_token,
        });
        let data: ReserveData = self.post(descriptor, RESERVE_QUERY, request).await?;
        let reserve = data.reserve.ok_or_else(|| PipelineError::NotFound {
            descriptor: descriptor.to_string(),
            kind: "reserve",
        })?;

        Ok(ReserveBatch {
            context: MarketContext::from_descriptor(descriptor),
            reserves: vec![Some(reserve)],
        })
    }
}

#[async_trait::async_trait]
impl ReserveSource for AaveAdapter {
    async fn fetch(&self, descriptor: &MarketDescriptor) -> PipelineResult<ReserveBatch> {
        if descriptor.is_single_reserve() {
            self.fetch_reserve(descriptor).await
        } else {
            self.fetch_market(descriptor).await
        }
    }
}
