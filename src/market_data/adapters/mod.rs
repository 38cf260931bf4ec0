// Shared trait + batch type for reserve data sources
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, error};

use crate::error::PipelineResult;
use crate::market_data::types::MarketDescriptor;

use self::aave_types::RawReserve;

/// Chain/market context the normaliser needs alongside each raw reserve.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketContext {
    pub chain_id: u64,
    pub chain_name: String, // lowercase
    pub market_address: String,
    // Only set for single-reserve fetches, where the payload has no token info
    pub symbol_hint: Option<String>,
    pub underlying_hint: Option<String>,
}

impl MarketContext {
    pub fn from_descriptor(descriptor: &MarketDescriptor) -> Self {
        Self {
            chain_id: descriptor.chain_id,
            chain_name: descriptor
                .chain_name
                .as_deref()
                .map(|c| c.trim().to_lowercase())
                .unwrap_or_else(|| "unknown".to_string()),
            market_address: descriptor.market_address.clone(),
            symbol_hint: descriptor.symbol_hint.clone(),
            underlying_hint: descriptor.underlying_token.clone(),
        }
    }
}

/// Everything one fetch produced: a whole market's reserve list, or a single
/// reserve. `None` entries are reserves the API returned as null.
#[derive(Debug, Clone, PartialEq)]
pub struct ReserveBatch {
    pub context: MarketContext,
    pub reserves: Vec<Option<RawReserve>>,
}

#[async_trait::async_trait]
pub trait ReserveSource: Send + Sync {
    /// One network call for one descriptor. Any error aborts the run.
    async fn fetch(&self, descriptor: &MarketDescriptor) -> PipelineResult<ReserveBatch>;
}

/// Fan out one fetch per descriptor with at most `concurrency` in flight and
/// join them all. The first error wins; the remaining in-flight futures are
/// dropped with the stream. Output order follows completion order.
pub async fn fetch_all<S>(
    source: &S,
    descriptors: &[MarketDescriptor],
    concurrency: usize,
) -> PipelineResult<Vec<ReserveBatch>>
where
    S: ReserveSource + ?Sized,
{
    let limit = concurrency.max(1);
    debug!(descriptors = descriptors.len(), limit, "Fetching reserves");

    stream::iter(descriptors)
        .map(|descriptor| async move {
            let result = source.fetch(descriptor).await;
            match &result {
                Ok(batch) => debug!(%descriptor, reserves = batch.reserves.len(), "Fetched"),
                Err(e) => error!(%descriptor, error = %e, "Fetch failed"),
            }
            result
        })
        .buffer_unordered(limit)
        .try_collect()
        .await
}

pub mod aave;
pub mod aave_types;
