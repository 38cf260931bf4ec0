use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::market_data::filter::Counts;
use crate::market_data::types::MarketRow;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("HTTP failure: {0}")]
    Http(#[from] reqwest::Error),
    #[error("row insert rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// The document handed to the snapshot sink, one per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub updated_at: DateTime<Utc>,
    pub markets: Vec<MarketRow>,
    pub counts: Counts,
    pub min_tvl_usd: f64,
}

/// Flat time-series row for the row-insert sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRow {
    pub ts: DateTime<Utc>,
    pub chain_id: u64,
    pub market: String,
    pub symbol: String,
    pub supply_apy: f64,
    pub borrow_apy: f64,
    pub tvl_usd: f64,
    pub utilization: f64,
}
