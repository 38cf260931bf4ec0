use std::fmt;

use serde::{Deserialize, Serialize};

// One entry of the market registry, as written in markets.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDescriptor {
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    #[serde(rename = "market", alias = "marketAddress")]
    pub market_address: String,
    #[serde(rename = "underlyingToken", default, skip_serializing_if = "Option::is_none")]
    pub underlying_token: Option<String>,
    #[serde(rename = "symbol", alias = "symbolHint", default, skip_serializing_if = "Option::is_none")]
    pub symbol_hint: Option<String>,
    #[serde(rename = "chain", default, skip_serializing_if = "Option::is_none")]
    pub chain_name: Option<String>,
}

impl MarketDescriptor {
    pub fn market(chain_id: u64, market_address: &str) -> Self {
        Self {
            chain_id,
            market_address: market_address.to_string(),
            underlying_token: None,
            symbol_hint: None,
            chain_name: None,
        }
    }

    pub fn reserve(chain_id: u64, market_address: &str, underlying_token: &str, symbol: &str) -> Self {
        Self {
            underlying_token: Some(underlying_token.to_string()),
            symbol_hint: Some(symbol.to_string()),
            ..Self::market(chain_id, market_address)
        }
    }

    // Descriptors with an underlying token are fetched one reserve at a time
    pub fn is_single_reserve(&self) -> bool {
        self.underlying_token.is_some()
    }
}

impl fmt::Display for MarketDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chainId={} market={}", self.chain_id, self.market_address)?;
        if let Some(token) = &self.underlying_token {
            write!(f, " token={}", token)?;
        }
        Ok(())
    }
}

/// A normalized, classified reserve ready for filtering and ranking.
///
/// Rows are never mutated after the normaliser builds them. The serialized
/// key names are the ones the snapshot document has always used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRow {
    pub segment: String,
    pub protocol: String,
    #[serde(rename = "chain")]
    pub chain_name: String,
    pub chain_id: u64,
    #[serde(rename = "market")]
    pub market_address: String,
    pub symbol: String,
    pub underlying_token: String,
    pub supply_apy: f64,
    pub borrow_apy: f64,
    pub utilization: f64,
    pub tvl_usd: f64,
    pub is_stable: bool,
    pub is_ethereum: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteReason {
    MissingReserve,
    MissingSupplyInfo,
    MissingBorrowInfo,
    MissingSupplyApy,
    MissingSupplyTotal,
    MissingBorrowApy,
    MissingUtilization,
    MissingUsdPrice,
}

impl fmt::Display for IncompleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IncompleteReason::MissingReserve => "reserve is null",
            IncompleteReason::MissingSupplyInfo => "supplyInfo is null",
            IncompleteReason::MissingBorrowInfo => "borrowInfo is null",
            IncompleteReason::MissingSupplyApy => "supplyInfo.apy.value is null",
            IncompleteReason::MissingSupplyTotal => "supplyInfo.total.value is null",
            IncompleteReason::MissingBorrowApy => "borrowInfo.apy.value is null",
            IncompleteReason::MissingUtilization => "borrowInfo.utilizationRate.value is null",
            IncompleteReason::MissingUsdPrice => "borrowInfo.total.usdPerToken is null",
        };
        f.write_str(s)
    }
}

// Output of the normaliser: either a full row or the first missing field
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Complete(MarketRow),
    Incomplete(IncompleteReason),
}
