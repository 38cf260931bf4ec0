//! Pure conversions from ranked rows into the persisted shapes.
//!
//! This file MUST NOT do I/O. Only struct <-> struct mapping lives here.

use chrono::{DateTime, Utc};

use crate::market_data::filter::Counts;
use crate::market_data::types::MarketRow;
use crate::persist::types::{RateRow, Snapshot};

/// Wrap already-ranked rows into a snapshot. Row order is kept as given.
pub fn assemble(markets: Vec<MarketRow>, counts: Counts, min_tvl_usd: f64, now: DateTime<Utc>) -> Snapshot {
    Snapshot {
        updated_at: now,
        markets,
        counts,
        min_tvl_usd,
    }
}

/// One flat row per market, all stamped with the snapshot time.
pub fn to_rate_rows(snapshot: &Snapshot) -> Vec<RateRow> {
    snapshot
        .markets
        .iter()
        .map(|m| RateRow {
            ts: snapshot.updated_at,
            chain_id: m.chain_id,
            market: m.market_address.clone(),
            symbol: m.symbol.clone(),
            supply_apy: m.supply_apy,
            borrow_apy: m.borrow_apy,
            tvl_usd: m.tvl_usd,
            utilization: m.utilization,
        })
        .collect()
}
