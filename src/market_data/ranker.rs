//! Deterministic display order for kept rows.
//!
//! Rows fall into four tiers, checked in order:
//!
//! | tier | rows                  | primary key          |
//! |------|-----------------------|----------------------|
//! | 0    | stable, ethereum      | borrow APY ascending |
//! | 1    | stable, other chains  | borrow APY ascending |
//! | 2    | volatile, ethereum    | supply APY descending|
//! | 3    | volatile, other chains| supply APY descending|
//!
//! Ties go to the larger TVL, then symbol and chain name. Chain id, market,
//! underlying token and the remaining numeric fields close the key so
//! distinct rows never compare equal.

use std::cmp::{Ordering, Reverse};

use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::market_data::types::MarketRow;

pub fn tier(row: &MarketRow) -> u8 {
    match (row.is_stable, row.is_ethereum) {
        (true, true) => 0,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    }
}

type RankKey<'a> = (
    u8,
    OrderedFloat<f64>,
    Reverse<OrderedFloat<f64>>,
    &'a str,
    &'a str,
    u64,
    &'a str,
    &'a str,
    (OrderedFloat<f64>, OrderedFloat<f64>, OrderedFloat<f64>),
);

fn rank_key(row: &MarketRow) -> RankKey<'_> {
    let t = tier(row);
    // Stables: cheapest borrow first. Volatiles: highest supply first.
    let primary = if t < 2 { row.borrow_apy } else { -row.supply_apy };
    (
        t,
        OrderedFloat(primary),
        Reverse(OrderedFloat(row.tvl_usd)),
        row.symbol.as_str(),
        row.chain_name.as_str(),
        row.chain_id,
        row.market_address.as_str(),
        row.underlying_token.as_str(),
        (
            OrderedFloat(row.supply_apy),
            OrderedFloat(row.borrow_apy),
            OrderedFloat(row.utilization),
        ),
    )
}

pub fn compare(a: &MarketRow, b: &MarketRow) -> Ordering {
    rank_key(a).cmp(&rank_key(b))
}

/// Stable sort into display order; consumes the input, never edits a row.
pub fn rank(rows: Vec<MarketRow>) -> Vec<MarketRow> {
    rows.into_iter().sorted_by(compare).collect()
}
