// Convert raw API reserves into typed, classified MarketRows.
// Missing leaves never raise: they produce Candidate::Incomplete.

use crate::market_data::adapters::aave_types::{RawReserve, RawValue};
use crate::market_data::adapters::MarketContext;
use crate::market_data::classifier::{is_ethereum, StablePolicy};
use crate::market_data::types::{Candidate, IncompleteReason, MarketRow};

pub const SEGMENT: &str = "evm";
pub const PROTOCOL: &str = "aave";
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

pub struct Normaliser {
    pub policy: StablePolicy,
}

fn leaf(v: Option<&RawValue>, missing: IncompleteReason) -> Result<f64, IncompleteReason> {
    v.and_then(|v| v.value).ok_or(missing)
}

impl Normaliser {
    pub fn new(policy: StablePolicy) -> Self {
        Self { policy }
    }

    pub fn normalise(&self, ctx: &MarketContext, raw: Option<&RawReserve>) -> Candidate {
        match self.try_normalise(ctx, raw) {
            Ok(row) => Candidate::Complete(row),
            Err(reason) => Candidate::Incomplete(reason),
        }
    }

    fn try_normalise(&self, ctx: &MarketContext, raw: Option<&RawReserve>) -> Result<MarketRow, IncompleteReason> {
        let raw = raw.ok_or(IncompleteReason::MissingReserve)?;
        let supply = raw.supply_info.as_ref().ok_or(IncompleteReason::MissingSupplyInfo)?;
        let borrow = raw.borrow_info.as_ref().ok_or(IncompleteReason::MissingBorrowInfo)?;

        let supply_apy = leaf(supply.apy.as_ref(), IncompleteReason::MissingSupplyApy)?;
        let supply_total = leaf(supply.total.as_ref(), IncompleteReason::MissingSupplyTotal)?;
        let borrow_apy = leaf(borrow.apy.as_ref(), IncompleteReason::MissingBorrowApy)?;
        let utilization = leaf(borrow.utilization_rate.as_ref(), IncompleteReason::MissingUtilization)?;
        let usd_per_token = borrow
            .total
            .as_ref()
            .and_then(|t| t.usd_per_token)
            .ok_or(IncompleteReason::MissingUsdPrice)?;

        // Supplied amount priced in USD; the borrowed side is ignored
        let tvl_usd = supply_total * usd_per_token;

        // Per-reserve descriptors name their asset; the API token is the fallback
        let token = raw.underlying_token.as_ref();
        let symbol = ctx
            .symbol_hint
            .clone()
            .or_else(|| token.and_then(|t| t.symbol.clone()))
            .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string());
        let underlying_token = ctx
            .underlying_hint
            .clone()
            .or_else(|| token.and_then(|t| t.address.clone()))
            .unwrap_or_default();

        Ok(MarketRow {
            segment: SEGMENT.to_string(),
            protocol: PROTOCOL.to_string(),
            chain_name: ctx.chain_name.clone(),
            chain_id: ctx.chain_id,
            market_address: ctx.market_address.clone(),
            is_stable: self.policy.is_stable(&symbol),
            is_ethereum: is_ethereum(Some(ctx.chain_id), Some(&ctx.chain_name)),
            symbol,
            underlying_token,
            supply_apy,
            borrow_apy,
            utilization,
            tvl_usd,
        })
    }
}

impl Default for Normaliser {
    fn default() -> Self {
        Self::new(StablePolicy::default())
    }
}
