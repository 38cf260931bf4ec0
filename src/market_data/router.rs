// Router drives one run: fetch -> normalise -> filter -> rank -> snapshot
use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::PipelineResult;
use crate::market_data::adapters::{fetch_all, ReserveBatch, ReserveSource};
use crate::market_data::filter::{Counts, QualityFilter};
use crate::market_data::normaliser::Normaliser;
use crate::market_data::ranker;
use crate::market_data::registry::Registry;
use crate::persist::snapshot;
use crate::persist::Snapshot;

pub struct Pipeline<S: ReserveSource> {
    pub source: S,
    pub normaliser: Normaliser,
    pub concurrency: usize,
    pub default_min_tvl_usd: f64,
}

impl<S: ReserveSource> Pipeline<S> {
    pub fn new(source: S, normaliser: Normaliser, concurrency: usize, default_min_tvl_usd: f64) -> Self {
        Self { source, normaliser, concurrency, default_min_tvl_usd }
    }

    /// All-or-nothing: any fetch error is returned before a snapshot exists.
    pub async fn run(&self, registry: &Registry) -> PipelineResult<Snapshot> {
        let min_tvl_usd = registry.min_tvl_usd.unwrap_or(self.default_min_tvl_usd);
        let batches = fetch_all(&self.source, &registry.descriptors, self.concurrency).await?;
        let snapshot = build_snapshot(&self.normaliser, &batches, min_tvl_usd, Utc::now());

        let c = snapshot.counts;
        info!(
            reserves_seen = c.reserves_seen,
            skipped_nulls = c.skipped_nulls,
            skipped_below_floor = c.skipped_below_floor,
            kept = c.kept,
            min_tvl_usd,
            "Run complete"
        );
        record_metrics(&c);
        Ok(snapshot)
    }
}

/// The synchronous half of a run. Fetch completion order does not matter:
/// the ranker alone decides the row order.
pub fn build_snapshot(
    normaliser: &Normaliser,
    batches: &[ReserveBatch],
    min_tvl_usd: f64,
    now: DateTime<Utc>,
) -> Snapshot {
    let mut filter = QualityFilter::new(min_tvl_usd);
    let kept: Vec<_> = batches
        .iter()
        .flat_map(|batch| {
            batch
                .reserves
                .iter()
                .map(move |raw| normaliser.normalise(&batch.context, raw.as_ref()))
        })
        .filter_map(|candidate| filter.admit(candidate))
        .collect();

    snapshot::assemble(ranker::rank(kept), filter.counts(), min_tvl_usd, now)
}

fn record_metrics(c: &Counts) {
    metrics::counter!("lendboard_reserves_seen").increment(c.reserves_seen);
    metrics::counter!("lendboard_skipped_nulls").increment(c.skipped_nulls);
    metrics::counter!("lendboard_skipped_below_floor").increment(c.skipped_below_floor);
    metrics::counter!("lendboard_rows_kept").increment(c.kept);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::market_data::adapters::aave_types::{
        RawBorrowInfo, RawBorrowTotal, RawReserve, RawSupplyInfo, RawToken, RawValue,
    };
    use crate::market_data::adapters::MarketContext;
    use crate::market_data::types::MarketDescriptor;
    use std::collections::HashMap;

    fn value(v: f64) -> Option<RawValue> {
        Some(RawValue { value: Some(v) })
    }

    fn reserve(symbol: &str, supply_apy: f64, borrow_apy: f64, tvl_usd: f64) -> Option<RawReserve> {
        Some(RawReserve {
            underlying_token: Some(RawToken { address: Some(format!("0x{}", symbol)), symbol: Some(symbol.into()) }),
            supply_info: Some(RawSupplyInfo { apy: value(supply_apy), total: value(tvl_usd) }),
            borrow_info: Some(RawBorrowInfo {
                apy: value(borrow_apy),
                total: Some(RawBorrowTotal { usd_per_token: Some(1.0) }),
                utilization_rate: value(0.5),
            }),
        })
    }

    fn batch(chain_id: u64, chain_name: &str, reserves: Vec<Option<RawReserve>>) -> ReserveBatch {
        ReserveBatch {
            context: MarketContext {
                chain_id,
                chain_name: chain_name.into(),
                market_address: format!("0xmarket{}", chain_id),
                symbol_hint: None,
                underlying_hint: None,
            },
            reserves,
        }
    }

    fn symbols(s: &Snapshot) -> Vec<&str> {
        s.markets.iter().map(|m| m.symbol.as_str()).collect()
    }

    #[test]
    fn test_reference_scenario_end_to_end() {
        let batches = vec![batch(
            1,
            "ethereum",
            vec![
                reserve("USDC", 0.04, 0.05, 5e9),
                reserve("USDT", 0.02, 0.03, 2e9),
                reserve("WETH", 0.04, 0.06, 1e10),
            ],
        )];
        let snap = build_snapshot(&Normaliser::default(), &batches, 10_000_000.0, Utc::now());
        assert_eq!(symbols(&snap), vec!["USDT", "USDC", "WETH"]);
        assert_eq!(snap.counts, Counts {
                reserves_seen: 3,
                skipped_nulls: 0,
                skipped_below_floor: 0,
                kept: 3,
                stable: 2,
                non_stable: 1,
                ethereum: 3,
                non_ethereum: 0,
            });
    }

    #[test]
    fn test_nulls_and_floor_are_counted_and_excluded() {
        let mut no_supply = reserve("GHO", 0.0, 0.06, 5e8);
        no_supply.as_mut().unwrap().supply_info = None;
        let batches = vec![batch(
            1,
            "ethereum",
            vec![no_supply, reserve("LINK", 0.01, 0.02, 9_000_000.0), reserve("USDC", 0.04, 0.05, 5e9), None],
        )];
        let snap = build_snapshot(&Normaliser::default(), &batches, 10_000_000.0, Utc::now());

        assert_eq!(symbols(&snap), vec!["USDC"]);
        assert_eq!(snap.counts, Counts {
                reserves_seen: 4,
                skipped_nulls: 2,
                skipped_below_floor: 1,
                kept: 1,
                stable: 1,
                non_stable: 0,
                ethereum: 1,
                non_ethereum: 0,
            });
        assert_eq!(snap.min_tvl_usd, 10_000_000.0);
        assert!(snap.markets.iter().all(|m| m.tvl_usd >= snap.min_tvl_usd));
    }

    #[test]
    fn test_order_independent_of_batch_order() {
        let eth = batch(1, "ethereum", vec![reserve("USDC", 0.04, 0.05, 5e9), reserve("WETH", 0.02, 0.03, 1e10)]);
        let base = batch(8453, "base", vec![reserve("USDC", 0.05, 0.04, 3e8), reserve("CBBTC", 0.01, 0.02, 2e8)]);
        let now = Utc::now();
        let n = Normaliser::default();

        let a = build_snapshot(&n, &[eth.clone(), base.clone()], 1.0, now);
        let b = build_snapshot(&n, &[base, eth], 1.0, now);
        assert_eq!(a, b);
        let chains: Vec<(&str, u64)> = a.markets.iter().map(|m| (m.symbol.as_str(), m.chain_id)).collect();
        assert_eq!(chains, vec![("USDC", 1), ("USDC", 8453), ("WETH", 1), ("CBBTC", 8453)]);
    }

    struct StaticSource {
        batches: HashMap<String, ReserveBatch>,
    }

    #[async_trait::async_trait]
    impl ReserveSource for StaticSource {
        async fn fetch(&self, descriptor: &MarketDescriptor) -> PipelineResult<ReserveBatch> {
            self.batches
                .get(&descriptor.market_address)
                .cloned()
                .ok_or_else(|| PipelineError::NotFound { descriptor: descriptor.to_string(), kind: "market" })
        }
    }

    fn static_source() -> StaticSource {
        let mut batches = HashMap::new();
        batches.insert("0xmarket1".to_string(), batch(1, "ethereum", vec![reserve("USDC", 0.04, 0.05, 5e9)]));
        batches.insert("0xmarket8453".to_string(), batch(8453, "base", vec![reserve("WETH", 0.02, 0.03, 5e6)]));
        StaticSource { batches }
    }

    #[tokio::test]
    async fn test_run_uses_registry_floor_over_default() {
        let pipeline = Pipeline::new(static_source(), Normaliser::default(), 4, 10_000_000.0);
        let registry = Registry {
            descriptors: vec![MarketDescriptor::market(1, "0xmarket1"), MarketDescriptor::market(8453, "0xmarket8453")],
            min_tvl_usd: Some(1_000_000.0),
        };
        let snap = pipeline.run(&registry).await.unwrap();
        assert_eq!(snap.min_tvl_usd, 1_000_000.0);
        assert_eq!(snap.counts.kept, 2);

        let registry = Registry { min_tvl_usd: None, ..registry };
        let snap = pipeline.run(&registry).await.unwrap();
        assert_eq!(snap.min_tvl_usd, 10_000_000.0);
        assert_eq!(snap.counts.kept, 1);
        assert_eq!(snap.counts.skipped_below_floor, 1);
    }

    #[tokio::test]
    async fn test_run_aborts_on_any_failed_fetch() {
        let pipeline = Pipeline::new(static_source(), Normaliser::default(), 4, 0.0);
        let registry = Registry {
            descriptors: vec![MarketDescriptor::market(1, "0xmarket1"), MarketDescriptor::market(10, "0xmissing")],
            min_tvl_usd: None,
        };
        let err = pipeline.run(&registry).await.unwrap_err();
        assert!(err.to_string().contains("chainId=10 market=0xmissing"));
    }
}
