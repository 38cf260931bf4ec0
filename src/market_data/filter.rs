use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::market_data::types::{Candidate, MarketRow};

/// Per-run counters. `reserves_seen == skipped_nulls + skipped_below_floor + kept`.
///
/// The classification tallies cover kept rows only, so
/// `stable + non_stable == kept` and `ethereum + non_ethereum == kept`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub reserves_seen: u64,
    pub skipped_nulls: u64,
    pub skipped_below_floor: u64,
    pub kept: u64,
    #[serde(default)]
    pub stable: u64,
    #[serde(default)]
    pub non_stable: u64,
    #[serde(default)]
    pub ethereum: u64,
    #[serde(default)]
    pub non_ethereum: u64,
}

pub struct QualityFilter {
    pub min_tvl_usd: f64,
    counts: Counts,
}

impl QualityFilter {
    pub fn new(min_tvl_usd: f64) -> Self {
        Self { min_tvl_usd, counts: Counts::default() }
    }

    /// Keep or drop one candidate, bumping exactly one outcome counter.
    pub fn admit(&mut self, candidate: Candidate) -> Option<MarketRow> {
        self.counts.reserves_seen += 1;
        match candidate {
            Candidate::Incomplete(reason) => {
                debug!(%reason, "Dropping incomplete reserve");
                self.counts.skipped_nulls += 1;
                None
            }
            Candidate::Complete(row) if row.tvl_usd < self.min_tvl_usd => {
                debug!(symbol = %row.symbol, chain = %row.chain_name, tvl_usd = row.tvl_usd, "Dropping reserve below TVL floor");
                self.counts.skipped_below_floor += 1;
                None
            }
            Candidate::Complete(row) => {
                self.counts.kept += 1;
                if row.is_stable {
                    self.counts.stable += 1;
                } else {
                    self.counts.non_stable += 1;
                }
                if row.is_ethereum {
                    self.counts.ethereum += 1;
                } else {
                    self.counts.non_ethereum += 1;
                }
                Some(row)
            }
        }
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }
}
