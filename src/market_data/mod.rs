// Market data module entrypoint
pub mod types;       // descriptors, rows, candidates
pub mod registry;    // markets.json -> descriptors
pub mod adapters;    // reserve sources (Aave GraphQL)
pub mod normaliser;  // raw reserve -> MarketRow candidate
pub mod classifier;  // stable / ethereum tagging
pub mod filter;      // null + TVL floor filter with counters
pub mod ranker;      // 4-tier deterministic ordering
pub mod router;      // orchestrates one run
