pub mod types;
pub use types::*;
pub mod snapshot;
pub mod file;
pub mod rest;
pub mod postgres;
use async_trait::async_trait;

#[async_trait]
pub trait SnapshotStore {
    async fn load_snapshot(&self) -> PersistResult<Option<Snapshot>>;
    async fn save_snapshot(&mut self, snapshot: &Snapshot) -> PersistResult<()>;
}

#[async_trait]
pub trait RowSink {
    async fn insert_rows(&self, rows: &[RateRow]) -> PersistResult<()>;
}
