use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;

use crate::persist::types::{PersistResult, RateRow};
use crate::persist::RowSink;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {table} (
    id BIGSERIAL PRIMARY KEY,
    ts TIMESTAMPTZ NOT NULL,
    chain_id BIGINT NOT NULL,
    market TEXT NOT NULL,
    symbol TEXT NOT NULL,
    supply_apy DOUBLE PRECISION NOT NULL,
    borrow_apy DOUBLE PRECISION NOT NULL,
    tvl_usd DOUBLE PRECISION NOT NULL,
    utilization DOUBLE PRECISION NOT NULL
)
"#;

/// Direct time-series insert, the database-side twin of the REST sink.
pub struct PostgresRowSink {
    connection_pool: PgPool,
    table: String,
}

impl PostgresRowSink {
    pub async fn connect(database_url: &str, table: &str) -> PersistResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self {
            connection_pool: pool,
            table: table.to_string(),
        })
    }

    pub async fn ensure_table(&self) -> PersistResult<()> {
        sqlx::query(&CREATE_TABLE.replace("{table}", &self.table))
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }
}

// One multi-row INSERT; table names come from settings, never from API data
fn insert_query<'a>(table: &str, rows: &'a [RateRow]) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} (ts, chain_id, market, symbol, supply_apy, borrow_apy, tvl_usd, utilization) ",
        table
    ));
    qb.push_values(rows, |mut b, row| {
        b.push_bind(row.ts)
            .push_bind(row.chain_id as i64)
            .push_bind(row.market.as_str())
            .push_bind(row.symbol.as_str())
            .push_bind(row.supply_apy)
            .push_bind(row.borrow_apy)
            .push_bind(row.tvl_usd)
            .push_bind(row.utilization);
    });
    qb
}

#[async_trait::async_trait]
impl RowSink for PostgresRowSink {
    async fn insert_rows(&self, rows: &[RateRow]) -> PersistResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut tx = self.connection_pool.begin().await?;
        insert_query(&self.table, rows).build().execute(&mut *tx).await?;
        tx.commit().await?;

        info!(table = %self.table, rows = rows.len(), "Inserted rows");
        Ok(())
    }
}
