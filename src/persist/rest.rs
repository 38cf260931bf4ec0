// Bulk row insert into a PostgREST-style endpoint (`{base}/rest/v1/{table}`)
use std::time::Duration;

use tracing::info;

use crate::persist::types::{PersistError, PersistResult, RateRow};
use crate::persist::RowSink;

pub struct RestRowSink {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestRowSink {
    pub fn new(base_url: &str, api_key: &str, table: &str, timeout: Duration) -> PersistResult<Self> {
        if api_key.trim().is_empty() {
            return Err(PersistError::MissingCredential("rest_key"));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl RowSink for RestRowSink {
    async fn insert_rows(&self, rows: &[RateRow]) -> PersistResult<()> {
        let res = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(PersistError::Rejected { status: status.as_u16(), body });
        }

        info!(endpoint = %self.endpoint, rows = rows.len(), "Inserted rows");
        Ok(())
    }
}
