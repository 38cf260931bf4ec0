// Market registry: the list of descriptors to query, read once per run.
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::market_data::types::MarketDescriptor;

#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    pub descriptors: Vec<MarketDescriptor>,
    // None when the document uses the flat list form
    pub min_tvl_usd: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Section {
    Scoped {
        #[serde(rename = "minTvlUsd", default)]
        min_tvl_usd: Option<f64>,
        markets: Vec<MarketDescriptor>,
    },
    Flat(Vec<MarketDescriptor>),
}

impl Registry {
    pub async fn load(path: &Path, namespace: &str) -> PipelineResult<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PipelineError::config(format!("cannot read {}: {}", path.display(), e)))?;
        let registry = Self::parse(&text, namespace)
            .map_err(|e| PipelineError::config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), markets = registry.descriptors.len(), "Loaded market registry");
        Ok(registry)
    }

    /// Parse a markets document and pick the section at a dot-separated path.
    pub fn parse(text: &str, namespace: &str) -> Result<Self, String> {
        let doc: Value = serde_json::from_str(text).map_err(|e| format!("invalid JSON: {}", e))?;

        let mut node = &doc;
        for key in namespace.split('.').filter(|k| !k.is_empty()) {
            node = node
                .get(key)
                .ok_or_else(|| format!("no section at {}", namespace))?;
        }

        let section: Section = Section::deserialize(node).map_err(|_| {
            format!(
                "{} must be a list of markets or an object with keys: minTvlUsd, markets",
                namespace
            )
        })?;

        let registry = match section {
            Section::Scoped { min_tvl_usd, markets } => Registry { descriptors: markets, min_tvl_usd },
            Section::Flat(markets) => Registry { descriptors: markets, min_tvl_usd: None },
        };

        if registry.descriptors.is_empty() {
            return Err(format!("no markets found at {}", namespace));
        }
        if let Some(floor) = registry.min_tvl_usd {
            if !floor.is_finite() || floor < 0.0 {
                return Err(format!("{}.minTvlUsd must be a non-negative number", namespace));
            }
        }
        Ok(registry)
    }
}
