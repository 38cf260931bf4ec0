// Source: https://api.v3.aave.com/graphql (queries `reserve` and `market`)
//
// Every level is optional: the API returns null sub-objects for reserves
// that are frozen, paused or missing price data.
use serde::{Deserialize, Deserializer};

pub const RESERVE_QUERY: &str = r#"
query GetReserve($request: ReserveRequest!) {
  reserve(request: $request) {
    underlyingToken { address symbol }
    supplyInfo { apy { value } total { value } }
    borrowInfo {
      apy { value }
      total { usdPerToken }
      utilizationRate { value }
    }
  }
}
"#;

pub const MARKET_QUERY: &str = r#"
query GetMarket($request: MarketRequest!) {
  market(request: $request) {
    address
    chain { chainId name }
    reserves {
      underlyingToken { address symbol }
      supplyInfo { apy { value } total { value } }
      borrowInfo {
        apy { value }
        total { usdPerToken }
        utilizationRate { value }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ReserveData {
    #[serde(default)]
    pub reserve: Option<RawReserve>,
}

#[derive(Debug, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub market: Option<RawMarket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMarket {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub chain: Option<RawChain>,
    #[serde(default)]
    pub reserves: Option<Vec<Option<RawReserve>>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChain {
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReserve {
    #[serde(default)]
    pub underlying_token: Option<RawToken>,
    #[serde(default)]
    pub supply_info: Option<RawSupplyInfo>,
    #[serde(default)]
    pub borrow_info: Option<RawBorrowInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawToken {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSupplyInfo {
    #[serde(default)]
    pub apy: Option<RawValue>,
    #[serde(default)]
    pub total: Option<RawValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBorrowInfo {
    #[serde(default)]
    pub apy: Option<RawValue>,
    #[serde(default)]
    pub total: Option<RawBorrowTotal>,
    #[serde(default)]
    pub utilization_rate: Option<RawValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawValue {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBorrowTotal {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd_per_token: Option<f64>,
}

// BigDecimal leaves come back as strings ("0.0312"), sometimes as numbers.
// Anything unparsable or non-finite is treated the same as null.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }

    let parsed = match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(NumberOrString::Other(_)) | None => None,
    };
    Ok(parsed.filter(|v| v.is_finite()))
}
