use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One full payload as reported by `GET /api/refresh`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: Summary,

    #[serde(default, rename = "cryptos", deserialize_with = "null_as_default")]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_count: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub valid_count: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub data_quality_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub price_usd: Option<f64>,
    #[serde(default)]
    pub market_cap_usd: Option<f64>,
    #[serde(default)]
    pub volume_24h_usd: Option<f64>,
    #[serde(default)]
    pub change_24h_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub update_count: Option<u64>,
    #[serde(default)]
    pub error_count: Option<u64>,
}

/// Body of `GET /api/refresh`. Success carries `data`, failure carries `message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Snapshot>,
}

/// Body of `GET /api/data`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataResponse {
    #[serde(default)]
    pub stats: Option<Stats>,
    #[serde(default)]
    pub last_update: Option<String>,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cache: CacheHealth,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheHealth {
    #[serde(default)]
    pub has_data: bool,
    #[serde(default)]
    pub last_update: Option<String>,
    #[serde(default)]
    pub update_count: u64,
    #[serde(default)]
    pub error_count: u64,
}

/// Accepts RFC 3339 timestamps as well as the naive ISO form the backend
/// emits (`2024-05-01T12:00:00.123456`), which is UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Anything that is not a readable timestamp string counts as no timestamp.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => {
            let parsed = parse_timestamp(&s);
            if parsed.is_none() {
                log::debug!("Ignoring unreadable timestamp {:?}", s);
            }
            parsed
        }
        _ => None,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
