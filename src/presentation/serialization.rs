use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub trait Serializable: Serialize + for<'de> Deserialize<'de> {}

impl<T> Serializable for T where T: Serialize + for<'de> Deserialize<'de> {}

pub struct Serializer;

impl Serializer {
    pub fn from_json<T: Serializable>(json: &str) -> Result<T> {
        serde_json::from_str(json).context("Failed to deserialize from JSON")
    }

    pub fn to_json_pretty<T: Serializable>(value: &T) -> Result<String> {
        serde_json::to_string_pretty(value).context("Failed to serialize to pretty JSON")
    }
}

/// Reads a document id that is either a plain string or an extended-JSON `{"$oid": "..."}`.
pub(crate) fn object_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Plain(String),
        Extended {
            #[serde(rename = "$oid")]
            oid: String,
        },
    }

    match RawId::deserialize(deserializer)? {
        RawId::Plain(id) | RawId::Extended { oid: id } => Ok(id),
    }
}

/// Like counts arrive as integers, floats, numeric strings or `null`; negatives read as 0.
pub(crate) fn like_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let count = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| if f > 0.0 { f.floor() as u64 } else { 0 }))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().map(|n| n.max(0) as u64).unwrap_or(0),
        _ => 0,
    };
    Ok(count)
}

/// Timestamps are RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` or a bare date; anything else is dropped.
pub(crate) fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_datetime))
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
