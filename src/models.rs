use serde::Serialize;
use serde_json::Value;

use crate::error::{EventError, RoundError};

/// One rendered line of a round's event log
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RenderedLogEntry {
    pub title: String,
    pub desc: String,
    pub event: String,
    pub time: String,
}

/// One line of the round index
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub round_id: String,
    pub round_data: String,
}

/// Failure body returned to API callers
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// A decoded round file.
///
/// The whole decoded mapping is kept, since templates may reference any field of it.
#[derive(Debug, Clone)]
pub struct RoundRecord {
    pub id: String,
    pub map: String,
    /// Start/end in unix seconds. Absent while a round is still being written.
    pub st: Option<i64>,
    pub end: Option<i64>,
    raw: Value,
}

impl RoundRecord {
    pub fn from_value(raw: Value) -> Result<Self, RoundError> {
        if !raw.is_object() {
            return Err(RoundError::Malformed("round record is not a mapping"));
        }
        let id = raw
            .get("id")
            .and_then(scalar_string)
            .ok_or(RoundError::Malformed("missing `id`"))?;
        let map = raw
            .get("map")
            .and_then(scalar_string)
            .ok_or(RoundError::Malformed("missing `map`"))?;
        let st = raw.get("st").and_then(unix_seconds);
        let end = raw.get("end").and_then(unix_seconds);
        if !raw.get("events").is_some_and(Value::is_array) {
            return Err(RoundError::Malformed("missing `events` sequence"));
        }

        Ok(Self {
            id,
            map,
            st,
            end,
            raw,
        })
    }

    /// The full record, used as the primary placeholder context
    pub fn context(&self) -> &Value {
        &self.raw
    }

    /// Raw event entries in logged order
    pub fn events(&self) -> &[Value] {
        self.raw
            .get("events")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// A validated view over one raw event entry
#[derive(Debug)]
pub struct EventEntry<'a> {
    pub e_type: &'a str,
    pub data: &'a Value,
    pub ts: i64,
}

impl<'a> EventEntry<'a> {
    pub fn from_value(raw: &'a Value) -> Result<Self, EventError> {
        let e_type = raw
            .get("e_type")
            .and_then(Value::as_str)
            .ok_or(EventError::MissingType)?;
        let data = raw
            .get("data")
            .filter(|d| d.is_object())
            .ok_or(EventError::MissingData)?;
        let ts = data
            .get("ts")
            .and_then(unix_seconds)
            .ok_or(EventError::MissingTimestamp)?;

        Ok(Self { e_type, data, ts })
    }
}

/// String form of an identifier that may be stored as a string or a number.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whole unix seconds from an integer or float timestamp. Floats are floored.
pub fn unix_seconds(value: &Value) -> Option<i64> {
    if let Some(secs) = value.as_i64() {
        return Some(secs);
    }
    let secs = value.as_f64()?.floor();
    if secs.is_finite() && secs >= i64::MIN as f64 && secs < i64::MAX as f64 {
        Some(secs as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_record_accepts_numeric_ids() {
        let record = RoundRecord::from_value(json!({
            "id": 42,
            "map": 7,
            "st": 1_700_000_000.75,
            "end": 1_700_000_600,
            "events": [],
        }))
        .unwrap();

        assert_eq!(record.id, "42");
        assert_eq!(record.map, "7");
        assert_eq!(record.st, Some(1_700_000_000));
        assert_eq!(record.end, Some(1_700_000_600));
        assert!(record.events().is_empty());
    }

    #[test]
    fn test_round_record_requires_events() {
        let err = RoundRecord::from_value(json!({
            "id": "r1", "map": "de_dust", "st": 0, "end": 1,
        }))
        .unwrap_err();

        assert!(matches!(err, RoundError::Malformed(_)));
    }

    #[test]
    fn test_round_record_without_end() {
        let record = RoundRecord::from_value(json!({
            "id": "live", "map": "de_dust2", "st": 10, "events": [],
        }))
        .unwrap();

        assert_eq!(record.st, Some(10));
        assert_eq!(record.end, None);
    }

    #[test]
    fn test_event_entry_validation() {
        let ok = json!({"e_type": "kill", "data": {"ts": 5}});
        let entry = EventEntry::from_value(&ok).unwrap();
        assert_eq!(entry.e_type, "kill");
        assert_eq!(entry.ts, 5);

        let no_data = json!({"e_type": "kill"});
        assert_eq!(EventEntry::from_value(&no_data).unwrap_err(), EventError::MissingData);

        let no_ts = json!({"e_type": "kill", "data": {}});
        assert_eq!(EventEntry::from_value(&no_ts).unwrap_err(), EventError::MissingTimestamp);

        let no_type = json!({"data": {"ts": 1}});
        assert_eq!(EventEntry::from_value(&no_type).unwrap_err(), EventError::MissingType);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = RoundSummary {
            round_id: "r1".to_string(),
            round_data: "Dust, x - y".to_string(),
        };
        let value = serde_json::to_value(summary).unwrap();
        assert_eq!(value, json!({"roundId": "r1", "roundData": "Dust, x - y"}));
    }
}
