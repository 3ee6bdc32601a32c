//! Payload filters: validation, translation to Qdrant `must` clauses, and
//! local evaluation for the in-memory index.

use serde_json::{json, Value};

use interior_core::types::{FilterValue, Filters, MatchValue, Payload};
use interior_core::{Error, Result};

pub fn validate_filters(filters: &Filters) -> Result<()> {
    for (key, value) in filters {
        if key.trim().is_empty() {
            return Err(Error::InvalidFilter("filter key must not be empty".into()));
        }
        match value {
            FilterValue::Any(values) if values.is_empty() => {
                return Err(Error::InvalidFilter(format!("'{key}' matches an empty set")));
            }
            FilterValue::Any(values) => {
                for v in values {
                    validate_value(key, v)?;
                }
            }
            FilterValue::One(v) => validate_value(key, v)?,
        }
    }
    Ok(())
}

fn validate_value(key: &str, value: &MatchValue) -> Result<()> {
    match value {
        MatchValue::Keyword(s) if s.trim().is_empty() => {
            Err(Error::InvalidFilter(format!("'{key}' has an empty value")))
        }
        _ => Ok(()),
    }
}

/// `None` when there is nothing to filter on.
pub fn to_qdrant_filter(filters: &Filters) -> Result<Option<Value>> {
    validate_filters(filters)?;
    if filters.is_empty() {
        return Ok(None);
    }
    let must: Vec<Value> = filters
        .iter()
        .map(|(key, value)| match value {
            FilterValue::One(v) => json!({ "key": key, "match": { "value": v } }),
            FilterValue::Any(vs) => json!({ "key": key, "match": { "any": vs } }),
        })
        .collect();
    Ok(Some(json!({ "must": must })))
}

/// Every condition must hold. Array-valued payload fields match when any
/// element matches; keywords compare case-insensitively.
pub fn matches_payload(filters: &Filters, payload: &Payload) -> bool {
    filters.iter().all(|(key, cond)| {
        let Some(field) = payload.get(key) else { return false };
        let wanted: &[MatchValue] = match cond {
            FilterValue::One(v) => std::slice::from_ref(v),
            FilterValue::Any(vs) => vs,
        };
        match field {
            Value::Array(items) => items.iter().any(|item| wanted.iter().any(|w| value_matches(w, item))),
            other => wanted.iter().any(|w| value_matches(w, other)),
        }
    })
}

fn value_matches(wanted: &MatchValue, actual: &Value) -> bool {
    match (wanted, actual) {
        (MatchValue::Keyword(w), Value::String(a)) => w.eq_ignore_ascii_case(a),
        (MatchValue::Integer(w), Value::Number(a)) => a.as_i64() == Some(*w),
        (MatchValue::Bool(w), Value::Bool(a)) => w == a,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(json: &str) -> Filters {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn scalar_and_array_become_value_and_any() {
        let f = filters(r#"{"room_type":"bedroom","materials":["wood","cane"]}"#);
        let q = to_qdrant_filter(&f).unwrap().unwrap();
        assert_eq!(
            q,
            json!({ "must": [
                { "key": "materials", "match": { "any": ["wood", "cane"] } },
                { "key": "room_type", "match": { "value": "bedroom" } },
            ]})
        );
        assert!(to_qdrant_filter(&Filters::new()).unwrap().is_none());
    }

    #[test]
    fn malformed_filters_are_rejected() {
        assert!(matches!(to_qdrant_filter(&filters(r#"{"colors":[]}"#)), Err(Error::InvalidFilter(_))));
        assert!(matches!(to_qdrant_filter(&filters(r#"{"room_type":" "}"#)), Err(Error::InvalidFilter(_))));
        assert!(matches!(to_qdrant_filter(&filters(r#"{"":"x"}"#)), Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn local_matching_handles_arrays_and_case() {
        let payload: Payload =
            serde_json::from_str(r#"{"room_type":"bedroom","colors":["white","brown"],"floor":2}"#).unwrap();
        assert!(matches_payload(&filters(r#"{"room_type":"Bedroom"}"#), &payload));
        assert!(matches_payload(&filters(r#"{"colors":["black","brown"]}"#), &payload));
        assert!(matches_payload(&filters(r#"{"floor":2}"#), &payload));
        assert!(!matches_payload(&filters(r#"{"colors":"black"}"#), &payload));
        assert!(!matches_payload(&filters(r#"{"budget_category":"luxury"}"#), &payload));
    }
}
