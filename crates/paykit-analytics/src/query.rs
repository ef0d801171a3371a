//! URL query encoding for payloads
//!
//! Nested values use bracket notation: arrays become `key[0]`, `key[1]`, and
//! objects become `key[field]`, recursively. `null` and empty containers
//! produce no pairs. Pairs come out in sorted key order.

use reqwest::Url;
use serde_json::Value;

use crate::payload::Payload;

/// Flatten a payload into query pairs
pub fn query_pairs(payload: &Payload) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in payload.iter() {
        flatten(key.clone(), value, &mut pairs);
    }
    pairs
}

fn flatten(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push((key, b.to_string())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(format!("{}[{}]", key, index), item, pairs);
            }
        }
        Value::Object(fields) => {
            for (field, item) in fields {
                flatten(format!("{}[{}]", key, field), item, pairs);
            }
        }
    }
}

/// Endpoint with the payload appended as its query string
pub fn url_with_payload(endpoint: &Url, payload: &Payload) -> Url {
    let mut url = endpoint.clone();
    let pairs = query_pairs(payload);
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}
