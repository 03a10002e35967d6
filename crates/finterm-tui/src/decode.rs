//! Order-preserving decode for flat JSON objects.
//!
//! `serde_json`'s default map type reorders keys, but the crypto and budget
//! tables must render rows in the order the worker wrote them. Driving a
//! `Visitor` through `deserialize_map` observes entries in source-byte order
//! without buffering the whole document twice. The crate enables
//! `arbitrary_precision`, so numeric values keep their original text and
//! large integers survive without an f64 round-trip.

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::error::FeedError;

/// Decodes `bytes` as a flat JSON object, preserving key order.
pub fn decode_ordered_object(bytes: &[u8]) -> Result<Vec<(String, Value)>, FeedError> {
    let OrderedObject(pairs) = serde_json::from_slice(bytes)
        .map_err(|err| FeedError::Decode(err.to_string()))?;
    Ok(pairs)
}

/// Render a decoded value as table text: strings unquoted, numbers as their
/// source text, everything else in JSON form.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

struct OrderedObject(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for OrderedObject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedObjectVisitor;

        impl<'de> Visitor<'de> for OrderedObjectVisitor {
            type Value = Vec<(String, Value)>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a flat JSON object")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    pairs.push((key, value));
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(OrderedObjectVisitor).map(OrderedObject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_source_key_order() {
        let payload = br#"{"btc": 64000.5, "eth": "3100.20", "doge": 0.1}"#;
        for _ in 0..3 {
            let pairs = decode_ordered_object(payload).unwrap();
            let keys: Vec<&str> = pairs.iter().map(|(key, _)| key.as_str()).collect();
            assert_eq!(keys, ["btc", "eth", "doge"]);
        }
    }

    #[test]
    fn large_integers_keep_their_digits() {
        let payload = br#"{"sats": 9007199254740993}"#;
        let pairs = decode_ordered_object(payload).unwrap();
        assert_eq!(display_value(&pairs[0].1), "9007199254740993");
    }

    #[test]
    fn strings_render_unquoted() {
        let payload = br#"{"bitcoin": "64,000 USD"}"#;
        let pairs = decode_ordered_object(payload).unwrap();
        assert_eq!(display_value(&pairs[0].1), "64,000 USD");
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(matches!(
            decode_ordered_object(b"[1, 2, 3]"),
            Err(FeedError::Decode(_))
        ));
        assert!(matches!(
            decode_ordered_object(b"{\"truncated\":"),
            Err(FeedError::Decode(_))
        ));
    }
}
