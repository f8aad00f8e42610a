//! Canonical wire schema for the persisted store
//!
//! The store is a JSON array of `{"key": ..., "secret": ...}` objects in
//! list order. Gateways may hand back either an already-parsed JSON value
//! or the raw text; [`decode`] is the one place either form becomes
//! entries.

use serde_json::Value;
use thiserror::Error;

use crate::entry::Entry;

/// What a gateway returns from a load
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Already-parsed JSON
    Json(Value),
    /// Serialized JSON text
    Text(String),
}

impl Payload {
    /// The payload of a store that has never been written
    pub fn empty() -> Self {
        Payload::Json(Value::Array(Vec::new()))
    }
}

/// Loaded data could not be read as a list of entries
#[derive(Error, Debug)]
pub enum LoadParseError {
    #[error("Store is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("Store is not a list of entries")]
    NotASequence,

    #[error("Malformed entry in store: {0}")]
    Entry(#[source] serde_json::Error),
}

/// Decode a load payload into entries
pub fn decode(payload: Payload) -> Result<Vec<Entry>, LoadParseError> {
    let value = match payload {
        Payload::Json(Value::String(text)) | Payload::Text(text) => {
            serde_json::from_str::<Value>(&text).map_err(LoadParseError::Syntax)?
        }
        Payload::Json(value) => value,
    };

    if !value.is_array() {
        return Err(LoadParseError::NotASequence);
    }

    serde_json::from_value(value).map_err(LoadParseError::Entry)
}

/// Encode entries in the canonical form
pub fn encode(entries: &[Entry]) -> Result<String, serde_json::Error> {
    serde_json::to_string(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_native_sequence() {
        let payload = Payload::Json(json!([{"key": "a", "secret": "p"}]));
        assert_eq!(decode(payload).unwrap(), vec![Entry::new("a", "p")]);
    }

    #[test]
    fn test_decode_serialized_text() {
        let payload = Payload::Text(r#"[{"key":"a","password":"p"},{"key":"b","secret":"q"}]"#.into());
        assert_eq!(
            decode(payload).unwrap(),
            vec![Entry::new("a", "p"), Entry::new("b", "q")]
        );
    }

    #[test]
    fn test_decode_string_wrapped_in_json() {
        let payload = Payload::Json(Value::String(r#"[{"key":"a","secret":"p"}]"#.into()));
        assert_eq!(decode(payload).unwrap(), vec![Entry::new("a", "p")]);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(
            decode(Payload::Text("No passwords found".into())),
            Err(LoadParseError::Syntax(_))
        ));
        assert!(matches!(
            decode(Payload::Json(json!({"key": "a"}))),
            Err(LoadParseError::NotASequence)
        ));
        assert!(matches!(
            decode(Payload::Json(json!([{"name": "a"}]))),
            Err(LoadParseError::Entry(_))
        ));
    }

    #[test]
    fn test_empty_payload() {
        assert!(decode(Payload::empty()).unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let entries = vec![
            Entry::new("z", "1"),
            Entry::new("a", "2"),
            Entry::new("a", "3"),
        ];
        let text = encode(&entries).unwrap();
        assert_eq!(decode(Payload::Text(text)).unwrap(), entries);
    }
}
