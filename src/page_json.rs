//! Decoding of query api responses into the json stored on the page.
//!
//! Two independent steps, each with its own error:
//! 1. walk `query.pages.<first>.revisions[0]["*"]` ([`StorageError::MalformedEnvelope`]),
//! 2. parse that text as json ([`StorageError::InvalidPageJson`]).

use serde_json::Value;

use crate::errors::{EnvelopeStep, Result, StorageError};

/// Get the wikitext of the first revision of the first page in a query result.
///
/// Only the first key of `pages` is read, in the order the response listed them.
pub fn page_content(envelope: &Value) -> Result<&str> {
    let pages = envelope
        .get("query")
        .ok_or(StorageError::malformed(EnvelopeStep::Query))?
        .get("pages")
        .and_then(Value::as_object)
        .ok_or(StorageError::malformed(EnvelopeStep::Pages))?;
    let (_, page) = pages
        .iter()
        .next()
        .ok_or(StorageError::malformed(EnvelopeStep::FirstPage))?;
    page.get("revisions")
        .and_then(Value::as_array)
        .ok_or(StorageError::malformed(EnvelopeStep::Revisions))?
        .first()
        .ok_or(StorageError::malformed(EnvelopeStep::FirstRevision))?
        .get("*")
        .and_then(Value::as_str)
        .ok_or(StorageError::malformed(EnvelopeStep::Content))
}

/// Decode a query api response into the json value stored on the page.
pub fn decode_page(envelope: &Value) -> Result<Value> {
    let content = page_content(envelope)?;
    serde_json::from_str(content).map_err(StorageError::InvalidPageJson)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(content: &str) -> Value {
        json!({"query": {"pages": {"12345": {"revisions": [{"*": content}]}}}})
    }

    fn malformed_step(value: &Value) -> EnvelopeStep {
        match decode_page(value) {
            Err(StorageError::MalformedEnvelope { step }) => step,
            other => panic!("expected MalformedEnvelope, got {:?}", other),
        }
    }

    #[test]
    fn decodes_object() {
        let value = decode_page(&envelope(r#"{"valid": "json"}"#)).unwrap();
        assert_eq!(value, json!({"valid": "json"}));
    }

    #[test]
    fn decodes_any_json_value() {
        assert_eq!(decode_page(&envelope("[1, 2]")).unwrap(), json!([1, 2]));
        assert_eq!(decode_page(&envelope("42")).unwrap(), json!(42));
        assert_eq!(decode_page(&envelope("\"s\"")).unwrap(), json!("s"));
        assert_eq!(decode_page(&envelope("null")).unwrap(), Value::Null);
    }

    #[test]
    fn invalid_page_body() {
        let err = decode_page(&envelope("not a valid json")).unwrap_err();
        assert!(matches!(err, StorageError::InvalidPageJson(_)));
        assert_eq!(err.to_string(), "page contents are not a valid json");
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let err = decode_page(&json!("bad query result")).unwrap_err();
        assert_eq!(err.to_string(), "unexpected query result");

        assert_eq!(malformed_step(&json!("bad query result")), EnvelopeStep::Query);
        assert_eq!(malformed_step(&json!({"query": {}})), EnvelopeStep::Pages);
        assert_eq!(
            malformed_step(&json!({"query": {"pages": []}})),
            EnvelopeStep::Pages
        );
        assert_eq!(
            malformed_step(&json!({"query": {"pages": {}}})),
            EnvelopeStep::FirstPage
        );
        assert_eq!(
            malformed_step(&json!({"query": {"pages": {"-1": {"missing": ""}}}})),
            EnvelopeStep::Revisions
        );
        assert_eq!(
            malformed_step(&json!({"query": {"pages": {"1": {"revisions": []}}}})),
            EnvelopeStep::FirstRevision
        );
        assert_eq!(
            malformed_step(&json!({"query": {"pages": {"1": {"revisions": [{"*": 5}]}}}})),
            EnvelopeStep::Content
        );
    }

    #[test]
    fn only_first_page_is_read() {
        let value = json!({"query": {"pages": {
            "20": {"revisions": [{"*": "\"first\""}]},
            "10": {"revisions": [{"*": "\"second\""}]},
            "30": "not even a page"
        }}});
        assert_eq!(decode_page(&value).unwrap(), json!("first"));
    }

    #[test]
    fn decoding_is_deterministic() {
        let value = envelope(r#"{"a": [1, {"b": null}]}"#);
        assert_eq!(decode_page(&value).unwrap(), decode_page(&value).unwrap());
    }
}
