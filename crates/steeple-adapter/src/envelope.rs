//! Response envelopes
//!
//! JSON:API-flavored wrappers shared by the supported ChMS providers: a
//! `data` array or object, side-loaded `included` records, `links`, and a
//! `meta` block carrying the pagination cursor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope for a paginated list response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListEnvelope {
    /// The records on this page.
    #[serde(default)]
    pub data: Vec<Value>,

    /// Side-loaded related records.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Value>,

    /// Navigation links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,

    /// Pagination and count metadata.
    #[serde(default)]
    pub meta: Meta,
}

impl ListEnvelope {
    /// The offset of the next page, if the provider reported one.
    ///
    /// Absence signals the end of the stream.
    #[must_use]
    pub fn next_offset(&self) -> Option<u64> {
        self.meta.next.as_ref().map(|n| n.offset)
    }
}

/// Envelope for a single-record response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleEnvelope {
    /// The record.
    pub data: Value,

    /// Side-loaded related records.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Value>,
}

/// Navigation links on a list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Links {
    /// This page.
    #[serde(default, rename = "self")]
    pub this: Option<String>,

    /// The next page, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Pagination and count metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    /// Records on this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,

    /// Total records across all pages.
    #[serde(
        default,
        rename = "total_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_count: Option<u64>,

    /// Cursor for the next page; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<NextPage>,
}

/// The next-page cursor inside `meta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextPage {
    /// Offset of the first record on the next page.
    pub offset: u64,
}

/// Merge a JSON:API record's attributes and id into one flat object.
///
/// Records without an `attributes` object pass through unchanged.
#[must_use]
pub fn flatten_record(data: &Value) -> Value {
    let Some(obj) = data.as_object() else {
        return data.clone();
    };
    match obj.get("attributes").and_then(Value::as_object) {
        Some(attrs) => {
            let mut record = attrs.clone();
            if let Some(id) = obj.get("id") {
                record.insert("id".to_string(), id.clone());
            }
            Value::Object(record)
        }
        None => data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_envelope_with_next_cursor() {
        let envelope: ListEnvelope = serde_json::from_value(json!({
            "data": [{"id": "per_1"}, {"id": "per_2"}],
            "links": {"self": "https://api.example.com/people?offset=0"},
            "meta": {"count": 2, "total_count": 27, "next": {"offset": 25}}
        }))
        .unwrap();

        assert_eq!(envelope.data.len(), 2);
        assert_eq!(envelope.next_offset(), Some(25));
        assert_eq!(envelope.meta.total_count, Some(27));
    }

    #[test]
    fn test_list_envelope_last_page() {
        let envelope: ListEnvelope = serde_json::from_value(json!({
            "data": [{"id": "per_3"}],
            "meta": {"count": 1}
        }))
        .unwrap();

        assert_eq!(envelope.next_offset(), None);
    }

    #[test]
    fn test_flatten_record() {
        let flat = flatten_record(&json!({
            "type": "Person",
            "id": "per_1",
            "attributes": {"first_name": "Ada"}
        }));
        assert_eq!(flat, json!({"id": "per_1", "first_name": "Ada"}));

        let passthrough = flatten_record(&json!({"id": "x", "name": "plain"}));
        assert_eq!(passthrough, json!({"id": "x", "name": "plain"}));
    }

    #[test]
    fn test_single_envelope() {
        let envelope: SingleEnvelope = serde_json::from_value(json!({
            "data": {"id": "per_1", "attributes": {"first_name": "Ada"}},
            "included": [{"id": "addr_1"}]
        }))
        .unwrap();

        assert_eq!(envelope.data["id"], "per_1");
        assert_eq!(envelope.included.len(), 1);
    }
}
