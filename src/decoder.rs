use crate::error::{IngestError, Result};
use crate::types::{FieldValue, IngestConfig, Order, Record};
use serde_json::Value;

/// Decodes one archive entry into its list of orders
pub struct DocumentDecoder {
    orders_key: String,
    line_items_key: String,
}

impl Default for DocumentDecoder {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

impl DocumentDecoder {
    pub fn new(orders_key: impl Into<String>, line_items_key: impl Into<String>) -> Self {
        DocumentDecoder {
            orders_key: orders_key.into(),
            line_items_key: line_items_key.into(),
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.orders_key.clone(), config.line_items_key.clone())
    }

    /// Parse a document and return its orders, line items already detached.
    ///
    /// Errors carry an empty entry name; callers that know the entry attach it.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<Order>> {
        let document = parse_json(bytes)?;

        let Value::Object(mut root) = document else {
            return Err(mismatch(format!(
                "expected a top-level object holding \"{}\"",
                self.orders_key
            )));
        };

        let orders = match root.remove(&self.orders_key) {
            Some(Value::Array(orders)) => orders,
            Some(other) => {
                return Err(mismatch(format!(
                    "\"{}\" is {}, expected an array",
                    self.orders_key,
                    kind_of(&other)
                )))
            }
            None => {
                return Err(mismatch(format!(
                    "missing top-level key \"{}\"",
                    self.orders_key
                )))
            }
        };

        orders
            .into_iter()
            .enumerate()
            .map(|(idx, value)| self.decode_order(idx, value))
            .collect()
    }

    fn decode_order(&self, idx: usize, value: Value) -> Result<Order> {
        let obj = match value {
            Value::Object(obj) => obj,
            other => {
                return Err(mismatch(format!(
                    "order #{} is {}, expected an object",
                    idx,
                    kind_of(&other)
                )))
            }
        };

        // Detach before the remaining fields become the order row
        let mut fields = Record::from_map(obj);
        let line_items = match fields.remove(&self.line_items_key) {
            None | Some(FieldValue::Null) => Vec::new(),
            Some(FieldValue::Nested(Value::Array(items))) => self.decode_items(idx, items)?,
            Some(other) => {
                return Err(mismatch(format!(
                    "order #{} \"{}\" is {}, expected an array",
                    idx,
                    self.line_items_key,
                    kind_of_field(&other)
                )))
            }
        };

        Ok(Order { fields, line_items })
    }

    fn decode_items(&self, order_idx: usize, items: Vec<Value>) -> Result<Vec<Record>> {
        items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(obj) => Ok(Record::from_map(obj)),
                other => Err(mismatch(format!(
                    "order #{} line item #{} is {}, expected an object",
                    order_idx,
                    idx,
                    kind_of(&other)
                ))),
            })
            .collect()
    }
}

/// Decode with the default keys (`orders`, `line_items`)
pub fn decode_document(bytes: &[u8]) -> Result<Vec<Order>> {
    DocumentDecoder::default().decode(bytes)
}

/// Parse with simd-json, falling back to serde_json for a located error message
fn parse_json(bytes: &[u8]) -> Result<Value> {
    let mut buffer = bytes.to_vec();
    match simd_json::serde::from_slice::<Value>(&mut buffer) {
        Ok(value) => Ok(value),
        Err(_) => serde_json::from_slice::<Value>(bytes).map_err(|e| IngestError::Decode {
            entry: String::new(),
            message: e.to_string(),
        }),
    }
}

fn mismatch(message: String) -> IngestError {
    IngestError::SchemaMismatch {
        entry: String::new(),
        message,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn kind_of_field(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Null => "null",
        FieldValue::Bool(_) => "a boolean",
        FieldValue::Integer(_) | FieldValue::Float(_) => "a number",
        FieldValue::Text(_) => "a string",
        FieldValue::Nested(nested) => kind_of(nested),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_detaches_line_items() {
        let bytes = br#"{"orders": [{"id": 1, "email": "a@b.com", "line_items": [{"id": "i1", "quantity": 2}]}]}"#;
        let orders = decode_document(bytes).unwrap();

        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        assert_eq!(order.fields.get("id"), Some(&FieldValue::Integer(1)));
        assert_eq!(order.fields.get("email"), Some(&FieldValue::Text("a@b.com".into())));
        assert!(!order.fields.contains("line_items"));

        assert_eq!(order.line_items.len(), 1);
        assert_eq!(order.line_items[0].get("id"), Some(&FieldValue::Text("i1".into())));
        assert_eq!(order.line_items[0].get("quantity"), Some(&FieldValue::Integer(2)));
    }

    #[test]
    fn test_decode_keeps_document_order() {
        let bytes = br#"{"orders": [
            {"id": 2, "line_items": [{"id": "b"}, {"id": "a"}]},
            {"id": 1}
        ]}"#;
        let orders = decode_document(bytes).unwrap();

        assert_eq!(orders[0].fields.get("id"), Some(&FieldValue::Integer(2)));
        assert_eq!(orders[1].fields.get("id"), Some(&FieldValue::Integer(1)));
        assert_eq!(orders[0].line_items[0].get("id"), Some(&FieldValue::Text("b".into())));
        assert_eq!(orders[0].line_items[1].get("id"), Some(&FieldValue::Text("a".into())));
    }

    #[test]
    fn test_missing_or_null_line_items_is_empty() {
        let orders = decode_document(br#"{"orders": [{"id": 1}, {"id": 2, "line_items": null}]}"#).unwrap();
        assert!(orders[0].line_items.is_empty());
        assert!(orders[1].line_items.is_empty());
        assert!(!orders[1].fields.contains("line_items"));
    }

    #[test]
    fn test_empty_order_list() {
        let orders = decode_document(br#"{"orders": []}"#).unwrap();
        assert!(orders.is_empty());
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        let err = decode_document(br#"{"orders": [{"id": 1,}"#).unwrap_err();
        assert!(matches!(err, IngestError::Decode { .. }));
    }

    #[test]
    fn test_missing_orders_key_is_mismatch() {
        let err = decode_document(br#"{"customers": []}"#).unwrap_err();
        match err {
            IngestError::SchemaMismatch { message, .. } => assert!(message.contains("orders")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_orders_not_a_list_is_mismatch() {
        let err = decode_document(br#"{"orders": {"id": 1}}"#).unwrap_err();
        assert!(matches!(err, IngestError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_top_level_array_is_mismatch() {
        let err = decode_document(br#"[{"orders": []}]"#).unwrap_err();
        assert!(matches!(err, IngestError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_non_object_line_item_is_mismatch() {
        let err = decode_document(br#"{"orders": [{"id": 1, "line_items": [1, 2]}]}"#).unwrap_err();
        assert!(matches!(err, IngestError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_custom_keys() {
        let decoder = DocumentDecoder::new("data", "lines");
        let orders = decoder
            .decode(br#"{"data": [{"id": 9, "lines": [{"id": "x"}], "line_items": "kept"}]}"#)
            .unwrap();

        assert_eq!(orders[0].line_items.len(), 1);
        assert_eq!(
            orders[0].fields.get("line_items"),
            Some(&FieldValue::Text("kept".into()))
        );
    }

    #[test]
    fn test_nested_fields_pass_through_decode() {
        let orders = decode_document(br#"{"orders": [{"id": 1, "customer": {"id": 5}}]}"#).unwrap();
        assert!(matches!(orders[0].fields.get("customer"), Some(FieldValue::Nested(_))));
    }
}
