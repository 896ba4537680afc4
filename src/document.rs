//! Read-only projections of index documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{CatalogConfig, FieldRole};
use crate::error::{LecternError, Result};
use crate::identifier::CatalogIdentifier;

/// A stored field value: one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// Convert a raw JSON value. Numbers and booleans become strings;
    /// objects and nulls are not representable.
    fn from_json(value: &Value) -> Option<FieldValue> {
        match value {
            Value::Array(items) => {
                let values: Option<Vec<String>> = items.iter().map(scalar_string).collect();
                values.map(FieldValue::Multi)
            }
            other => scalar_string(other).map(FieldValue::Single),
        }
    }

    /// All values as a slice-like iterator.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let values: Vec<&str> = match self {
            FieldValue::Single(v) => vec![v.as_str()],
            FieldValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
        };
        values.into_iter()
    }

    /// First value, if any.
    pub fn first(&self) -> Option<&str> {
        self.values().next()
    }

    /// Values joined for display.
    pub fn joined(&self, separator: &str) -> String {
        self.values().collect::<Vec<_>>().join(separator)
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A catalog document as returned by the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRef {
    identifier: CatalogIdentifier,
    fields: BTreeMap<String, FieldValue>,
    /// Stored fields exactly as the index returned them.
    #[serde(skip)]
    raw: Map<String, Value>,
}

impl DocumentRef {
    /// Project a raw index document, reading its identifier from `key_field`.
    pub fn from_raw(key_field: &str, raw: &Map<String, Value>) -> Result<Self> {
        let key = raw
            .get(key_field)
            .and_then(Value::as_str)
            .ok_or_else(|| LecternError::corrupt(format!("document without {key_field} field")))?;
        let identifier = CatalogIdentifier::from_document_key(key)
            .map_err(|e| LecternError::corrupt(format!("document key {key:?}: {e}")))?;

        let fields = raw
            .iter()
            .filter_map(|(name, value)| FieldValue::from_json(value).map(|v| (name.clone(), v)))
            .collect();

        Ok(DocumentRef {
            identifier,
            fields,
            raw: raw.clone(),
        })
    }

    pub fn identifier(&self) -> &CatalogIdentifier {
        &self.identifier
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Stored fields as returned by the index, including values with no
    /// [`FieldValue`] form.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// The configured title field, falling back to the document key.
    pub fn title(&self, config: &CatalogConfig) -> String {
        self.get(&config.title_field)
            .and_then(FieldValue::first)
            .map(str::to_string)
            .unwrap_or_else(|| self.identifier.to_document_key())
    }

    /// `(label, value)` pairs for the single-document view.
    pub fn show_fields<'a>(&'a self, config: &'a CatalogConfig) -> Vec<(&'a str, &'a FieldValue)> {
        self.labelled(config, FieldRole::Show)
    }

    /// `(label, value)` pairs for result lists.
    pub fn index_fields<'a>(&'a self, config: &'a CatalogConfig) -> Vec<(&'a str, &'a FieldValue)> {
        self.labelled(config, FieldRole::Index)
    }

    fn labelled<'a>(
        &'a self,
        config: &'a CatalogConfig,
        role: FieldRole,
    ) -> Vec<(&'a str, &'a FieldValue)> {
        config
            .fields_with_role(role)
            .filter_map(|entry| self.get(&entry.field).map(|v| (entry.label.as_str(), v)))
            .collect()
    }
}

/// Machine-readable single-document body: `{"response": {"document": {...}}}`.
///
/// The document is the raw stored-field map, so value types are preserved.
#[derive(Debug, Serialize)]
pub struct DocumentResponse<'a> {
    response: DocumentBody<'a>,
}

#[derive(Debug, Serialize)]
struct DocumentBody<'a> {
    document: &'a Map<String, Value>,
}

impl<'a> DocumentResponse<'a> {
    pub fn new(doc: &'a DocumentRef) -> Self {
        DocumentResponse {
            response: DocumentBody {
                document: &doc.raw,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw() -> Map<String, Value> {
        json!({
            "id": "/editions/any/2009/jul/01/42",
            "cobject_title_ssi": "Isbjørne",
            "creator_tsim": ["Hansen, Anna", "Berg, Ole"],
            "page_count_isi": 12,
            "_version_": 1789,
            "nested": {"ignored": true}
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_from_raw() {
        let doc = DocumentRef::from_raw("id", &raw()).unwrap();
        assert_eq!(doc.identifier().object_id(), "42");
        assert_eq!(
            doc.get("creator_tsim"),
            Some(&FieldValue::Multi(vec![
                "Hansen, Anna".to_string(),
                "Berg, Ole".to_string()
            ]))
        );
        assert_eq!(
            doc.get("page_count_isi"),
            Some(&FieldValue::Single("12".to_string()))
        );
        assert!(doc.get("nested").is_none());
    }

    #[test]
    fn test_missing_or_bad_key_is_corrupt() {
        let mut map = raw();
        map.remove("id");
        assert!(matches!(
            DocumentRef::from_raw("id", &map),
            Err(LecternError::CorruptDocument(_))
        ));

        map.insert("id".to_string(), json!("not-a-key"));
        assert!(matches!(
            DocumentRef::from_raw("id", &map),
            Err(LecternError::CorruptDocument(_))
        ));
    }

    #[test]
    fn test_labelled_fields_follow_config_order() {
        let config = CatalogConfig::default();
        let doc = DocumentRef::from_raw("id", &raw()).unwrap();
        let shown: Vec<&str> = doc.show_fields(&config).iter().map(|(l, _)| *l).collect();
        assert_eq!(shown, vec!["Title", "Creator"]);
        assert_eq!(doc.title(&config), "Isbjørne");
        assert_eq!(doc.get("creator_tsim").unwrap().joined("; "), "Hansen, Anna; Berg, Ole");
    }

    #[test]
    fn test_json_envelope_keeps_value_types() {
        let raw = json!({
            "id": "/a/b/c/d/e/1",
            "page_count_isi": 12,
            "flag_bsi": true,
            "opt": null,
            "mixed": ["x", null],
            "nested": {"k": 1.5}
        });
        let doc = DocumentRef::from_raw("id", raw.as_object().unwrap()).unwrap();
        let value = serde_json::to_value(DocumentResponse::new(&doc)).unwrap();

        assert_eq!(value, json!({"response": {"document": raw}}));
        assert_eq!(value["response"]["document"]["page_count_isi"], json!(12));
        assert_eq!(value["response"]["document"]["flag_bsi"], json!(true));
        assert_eq!(value["response"]["document"]["opt"], Value::Null);
        // The display projection still skips what it cannot represent.
        assert!(doc.get("opt").is_none());
        assert!(doc.get("mixed").is_none());
    }

    #[test]
    fn test_json_envelope() {
        let doc = DocumentRef::from_raw("id", &raw()).unwrap();
        let value = serde_json::to_value(DocumentResponse::new(&doc)).unwrap();
        assert_eq!(
            value["response"]["document"]["id"],
            json!("/editions/any/2009/jul/01/42")
        );
        assert_eq!(
            value["response"]["document"]["creator_tsim"],
            json!(["Hansen, Anna", "Berg, Ole"])
        );
    }
}
