use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::models::DocumentResponse;

/// Document is a JSON object with CouchDB's reserved `_`-prefixed members split out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
    #[serde(rename = "_deleted", default, skip_serializing_if = "std::ops::Not::not")]
    deleted: bool,
    #[serde(
        rename = "_attachments",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    attachments: BTreeMap<String, AttachmentStub>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_fields(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        let mut doc = Self::new(id);
        for (name, value) in fields {
            doc.set(name, value);
        }
        doc
    }

    /// Build a document from any serializable struct; `_id`/`_rev` members are honoured
    pub fn from_typed<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).and_then(serde_json::from_value)
    }

    pub fn into_typed<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        serde_json::to_value(self).and_then(serde_json::from_value)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }

    pub fn set_rev(&mut self, rev: impl Into<String>) {
        self.rev = Some(rev.into());
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Flag the document as a deletion stub for `_bulk_docs`
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Set a content field, returning the previous value.
    ///
    /// `_id`, `_rev`, `_deleted` and `_attachments` update their typed members
    /// instead. A value of the wrong shape for one of those is ignored and
    /// `None` is returned.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let field = field.into();
        let value = value.into();
        match (field.as_str(), value) {
            ("_id", Value::String(id)) => self.id.replace(id).map(Value::String),
            ("_rev", Value::String(rev)) => self.rev.replace(rev).map(Value::String),
            ("_deleted", Value::Bool(deleted)) => {
                Some(Value::Bool(std::mem::replace(&mut self.deleted, deleted)))
            }
            ("_attachments", value) => {
                let attachments = serde_json::from_value(value).ok()?;
                let previous = std::mem::replace(&mut self.attachments, attachments);
                serde_json::to_value(previous).ok()
            }
            ("_id" | "_rev" | "_deleted", _) => None,
            (_, value) => self.fields.insert(field, value),
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn attachments(&self) -> &BTreeMap<String, AttachmentStub> {
        &self.attachments
    }

    pub fn attachment(&self, name: &str) -> Option<&AttachmentStub> {
        self.attachments.get(name)
    }

    /// Embed an attachment to be uploaded with the next save
    pub fn add_inline_attachment(
        &mut self,
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: &[u8],
    ) {
        self.attachments
            .insert(name.into(), AttachmentStub::inline(content_type, data));
    }

    pub fn remove_attachment(&mut self, name: &str) -> Option<AttachmentStub> {
        self.attachments.remove(name)
    }

    /// Record the identity assigned by a successful write
    pub fn apply_response(&mut self, response: &DocumentResponse) {
        self.id = Some(response.id.clone());
        self.rev = Some(response.rev.clone());
    }
}

/// AttachmentStub describes an attachment as listed in `_attachments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentStub {
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stub: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revpos: Option<u64>,
    /// Base64 content for inline attachments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl AttachmentStub {
    pub fn inline(content_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            content_type: content_type.into(),
            length: None,
            digest: None,
            stub: false,
            revpos: None,
            data: Some(STANDARD.encode(data)),
        }
    }

    /// Decoded inline content, if any was fetched with `attachments=true`
    pub fn decoded_data(&self) -> Option<Vec<u8>> {
        self.data
            .as_deref()
            .and_then(|data| STANDARD.decode(data).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Album {
        #[serde(rename = "_id")]
        id: String,
        title: String,
        year: u32,
    }

    #[test]
    fn test_reserved_members_are_split_out() {
        let doc: Document = serde_json::from_value(json!({
            "_id": "album-1",
            "_rev": "2-abc",
            "_attachments": {
                "cover.png": {"content_type": "image/png", "length": 10, "stub": true, "revpos": 1}
            },
            "title": "Blue Train",
            "year": 1957
        }))
        .unwrap();

        assert_eq!(doc.id(), Some("album-1"));
        assert_eq!(doc.rev(), Some("2-abc"));
        assert!(!doc.is_deleted());
        assert_eq!(doc.fields().len(), 2);
        assert_eq!(doc.get("year"), Some(&json!(1957)));
        assert!(doc.attachment("cover.png").unwrap().stub);
    }

    #[test]
    fn test_serialize_skips_empty_reserved_members() {
        let mut doc = Document::default();
        doc.set("title", "Kind of Blue");
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({"title": "Kind of Blue"}));
    }

    #[test]
    fn test_set_routes_identity_fields() {
        let mut doc = Document::new("a");
        assert_eq!(doc.set("_id", "b"), Some(json!("a")));
        doc.set("_rev", "1-x");
        doc.set("n", 3);

        assert_eq!(doc.id(), Some("b"));
        assert_eq!(doc.rev(), Some("1-x"));
        assert!(doc.get("_id").is_none());
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"_id": "b", "_rev": "1-x", "n": 3})
        );
    }

    #[test]
    fn test_set_never_duplicates_reserved_members() {
        let mut doc = Document::new("a");
        assert_eq!(doc.set("_id", 5), None);
        assert_eq!(doc.set("_rev", json!(["1-x"])), None);
        assert_eq!(doc.set("_deleted", "yes"), None);
        assert_eq!(doc.set("_attachments", 3), None);
        assert!(doc.fields().is_empty());
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({"_id": "a"}));

        assert_eq!(doc.set("_deleted", true), Some(json!(false)));
        assert!(doc.is_deleted());
        doc.set(
            "_attachments",
            json!({"a.txt": {"content_type": "text/plain", "stub": true}}),
        );
        assert!(doc.attachment("a.txt").unwrap().stub);

        let value = serde_json::to_string(&doc).unwrap();
        assert_eq!(value.matches("\"_deleted\"").count(), 1);
        assert_eq!(value.matches("\"_attachments\"").count(), 1);
    }

    #[test]
    fn test_typed_conversion() {
        let album = Album {
            id: "album-2".to_string(),
            title: "Giant Steps".to_string(),
            year: 1960,
        };
        let mut doc = Document::from_typed(&album).unwrap();
        assert_eq!(doc.id(), Some("album-2"));
        assert_eq!(doc.get("title"), Some(&json!("Giant Steps")));

        doc.set_rev("3-zzz");
        let back: Album = doc.into_typed().unwrap();
        assert_eq!(back, album);
    }

    #[test]
    fn test_apply_response_updates_identity() {
        let mut doc = Document::default();
        doc.apply_response(&DocumentResponse {
            ok: true,
            id: "new-id".to_string(),
            rev: "1-abc".to_string(),
        });
        assert_eq!(doc.id(), Some("new-id"));
        assert_eq!(doc.rev(), Some("1-abc"));
    }

    #[test]
    fn test_inline_attachment_round_trip() {
        let mut doc = Document::new("notes");
        doc.add_inline_attachment("hello.txt", "text/plain", b"hello");

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["_attachments"]["hello.txt"]["data"], json!("aGVsbG8="));
        assert_eq!(
            doc.attachment("hello.txt").unwrap().decoded_data(),
            Some(b"hello".to_vec())
        );
    }

    #[test]
    fn test_deleted_stub_serializes_flag() {
        let mut doc = Document::new("gone");
        doc.set_rev("4-d");
        doc.mark_deleted();
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"_id": "gone", "_rev": "4-d", "_deleted": true})
        );
    }
}
