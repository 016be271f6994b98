use crate::{Database, Result};
use couchwire_core::models::ViewResult;
use couchwire_core::{Document, ViewArgs};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const DESIGN_PREFIX: &str = "_design/";

/// ViewDefinition holds the map and optional reduce source of a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub map: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce: Option<String>,
}

/// DesignDocument is a document stored at `_design/{name}` holding view and helper functions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub views: BTreeMap<String, ViewDefinition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shows: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lists: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub updates: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_doc_update: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Strip an optional `_design/` prefix from a design document name
pub(crate) fn design_name(name: &str) -> &str {
    name.strip_prefix(DESIGN_PREFIX).unwrap_or(name)
}

fn default_language() -> String {
    "javascript".to_string()
}

impl DesignDocument {
    /// `name` may be given with or without the `_design/` prefix
    pub fn new(name: &str) -> Self {
        Self {
            id: format!("{DESIGN_PREFIX}{}", design_name(name)),
            rev: None,
            language: default_language(),
            views: BTreeMap::new(),
            shows: BTreeMap::new(),
            lists: BTreeMap::new(),
            updates: BTreeMap::new(),
            filters: BTreeMap::new(),
            validate_doc_update: None,
            extra: Map::new(),
        }
    }

    /// Name without the `_design/` prefix
    pub fn name(&self) -> &str {
        design_name(&self.id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }

    pub fn set_rev(&mut self, rev: impl Into<String>) {
        self.rev = Some(rev.into());
    }

    pub fn add_view(&mut self, name: impl Into<String>, map: impl Into<String>, reduce: Option<&str>) -> &mut Self {
        self.views.insert(
            name.into(),
            ViewDefinition {
                map: map.into(),
                reduce: reduce.map(str::to_string),
            },
        );
        self
    }

    pub fn view(&self, name: &str) -> Option<&ViewDefinition> {
        self.views.get(name)
    }

    pub fn views(&self) -> impl Iterator<Item = (&str, &ViewDefinition)> {
        self.views.iter().map(|(name, view)| (name.as_str(), view))
    }

    pub fn from_document(doc: Document) -> serde_json::Result<Self> {
        doc.into_typed()
    }

    pub fn to_document(&self) -> serde_json::Result<Document> {
        Document::from_typed(self)
    }

    /// Query one of this design document's views
    pub async fn query(&self, db: &Database, view: &str, args: &ViewArgs) -> Result<ViewResult> {
        db.query_view(self.name(), view, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_normalizes_prefix() {
        assert_eq!(DesignDocument::new("stats").id(), "_design/stats");
        assert_eq!(DesignDocument::new("_design/stats").name(), "stats");
        assert_eq!(design_name("_design/stats"), "stats");
        assert_eq!(design_name("stats"), "stats");
    }

    #[test]
    fn test_serialize_with_views() {
        let mut design = DesignDocument::new("albums");
        design
            .add_view("by_artist", "function(doc) { emit(doc.artist, null); }", None)
            .add_view("count", "function(doc) { emit(null, 1); }", Some("_count"));

        assert_eq!(
            serde_json::to_value(&design).unwrap(),
            json!({
                "_id": "_design/albums",
                "language": "javascript",
                "views": {
                    "by_artist": {"map": "function(doc) { emit(doc.artist, null); }"},
                    "count": {"map": "function(doc) { emit(null, 1); }", "reduce": "_count"}
                }
            })
        );
        assert_eq!(design.views().count(), 2);
    }

    #[test]
    fn test_deserialize_keeps_unknown_members() {
        let design: DesignDocument = serde_json::from_value(json!({
            "_id": "_design/app",
            "_rev": "7-abc",
            "views": {"all": {"map": "function(doc) { emit(doc._id, 1); }"}},
            "validate_doc_update": "function(newDoc) {}",
            "options": {"partitioned": false}
        }))
        .unwrap();

        assert_eq!(design.name(), "app");
        assert_eq!(design.rev(), Some("7-abc"));
        assert_eq!(design.language, "javascript");
        assert!(design.view("all").unwrap().reduce.is_none());
        assert_eq!(design.extra.get("options"), Some(&json!({"partitioned": false})));
    }

    #[test]
    fn test_document_conversion() {
        let mut design = DesignDocument::new("app");
        design.add_view("all", "function(doc) { emit(doc._id, 1); }", None);

        let doc = design.to_document().unwrap();
        assert_eq!(doc.id(), Some("_design/app"));
        assert!(doc.get("views").is_some());

        let back = DesignDocument::from_document(doc).unwrap();
        assert_eq!(back, design);
    }
}
