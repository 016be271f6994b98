use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::document::Document;

/// ServerInfo is the welcome document served at `/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub couchdb: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<serde_json::Value>,
}

/// DbInfo describes a single database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbInfo {
    pub db_name: String,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(default)]
    pub doc_del_count: u64,
    // String on 2.x+, integer on 1.x
    #[serde(default)]
    pub update_seq: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purge_seq: Option<serde_json::Value>,
    #[serde(default)]
    pub compact_running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<DbSizes>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbSizes {
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub external: u64,
    #[serde(default)]
    pub file: u64,
}

/// DocumentResponse is returned by every single-document write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    #[serde(default)]
    pub ok: bool,
    pub id: String,
    pub rev: String,
}

/// BulkResult is one entry of a `_bulk_docs` reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BulkResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// ViewResult holds the rows of a view or `_all_docs` query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_seq: Option<serde_json::Value>,
    #[serde(default)]
    pub rows: Vec<ViewRow>,
}

impl ViewResult {
    /// Documents of rows queried with `include_docs=true`
    pub fn docs(&self) -> impl Iterator<Item = &Document> {
        self.rows.iter().filter_map(|row| row.doc.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub key: serde_json::Value,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Document>,
    // Set for `keys` lookups that miss
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// ChangesResult is the `normal` feed reply of `_changes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangesResult {
    #[serde(default)]
    pub results: Vec<ChangeRow>,
    pub last_seq: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRow {
    pub seq: serde_json::Value,
    pub id: String,
    #[serde(default)]
    pub changes: Vec<ChangeRev>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRev {
    pub rev: String,
}

/// ActiveTask is one entry of `_active_tasks`; task-specific fields stay in `details`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTask {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    #[serde(flatten)]
    pub details: BTreeMap<String, serde_json::Value>,
}

/// ReplicationRequest is the body posted to `_replicate`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicationRequest {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub create_target: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub continuous: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl ReplicationRequest {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_last_seq: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_changes: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UuidsResponse {
    pub uuids: Vec<String>,
}

/// ErrorResponse is the body CouchDB sends with non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub reason: String,
}

/// OkResponse acknowledges maintenance calls such as `_compact`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    #[serde(default)]
    pub ok: bool,
}
