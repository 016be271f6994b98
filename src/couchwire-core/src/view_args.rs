//! View query argument encoding
//!
//! CouchDB reads most view parameters (`key`, `startkey`, ...) as JSON, while a
//! handful (`stale`, `startkey_docid`, ...) are plain text. [`fix_view_args`]
//! turns a JSON map of arguments into query-string pairs following those rules.

use serde::ser::Error as _;
use serde::Serialize;
use serde_json::{Map, Value};

/// Parameters whose string values go on the wire untouched
const RAW_TEXT_KEYS: &[&str] = &[
    "stale",
    "update",
    "startkey_docid",
    "start_key_doc_id",
    "endkey_docid",
    "end_key_doc_id",
    "rev",
    "since",
    "feed",
    "filter",
    "style",
];

/// Serialize view arguments into `(name, value)` query pairs.
///
/// - booleans become `true` / `false`
/// - numbers and numeric-looking strings are sent as their decimal text
/// - other strings are JSON-encoded (quoted), except for raw-text parameters
/// - `null`, arrays and objects are sent as compact JSON
pub fn fix_view_args(args: &Map<String, Value>) -> Vec<(String, String)> {
    args.iter()
        .map(|(name, value)| (name.clone(), encode_value(name, value)))
        .collect()
}

fn encode_value(name: &str, value: &Value) -> String {
    match value {
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if RAW_TEXT_KEYS.contains(&name) || is_numeric(s) => s.clone(),
        // Serializing a Value cannot fail: map keys are always strings
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// True when `s` is a plain JSON number such as `42`, `-1.5` or `1e3`
fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.trim() == s && serde_json::from_str::<serde_json::Number>(s).is_ok()
}

/// Typed builder over the view query arguments.
///
/// Setters never fail; the first value that cannot be serialized is kept as an
/// error and returned by [`ViewArgs::encode`], [`ViewArgs::query_pairs`] and
/// [`ViewArgs::keys_body`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewArgs {
    args: Map<String, Value>,
    error: Option<String>,
}

impl ViewArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary argument from any serializable value
    pub fn set(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        let name = name.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.args.insert(name, value);
            }
            Err(e) => self.record_error(&name, &e),
        }
        self
    }

    fn record_error(&mut self, name: &str, error: &serde_json::Error) {
        if self.error.is_none() {
            self.error = Some(format!("invalid value for `{name}`: {error}"));
        }
    }

    pub fn key(self, key: impl Serialize) -> Self {
        self.set("key", key)
    }

    /// Multi-key lookup; sent as a POST body rather than in the query string
    pub fn keys<K: Serialize>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        let keys: serde_json::Result<Vec<Value>> =
            keys.into_iter().map(serde_json::to_value).collect();
        match keys {
            Ok(keys) => self.set("keys", keys),
            Err(e) => {
                self.record_error("keys", &e);
                self
            }
        }
    }

    pub fn start_key(self, key: impl Serialize) -> Self {
        self.set("startkey", key)
    }

    pub fn end_key(self, key: impl Serialize) -> Self {
        self.set("endkey", key)
    }

    pub fn start_key_doc_id(self, id: impl Into<String>) -> Self {
        self.set("startkey_docid", id.into())
    }

    pub fn end_key_doc_id(self, id: impl Into<String>) -> Self {
        self.set("endkey_docid", id.into())
    }

    pub fn limit(self, limit: u64) -> Self {
        self.set("limit", limit)
    }

    pub fn skip(self, skip: u64) -> Self {
        self.set("skip", skip)
    }

    pub fn descending(self, descending: bool) -> Self {
        self.set("descending", descending)
    }

    pub fn include_docs(self, include: bool) -> Self {
        self.set("include_docs", include)
    }

    pub fn inclusive_end(self, inclusive: bool) -> Self {
        self.set("inclusive_end", inclusive)
    }

    pub fn reduce(self, reduce: bool) -> Self {
        self.set("reduce", reduce)
    }

    pub fn group(self, group: bool) -> Self {
        self.set("group", group)
    }

    pub fn group_level(self, level: u32) -> Self {
        self.set("group_level", level)
    }

    /// `ok` or `update_after`
    pub fn stale(self, stale: impl Into<String>) -> Self {
        self.set("stale", stale.into())
    }

    /// `true`, `false` or `lazy`
    pub fn update(self, update: impl Into<String>) -> Self {
        self.set("update", update.into())
    }

    pub fn update_seq(self, update_seq: bool) -> Self {
        self.set("update_seq", update_seq)
    }

    pub fn conflicts(self, conflicts: bool) -> Self {
        self.set("conflicts", conflicts)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.args
    }

    fn check(&self) -> serde_json::Result<()> {
        match &self.error {
            Some(message) => Err(serde_json::Error::custom(message)),
            None => Ok(()),
        }
    }

    /// Encode every argument, `keys` included
    pub fn encode(&self) -> serde_json::Result<Vec<(String, String)>> {
        self.check()?;
        Ok(fix_view_args(&self.args))
    }

    /// Encode the arguments that belong in the query string
    pub fn query_pairs(&self) -> serde_json::Result<Vec<(String, String)>> {
        Ok(self
            .encode()?
            .into_iter()
            .filter(|(name, _)| name != "keys")
            .collect())
    }

    /// `{"keys": [...]}` body when a multi-key lookup was requested
    pub fn keys_body(&self) -> serde_json::Result<Option<Value>> {
        self.check()?;
        Ok(self
            .args
            .get("keys")
            .map(|keys| serde_json::json!({ "keys": keys })))
    }
}

impl From<Map<String, Value>> for ViewArgs {
    fn from(args: Map<String, Value>) -> Self {
        Self { args, error: None }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ViewArgs {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            args: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            error: None,
        }
    }
}
