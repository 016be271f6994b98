use crate::design::{design_name, DesignDocument};
use crate::transport::Transport;
use crate::{ClientError, Result};
use couchwire_core::models::{
    BulkResult, ChangesResult, DbInfo, DocumentResponse, OkResponse, ViewResult,
};
use couchwire_core::{Document, ViewArgs};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Handle on a single database; cloning is cheap
#[derive(Debug, Clone)]
pub struct Database {
    transport: Arc<Transport>,
    name: String,
}

impl Database {
    pub(crate) fn new(transport: Arc<Transport>, name: String) -> Self {
        Self { transport, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path segments of a document; `_design/` and `_local/` ids keep their prefix as its own segment
    fn doc_path<'a>(&'a self, id: &'a str) -> Vec<&'a str> {
        let mut path = vec![self.name.as_str()];
        match id.split_once('/') {
            Some((prefix @ ("_design" | "_local"), rest)) => path.extend([prefix, rest]),
            _ => path.push(id),
        }
        path
    }

    pub async fn info(&self) -> Result<DbInfo> {
        self.transport.get(&[self.name.as_str()], &[]).await
    }

    /// Whether a document exists, via HEAD
    pub async fn exists(&self, id: &str) -> Result<bool> {
        self.transport.head(&self.doc_path(id)).await
    }

    pub async fn get(&self, id: &str) -> Result<Document> {
        self.get_with(id, &ViewArgs::new()).await
    }

    /// Get a document with query options such as `rev`, `revs`, `conflicts` or `attachments`
    pub async fn get_with(&self, id: &str, args: &ViewArgs) -> Result<Document> {
        self.transport.get(&self.doc_path(id), &args.encode()?).await
    }

    /// Get a document, mapping 404 to `None`
    pub async fn get_opt(&self, id: &str) -> Result<Option<Document>> {
        match self.get(id).await {
            Ok(doc) => Ok(Some(doc)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn get_typed<T: DeserializeOwned>(&self, id: &str) -> Result<T> {
        self.transport.get(&self.doc_path(id), &[]).await
    }

    /// Create or update a document with PUT.
    ///
    /// Documents without an id get a random UUID. On success the document's
    /// `_id` and `_rev` are updated from the server reply.
    pub async fn save(&self, doc: &mut Document) -> Result<DocumentResponse> {
        if doc.id().is_none() {
            doc.set_id(Uuid::new_v4().simple().to_string());
        }
        let id = doc.id().ok_or(ClientError::MissingId)?.to_string();
        let body = serde_json::to_value(&*doc)?;

        let response: DocumentResponse = self
            .transport
            .json(Method::PUT, &self.doc_path(&id), &[], Some(&body))
            .await?;
        tracing::debug!(db = %self.name, id = %response.id, rev = %response.rev, "Saved document");

        doc.apply_response(&response);
        Ok(response)
    }

    /// Create a document with POST, letting the server assign the id
    pub async fn create<T: Serialize + ?Sized>(&self, value: &T) -> Result<DocumentResponse> {
        let body = serde_json::to_value(value)?;
        self.transport
            .json(Method::POST, &[self.name.as_str()], &[], Some(&body))
            .await
    }

    pub async fn delete(&self, id: &str, rev: &str) -> Result<DocumentResponse> {
        let query = vec![("rev".to_string(), rev.to_string())];
        self.transport
            .json(Method::DELETE, &self.doc_path(id), &query, None)
            .await
    }

    /// Delete the revision the document currently carries
    pub async fn delete_doc(&self, doc: &Document) -> Result<DocumentResponse> {
        let id = doc.id().ok_or(ClientError::MissingId)?;
        let rev = doc.rev().ok_or(ClientError::MissingRevision)?;
        self.delete(id, rev).await
    }

    /// Write several documents in one request; per-document failures are reported in the results
    pub async fn bulk_docs(&self, docs: &[Document], all_or_nothing: bool) -> Result<Vec<BulkResult>> {
        let mut body = serde_json::json!({ "docs": docs });
        if all_or_nothing {
            body["all_or_nothing"] = serde_json::Value::Bool(true);
        }
        self.transport
            .json(Method::POST, &[self.name.as_str(), "_bulk_docs"], &[], Some(&body))
            .await
    }

    pub async fn all_docs(&self, args: &ViewArgs) -> Result<ViewResult> {
        self.fetch_view(&[self.name.as_str(), "_all_docs"], args).await
    }

    /// Query `_design/{design}/_view/{view}`
    pub async fn query_view(&self, design: &str, view: &str, args: &ViewArgs) -> Result<ViewResult> {
        self.fetch_view(
            &[self.name.as_str(), "_design", design_name(design), "_view", view],
            args,
        )
        .await
    }

    pub async fn view(&self, design: &str, view: &str, args: &ViewArgs) -> Result<ViewResult> {
        self.query_view(design, view, args).await
    }

    async fn fetch_view(&self, segments: &[&str], args: &ViewArgs) -> Result<ViewResult> {
        let query = args.query_pairs()?;
        match args.keys_body()? {
            Some(body) => {
                self.transport
                    .json(Method::POST, segments, &query, Some(&body))
                    .await
            }
            None => self.transport.get(segments, &query).await,
        }
    }

    /// One-shot `normal` changes feed
    pub async fn changes(&self, args: &ViewArgs) -> Result<ChangesResult> {
        let query: Vec<_> = args
            .encode()?
            .into_iter()
            .filter(|(name, _)| name != "feed")
            .collect();
        self.transport.get(&[self.name.as_str(), "_changes"], &query).await
    }

    pub async fn compact(&self) -> Result<()> {
        self.post_maintenance(&[self.name.as_str(), "_compact"]).await
    }

    /// Compact the view indexes of one design document
    pub async fn compact_design(&self, design: &str) -> Result<()> {
        self.post_maintenance(&[self.name.as_str(), "_compact", design_name(design)])
            .await
    }

    pub async fn view_cleanup(&self) -> Result<()> {
        self.post_maintenance(&[self.name.as_str(), "_view_cleanup"]).await
    }

    pub async fn ensure_full_commit(&self) -> Result<()> {
        self.post_maintenance(&[self.name.as_str(), "_ensure_full_commit"])
            .await
    }

    async fn post_maintenance(&self, segments: &[&str]) -> Result<()> {
        let response: OkResponse = self
            .transport
            .json(Method::POST, segments, &[], None)
            .await?;
        if response.ok {
            Ok(())
        } else {
            Err(ClientError::InvalidResponse)
        }
    }

    fn attachment_path<'a>(&'a self, id: &'a str, name: &'a str) -> Vec<&'a str> {
        let mut path = self.doc_path(id);
        path.extend(name.split('/'));
        path
    }

    /// Upload an attachment; `rev` is required when the document already exists
    pub async fn put_attachment(
        &self,
        id: &str,
        rev: Option<&str>,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<DocumentResponse> {
        let query: Vec<(String, String)> = rev
            .map(|rev| ("rev".to_string(), rev.to_string()))
            .into_iter()
            .collect();
        self.transport
            .put_bytes(&self.attachment_path(id, name), &query, content_type, data)
            .await
    }

    pub async fn get_attachment(&self, id: &str, name: &str) -> Result<Vec<u8>> {
        self.transport
            .get_bytes(&self.attachment_path(id, name), &[])
            .await
    }

    pub async fn delete_attachment(&self, id: &str, rev: &str, name: &str) -> Result<DocumentResponse> {
        let query = vec![("rev".to_string(), rev.to_string())];
        self.transport
            .json(Method::DELETE, &self.attachment_path(id, name), &query, None)
            .await
    }

    pub async fn design(&self, name: &str) -> Result<DesignDocument> {
        self.transport
            .get(&[self.name.as_str(), "_design", design_name(name)], &[])
            .await
    }

    /// Create or update a design document, updating its `_rev`
    pub async fn save_design(&self, design: &mut DesignDocument) -> Result<DocumentResponse> {
        let body = serde_json::to_value(&*design)?;
        let response: DocumentResponse = self
            .transport
            .json(
                Method::PUT,
                &[self.name.as_str(), "_design", design.name()],
                &[],
                Some(&body),
            )
            .await?;
        design.set_rev(response.rev.clone());
        Ok(response)
    }

    pub async fn delete_design(&self, name: &str, rev: &str) -> Result<DocumentResponse> {
        let query = vec![("rev".to_string(), rev.to_string())];
        self.transport
            .json(
                Method::DELETE,
                &[self.name.as_str(), "_design", design_name(name)],
                &query,
                None,
            )
            .await
    }
}
