use crate::transport::Transport;
use crate::{ClientError, Database, Result};
use couchwire_core::models::{
    ActiveTask, OkResponse, ReplicationRequest, ReplicationResponse, ServerInfo, UuidsResponse,
};
use couchwire_core::ClientConfig;
use reqwest::Method;
use std::sync::Arc;

const SYSTEM_DATABASES: &[&str] = &["_users", "_replicator", "_global_changes"];

/// Couchwire server client
#[derive(Debug, Clone)]
pub struct Client {
    transport: Arc<Transport>,
}

impl Client {
    /// Create a new client for the given base URL; `user:password@` in the URL enables Basic auth
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(&ClientConfig::new(base_url))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Arc::new(Transport::new(config)?),
        })
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Server welcome document
    pub async fn server_info(&self) -> Result<ServerInfo> {
        self.transport.get(&[], &[]).await
    }

    /// Names of all databases
    pub async fn all_dbs(&self) -> Result<Vec<String>> {
        self.transport.get(&["_all_dbs"], &[]).await
    }

    /// Handle on a database, no request is made
    pub fn database(&self, name: impl Into<String>) -> Result<Database> {
        let name = name.into();
        validate_db_name(&name)?;
        Ok(Database::new(self.transport.clone(), name))
    }

    /// Create a database and return a handle on it
    pub async fn create_database(&self, name: impl Into<String>) -> Result<Database> {
        let db = self.database(name)?;
        let _: OkResponse = self
            .transport
            .json(Method::PUT, &[db.name()], &[], None)
            .await?;
        tracing::info!(db = %db.name(), "Created database");
        Ok(db)
    }

    pub async fn delete_database(&self, name: &str) -> Result<()> {
        validate_db_name(name)?;
        let _: OkResponse = self
            .transport
            .json(Method::DELETE, &[name], &[], None)
            .await?;
        tracing::info!(db = %name, "Deleted database");
        Ok(())
    }

    pub async fn database_exists(&self, name: &str) -> Result<bool> {
        validate_db_name(name)?;
        self.transport.head(&[name]).await
    }

    /// Server-generated UUIDs
    pub async fn uuids(&self, count: u32) -> Result<Vec<String>> {
        let query = vec![("count".to_string(), count.to_string())];
        let response: UuidsResponse = self.transport.get(&["_uuids"], &query).await?;
        Ok(response.uuids)
    }

    pub async fn active_tasks(&self) -> Result<Vec<ActiveTask>> {
        self.transport.get(&["_active_tasks"], &[]).await
    }

    /// Trigger (or cancel) a replication
    pub async fn replicate(&self, request: &ReplicationRequest) -> Result<ReplicationResponse> {
        let body = serde_json::to_value(request)?;
        self.transport
            .json(Method::POST, &["_replicate"], &[], Some(&body))
            .await
    }
}

/// Database names: a lowercase letter followed by `a-z 0-9 _ $ ( ) + - /`, or a system database
fn validate_db_name(name: &str) -> Result<()> {
    if SYSTEM_DATABASES.contains(&name) {
        return Ok(());
    }

    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some('a'..='z'))
        && chars.all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '$' | '(' | ')' | '+' | '-' | '/'));

    if valid {
        Ok(())
    } else {
        Err(ClientError::InvalidDatabaseName(name.to_string()))
    }
}
