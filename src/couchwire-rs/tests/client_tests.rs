use anyhow::Result;
use couchwire_rs::{Client, ClientConfig, ClientError, ReplicationRequest};
use httpmock::prelude::*;
use httpmock::Method::HEAD;
use serde_json::json;

#[tokio::test]
async fn test_server_info() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).json_body(json!({
                "couchdb": "Welcome",
                "version": "3.3.3",
                "uuid": "2a9d5d38c6e2",
                "vendor": {"name": "The Apache Software Foundation"}
            }));
        })
        .await;

    let client = Client::new(server.base_url())?;
    let info = client.server_info().await?;

    mock.assert_async().await;
    assert_eq!(info.couchdb, "Welcome");
    assert_eq!(info.version, "3.3.3");
    Ok(())
}

#[tokio::test]
async fn test_basic_auth_from_url() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/_all_dbs")
                .header("authorization", "Basic YWRtaW46c2VjcmV0");
            then.status(200).json_body(json!(["_users", "albums"]));
        })
        .await;

    let url = format!("http://admin:secret@{}", server.address());
    let client = Client::new(url)?;
    let dbs = client.all_dbs().await?;

    mock.assert_async().await;
    assert_eq!(dbs, vec!["_users", "albums"]);
    Ok(())
}

#[tokio::test]
async fn test_basic_auth_from_config() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/_all_dbs")
                .header("authorization", "Basic YWRtaW46c2VjcmV0");
            then.status(200).json_body(json!([]));
        })
        .await;

    let config = ClientConfig::new(server.base_url()).with_credentials("admin", "secret");
    let client = Client::from_config(&config)?;
    assert!(client.all_dbs().await?.is_empty());

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_create_and_delete_database() -> Result<()> {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(PUT).path("/albums");
            then.status(201).json_body(json!({"ok": true}));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/albums");
            then.status(200).json_body(json!({"ok": true}));
        })
        .await;

    let client = Client::new(server.base_url())?;
    let db = client.create_database("albums").await?;
    assert_eq!(db.name(), "albums");
    client.delete_database("albums").await?;

    create.assert_async().await;
    delete.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_create_existing_database_maps_status() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/albums");
            then.status(412).json_body(json!({
                "error": "file_exists",
                "reason": "The database could not be created, the file already exists."
            }));
        })
        .await;

    let client = Client::new(server.base_url())?;
    let err = client.create_database("albums").await.unwrap_err();

    assert_eq!(err.status(), Some(412));
    assert_eq!(err.couch_error().unwrap().error, "file_exists");
    match err {
        ClientError::Server { message, .. } => assert!(message.contains("file already exists")),
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_database_exists_false_on_404() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(HEAD).path("/missing");
            then.status(404);
        })
        .await;

    let client = Client::new(server.base_url())?;
    assert!(!client.database_exists("missing").await?);
    Ok(())
}

#[tokio::test]
async fn test_head_error_uses_reason_phrase() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(HEAD).path("/locked");
            then.status(401);
        })
        .await;

    let client = Client::new(server.base_url())?;
    let err = client.database_exists("locked").await.unwrap_err();
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Unauthorized");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_invalid_database_name_makes_no_request() -> Result<()> {
    let client = Client::new("http://127.0.0.1:9")?;
    assert!(matches!(
        client.create_database("Albums").await,
        Err(ClientError::InvalidDatabaseName(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_uuids() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/_uuids").query_param("count", "2");
            then.status(200)
                .json_body(json!({"uuids": ["6e1295ed6c29495e54cc05947f18c8af", "e8a3d1b2c4"]}));
        })
        .await;

    let client = Client::new(server.base_url())?;
    let uuids = client.uuids(2).await?;

    mock.assert_async().await;
    assert_eq!(uuids.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_active_tasks() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/_active_tasks");
            then.status(200).json_body(json!([
                {"type": "database_compaction", "pid": "<0.1.0>", "progress": 50, "database": "albums"}
            ]));
        })
        .await;

    let client = Client::new(server.base_url())?;
    let tasks = client.active_tasks().await?;

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_type, "database_compaction");
    assert_eq!(tasks[0].progress, Some(50));
    Ok(())
}

#[tokio::test]
async fn test_replicate() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/_replicate")
                .header("content-type", "application/json")
                .json_body(json!({"source": "albums", "target": "albums-backup", "create_target": true}));
            then.status(200)
                .json_body(json!({"ok": true, "session_id": "abc", "source_last_seq": 12}));
        })
        .await;

    let client = Client::new(server.base_url())?;
    let request = ReplicationRequest {
        create_target: true,
        ..ReplicationRequest::new("albums", "albums-backup")
    };
    let response = client.replicate(&request).await?;

    mock.assert_async().await;
    assert!(response.ok);
    assert_eq!(response.session_id.as_deref(), Some("abc"));
    Ok(())
}

#[tokio::test]
async fn test_non_json_reply_is_serialization_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("<html>proxy page</html>");
        })
        .await;

    let client = Client::new(server.base_url())?;
    assert!(matches!(
        client.server_info().await,
        Err(ClientError::Serialization(_))
    ));
    Ok(())
}
