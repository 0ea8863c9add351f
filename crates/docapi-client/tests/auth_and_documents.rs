//! Authentication, credential resolution, and document facade tests.

use docapi_client::{
    ApiError, ClientConfig, DocumentClient, DocumentUpdateRequest, LOCK_HEADER,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

async fn client_for(server: &MockServer) -> DocumentClient {
    init_tracing();
    DocumentClient::new(ClientConfig::new(server.uri())).unwrap()
}

#[tokio::test]
async fn login_stores_the_token_under_its_tenant() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(query_param("tenant", "acme"))
        .and(body_json(json!({"username": "alice", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-acme",
            "tokenType": "Bearer",
            "userId": "u1",
            "username": "alice"
        })))
        .mount(&server)
        .await;

    let response = client.login(Some("acme"), "alice", "secret").await.unwrap();
    assert_eq!(response.token, "tok-acme");
    assert_eq!(client.credentials().active_tenant().as_deref(), Some("acme"));
    assert_eq!(client.credentials().resolve_token().as_deref(), Some("tok-acme"));
}

#[tokio::test]
async fn login_without_a_tenant_falls_back_to_the_remembered_default() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(query_param("tenant", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-1"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    // Re-login without naming a tenant: "acme" is the remembered default,
    // so the call still targets it and the stored token is replaced.
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(query_param("tenant", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-2"})))
        .expect(1)
        .mount(&server)
        .await;

    client.login(Some("acme"), "alice", "secret").await.unwrap();
    assert_eq!(client.credentials().default_tenant().as_deref(), Some("acme"));

    client.login(None, "alice", "secret").await.unwrap();
    assert_eq!(client.credentials().token_for("acme").as_deref(), Some("tok-2"));
    assert_eq!(client.credentials().active_tenant().as_deref(), Some("acme"));
    assert_eq!(client.credentials().resolve_token().as_deref(), Some("tok-2"));
}

#[tokio::test]
async fn authenticated_calls_carry_the_bearer_token() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-1"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/documents/doc-1"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "doc-1",
            "title": "Quarterly report"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.login(None, "alice", "secret").await.unwrap();
    let document = client.try_get_document("doc-1").await.unwrap().unwrap();
    assert_eq!(document.title.as_deref(), Some("Quarterly report"));
}

#[tokio::test]
async fn bad_credentials_surface_as_auth_errors() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "INVALID_CREDENTIALS",
            "message": "bad username or password"
        })))
        .mount(&server)
        .await;

    let err = client.login(None, "alice", "wrong").await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(_)));
    assert_eq!(client.credentials().resolve_token(), None);
}

#[tokio::test]
async fn try_get_maps_missing_documents_to_none() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/documents/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "NOT_FOUND",
            "message": "no such document"
        })))
        .mount(&server)
        .await;

    assert!(client.try_get_document("ghost").await.unwrap().is_none());
    assert!(!client.document_exists("ghost").await.unwrap());
}

#[tokio::test]
async fn update_without_a_required_lock_is_rejected() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("PUT"))
        .and(path("/api/documents/doc-1"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "LOCK_REQUIRED",
            "message": "document requires a lock for mutation"
        })))
        .mount(&server)
        .await;

    let request = DocumentUpdateRequest {
        title: Some("New title".to_string()),
        ..Default::default()
    };
    let err = client
        .update_document("doc-1", &request, None)
        .await
        .unwrap_err();
    match err {
        ApiError::LockRequired { document_id } => assert_eq!(document_id, "doc-1"),
        other => panic!("expected LockRequired, got {:?}", other),
    }
}

#[tokio::test]
async fn mutations_thread_the_lock_header() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    Mock::given(method("PUT"))
        .and(path("/api/documents/doc-1"))
        .and(header(LOCK_HEADER, "lock-abc"))
        .and(body_json(json!({"title": "New title"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "doc-1",
            "title": "New title"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/documents/doc-1"))
        .and(header(LOCK_HEADER, "lock-abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let request = DocumentUpdateRequest {
        title: Some("New title".to_string()),
        ..Default::default()
    };
    let updated = client
        .update_document("doc-1", &request, Some("lock-abc"))
        .await
        .unwrap();
    assert_eq!(updated.title.as_deref(), Some("New title"));

    client
        .delete_document("doc-1", Some("lock-abc"))
        .await
        .unwrap();
}

#[tokio::test]
async fn simple_attachment_upload_posts_a_form() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("note.txt");
    std::fs::write(&file_path, b"hello").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/documents/doc-1/attachments"))
        .and(header(LOCK_HEADER, "lock-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "attachmentId": "att-9",
            "documentId": "doc-1",
            "fileName": "note.txt",
            "fileSize": 5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client
        .upload_attachment("doc-1", &file_path, Some("lock-abc"))
        .await
        .unwrap();
    assert_eq!(response.attachment_id, "att-9");
    assert_eq!(response.file_size, 5);
}
