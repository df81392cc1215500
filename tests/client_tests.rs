mod common;

use axum::routing::get;
use axum::Router;
use serde_json::json;

use churchman::ClientError;

use common::{canned, StubApi};

#[tokio::test]
async fn current_user_access_reads_grants() {
    let stub = StubApi::spawn(Router::new().route("/auth/users/me", get(canned(200, json!([
        {"Usercode": "M0001", "Level_Code": 3, "Role_Code": "ADM", "Module_Code": "MEM", "Access_Type": "RW"}
    ]))))).await;
    let client = stub.client();
    client.session().set_token("T").unwrap();

    let grants = client.current_user_access().await.unwrap();

    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].level_code.as_deref(), Some("3"));
    assert_eq!(grants[0].access_type.as_deref(), Some("RW"));
    assert_eq!(stub.recorder.last().authorization.as_deref(), Some("Bearer T"));
}

#[tokio::test]
async fn current_user_access_requires_a_token() {
    let stub = StubApi::spawn(Router::new().route("/auth/users/me", get(canned(200, json!([]))))).await;
    let client = stub.client();

    let err = client.current_user_access().await.unwrap_err();

    assert!(matches!(err, ClientError::MissingCredential));
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn rejected_user_lookup_carries_server_detail() {
    let stub = StubApi::spawn(Router::new().route(
        "/auth/users/me",
        get(canned(401, json!({"detail": "Could not validate credentials"}))),
    )).await;
    let client = stub.client();
    client.session().set_token("T").unwrap();

    let err = client.current_user_access().await.unwrap_err();

    assert_eq!(err.server_message(), Some("Could not validate credentials"));
    assert_eq!(err.code_str(), "rejected");
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let stub = StubApi::spawn(Router::new().route("/api/auth/users/me", get(canned(200, json!([]))))).await;
    let cfg = churchman::ClientConfig::new(&format!("{}/api", stub.base), "unused-session.json").unwrap();
    let client = churchman::ApiClient::new(&cfg, churchman::SessionStore::in_memory()).unwrap();
    client.session().set_token("T").unwrap();

    assert!(client.current_user_access().await.unwrap().is_empty());
    assert_eq!(stub.recorder.last().path, "/api/auth/users/me");
}
