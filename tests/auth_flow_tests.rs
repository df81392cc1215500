//! Login, signup and logout against an in-process stub API.

mod common;

use axum::routing::post;
use axum::Router;
use serde_json::json;

use churchman::flows::{AuthFlow, AuthOutcome, AuthState, Route, SignupRequest};
use churchman::{ApiClient, ClientConfig, ClientError, SessionStore};

use common::{canned, dead_base_url, StubApi};

#[tokio::test]
async fn login_success_stores_token_and_navigates_root() {
    let stub = StubApi::spawn(Router::new().route(
        "/auth/login",
        post(canned(201, json!({"message": "ok", "access_token": "T", "token_type": "bearer"}))),
    )).await;
    let client = stub.client();
    let mut watcher = client.session().subscribe();
    let mut flow = AuthFlow::new(client.clone());

    let out = flow.login("u", "p").await.unwrap();

    assert_eq!(out, AuthOutcome::SignedIn { message: Some("ok".into()), navigate: Route::Root });
    assert_eq!(client.session().get_token().as_deref(), Some("T"));
    assert_eq!(flow.state(), AuthState::Success);
    assert_eq!(flow.server_message(), Some("ok"));
    // observers re-render from the published state; nothing reloads
    assert!(watcher.has_changed().unwrap());
    assert!(watcher.borrow_and_update().signed_in);

    let hit = stub.recorder.last();
    assert_eq!(hit.method, "POST");
    assert_eq!(hit.path, "/auth/login");
    assert_eq!(hit.body, "username=u&password=p");
    assert_eq!(hit.content_type.as_deref(), Some("application/x-www-form-urlencoded"));
    assert_eq!(hit.authorization, None);
}

#[tokio::test]
async fn login_rejected_leaves_store_unchanged_and_surfaces_message() {
    let stub = StubApi::spawn(Router::new().route(
        "/auth/login",
        post(canned(400, json!({"message": "bad creds"}))),
    )).await;
    let client = stub.client();
    client.session().set_token("OLD").unwrap();
    let mut flow = AuthFlow::new(client.clone());

    let out = flow.login("u", "wrong").await.unwrap();

    assert_eq!(out, AuthOutcome::Rejected { status: 400, message: Some("bad creds".into()) });
    assert_eq!(client.session().get_token().as_deref(), Some("OLD"));
    assert_eq!(flow.state(), AuthState::Idle);
    assert_eq!(flow.server_message(), Some("bad creds"));
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn login_rejected_with_fastapi_detail() {
    let stub = StubApi::spawn(Router::new().route(
        "/auth/login",
        post(canned(401, json!({"detail": "Incorrect usercode or password"}))),
    )).await;
    let client = stub.client();
    let mut flow = AuthFlow::new(client.clone());

    let out = flow.login("u", "p").await.unwrap();

    assert_eq!(out, AuthOutcome::Rejected { status: 401, message: Some("Incorrect usercode or password".into()) });
    assert_eq!(client.session().get_token(), None);
}

#[tokio::test]
async fn retry_after_rejection_can_succeed() {
    let stub = StubApi::spawn(Router::new().route(
        "/auth/login",
        post(|body: String| async move {
            if body.contains("password=right") {
                (axum::http::StatusCode::CREATED, axum::Json(json!({"message": "ok", "access_token": "T"})))
            } else {
                (axum::http::StatusCode::BAD_REQUEST, axum::Json(json!({"message": "bad creds"})))
            }
        }),
    )).await;
    let client = stub.client();
    let mut flow = AuthFlow::new(client.clone());

    assert!(matches!(flow.login("u", "wrong").await.unwrap(), AuthOutcome::Rejected { .. }));
    assert_eq!(flow.state(), AuthState::Idle);
    assert!(matches!(flow.login("u", "right").await.unwrap(), AuthOutcome::SignedIn { .. }));
    assert_eq!(client.session().token().as_deref(), Some("T"));
    assert_eq!(stub.calls(), 2);
}

#[tokio::test]
async fn missing_fields_never_reach_the_network() {
    let stub = StubApi::spawn(Router::new().route("/auth/login", post(canned(201, json!({"access_token": "T"}))))).await;
    let mut flow = AuthFlow::new(stub.client());

    assert!(matches!(flow.login("", "p").await, Err(ClientError::Validation { field: "Usercode" })));
    assert!(matches!(flow.login("u", "").await, Err(ClientError::Validation { field: "Password" })));
    assert_eq!(stub.calls(), 0);
    assert_eq!(flow.state(), AuthState::Idle);
}

#[tokio::test]
async fn success_without_token_is_a_decode_error() {
    let stub = StubApi::spawn(Router::new().route("/auth/login", post(canned(201, json!({"message": "ok"}))))).await;
    let client = stub.client();
    let mut flow = AuthFlow::new(client.clone());

    let err = flow.login("u", "p").await.unwrap_err();

    assert_eq!(err.code_str(), "decode");
    assert_eq!(client.session().get_token(), None);
    assert_eq!(flow.state(), AuthState::Idle);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let cfg = ClientConfig::new(&dead_base_url(), "unused-session.json").unwrap();
    let client = ApiClient::new(&cfg, SessionStore::in_memory()).unwrap();
    let mut flow = AuthFlow::new(client.clone());

    let err = flow.login("u", "p").await.unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(flow.state(), AuthState::Idle);
    assert_eq!(client.session().get_token(), None);
}

#[tokio::test]
async fn signup_stores_token_like_login() {
    let stub = StubApi::spawn(Router::new().route(
        "/auth/signup",
        post(canned(201, json!({"message": "Welcome", "access_token": "\"S\""}))),
    )).await;
    let client = stub.client();
    let mut flow = AuthFlow::new(client.clone());
    let req = SignupRequest {
        username: "M0002".into(),
        password: "pw".into(),
        email: Some("m2@parish.org".into()),
        ..Default::default()
    };

    let out = flow.signup(&req).await.unwrap();

    assert_eq!(out, AuthOutcome::SignedIn { message: Some("Welcome".into()), navigate: Route::Root });
    assert_eq!(client.session().token().as_deref(), Some("S"));
    assert_eq!(stub.recorder.last().body, "username=M0002&password=pw&email=m2%40parish.org");
}

#[tokio::test]
async fn logout_clears_token_and_publishes_signed_out() {
    let stub = StubApi::spawn(Router::new().route("/auth/login", post(canned(201, json!({"access_token": "T"}))))).await;
    let client = stub.client();
    let mut flow = AuthFlow::new(client.clone());
    flow.login("u", "p").await.unwrap();
    let mut watcher = client.session().subscribe();

    assert_eq!(flow.logout().unwrap(), Route::Login);

    assert_eq!(client.session().get_token(), None);
    assert!(watcher.has_changed().unwrap());
    assert!(!watcher.borrow_and_update().signed_in);
    assert_eq!(flow.state(), AuthState::Idle);
}
