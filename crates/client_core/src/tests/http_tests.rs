use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use shared::error::ApiError;
use tokio::{net::TcpListener, sync::Mutex};

use super::*;
use crate::{
    credential::{MissingCredential, SessionCredentials},
    directory::DirectoryStore,
    error::{ClientError, ErrorKind},
};

#[derive(Default)]
struct MockState {
    records: Vec<EmployeeRecord>,
    next_id: i64,
    accounts: Vec<(String, String)>,
    valid_tokens: HashSet<String>,
    seen_auth: Vec<Option<String>>,
    fail_list_with: Option<StatusCode>,
    corrupt_list: bool,
}

#[derive(Clone, Default)]
struct MockServer {
    state: Arc<Mutex<MockState>>,
}

impl MockServer {
    async fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let mut state = self.state.lock().await;
        state.seen_auth.push(header.clone());
        let token = header.as_deref().and_then(|h| h.strip_prefix("Bearer "));
        match token {
            Some(token) if state.valid_tokens.contains(token) => Ok(()),
            _ => Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiError::new("invalid token")),
            )
                .into_response()),
        }
    }
}

async fn list_employees(State(server): State<MockServer>, headers: HeaderMap) -> Response {
    if let Err(rejection) = server.authorize(&headers).await {
        return rejection;
    }
    let state = server.state.lock().await;
    if let Some(status) = state.fail_list_with {
        return (status, "backend exploded").into_response();
    }
    if state.corrupt_list {
        return (StatusCode::OK, "<html>not json</html>").into_response();
    }
    Json(state.records.clone()).into_response()
}

async fn create_employee(
    State(server): State<MockServer>,
    headers: HeaderMap,
    Json(draft): Json<EmployeeDraft>,
) -> Response {
    if let Err(rejection) = server.authorize(&headers).await {
        return rejection;
    }
    let mut state = server.state.lock().await;
    if state.records.iter().any(|r| r.email == draft.email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("email already exists")),
        )
            .into_response();
    }
    state.next_id += 1;
    let created = EmployeeRecord::from_draft(EmployeeId(state.next_id), draft);
    state.records.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_employee(
    State(server): State<MockServer>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(draft): Json<EmployeeDraft>,
) -> Response {
    if let Err(rejection) = server.authorize(&headers).await {
        return rejection;
    }
    let mut state = server.state.lock().await;
    match state.records.iter_mut().find(|r| r.id == EmployeeId(id)) {
        Some(slot) => {
            *slot = EmployeeRecord::from_draft(EmployeeId(id), draft);
            Json(slot.clone()).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new("employee not found")),
        )
            .into_response(),
    }
}

async fn delete_employee(
    State(server): State<MockServer>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = server.authorize(&headers).await {
        return rejection;
    }
    let mut state = server.state.lock().await;
    let before = state.records.len();
    state.records.retain(|r| r.id != EmployeeId(id));
    if state.records.len() == before {
        return (StatusCode::NOT_FOUND, "employee not found").into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_positions(State(server): State<MockServer>, headers: HeaderMap) -> Response {
    if let Err(rejection) = server.authorize(&headers).await {
        return rejection;
    }
    Json(vec!["Developer", "Designer", "Manager"]).into_response()
}

async fn login(
    State(server): State<MockServer>,
    Json(body): Json<CredentialsRequest>,
) -> Response {
    let mut state = server.state.lock().await;
    let known = state
        .accounts
        .iter()
        .any(|(email, password)| *email == body.email && *password == body.password);
    if !known {
        return (StatusCode::UNAUTHORIZED, "invalid credentials").into_response();
    }
    let token = format!("token-{}", state.valid_tokens.len() + 1);
    state.valid_tokens.insert(token.clone());
    Json(LoginResponse { token }).into_response()
}

async fn register(
    State(server): State<MockServer>,
    Json(body): Json<CredentialsRequest>,
) -> Response {
    let mut state = server.state.lock().await;
    if state.accounts.iter().any(|(email, _)| *email == body.email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("email already registered")),
        )
            .into_response();
    }
    state.accounts.push((body.email, body.password));
    StatusCode::CREATED.into_response()
}

async fn spawn_employee_server() -> anyhow::Result<(String, MockServer)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server = MockServer::default();
    {
        let mut state = server.state.lock().await;
        state.valid_tokens.insert("tok-a".into());
        state.valid_tokens.insert("tok-b".into());
        state
            .accounts
            .push(("admin@x.com".into(), "secret".into()));
    }
    let app = Router::new()
        .route("/api/employees", get(list_employees).post(create_employee))
        .route(
            "/api/employees/:id",
            put(update_employee).delete(delete_employee),
        )
        .route("/api/positions", get(list_positions))
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .with_state(server.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), server))
}

fn draft(first_name: &str, email: &str) -> EmployeeDraft {
    EmployeeDraft {
        first_name: first_name.into(),
        last_name: "Tester".into(),
        position: "Developer".into(),
        email: email.into(),
        birth_date: "1988-11-02".into(),
    }
}

fn client_with_token(url: &str, token: &str) -> (EmployeeApiClient, Arc<SessionCredentials>) {
    let session = Arc::new(SessionCredentials::with_token(BearerToken::new(token)));
    let client = EmployeeApiClient::new(url, session.clone()).expect("client");
    (client, session)
}

#[tokio::test]
async fn every_call_carries_the_bearer_token() {
    let (url, server) = spawn_employee_server().await.expect("spawn server");
    let (client, _) = client_with_token(&url, "tok-a");

    let created = client
        .create(&draft("Ana", "ana@x.com"))
        .await
        .expect("create");
    client.list().await.expect("list");
    client
        .update(created.id, &draft("Anna", "ana@x.com"))
        .await
        .expect("update");
    client.positions().await.expect("positions");
    client.delete(created.id).await.expect("delete");

    let seen = server.state.lock().await.seen_auth.clone();
    assert_eq!(seen.len(), 5);
    assert!(seen.iter().all(|h| h.as_deref() == Some("Bearer tok-a")));
}

#[tokio::test]
async fn token_replaced_after_construction_is_used_by_next_call() {
    let (url, server) = spawn_employee_server().await.expect("spawn server");
    let (client, session) = client_with_token(&url, "tok-a");

    client.list().await.expect("first list");
    session.set(BearerToken::new("tok-b")).await;
    client.list().await.expect("second list");

    let seen = server.state.lock().await.seen_auth.clone();
    assert_eq!(
        seen,
        vec![Some("Bearer tok-a".into()), Some("Bearer tok-b".into())]
    );
}

#[tokio::test]
async fn missing_credential_fails_without_network_io() {
    let (url, server) = spawn_employee_server().await.expect("spawn server");
    let client = EmployeeApiClient::new(&url, Arc::new(MissingCredential)).expect("client");

    let err = client.list().await.expect_err("no token");
    assert!(matches!(err, GatewayError::MissingCredential));
    assert!(err.requires_reauth());
    assert!(server.state.lock().await.seen_auth.is_empty());
}

#[tokio::test]
async fn rejected_token_maps_to_auth_error() {
    let (url, _server) = spawn_employee_server().await.expect("spawn server");
    let (client, _) = client_with_token(&url, "expired");

    let err = client.list().await.expect_err("401");
    match &err {
        GatewayError::Auth { status, message } => {
            assert_eq!(*status, 401);
            assert_eq!(message, "invalid token");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::Auth);
}

#[tokio::test]
async fn duplicate_email_maps_to_validation_error() {
    let (url, _server) = spawn_employee_server().await.expect("spawn server");
    let (client, _) = client_with_token(&url, "tok-a");
    client
        .create(&draft("Ana", "dup@x.com"))
        .await
        .expect("first create");

    let err = client
        .create(&draft("Cy", "dup@x.com"))
        .await
        .expect_err("duplicate");
    match &err {
        GatewayError::Validation { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "email already exists");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.user_message().contains("email already exists"));
}

#[tokio::test]
async fn unknown_id_maps_to_not_found() {
    let (url, _server) = spawn_employee_server().await.expect("spawn server");
    let (client, _) = client_with_token(&url, "tok-a");

    let err = client
        .update(EmployeeId(404), &draft("Ana", "ana@x.com"))
        .await
        .expect_err("update unknown");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = client.delete(EmployeeId(404)).await.expect_err("delete unknown");
    match err {
        GatewayError::NotFound { message } => assert_eq!(message, "employee not found"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn server_failure_maps_to_unexpected() {
    let (url, server) = spawn_employee_server().await.expect("spawn server");
    server.state.lock().await.fail_list_with = Some(StatusCode::INTERNAL_SERVER_ERROR);
    let (client, _) = client_with_token(&url, "tok-a");

    let err = client.list().await.expect_err("500");
    assert!(matches!(err, GatewayError::Unexpected { status: 500, .. }));
    assert_eq!(err.kind(), ErrorKind::Other);
}

#[tokio::test]
async fn forbidden_maps_to_auth_error() {
    let (url, server) = spawn_employee_server().await.expect("spawn server");
    server.state.lock().await.fail_list_with = Some(StatusCode::FORBIDDEN);
    let (client, _) = client_with_token(&url, "tok-a");

    let err = client.list().await.expect_err("403");
    assert!(matches!(err, GatewayError::Auth { status: 403, .. }));
    assert!(err.requires_reauth());
}

#[tokio::test]
async fn undecodable_success_body_maps_to_decode_error() {
    let (url, server) = spawn_employee_server().await.expect("spawn server");
    server.state.lock().await.corrupt_list = true;
    let (client, _) = client_with_token(&url, "tok-a");

    let err = client.list().await.expect_err("garbage body");
    assert!(matches!(err, GatewayError::Decode(_)));
    assert_eq!(err.kind(), ErrorKind::Other);
}

#[tokio::test]
async fn unreachable_server_maps_to_network_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let (client, _) = client_with_token(&format!("http://{addr}"), "tok-a");
    let err = client.list().await.expect_err("connection refused");
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn login_returns_token_and_register_rejects_duplicates() {
    let (url, server) = spawn_employee_server().await.expect("spawn server");
    let client = EmployeeApiClient::new(&url, Arc::new(MissingCredential)).expect("client");
    let password = SecretString::from("secret".to_string());

    let token = client.login("admin@x.com", &password).await.expect("login");
    assert!(server
        .state
        .lock()
        .await
        .valid_tokens
        .contains(token.expose()));

    let wrong = SecretString::from("nope".to_string());
    let err = client.login("admin@x.com", &wrong).await.expect_err("bad password");
    assert_eq!(err.kind(), ErrorKind::Auth);

    client
        .register("new@x.com", &password)
        .await
        .expect("register");
    let err = client
        .register("new@x.com", &password)
        .await
        .expect_err("duplicate");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn base_url_with_prefix_keeps_its_path() {
    let client = EmployeeApiClient::new(
        "http://example.test/tenant-a",
        Arc::new(MissingCredential),
    )
    .expect("client");
    assert_eq!(
        client.base_url().join(paths::EMPLOYEES).expect("join").as_str(),
        "http://example.test/tenant-a/api/employees"
    );

    assert!(matches!(
        EmployeeApiClient::new("not a url", Arc::new(MissingCredential)),
        Err(GatewayError::InvalidUrl(_))
    ));
}

#[tokio::test]
async fn directory_store_round_trips_through_the_api() {
    let (url, _server) = spawn_employee_server().await.expect("spawn server");
    let (client, _) = client_with_token(&url, "tok-a");
    let client = Arc::new(client);
    let store = DirectoryStore::new(client.clone());
    store.load_positions(&*client).await.expect("positions");
    store.load().await.expect("initial load");
    assert!(store.records().await.is_empty());

    let created = store
        .create(draft("Ana", "ana@x.com"))
        .await
        .expect("create");
    store
        .create(draft("Ben", "ben@x.com"))
        .await
        .expect("create");
    assert!(created.id.0 > 0);
    assert!(store.records().await.iter().any(|r| r.id == created.id));

    let err = store
        .create(draft("Cy", "ana@x.com"))
        .await
        .expect_err("duplicate");
    assert!(matches!(
        err,
        ClientError::Gateway(GatewayError::Validation { .. })
    ));
    assert_eq!(store.records().await.len(), 2);

    store.delete(created.id).await.expect("delete");
    let remaining = store.records().await;
    assert_eq!(remaining.len(), 1);
    assert!(remaining.iter().all(|r| r.id != created.id));
}
