use super::*;

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode as HttpStatus},
    response::{IntoResponse, Response as AxumResponse},
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::{Gender, UserStatus};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

#[derive(Debug, Clone)]
struct SeenRequest {
    method: &'static str,
    authorization: Option<String>,
    body: Option<Value>,
}

impl ServerState {
    async fn record(&self, method: &'static str, headers: &HeaderMap, body: Option<Value>) {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        self.seen.lock().await.push(SeenRequest {
            method,
            authorization,
            body,
        });
    }
}

fn record_json(id: i64, draft: &Value) -> Value {
    json!({
        "id": id,
        "name": draft["name"],
        "email": draft["email"],
        "gender": draft["gender"],
        "status": draft["status"],
    })
}

async fn list_users(State(state): State<ServerState>, headers: HeaderMap) -> Json<Value> {
    state.record("GET", &headers, None).await;
    Json(json!({
        "meta": { "pagination": { "total": 2 } },
        "data": [
            { "id": 1, "name": "Ann", "email": "ann@example.com", "gender": "female", "status": "active" },
            { "id": 2, "name": "Bo", "email": "bo@example.com", "gender": "male", "status": "inactive" },
        ]
    }))
}

async fn create_user(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(draft): Json<Value>,
) -> AxumResponse {
    state.record("POST", &headers, Some(draft.clone())).await;
    match draft["name"].as_str() {
        Some("taken") => (
            HttpStatus::UNPROCESSABLE_ENTITY,
            Json(json!({ "data": [{ "field": "email", "message": "has already been taken" }] })),
        )
            .into_response(),
        Some("legacy") => Json(json!({
            "code": 422,
            "meta": null,
            "data": [{ "field": "name", "message": "can't be blank" }]
        }))
        .into_response(),
        Some("anonymous") => (
            HttpStatus::UNAUTHORIZED,
            Json(json!({ "data": { "message": "Authentication failed" } })),
        )
            .into_response(),
        Some("boom") => (HttpStatus::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        Some("garbled") => (HttpStatus::CREATED, "not json").into_response(),
        _ => (
            HttpStatus::CREATED,
            Json(json!({ "data": record_json(42, &draft) })),
        )
            .into_response(),
    }
}

async fn update_user(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(draft): Json<Value>,
) -> AxumResponse {
    state.record("PUT", &headers, Some(draft.clone())).await;
    let returned_id = if id == 99 { 100 } else { id };
    Json(json!({ "data": record_json(returned_id, &draft) })).into_response()
}

async fn delete_user(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> AxumResponse {
    state.record("DELETE", &headers, None).await;
    match id {
        1 => HttpStatus::NO_CONTENT.into_response(),
        2 => Json(json!({ "data": null })).into_response(),
        3 => Json(json!({ "code": 204, "meta": null, "data": null })).into_response(),
        4 => (
            HttpStatus::NOT_FOUND,
            Json(json!({ "message": "Resource not found" })),
        )
            .into_response(),
        5 => Json(json!({ "code": 404, "data": { "message": "Resource not found" } }))
            .into_response(),
        7 => Json(json!({})).into_response(),
        8 => Json(json!({ "code": 200 })).into_response(),
        _ => Json(json!({ "data": { "id": id } })).into_response(),
    }
}

async fn slow_list() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "data": [] }))
}

async fn spawn_users_server() -> Result<(String, ServerState), std::io::Error> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
        .route("/slow/users", get(slow_list))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn gateway(base_url: &str, token: Option<&str>) -> HttpUserGateway {
    HttpUserGateway::with_client(
        Client::new(),
        base_url.to_string(),
        token.map(ToString::to_string),
    )
}

fn draft(name: &str) -> UserDraft {
    UserDraft {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_ascii_lowercase()),
        gender: Gender::Female,
        status: UserStatus::Active,
    }
}

#[tokio::test]
async fn list_decodes_records_without_credentials() {
    let (url, state) = spawn_users_server().await.expect("spawn server");
    let records = gateway(&url, Some("secret")).list().await.expect("list");

    assert_eq!(
        records.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![UserId(1), UserId(2)]
    );
    assert_eq!(records[1].gender, Gender::Male);
    assert_eq!(records[1].status, UserStatus::Inactive);

    let seen = state.seen.lock().await;
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].authorization, None);
}

#[tokio::test]
async fn create_sends_bearer_token_and_draft_body() {
    let (url, state) = spawn_users_server().await.expect("spawn server");
    let created = gateway(&url, Some("secret"))
        .create(&draft("Cy"))
        .await
        .expect("create");

    assert_eq!(created.id, UserId(42));
    assert_eq!(created.name, "Cy");

    let seen = state.seen.lock().await;
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret"));
    assert_eq!(
        seen[0].body,
        Some(json!({
            "name": "Cy",
            "email": "cy@example.com",
            "gender": "female",
            "status": "active",
        }))
    );
}

#[tokio::test]
async fn gateway_from_settings_uses_trimmed_token() {
    let (url, state) = spawn_users_server().await.expect("spawn server");
    let settings = crate::config::finalize(Settings {
        api_base_url: format!("{url}/"),
        api_token: Some("  secret ".to_string()),
        request_timeout_secs: 5,
    })
    .expect("settings");
    HttpUserGateway::new(&settings)
        .expect("client")
        .create(&draft("Cy"))
        .await
        .expect("create");

    assert_eq!(
        state.seen.lock().await[0].authorization.as_deref(),
        Some("Bearer secret")
    );
}

#[tokio::test]
async fn create_without_token_omits_header() {
    let (url, state) = spawn_users_server().await.expect("spawn server");
    gateway(&url, None)
        .create(&draft("Cy"))
        .await
        .expect("create");

    assert_eq!(state.seen.lock().await[0].authorization, None);
}

#[tokio::test]
async fn unprocessable_create_is_a_validation_error_with_fields() {
    let (url, _state) = spawn_users_server().await.expect("spawn server");
    let err = gateway(&url, Some("secret"))
        .create(&draft("taken"))
        .await
        .expect_err("must be rejected");

    match err {
        GatewayError::Validation {
            status,
            code,
            message,
            fields,
        } => {
            assert_eq!(status, 422);
            assert_eq!(code, ErrorCode::Validation);
            assert_eq!(message, "email has already been taken");
            assert_eq!(fields.len(), 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn legacy_envelope_code_overrides_http_success() {
    let (url, _state) = spawn_users_server().await.expect("spawn server");
    let err = gateway(&url, Some("secret"))
        .create(&draft("legacy"))
        .await
        .expect_err("must be rejected");

    assert!(err.is_validation());
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "request rejected (422): name can't be blank");
}

#[tokio::test]
async fn unauthorized_create_keeps_service_message() {
    let (url, _state) = spawn_users_server().await.expect("spawn server");
    let err = gateway(&url, None)
        .create(&draft("anonymous"))
        .await
        .expect_err("must be rejected");

    assert_eq!(err.code(), Some(ErrorCode::Unauthorized));
    assert!(err.to_string().contains("Authentication failed"), "{err}");
}

#[tokio::test]
async fn server_error_and_garbage_are_transport_errors() {
    let (url, _state) = spawn_users_server().await.expect("spawn server");
    let gw = gateway(&url, Some("secret"));

    let err = gw.create(&draft("boom")).await.expect_err("5xx");
    assert!(!err.is_validation());
    assert_eq!(err.status(), Some(500));

    let err = gw.create(&draft("garbled")).await.expect_err("garbage");
    assert!(!err.is_validation());
    assert!(err.to_string().contains("malformed response"), "{err}");
}

#[tokio::test]
async fn update_puts_to_member_url() {
    let (url, state) = spawn_users_server().await.expect("spawn server");
    let mut changed = draft("Ann");
    changed.status = UserStatus::Inactive;

    let updated = gateway(&url, Some("secret"))
        .update(UserId(1), &changed)
        .await
        .expect("update");

    assert_eq!(updated.id, UserId(1));
    assert_eq!(updated.status, UserStatus::Inactive);
    let seen = state.seen.lock().await;
    assert_eq!(seen[0].method, "PUT");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret"));
}

#[tokio::test]
async fn update_returning_other_id_is_rejected() {
    let (url, _state) = spawn_users_server().await.expect("spawn server");
    let err = gateway(&url, Some("secret"))
        .update(UserId(99), &draft("Ann"))
        .await
        .expect_err("mismatch");

    assert!(err.to_string().contains("server returned user 100"), "{err}");
}

#[tokio::test]
async fn delete_accepts_no_content_and_null_data_alike() {
    let (url, state) = spawn_users_server().await.expect("spawn server");
    let gw = gateway(&url, Some("secret"));

    for id in [1, 2, 3] {
        gw.delete(UserId(id))
            .await
            .unwrap_or_else(|err| panic!("delete {id} should succeed: {err}"));
    }

    let seen = state.seen.lock().await;
    assert!(seen
        .iter()
        .all(|req| req.authorization.as_deref() == Some("Bearer secret")));
}

#[tokio::test]
async fn delete_with_any_other_response_is_a_transport_error() {
    let (url, _state) = spawn_users_server().await.expect("spawn server");
    let gw = gateway(&url, Some("secret"));

    for id in [4, 5, 6, 7, 8] {
        let err = gw.delete(UserId(id)).await.expect_err("must fail");
        assert!(!err.is_validation(), "delete {id}: {err:?}");
    }

    let err = gw.delete(UserId(4)).await.expect_err("must fail");
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("Resource not found"));

    let err = gw.delete(UserId(7)).await.expect_err("empty object is not a confirmation");
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = gateway(&format!("http://{addr}"), None)
        .list()
        .await
        .expect_err("must fail");
    assert!(matches!(err, GatewayError::Transport { status: None, .. }));
}

#[tokio::test]
async fn slow_service_times_out_as_transport_error() {
    let (url, _state) = spawn_users_server().await.expect("spawn server");
    let http = Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .expect("client");
    let gw = HttpUserGateway::with_client(http, format!("{url}/slow"), None);

    let err = gw.list().await.expect_err("must time out");
    assert!(err.to_string().contains("timed out"), "{err}");
}
