//! End-to-end tests for `ApiClient` against an in-process axum server
//! bound to an ephemeral port.

use std::sync::{Arc, Mutex};

use axum::{
  Json, Router,
  extract::{Multipart, Path, State},
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
  routing::{delete, get, post},
};
use legalward_client::{ApiClient, ApiConfig, Error};
use legalward_core::{
  lifecycle::{DiscoveryState, Lifecycle},
  recent::{MemoryStorage, RecentlyViewed},
  service::DiscoveryService,
  session::Session,
};
use serde_json::{Value, json};

// ─── Fake backend ────────────────────────────────────────────────────────────

#[derive(Default)]
struct Backend {
  rows:           Vec<Value>,
  fail_mutations: bool,
}

type Shared = Arc<Mutex<Backend>>;

fn row(id: i64, state: &str) -> Value {
  json!({
    "id": id,
    "proyecto_id": format!("{id}-07"),
    "proyecto_titulo": format!("Proyecto {id}"),
    "descripcion_impacto_consolidada": null,
    "fecha_analisis": "2024-03-01T10:00:00Z",
    "cantidad_impactos": 2,
    "max_nivel_relevancia": 60,
    "documento_nombre": "contrato.pdf",
    "documento_id": 1,
    "estado": state,
    "proyecto_etapa": 2,
    "proyecto_fecha": "2024-01-10",
    "proyecto_camara_origen": "Senado"
  })
}

fn in_state(backend: &Backend, state: &str) -> Vec<Value> {
  backend
    .rows
    .iter()
    .filter(|r| r["estado"] == state)
    .cloned()
    .collect()
}

async fn list_pending(State(s): State<Shared>) -> Json<Vec<Value>> {
  Json(in_state(&s.lock().unwrap(), "PENDING"))
}

async fn list_tracking(State(s): State<Shared>) -> Json<Vec<Value>> {
  Json(in_state(&s.lock().unwrap(), "TRACKING"))
}

fn transition(s: &Shared, id: i64, target: &str) -> axum::response::Response {
  let mut backend = s.lock().unwrap();
  if backend.fail_mutations {
    return (StatusCode::INTERNAL_SERVER_ERROR, "database is locked").into_response();
  }
  match backend.rows.iter_mut().find(|r| r["id"] == id) {
    Some(row) => {
      row["estado"] = json!(target);
      Json(json!({ "success": true, "message": "ok", "estado": target })).into_response()
    }
    None => (StatusCode::NOT_FOUND, "no such discovery").into_response(),
  }
}

async fn track(State(s): State<Shared>, Path(id): Path<i64>) -> axum::response::Response {
  transition(&s, id, "TRACKING")
}

async fn discard(State(s): State<Shared>, Path(id): Path<i64>) -> axum::response::Response {
  transition(&s, id, "DISCARDED")
}

async fn detect(mut form: Multipart) -> axum::response::Response {
  while let Ok(Some(field)) = form.next_field().await {
    if field.name() != Some("file") {
      continue;
    }
    let name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.unwrap();
    return Json(json!({
      "documento_id": 9,
      "documento_nombre": name,
      "fecha_carga": "2024-06-01T12:00:00",
      "descubrimientos": [{
        "id": 40,
        "proyecto_id": "15000-07",
        "proyecto_titulo": "Ley de datos",
        "cantidad_impactos": bytes.len()
      }],
      "pending_discoveries_count": 1
    }))
    .into_response();
  }
  (StatusCode::BAD_REQUEST, "missing file").into_response()
}

async fn delete_document(Path(id): Path<i64>) -> Json<Value> {
  Json(json!({ "success": true, "message": format!("documento {id} eliminado") }))
}

async fn malformed() -> &'static str { "[{\"id\": \"not a number\"}]" }

async fn session(headers: HeaderMap) -> axum::response::Response {
  let signed_in = headers
    .get(header::COOKIE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.contains("sessionid=abc"));
  if !signed_in {
    return (StatusCode::UNAUTHORIZED, Json(json!({ "status": 401 }))).into_response();
  }
  Json(json!({
    "status": 200,
    "data": { "user": { "id": 3, "email": "ana@example.cl", "display": "Ana" } }
  }))
  .into_response()
}

async fn login(Json(body): Json<Value>) -> axum::response::Response {
  if body["password"] != "secreto" {
    return (StatusCode::BAD_REQUEST, "invalid credentials").into_response();
  }
  (
    [(header::SET_COOKIE, "sessionid=abc; Path=/")],
    Json(json!({
      "status": 200,
      "data": { "user": { "id": 3, "email": body["email"], "display": "Ana" } }
    })),
  )
    .into_response()
}

async fn logout() -> impl IntoResponse {
  (
    StatusCode::UNAUTHORIZED,
    [(header::SET_COOKIE, "sessionid=; Path=/; Max-Age=0")],
    Json(json!({ "status": 401 })),
  )
}

async fn serve(backend: Backend) -> (ApiClient, Shared) {
  let shared: Shared = Arc::new(Mutex::new(backend));
  let app = Router::new()
    .route("/api/conflict-detector/discoveries", get(list_pending))
    .route("/api/conflict-detector/discoveries/tracking", get(list_tracking))
    .route("/api/conflict-detector/discoveries/{id}/track", post(track))
    .route("/api/conflict-detector/discoveries/{id}/discard", post(discard))
    .route("/api/conflict-detector/detect", post(detect))
    .route("/api/conflict-detector/documents/{id}", delete(delete_document))
    .route("/api/conflict-detector/documents", get(malformed))
    .route(
      "/.auth/headless/browser/v1/auth/session",
      get(session).delete(logout),
    )
    .route("/.auth/headless/browser/v1/auth/login", post(login))
    .with_state(shared.clone());

  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });

  let client = ApiClient::new(ApiConfig {
    base_url: format!("http://{addr}/"),
    ..ApiConfig::default()
  })
  .unwrap();
  (client, shared)
}

fn backend_with(rows: Vec<Value>) -> Backend {
  Backend { rows, fail_mutations: false }
}

// ─── Discoveries ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn lists_pending_discoveries() {
  let (client, _) = serve(backend_with(vec![row(1, "PENDING"), row(2, "TRACKING")])).await;

  let pending = client.list_pending().await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].id, 1);
  assert_eq!(pending[0].bill_id, "1-07");
  assert_eq!(pending[0].max_relevance.get(), 60);
  assert_eq!(pending[0].bill.as_ref().and_then(|b| b.stage), Some(2));

  let tracking = client.list_tracking().await.unwrap();
  assert_eq!(tracking[0].state, DiscoveryState::Tracking);
}

#[tokio::test]
async fn track_returns_new_state() {
  let (client, _) = serve(backend_with(vec![row(1, "PENDING")])).await;

  let change = client.track(1).await.unwrap();
  assert!(change.success);
  assert_eq!(change.state, DiscoveryState::Tracking);
  assert!(client.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn server_error_carries_status_and_body() {
  let (client, shared) = serve(backend_with(vec![row(1, "PENDING")])).await;
  shared.lock().unwrap().fail_mutations = true;

  let err = client.discard(1).await.unwrap_err();
  match err {
    Error::Status { status, ref body, .. } => {
      assert_eq!(status, 500);
      assert_eq!(body, "database is locked");
    }
    other => panic!("expected status error, got {other:?}"),
  }
}

#[tokio::test]
async fn unexpected_shape_is_a_decode_error() {
  let (client, _) = serve(backend_with(vec![])).await;
  let err = client.list_documents().await.unwrap_err();
  assert!(matches!(err, Error::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
  let client = ApiClient::new(ApiConfig {
    base_url: "http://127.0.0.1:9".into(),
    ..ApiConfig::default()
  })
  .unwrap();
  let err = client.list_pending().await.unwrap_err();
  assert!(matches!(err, Error::Http(_)), "got {err:?}");
}

#[tokio::test]
async fn failed_discard_leaves_discovery_pending() {
  let (client, shared) = serve(backend_with(vec![row(1, "PENDING")])).await;
  shared.lock().unwrap().fail_mutations = true;
  let recent = RecentlyViewed::new(MemoryStorage::default());
  let lifecycle = Lifecycle::new(&client, &recent);

  assert!(lifecycle.discard(1).await.is_err());
  let lists = lifecycle.reload().await.unwrap();
  assert_eq!(lists.pending.len(), 1);
  assert_eq!(lists.pending[0].state, DiscoveryState::Pending);
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn detect_uploads_multipart_file() {
  let (client, _) = serve(backend_with(vec![])).await;

  let result = client
    .detect("contrato.pdf".into(), b"12345".to_vec())
    .await
    .unwrap();
  assert_eq!(result.document_id, 9);
  assert_eq!(result.document_name, "contrato.pdf");
  assert_eq!(result.pending_count, 1);
  assert_eq!(result.discoveries[0].impact_count, 5);
}

#[tokio::test]
async fn delete_document_reports_success() {
  let (client, _) = serve(backend_with(vec![])).await;
  let deletion = client.delete_document(4).await.unwrap();
  assert!(deletion.success);
  assert_eq!(deletion.message, "documento 4 eliminado");
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn no_session_is_anonymous() {
  let (client, _) = serve(backend_with(vec![])).await;
  assert_eq!(client.session().await.unwrap(), Session::Anonymous);
}

#[tokio::test]
async fn login_keeps_session_cookie() {
  let (client, _) = serve(backend_with(vec![])).await;

  let session = client.login("ana@example.cl", "secreto").await.unwrap();
  assert_eq!(session.user().map(|u| u.id), Some(3));

  let again = client.session().await.unwrap();
  assert!(again.is_authenticated());
  assert_eq!(again.user().map(|u| u.display.as_str()), Some("Ana"));

  client.logout().await.unwrap();
  assert_eq!(client.session().await.unwrap(), Session::Anonymous);
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
  let (client, _) = serve(backend_with(vec![])).await;
  let err = client.login("ana@example.cl", "nope").await.unwrap_err();
  assert_eq!(err.status(), Some(400));
  assert!(!err.is_unauthorized());
}
