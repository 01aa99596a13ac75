//! Servidor TMDB falso para los tests del cliente HTTP.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;

/// Petición recibida, para las aserciones.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
  pub query: Option<String>,
  pub authorization: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MockResponse {
  pub status: u16,
  pub body: String,
}

impl MockResponse {
  pub fn json(body: &str) -> Self {
    Self { status: 200, body: body.to_string() }
  }

  pub fn error(status: u16) -> Self {
    Self { status, body: r#"{"status_message":"nope"}"#.to_string() }
  }
}

#[derive(Default)]
struct MockState {
  response: Mutex<Option<MockResponse>>,
  captured: Mutex<Vec<CapturedRequest>>,
}

pub struct MockTmdb {
  addr: SocketAddr,
  state: Arc<MockState>,
}

impl MockTmdb {
  pub async fn start() -> Self {
    let state = Arc::new(MockState::default());
    let app = Router::new().route("/3/search/movie", get(search)).with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock tmdb");
    let addr = listener.local_addr().expect("mock addr");
    tokio::spawn(async move {
      let _ = axum::serve(listener, app).await;
    });

    Self { addr, state }
  }

  /// Base con el segmento de versión, como la real.
  pub fn base_url(&self) -> String {
    format!("http://{}/3/", self.addr)
  }

  pub fn respond_with(&self, response: MockResponse) {
    *self.state.response.lock().unwrap() = Some(response);
  }

  pub fn captured(&self) -> Vec<CapturedRequest> {
    self.state.captured.lock().unwrap().clone()
  }
}

async fn search(
  State(state): State<Arc<MockState>>,
  Query(params): Query<HashMap<String, String>>,
  headers: HeaderMap,
) -> Response {
  state.captured.lock().unwrap().push(CapturedRequest {
    query: params.get("query").cloned(),
    authorization: headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .map(str::to_string),
  });

  let response = state.response.lock().unwrap().clone().unwrap_or_else(|| MockResponse::json(r#"{"results":[]}"#));
  let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

  (status, [(header::CONTENT_TYPE, "application/json")], response.body).into_response()
}
