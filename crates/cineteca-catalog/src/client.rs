use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

use cineteca_core::domain::Movie;
use cineteca_core::ports::{CatalogClient, CatalogError};

use crate::config::CatalogConfig;
use crate::dto::SearchResponse;

/// Errores al montar el cliente (no al buscar).
#[derive(Debug, Error)]
pub enum ClientError {
  #[error("TMDB token not set (config [catalog].api_token or {})", crate::config::TOKEN_ENV)]
  MissingToken,

  #[error("invalid base url {url}: {reason}")]
  InvalidBaseUrl { url: String, reason: String },

  #[error("http client error: {0}")]
  Http(#[from] reqwest::Error),
}

/// Adapter de [`CatalogClient`] contra la API v3 de TMDB.
///
/// `GET {base_url}search/movie?query=...` con `Authorization: Bearer`.
#[derive(Debug, Clone)]
pub struct TmdbCatalogClient {
  client: Client,
  search_url: Url,
  token: String,
}

impl TmdbCatalogClient {
  pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
    let token = token.into();
    if token.trim().is_empty() {
      return Err(ClientError::MissingToken);
    }

    // Sin barra final `join` se comería el último segmento (`/3`).
    let mut base = base_url.to_string();
    if !base.ends_with('/') {
      base.push('/');
    }

    let search_url = Url::parse(&base).and_then(|u| u.join("search/movie")).map_err(|e| {
      ClientError::InvalidBaseUrl { url: base_url.to_string(), reason: e.to_string() }
    })?;

    let client = Client::builder().timeout(timeout).build()?;

    Ok(Self { client, search_url, token })
  }

  pub fn from_config(cfg: &CatalogConfig) -> Result<Self, ClientError> {
    let token = cfg.resolved_token().ok_or(ClientError::MissingToken)?;
    Self::new(&cfg.base_url, token, Duration::from_secs(cfg.timeout_secs))
  }

  fn url_for(&self, query: &str) -> Url {
    let mut url = self.search_url.clone();
    url.query_pairs_mut().append_pair("query", query);
    url
  }
}

#[async_trait]
impl CatalogClient for TmdbCatalogClient {
  async fn search(&self, query: &str) -> Result<Vec<Movie>, CatalogError> {
    let url = self.url_for(query);
    debug!(%query, "GET {}", self.search_url);

    let response = self
      .client
      .get(url)
      .bearer_auth(&self.token)
      .send()
      .await
      .map_err(|e| CatalogError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      return Err(CatalogError::Status { status: status.as_u16() });
    }

    let body = response.bytes().await.map_err(|e| CatalogError::Transport(e.to_string()))?;
    let parsed: SearchResponse =
      serde_json::from_slice(&body).map_err(|e| CatalogError::Deserialization(e.to_string()))?;

    debug!(%query, results = parsed.results.len(), "catalog answered");
    Ok(parsed.results.into_iter().map(Movie::from).collect())
  }
}
