//! HTTP gateway between Tally exports and the sales store.
//!
//! Wires the [`tally_api`] router under `/api`, adds a health check, request
//! tracing and the body-size limit, and owns the server configuration.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use serde::Deserialize;
use tally_api::{AppState, api_router, auth::ApiKeyConfig};
use tally_core::store::SalesStore;
use tower_http::trace::TraceLayer;

/// Environment variable prefix, e.g. `TALLY_PORT`, `TALLY_API_KEY`.
pub const ENV_PREFIX: &str = "TALLY";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `TALLY_*` environment.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  /// SQLite file holding the sales collections.
  pub store_path:     PathBuf,
  /// Secret expected in `x-api-key` on ingest. Ingest is refused when unset.
  pub api_key:        Option<String>,
  pub max_body_bytes: usize,
}

impl ServerConfig {
  /// Load configuration: built-in defaults, then the optional TOML file at
  /// `path`, then `TALLY_*` environment variables.
  pub fn load(path: impl Into<PathBuf>) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 8080_i64)?
      .set_default("max_body_bytes", 16 * 1024 * 1024_i64)?
      .add_source(config::File::from(path.into()).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?
      .try_deserialize()
  }

  /// `host:port`, ready for binding.
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// The store location with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn api_key_config(&self) -> ApiKeyConfig {
    ApiKeyConfig {
      key: self.api_key.clone().filter(|k| !k.is_empty()),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router for `store`.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: SalesStore + Clone + Send + Sync + 'static,
{
  let state = AppState {
    store,
    api_key: Arc::new(config.api_key_config()),
  };

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api_router(state))
    .layer(DefaultBodyLimit::max(config.max_body_bytes))
    .layer(TraceLayer::new_for_http())
}
