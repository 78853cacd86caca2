//! JSON REST API for the Tally sales gateway.
//!
//! Exposes an axum [`Router`] backed by any [`tally_core::store::SalesStore`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tally_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod ingest;
pub mod sales;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tally_core::store::SalesStore;

pub use error::ApiError;

use auth::ApiKeyConfig;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: SalesStore> {
  pub store:   Arc<S>,
  pub api_key: Arc<ApiKeyConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// Only the ingest route is guarded by the API key; reads are open.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SalesStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/ingest_tally_sales", post(ingest::handler::<S>))
    .route("/get_sales", get(sales::list::<S>))
    .route("/sales/{voucher_number}", get(sales::get_one::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
