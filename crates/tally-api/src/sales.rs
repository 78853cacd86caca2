//! Handlers for reading sales back out.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/get_sales` | Every sale, wrapped as `{"Sale": [...]}` |
//! | `GET`  | `/sales/{voucher_number}` | One sale; 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Serialize;
use serde_json::Value;
use tally_core::{sale::SaleDocument, store::SalesStore};

use crate::{AppState, error::ApiError};

/// Response envelope; same key as the ingest request body.
#[derive(Debug, Serialize)]
pub struct SalesEnvelope {
  #[serde(rename = "Sale")]
  pub sale: Vec<Value>,
}

/// `GET /get_sales`
///
/// Any store failure aborts the whole read; no partial list is returned.
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<SalesEnvelope>, ApiError>
where
  S: SalesStore + Clone + Send + Sync + 'static,
{
  let sales = state.store.list_sales().await.map_err(|e| {
    tracing::error!(error = %e, "failed to list sales");
    ApiError::Store(Box::new(e))
  })?;

  Ok(Json(SalesEnvelope {
    sale: sales.into_iter().map(SaleDocument::into_record).collect(),
  }))
}

/// `GET /sales/{voucher_number}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(voucher_number): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  S: SalesStore + Clone + Send + Sync + 'static,
{
  let sale = state
    .store
    .get_sale(&voucher_number)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("sale {voucher_number} not found")))?;
  Ok(Json(sale.into_record()))
}
