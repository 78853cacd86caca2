//! Handler for `POST /ingest_tally_sales`.
//!
//! Body: `{"Sale": [ {VoucherNumber, ...fields, ItemDetails: [...], LedgerDetails: [...]} ]}`.
//!
//! Records are processed one at a time and independently: a bad or duplicate
//! record is reported and skipped, and the rest of the batch carries on.
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | every record stored | 200 | `{message, processed_vouchers}` |
//! | some records rejected | 207 | `{message, processed_vouchers, errors}` |
//! | malformed envelope | 400 | `{error}` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Serialize;
use tally_core::{
  batch::IngestBatch,
  sale::{self, SaleDocument},
  store::{CreateOutcome, SalesStore},
};

use crate::{AppState, auth::RequireApiKey, error::ApiError};

// ─── Report ──────────────────────────────────────────────────────────────────

/// Why one record of a batch was not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
  /// Position of the record in the submitted `Sale` array.
  pub index:          usize,
  /// The record's voucher number, when it had a usable one.
  #[serde(rename = "VoucherNumber")]
  pub voucher_number: Option<String>,
  pub error:          String,
}

/// Per-record outcome of an ingest batch.
///
/// Every submitted record ends up in exactly one of the two lists.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
  pub total:              usize,
  pub processed_vouchers: Vec<String>,
  pub errors:             Vec<ItemError>,
}

impl IngestReport {
  fn reject(&mut self, index: usize, voucher_number: Option<String>, error: String) {
    tracing::warn!(index, voucher_number = ?voucher_number, %error, "sale rejected");
    self.errors.push(ItemError {
      index,
      voucher_number,
      error,
    });
  }

  pub fn is_complete(&self) -> bool { self.errors.is_empty() }
}

#[derive(Serialize)]
struct ReportBody<'a> {
  message:            String,
  processed_vouchers: &'a [String],
  #[serde(skip_serializing_if = "Option::is_none")]
  errors:             Option<&'a [ItemError]>,
}

impl IntoResponse for IngestReport {
  fn into_response(self) -> Response {
    if self.is_complete() {
      let body = ReportBody {
        message:            format!(
          "Successfully processed {} sales",
          self.processed_vouchers.len()
        ),
        processed_vouchers: &self.processed_vouchers,
        errors:             None,
      };
      (StatusCode::OK, Json(body)).into_response()
    } else {
      let body = ReportBody {
        message:            format!(
          "Processed {} of {} sales with {} errors",
          self.processed_vouchers.len(),
          self.total,
          self.errors.len()
        ),
        processed_vouchers: &self.processed_vouchers,
        errors:             Some(&self.errors),
      };
      (StatusCode::MULTI_STATUS, Json(body)).into_response()
    }
  }
}

// ─── Processing ──────────────────────────────────────────────────────────────

/// Store every record of `batch`, sequentially, collecting per-record
/// outcomes. Never fails as a whole: store errors are reported per record.
pub async fn ingest_batch<S>(store: &S, batch: IngestBatch) -> IngestReport
where
  S: SalesStore,
{
  let mut report = IngestReport {
    total: batch.len(),
    ..IngestReport::default()
  };

  for (index, record) in batch.into_records().into_iter().enumerate() {
    let voucher_number = sale::voucher_number(&record);

    let document = match SaleDocument::from_record(record) {
      Ok(d) => d,
      Err(e) => {
        report.reject(index, voucher_number, e.to_string());
        continue;
      }
    };

    let id = document.voucher_number.clone();
    match store.create_sale(document).await {
      Ok(CreateOutcome::Created) => report.processed_vouchers.push(id),
      Ok(CreateOutcome::AlreadyExists) => {
        let error = format!("Voucher {id} already exists");
        report.reject(index, Some(id), error);
      }
      Err(e) => {
        tracing::error!(voucher_number = %id, error = %e, "failed to store sale");
        report.reject(index, Some(id), e.to_string());
      }
    }
  }

  tracing::info!(
    total = report.total,
    processed = report.processed_vouchers.len(),
    errors = report.errors.len(),
    "ingest batch finished"
  );
  report
}

/// `POST /ingest_tally_sales`; requires `x-api-key`.
pub async fn handler<S>(
  _auth: RequireApiKey,
  State(state): State<AppState<S>>,
  body: Bytes,
) -> Result<IngestReport, ApiError>
where
  S: SalesStore + Clone + Send + Sync + 'static,
{
  let batch = IngestBatch::from_slice(&body).inspect_err(|e| {
    tracing::warn!(error = %e, "rejected malformed ingest body");
  })?;
  Ok(ingest_batch(state.store.as_ref(), batch).await)
}
