//! Error types for `tally-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("request body is not valid JSON: {0}")]
  MalformedBody(#[from] serde_json::Error),

  #[error("request body must be a JSON object with a \"Sale\" key")]
  MissingSaleKey,

  #[error("\"Sale\" must be an array of sale records")]
  SaleNotSequence,

  #[error("\"Sale\" must contain at least one record")]
  EmptyBatch,

  #[error("sale record must be a JSON object")]
  RecordNotObject,

  #[error("missing VoucherNumber")]
  MissingVoucherNumber,

  #[error("{0} must be an array of objects")]
  InvalidDetails(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
