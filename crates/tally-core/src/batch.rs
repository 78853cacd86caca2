//! The ingest request envelope: `{"Sale": [ ...records ]}`.
//!
//! Only the envelope is validated here. Individual records are left as raw
//! JSON so that one bad record cannot fail the whole batch; see
//! [`SaleDocument::from_record`](crate::sale::SaleDocument::from_record).

use serde_json::Value;

use crate::{Error, Result};

/// Key under which sale records travel, both on ingest and on retrieve.
pub const SALE_KEY: &str = "Sale";

/// A validated, non-empty batch of raw sale records.
#[derive(Debug, Clone)]
pub struct IngestBatch {
  records: Vec<Value>,
}

impl IngestBatch {
  /// Parse and validate a request body.
  pub fn from_slice(body: &[u8]) -> Result<Self> {
    let value: Value = serde_json::from_slice(body)?;
    Self::from_value(value)
  }

  /// Validate an already-parsed request body.
  pub fn from_value(value: Value) -> Result<Self> {
    let Value::Object(mut envelope) = value else {
      return Err(Error::MissingSaleKey);
    };
    match envelope.remove(SALE_KEY) {
      None => Err(Error::MissingSaleKey),
      Some(Value::Array(records)) if records.is_empty() => Err(Error::EmptyBatch),
      Some(Value::Array(records)) => Ok(Self { records }),
      Some(_) => Err(Error::SaleNotSequence),
    }
  }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn into_records(self) -> Vec<Value> { self.records }
}
