//! Encoding and decoding helpers between [`SaleDocument`] and the plain-text
//! representations stored in SQLite columns.
//!
//! Documents are stored as compact JSON objects. Timestamps are RFC 3339
//! strings. UUIDs are hyphenated lowercase strings.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tally_core::sale::{Fields, SaleDocument};
use uuid::Uuid;

use crate::Result;

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_fields(fields: &Fields) -> Result<String> {
  Ok(serde_json::to_string(fields)?)
}

pub fn decode_fields(s: &str) -> Result<Fields> { Ok(serde_json::from_str(s)?) }

// ─── Write side ──────────────────────────────────────────────────────────────

/// A child document with its store-assigned identifier.
pub struct EncodedChild {
  pub id:       String,
  pub document: String,
}

/// Column values for one sale, owned so they can move into a
/// `tokio_rusqlite` closure.
pub struct EncodedSale {
  pub voucher_number: String,
  pub document:       String,
  pub created_at:     String,
  pub items:          Vec<EncodedChild>,
  pub ledgers:        Vec<EncodedChild>,
}

impl EncodedSale {
  pub fn encode(sale: &SaleDocument, created_at: DateTime<Utc>) -> Result<Self> {
    Ok(Self {
      voucher_number: sale.voucher_number.clone(),
      document:       encode_fields(&sale.fields)?,
      created_at:     encode_dt(created_at),
      items:          encode_children(&sale.item_details)?,
      ledgers:        encode_children(&sale.ledger_details)?,
    })
  }
}

fn encode_children(children: &[Fields]) -> Result<Vec<EncodedChild>> {
  children
    .iter()
    .map(|fields| {
      Ok(EncodedChild {
        id:       encode_uuid(Uuid::new_v4()),
        document: encode_fields(fields)?,
      })
    })
    .collect()
}

// ─── Read side ───────────────────────────────────────────────────────────────

/// A `sales` row as read from SQLite.
pub struct RawSale {
  pub voucher_number: String,
  pub document:       String,
}

/// An `item_details` / `ledger_details` row as read from SQLite.
pub struct RawChild {
  pub voucher_number: String,
  pub document:       String,
}

impl RawSale {
  pub fn into_document(
    self,
    item_details: Vec<Fields>,
    ledger_details: Vec<Fields>,
  ) -> Result<SaleDocument> {
    Ok(SaleDocument {
      fields: decode_fields(&self.document)?,
      voucher_number: self.voucher_number,
      item_details,
      ledger_details,
    })
  }
}

/// Decode child rows and group them by parent voucher number, keeping row
/// order within each group.
pub fn group_children(raws: Vec<RawChild>) -> Result<HashMap<String, Vec<Fields>>> {
  let mut grouped: HashMap<String, Vec<Fields>> = HashMap::new();
  for raw in raws {
    let fields = decode_fields(&raw.document)?;
    grouped.entry(raw.voucher_number).or_default().push(fields);
  }
  Ok(grouped)
}
