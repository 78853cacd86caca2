//! Sale documents: the split between a parent document and its two child
//! collections.
//!
//! An incoming Tally sale record is a single nested JSON object:
//!
//! ```json
//! { "VoucherNumber": "V1", "Date": "2024-04-01", "PartyName": "Acme",
//!   "ItemDetails":   [ { "StockItemName": "Widget", "Quantity": 2 } ],
//!   "LedgerDetails": [ { "LedgerName": "Cash", "LedgerAmount": 100 } ] }
//! ```
//!
//! On write it is split into a [`SaleDocument`]: the top-level scalar fields
//! form the parent document, and the two arrays become child collections. On
//! read the same document is folded back into the nested shape.

use serde_json::{Map, Value};

use crate::{Error, Result};

pub const VOUCHER_NUMBER: &str = "VoucherNumber";
pub const ITEM_DETAILS: &str = "ItemDetails";
pub const LEDGER_DETAILS: &str = "LedgerDetails";

pub const LEDGER_NAME: &str = "LedgerName";
pub const LEDGER_AMOUNT: &str = "LedgerAmount";
pub const LEDGER_VALUE: &str = "LedgerValue";

/// An untyped JSON object, as stored for a single document.
pub type Fields = Map<String, Value>;

// ─── SaleDocument ────────────────────────────────────────────────────────────

/// A sale split into its parent document and child collections.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDocument {
  /// Document identifier; the record's `VoucherNumber`.
  pub voucher_number: String,
  /// Every top-level field of the record except the two detail arrays.
  pub fields:         Fields,
  /// `ItemDetails` entries, verbatim.
  pub item_details:   Vec<Fields>,
  /// `LedgerDetails` entries, after [`normalize_ledger`].
  pub ledger_details: Vec<Fields>,
}

impl SaleDocument {
  /// Split an incoming sale record.
  ///
  /// The voucher number is checked before anything else so that a record
  /// missing it always reports [`Error::MissingVoucherNumber`].
  pub fn from_record(record: Value) -> Result<Self> {
    let Value::Object(mut fields) = record else {
      return Err(Error::RecordNotObject);
    };

    let voucher_number = fields
      .get(VOUCHER_NUMBER)
      .and_then(voucher_number_of)
      .ok_or(Error::MissingVoucherNumber)?;

    let item_details = take_details(&mut fields, ITEM_DETAILS)?;
    let ledger_details = take_details(&mut fields, LEDGER_DETAILS)?
      .into_iter()
      .map(normalize_ledger)
      .collect();

    Ok(Self {
      voucher_number,
      fields,
      item_details,
      ledger_details,
    })
  }

  /// Fold the document back into the nested record shape.
  ///
  /// `VoucherNumber` is always set from the document identifier, overwriting
  /// whatever the stored parent fields hold.
  pub fn into_record(self) -> Value {
    let mut record = self.fields;
    record.insert(VOUCHER_NUMBER.to_owned(), Value::String(self.voucher_number));
    record.insert(
      ITEM_DETAILS.to_owned(),
      Value::Array(self.item_details.into_iter().map(Value::Object).collect()),
    );
    record.insert(
      LEDGER_DETAILS.to_owned(),
      Value::Array(self.ledger_details.into_iter().map(Value::Object).collect()),
    );
    Value::Object(record)
  }
}

/// Best-effort voucher number of a raw record, for error reporting.
///
/// Returns `None` if the record is not an object or the field is missing,
/// falsy (`""`, `0`), or neither a string nor a number.
pub fn voucher_number(record: &Value) -> Option<String> {
  record.get(VOUCHER_NUMBER).and_then(voucher_number_of)
}

fn voucher_number_of(value: &Value) -> Option<String> {
  match value {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) if !is_falsy(value) => Some(n.to_string()),
    _ => None,
  }
}

/// Remove a detail array from `fields`. Absent or `null` means empty.
fn take_details(fields: &mut Fields, key: &'static str) -> Result<Vec<Fields>> {
  match fields.remove(key) {
    None | Some(Value::Null) => Ok(Vec::new()),
    Some(Value::Array(entries)) => entries
      .into_iter()
      .map(|entry| match entry {
        Value::Object(map) => Ok(map),
        _ => Err(Error::InvalidDetails(key)),
      })
      .collect(),
    Some(_) => Err(Error::InvalidDetails(key)),
  }
}

// ─── Ledger normalisation ────────────────────────────────────────────────────

/// Normalise a ledger entry for storage.
///
/// `LedgerAmount` and `LedgerValue` become `0` when absent or falsy;
/// `LedgerName` becomes `null` when absent. Any other field is kept as-is.
pub fn normalize_ledger(mut entry: Fields) -> Fields {
  entry.entry(LEDGER_NAME).or_insert(Value::Null);
  for key in [LEDGER_AMOUNT, LEDGER_VALUE] {
    let value = entry.remove(key).filter(|v| !is_falsy(v));
    entry.insert(key.to_owned(), value.unwrap_or_else(|| Value::from(0)));
  }
  entry
}

/// JSON truthiness as the Tally exporter understands it: `null`, `false`,
/// zero, `""`, `[]` and `{}` are falsy.
pub fn is_falsy(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::Bool(b) => !b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
    Value::String(s) => s.is_empty(),
    Value::Array(a) => a.is_empty(),
    Value::Object(o) => o.is_empty(),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn object(v: Value) -> Fields {
    match v {
      Value::Object(m) => m,
      other => panic!("expected object, got {other}"),
    }
  }

  #[test]
  fn split_moves_details_into_children() {
    let doc = SaleDocument::from_record(json!({
      "VoucherNumber": "V1",
      "PartyName":     "Acme",
      "ItemDetails":   [{ "Item": "A" }, { "Item": "B" }],
      "LedgerDetails": [{ "LedgerName": "Cash", "LedgerAmount": 100 }],
    }))
    .unwrap();

    assert_eq!(doc.voucher_number, "V1");
    assert_eq!(doc.fields, object(json!({ "VoucherNumber": "V1", "PartyName": "Acme" })));
    assert_eq!(doc.item_details.len(), 2);
    assert_eq!(
      doc.ledger_details,
      vec![object(json!({ "LedgerName": "Cash", "LedgerAmount": 100, "LedgerValue": 0 }))]
    );
  }

  #[test]
  fn missing_details_are_empty() {
    let doc = SaleDocument::from_record(json!({
      "VoucherNumber": "V2",
      "ItemDetails":   null,
    }))
    .unwrap();
    assert!(doc.item_details.is_empty());
    assert!(doc.ledger_details.is_empty());
  }

  #[test]
  fn missing_or_empty_voucher_number_is_rejected() {
    for record in [
      json!({ "PartyName": "Acme" }),
      json!({ "VoucherNumber": "" }),
      json!({ "VoucherNumber": null }),
      json!({ "VoucherNumber": ["V1"] }),
    ] {
      assert!(matches!(
        SaleDocument::from_record(record),
        Err(Error::MissingVoucherNumber)
      ));
    }
  }

  #[test]
  fn numeric_voucher_number_is_stringified() {
    let doc = SaleDocument::from_record(json!({ "VoucherNumber": 42 })).unwrap();
    assert_eq!(doc.voucher_number, "42");
  }

  #[test]
  fn zero_voucher_number_counts_as_missing() {
    for zero in [json!(0), json!(0.0)] {
      let record = json!({ "VoucherNumber": zero });
      assert_eq!(voucher_number(&record), None);
      assert!(matches!(
        SaleDocument::from_record(record),
        Err(Error::MissingVoucherNumber)
      ));
    }
  }

  #[test]
  fn missing_voucher_number_wins_over_bad_details() {
    let err = SaleDocument::from_record(json!({ "ItemDetails": "oops" })).unwrap_err();
    assert!(matches!(err, Error::MissingVoucherNumber));
  }

  #[test]
  fn non_array_details_are_rejected() {
    let err = SaleDocument::from_record(json!({
      "VoucherNumber": "V1",
      "LedgerDetails": { "LedgerName": "Cash" },
    }))
    .unwrap_err();
    assert!(matches!(err, Error::InvalidDetails(LEDGER_DETAILS)));

    let err = SaleDocument::from_record(json!({
      "VoucherNumber": "V1",
      "ItemDetails":   [1, 2],
    }))
    .unwrap_err();
    assert!(matches!(err, Error::InvalidDetails(ITEM_DETAILS)));
  }

  #[test]
  fn non_object_record_is_rejected() {
    let err = SaleDocument::from_record(json!("V1")).unwrap_err();
    assert!(matches!(err, Error::RecordNotObject));
  }

  #[test]
  fn ledger_falsy_amounts_become_zero() {
    for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
      let entry = normalize_ledger(object(json!({
        "LedgerName":   "Sales",
        "LedgerAmount": falsy.clone(),
        "LedgerValue":  falsy,
      })));
      assert_eq!(entry[LEDGER_AMOUNT], json!(0));
      assert_eq!(entry[LEDGER_VALUE], json!(0));
    }
  }

  #[test]
  fn ledger_non_zero_amounts_are_kept() {
    let entry = normalize_ledger(object(json!({
      "LedgerName":   "Sales",
      "LedgerAmount": -250.5,
      "LedgerValue":  "1200",
      "IsDeemedPositive": true,
    })));
    assert_eq!(entry[LEDGER_AMOUNT], json!(-250.5));
    assert_eq!(entry[LEDGER_VALUE], json!("1200"));
    assert_eq!(entry["IsDeemedPositive"], json!(true));
  }

  #[test]
  fn ledger_missing_name_is_null() {
    let entry = normalize_ledger(Fields::new());
    assert_eq!(entry[LEDGER_NAME], Value::Null);
    assert_eq!(entry[LEDGER_AMOUNT], json!(0));
  }

  #[test]
  fn reassembly_restores_nested_shape() {
    let input = json!({
      "VoucherNumber": "V1",
      "ItemDetails":   [{ "Item": "A" }],
      "LedgerDetails": [{ "LedgerName": "Cash", "LedgerAmount": 100 }],
    });
    let record = SaleDocument::from_record(input).unwrap().into_record();
    assert_eq!(
      record,
      json!({
        "VoucherNumber": "V1",
        "ItemDetails":   [{ "Item": "A" }],
        "LedgerDetails": [{ "LedgerName": "Cash", "LedgerAmount": 100, "LedgerValue": 0 }],
      })
    );
  }

  #[test]
  fn reassembly_overwrites_voucher_number_with_identifier() {
    let doc = SaleDocument {
      voucher_number: "V9".into(),
      fields:         object(json!({ "VoucherNumber": "stale", "Amount": 5 })),
      item_details:   vec![],
      ledger_details: vec![],
    };
    let record = doc.into_record();
    assert_eq!(record[VOUCHER_NUMBER], json!("V9"));
    assert_eq!(record[ITEM_DETAILS], json!([]));
  }
}
