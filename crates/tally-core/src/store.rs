//! The `SalesStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! The HTTP layer (`tally-api`) depends on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::sale::SaleDocument;

/// Result of [`SalesStore::create_sale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
  /// The parent document and both child collections were written.
  Created,
  /// A sale with this voucher number already exists; nothing was written.
  AlreadyExists,
}

/// Abstraction over a document store holding sales.
///
/// Sales are write-once: there is no update or delete. Each sale is a parent
/// document keyed by its voucher number, with two child collections (item
/// details and ledger details) whose entries get store-assigned identifiers.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SalesStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create a sale if its voucher number is not taken yet.
  ///
  /// The existence check and all three writes (parent, item details, ledger
  /// details) happen atomically: either all of them are persisted or none.
  fn create_sale(
    &self,
    sale: SaleDocument,
  ) -> impl Future<Output = Result<CreateOutcome, Self::Error>> + Send + '_;

  /// Retrieve one sale, children attached. Returns `None` if not found.
  fn get_sale<'a>(
    &'a self,
    voucher_number: &'a str,
  ) -> impl Future<Output = Result<Option<SaleDocument>, Self::Error>> + Send + 'a;

  /// Retrieve every sale, children attached. Order is unspecified.
  fn list_sales(
    &self,
  ) -> impl Future<Output = Result<Vec<SaleDocument>, Self::Error>> + Send + '_;
}
