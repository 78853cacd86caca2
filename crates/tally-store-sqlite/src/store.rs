//! [`SqliteStore`]: the SQLite implementation of [`SalesStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use tally_core::{
  sale::SaleDocument,
  store::{CreateOutcome, SalesStore},
};

use crate::{
  encode::{EncodedChild, EncodedSale, RawChild, RawSale, decode_fields, group_children},
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A sales store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Run raw SQL against the underlying connection.
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of rows in `table`.
  pub(crate) async fn count_rows(&self, table: &'static str) -> Result<i64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await?;
    Ok(n)
  }
}

// ─── SQL helpers (run on the connection thread) ──────────────────────────────

fn insert_children(
  tx:             &rusqlite::Transaction<'_>,
  sql:            &str,
  voucher_number: &str,
  children:       &[EncodedChild],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(sql)?;
  for (position, child) in children.iter().enumerate() {
    stmt.execute(rusqlite::params![
      child.id,
      voucher_number,
      position as i64,
      child.document,
    ])?;
  }
  Ok(())
}

fn select_children(
  conn:           &rusqlite::Connection,
  table:          &'static str,
  voucher_number: Option<&str>,
) -> rusqlite::Result<Vec<RawChild>> {
  let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<RawChild> {
    Ok(RawChild {
      voucher_number: row.get(0)?,
      document:       row.get(1)?,
    })
  };

  if let Some(v) = voucher_number {
    let mut stmt = conn.prepare(&format!(
      "SELECT voucher_number, document FROM {table}
       WHERE voucher_number = ?1 ORDER BY position"
    ))?;
    let rows = stmt
      .query_map(rusqlite::params![v], map_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
  } else {
    let mut stmt = conn.prepare(&format!(
      "SELECT voucher_number, document FROM {table}
       ORDER BY voucher_number, position"
    ))?;
    let rows = stmt
      .query_map([], map_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
  }
}

// ─── SalesStore impl ─────────────────────────────────────────────────────────

impl SalesStore for SqliteStore {
  type Error = crate::Error;

  async fn create_sale(&self, sale: SaleDocument) -> Result<CreateOutcome> {
    let encoded = EncodedSale::encode(&sale, Utc::now())?;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let inserted = tx.execute(
          "INSERT INTO sales (voucher_number, document, created_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (voucher_number) DO NOTHING",
          rusqlite::params![
            encoded.voucher_number,
            encoded.document,
            encoded.created_at,
          ],
        )?;
        if inserted == 0 {
          // Dropping `tx` rolls it back.
          return Ok(CreateOutcome::AlreadyExists);
        }

        insert_children(
          &tx,
          "INSERT INTO item_details (item_id, voucher_number, position, document)
           VALUES (?1, ?2, ?3, ?4)",
          &encoded.voucher_number,
          &encoded.items,
        )?;
        insert_children(
          &tx,
          "INSERT INTO ledger_details (ledger_id, voucher_number, position, document)
           VALUES (?1, ?2, ?3, ?4)",
          &encoded.voucher_number,
          &encoded.ledgers,
        )?;

        tx.commit()?;
        Ok(CreateOutcome::Created)
      })
      .await?;

    if outcome == CreateOutcome::Created {
      tracing::debug!(
        voucher_number = %sale.voucher_number,
        items = sale.item_details.len(),
        ledgers = sale.ledger_details.len(),
        "sale created"
      );
    }
    Ok(outcome)
  }

  async fn get_sale(&self, voucher_number: &str) -> Result<Option<SaleDocument>> {
    let v = voucher_number.to_owned();

    let raw: Option<(RawSale, Vec<RawChild>, Vec<RawChild>)> = self
      .conn
      .call(move |conn| {
        let sale = conn
          .query_row(
            "SELECT voucher_number, document FROM sales WHERE voucher_number = ?1",
            rusqlite::params![v],
            |row| {
              Ok(RawSale {
                voucher_number: row.get(0)?,
                document:       row.get(1)?,
              })
            },
          )
          .optional()?;

        let Some(sale) = sale else {
          return Ok(None);
        };
        let items = select_children(conn, "item_details", Some(v.as_str()))?;
        let ledgers = select_children(conn, "ledger_details", Some(v.as_str()))?;
        Ok(Some((sale, items, ledgers)))
      })
      .await?;

    let Some((sale, items, ledgers)) = raw else {
      return Ok(None);
    };
    let items = items
      .into_iter()
      .map(|c| decode_fields(&c.document))
      .collect::<Result<Vec<_>>>()?;
    let ledgers = ledgers
      .into_iter()
      .map(|c| decode_fields(&c.document))
      .collect::<Result<Vec<_>>>()?;

    sale.into_document(items, ledgers).map(Some)
  }

  async fn list_sales(&self) -> Result<Vec<SaleDocument>> {
    let (sales, items, ledgers): (Vec<RawSale>, Vec<RawChild>, Vec<RawChild>) = self
      .conn
      .call(|conn| {
        // One read transaction so the three collections are consistent.
        let tx = conn.transaction()?;
        let sales = {
          let mut stmt = tx.prepare(
            "SELECT voucher_number, document FROM sales
             ORDER BY created_at, voucher_number",
          )?;
          stmt
            .query_map([], |row| {
              Ok(RawSale {
                voucher_number: row.get(0)?,
                document:       row.get(1)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        let items = select_children(&tx, "item_details", None)?;
        let ledgers = select_children(&tx, "ledger_details", None)?;
        tx.commit()?;
        Ok((sales, items, ledgers))
      })
      .await?;

    let mut items = group_children(items)?;
    let mut ledgers = group_children(ledgers)?;

    sales
      .into_iter()
      .map(|raw| {
        let sale_items = items.remove(&raw.voucher_number).unwrap_or_default();
        let sale_ledgers = ledgers.remove(&raw.voucher_number).unwrap_or_default();
        raw.into_document(sale_items, sale_ledgers)
      })
      .collect()
  }
}
