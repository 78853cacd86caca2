//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Parent documents. Write-once: no UPDATE or DELETE is ever issued.
CREATE TABLE IF NOT EXISTS sales (
    voucher_number TEXT PRIMARY KEY,
    document       TEXT NOT NULL,   -- JSON object: top-level record fields
    created_at     TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

-- Child collection: ItemDetails entries, stored verbatim.
CREATE TABLE IF NOT EXISTS item_details (
    item_id        TEXT PRIMARY KEY,   -- store-assigned UUID
    voucher_number TEXT NOT NULL REFERENCES sales(voucher_number),
    position       INTEGER NOT NULL,
    document       TEXT NOT NULL
);

-- Child collection: LedgerDetails entries, amounts normalised.
CREATE TABLE IF NOT EXISTS ledger_details (
    ledger_id      TEXT PRIMARY KEY,   -- store-assigned UUID
    voucher_number TEXT NOT NULL REFERENCES sales(voucher_number),
    position       INTEGER NOT NULL,
    document       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS item_details_sale_idx   ON item_details(voucher_number);
CREATE INDEX IF NOT EXISTS ledger_details_sale_idx ON ledger_details(voucher_number);

PRAGMA user_version = 1;
";
