//! SQL schema for the aiflow SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS` and
/// `INSERT OR IGNORE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Per-prefix counters behind generated record names (e.g. SUP-00001).
CREATE TABLE IF NOT EXISTS naming_series (
    prefix   TEXT PRIMARY KEY,
    current  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS ai_configs (
    name       TEXT PRIMARY KEY,
    api_key    TEXT NOT NULL,
    interface  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ai_prompts (
    name         TEXT PRIMARY KEY,
    text         TEXT NOT NULL,
    output_mode  TEXT NOT NULL,
    json_schema  TEXT,              -- JSON or NULL
    for_doctype  TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS source_documents (
    name         TEXT PRIMARY KEY,
    fulltext     TEXT NOT NULL DEFAULT '',
    status       TEXT NOT NULL DEFAULT 'Pending',
    external_id  INTEGER
);

CREATE TABLE IF NOT EXISTS ai_queries (
    name              TEXT PRIMARY KEY,
    document_type     TEXT NOT NULL,
    source_doc        TEXT NOT NULL,
    ai                TEXT NOT NULL,
    prompt            TEXT NOT NULL,
    effective_prompt  TEXT NOT NULL,
    ai_response       TEXT NOT NULL,
    ai_response_json  TEXT NOT NULL,
    supplier          TEXT,
    document          TEXT,
    created_at        TEXT NOT NULL   -- RFC 3339 UTC
);

CREATE TABLE IF NOT EXISTS suppliers (
    name             TEXT PRIMARY KEY,
    supplier_name    TEXT NOT NULL,
    tax_id           TEXT,
    supplier_group   TEXT NOT NULL DEFAULT '',
    supplier_type    TEXT NOT NULL DEFAULT 'Company',
    primary_address  TEXT,
    primary_contact  TEXT
);

CREATE TABLE IF NOT EXISTS countries (
    name  TEXT PRIMARY KEY,
    code  TEXT NOT NULL             -- lowercase ISO 3166-1 alpha-2
);

-- Links, phones and emails are small child lists; stored as JSON arrays.
CREATE TABLE IF NOT EXISTS addresses (
    name     TEXT PRIMARY KEY,
    title    TEXT NOT NULL,
    line1    TEXT NOT NULL,
    city     TEXT NOT NULL,
    pincode  TEXT NOT NULL,
    country  TEXT,
    links    TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS contacts (
    name          TEXT PRIMARY KEY,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL DEFAULT '',
    company_name  TEXT,
    address       TEXT,
    phones        TEXT NOT NULL DEFAULT '[]',
    emails        TEXT NOT NULL DEFAULT '[]',
    links         TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS items (
    name           TEXT PRIMARY KEY,
    item_name      TEXT NOT NULL,
    description    TEXT NOT NULL DEFAULT '',
    item_group     TEXT NOT NULL,
    stock_uom      TEXT NOT NULL,
    is_stock_item  INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS item_suppliers (
    item      TEXT NOT NULL REFERENCES items(name),
    idx       INTEGER NOT NULL,
    supplier  TEXT NOT NULL,
    part_no   TEXT NOT NULL,
    PRIMARY KEY (item, idx)
);

CREATE TABLE IF NOT EXISTS tax_templates (
    name        TEXT PRIMARY KEY,
    is_default  INTEGER NOT NULL DEFAULT 0,
    rows        TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS purchase_invoices (
    name                    TEXT PRIMARY KEY,
    supplier                TEXT NOT NULL REFERENCES suppliers(name),
    posting_date            TEXT NOT NULL,   -- YYYY-MM-DD
    due_date                TEXT NOT NULL,
    bill_no                 TEXT NOT NULL,
    bill_date               TEXT NOT NULL,
    docstatus               INTEGER NOT NULL DEFAULT 0,  -- 0 draft, 1 submitted, 2 cancelled
    taxes_and_charges       TEXT,
    taxes                   TEXT NOT NULL DEFAULT '[]',
    payment_terms_template  TEXT,
    net_total               REAL NOT NULL,
    total_taxes             REAL NOT NULL,
    grand_total             REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS purchase_invoice_items (
    parent               TEXT NOT NULL REFERENCES purchase_invoices(name),
    idx                  INTEGER NOT NULL,
    item_code            TEXT NOT NULL REFERENCES items(name),
    item_name            TEXT NOT NULL,
    qty                  REAL NOT NULL,
    uom                  TEXT NOT NULL,
    price_list_rate      REAL NOT NULL,
    discount_percentage  REAL NOT NULL,
    discount_amount      REAL NOT NULL,
    rate                 REAL NOT NULL,
    amount               REAL NOT NULL,
    base_rate            REAL NOT NULL,
    base_amount          REAL NOT NULL,
    PRIMARY KEY (parent, idx)
);

CREATE TABLE IF NOT EXISTS payment_schedules (
    parent           TEXT NOT NULL REFERENCES purchase_invoices(name),
    idx              INTEGER NOT NULL,
    payment_term     TEXT NOT NULL,
    due_date         TEXT NOT NULL,
    invoice_portion  REAL NOT NULL,
    payment_amount   REAL NOT NULL,
    PRIMARY KEY (parent, idx)
);

CREATE TABLE IF NOT EXISTS files (
    name                 TEXT PRIMARY KEY,
    file_url             TEXT NOT NULL,
    file_name            TEXT NOT NULL,
    is_private           INTEGER NOT NULL DEFAULT 1,
    attached_to_doctype  TEXT NOT NULL,
    attached_to_name     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS suppliers_tax_idx      ON suppliers(tax_id);
CREATE INDEX IF NOT EXISTS suppliers_name_idx     ON suppliers(supplier_name);
CREATE INDEX IF NOT EXISTS addresses_key_idx      ON addresses(line1, city, pincode);
CREATE INDEX IF NOT EXISTS contacts_name_idx      ON contacts(first_name, last_name);
CREATE INDEX IF NOT EXISTS item_suppliers_idx     ON item_suppliers(supplier, part_no);
CREATE INDEX IF NOT EXISTS invoices_bill_idx      ON purchase_invoices(supplier, bill_no);
CREATE INDEX IF NOT EXISTS queries_document_idx   ON ai_queries(document);
CREATE INDEX IF NOT EXISTS files_attached_idx     ON files(attached_to_doctype, attached_to_name);

INSERT OR IGNORE INTO countries (name, code) VALUES
    ('Austria', 'at'),
    ('Belgium', 'be'),
    ('Czech Republic', 'cz'),
    ('Denmark', 'dk'),
    ('France', 'fr'),
    ('Germany', 'de'),
    ('Italy', 'it'),
    ('Luxembourg', 'lu'),
    ('Netherlands', 'nl'),
    ('Poland', 'pl'),
    ('Spain', 'es'),
    ('Sweden', 'se'),
    ('Switzerland', 'ch'),
    ('United Kingdom', 'gb'),
    ('United States', 'us');

PRAGMA user_version = 1;
";
