//! [`SqliteStore`]: the SQLite implementation of [`ErpStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use aiflow_core::{
  invoice::{
    DocStatus, FileAttachment, Item, NewFileAttachment, NewItem, NewPurchaseInvoice,
    PurchaseInvoice, TaxTemplate,
  },
  party::{Address, AddressKey, Contact, NewAddress, NewContact, NewSupplier, Supplier},
  record::{AiConfig, AiPrompt, AiQuery, DocumentStatus, NewAiQuery, SourceDocument},
  store::ErpStore,
};

use crate::{
  encode::{
    ADDRESS_COLUMNS, CONTACT_COLUMNS, INVOICE_COLUMNS, QUERY_COLUMNS, RawAddress,
    RawAiConfig, RawContact, RawInvoice, RawItem, RawPrompt, RawQuery, RawScheduleEntry,
    RawSourceDocument, RawSupplier, RawTaxTemplate, SUPPLIER_COLUMNS, encode_date,
    encode_dt, encode_json, invoice_item_from_row, series_name,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Naming series ───────────────────────────────────────────────────────────

const QUERY_SERIES: &str = "AIQ";
const SUPPLIER_SERIES: &str = "SUP";
const ADDRESS_SERIES: &str = "ADDR";
const CONTACT_SERIES: &str = "CONT";
const ITEM_SERIES: &str = "ITEM";
const INVOICE_SERIES: &str = "PINV";
const FILE_SERIES: &str = "FILE";

/// Advance the counter for `prefix` and return the next record name.
fn next_name(conn: &rusqlite::Connection, prefix: &str) -> rusqlite::Result<String> {
  let n: i64 = conn.query_row(
    "INSERT INTO naming_series (prefix, current) VALUES (?1, 1)
     ON CONFLICT(prefix) DO UPDATE SET current = current + 1
     RETURNING current",
    rusqlite::params![prefix],
    |r| r.get(0),
  )?;
  Ok(series_name(prefix, n))
}

fn load_item(conn: &rusqlite::Connection, name: &str) -> rusqlite::Result<Option<RawItem>> {
  let head = conn
    .query_row(
      "SELECT name, item_name, description, item_group, stock_uom, is_stock_item
       FROM items WHERE name = ?1",
      rusqlite::params![name],
      |row| {
        Ok(RawItem {
          name:           row.get(0)?,
          item_name:      row.get(1)?,
          description:    row.get(2)?,
          item_group:     row.get(3)?,
          stock_uom:      row.get(4)?,
          is_stock_item:  row.get(5)?,
          supplier_items: Vec::new(),
        })
      },
    )
    .optional()?;

  let Some(mut item) = head else { return Ok(None) };

  let mut stmt = conn.prepare(
    "SELECT supplier, part_no FROM item_suppliers WHERE item = ?1 ORDER BY idx",
  )?;
  item.supplier_items = stmt
    .query_map(rusqlite::params![name], |r| Ok((r.get(0)?, r.get(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(Some(item))
}

fn load_invoice(
  conn: &rusqlite::Connection,
  name: &str,
) -> rusqlite::Result<Option<RawInvoice>> {
  let head = conn
    .query_row(
      &format!("SELECT {INVOICE_COLUMNS} FROM purchase_invoices WHERE name = ?1"),
      rusqlite::params![name],
      RawInvoice::from_row,
    )
    .optional()?;

  let Some(mut invoice) = head else { return Ok(None) };

  let mut stmt = conn.prepare(
    "SELECT item_code, item_name, qty, uom, price_list_rate, discount_percentage,
            discount_amount, rate, amount, base_rate, base_amount
     FROM purchase_invoice_items WHERE parent = ?1 ORDER BY idx",
  )?;
  invoice.items = stmt
    .query_map(rusqlite::params![name], invoice_item_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(
    "SELECT payment_term, due_date, invoice_portion, payment_amount
     FROM payment_schedules WHERE parent = ?1 ORDER BY idx",
  )?;
  invoice.schedule = stmt
    .query_map(rusqlite::params![name], |r| {
      Ok(RawScheduleEntry {
        payment_term:    r.get(0)?,
        due_date:        r.get(1)?,
        invoice_portion: r.get(2)?,
        payment_amount:  r.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(invoice))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An aiflow record store backed by a single SQLite file.
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

  /// Open an in-memory store, for tests.
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
    tracing::debug!("schema initialised");
    Ok(())
  }

  /// Run a single-row `UPDATE`; `Ok(false)` when no row matched.
  async fn update_one(
    &self,
    sql: &'static str,
    params: Vec<Option<String>>,
  ) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(sql, rusqlite::params_from_iter(params.iter()))?)
      })
      .await?;
    Ok(changed > 0)
  }
}

// ─── ErpStore impl ───────────────────────────────────────────────────────────

impl ErpStore for SqliteStore {
  type Error = Error;

  // ── AI configs, prompts, source documents ─────────────────────────────────

  async fn upsert_ai(&self, ai: AiConfig) -> Result<()> {
    let interface = ai.interface.as_str().to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO ai_configs (name, api_key, interface) VALUES (?1, ?2, ?3)
           ON CONFLICT(name) DO UPDATE SET
             api_key = excluded.api_key, interface = excluded.interface",
          rusqlite::params![ai.name, ai.api_key, interface],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_ai(&self, name: &str) -> Result<Option<AiConfig>> {
    let name = name.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT name, api_key, interface FROM ai_configs WHERE name = ?1",
            rusqlite::params![name],
            RawAiConfig::from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(raw.map(RawAiConfig::into_config))
  }

  async fn upsert_prompt(&self, prompt: AiPrompt) -> Result<()> {
    let schema = prompt.json_schema.as_ref().map(encode_json).transpose()?;
    let mode = prompt.output_mode.as_str();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO ai_prompts (name, text, output_mode, json_schema, for_doctype)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(name) DO UPDATE SET
             text = excluded.text, output_mode = excluded.output_mode,
             json_schema = excluded.json_schema, for_doctype = excluded.for_doctype",
          rusqlite::params![prompt.name, prompt.text, mode, schema, prompt.for_doctype],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_prompt(&self, name: &str) -> Result<Option<AiPrompt>> {
    let name = name.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT name, text, output_mode, json_schema, for_doctype
             FROM ai_prompts WHERE name = ?1",
            rusqlite::params![name],
            RawPrompt::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawPrompt::into_prompt).transpose()
  }

  async fn upsert_source_document(&self, doc: SourceDocument) -> Result<()> {
    let status = doc.status.as_str();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO source_documents (name, fulltext, status, external_id)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(name) DO UPDATE SET
             fulltext = excluded.fulltext, status = excluded.status,
             external_id = excluded.external_id",
          rusqlite::params![doc.name, doc.fulltext, status, doc.external_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_source_document(&self, name: &str) -> Result<Option<SourceDocument>> {
    let name = name.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT name, fulltext, status, external_id
             FROM source_documents WHERE name = ?1",
            rusqlite::params![name],
            RawSourceDocument::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawSourceDocument::into_document).transpose()
  }

  async fn set_source_document_status(
    &self,
    name:   &str,
    status: DocumentStatus,
  ) -> Result<bool> {
    self
      .update_one(
        "UPDATE source_documents SET status = ?1 WHERE name = ?2",
        vec![Some(status.as_str().to_owned()), Some(name.to_owned())],
      )
      .await
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  async fn insert_query(&self, q: NewAiQuery) -> Result<AiQuery> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let row = q.clone();

    let name = self
      .conn
      .call(move |conn| {
        let name = next_name(conn, QUERY_SERIES)?;
        conn.execute(
          &format!(
            "INSERT INTO ai_queries ({QUERY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, NULL, ?9)"
          ),
          rusqlite::params![
            name,
            row.document_type,
            row.source_doc,
            row.ai,
            row.prompt,
            row.effective_prompt,
            row.ai_response,
            row.ai_response_json,
            at_str,
          ],
        )?;
        Ok(name)
      })
      .await?;

    Ok(AiQuery {
      name,
      document_type: q.document_type,
      source_doc: q.source_doc,
      ai: q.ai,
      prompt: q.prompt,
      effective_prompt: q.effective_prompt,
      ai_response: q.ai_response,
      ai_response_json: q.ai_response_json,
      supplier: None,
      document: None,
      created_at,
    })
  }

  async fn get_query(&self, name: &str) -> Result<Option<AiQuery>> {
    let name = name.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {QUERY_COLUMNS} FROM ai_queries WHERE name = ?1"),
            rusqlite::params![name],
            RawQuery::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawQuery::into_query).transpose()
  }

  async fn link_query_supplier(&self, name: &str, supplier: &str) -> Result<bool> {
    self
      .update_one(
        "UPDATE ai_queries SET supplier = ?1 WHERE name = ?2",
        vec![Some(supplier.to_owned()), Some(name.to_owned())],
      )
      .await
  }

  async fn link_query_document(&self, name: &str, document: &str) -> Result<bool> {
    self
      .update_one(
        "UPDATE ai_queries SET document = ?1 WHERE name = ?2",
        vec![Some(document.to_owned()), Some(name.to_owned())],
      )
      .await
  }

  async fn find_query_by_document(&self, document: &str) -> Result<Option<AiQuery>> {
    let document = document.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {QUERY_COLUMNS} FROM ai_queries WHERE document = ?1
               ORDER BY created_at DESC LIMIT 1"
            ),
            rusqlite::params![document],
            RawQuery::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawQuery::into_query).transpose()
  }

  // ── Suppliers ─────────────────────────────────────────────────────────────

  async fn get_supplier(&self, name: &str) -> Result<Option<Supplier>> {
    let name = name.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE name = ?1"),
            rusqlite::params![name],
            RawSupplier::from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(raw.map(RawSupplier::into_supplier))
  }

  async fn find_supplier_by_tax_id(&self, tax_id: &str) -> Result<Option<Supplier>> {
    let tax_id = tax_id.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE tax_id = ?1
               ORDER BY name LIMIT 1"
            ),
            rusqlite::params![tax_id],
            RawSupplier::from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(raw.map(RawSupplier::into_supplier))
  }

  async fn find_supplier_by_name(&self, supplier_name: &str) -> Result<Option<Supplier>> {
    let supplier_name = supplier_name.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE supplier_name = ?1
               ORDER BY name LIMIT 1"
            ),
            rusqlite::params![supplier_name],
            RawSupplier::from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(raw.map(RawSupplier::into_supplier))
  }

  async fn insert_supplier(&self, s: NewSupplier) -> Result<Supplier> {
    let row = s.clone();
    let name = self
      .conn
      .call(move |conn| {
        let name = next_name(conn, SUPPLIER_SERIES)?;
        conn.execute(
          "INSERT INTO suppliers (name, supplier_name, tax_id, supplier_group, supplier_type)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            name,
            row.supplier_name,
            row.tax_id,
            row.supplier_group,
            row.supplier_type.as_str(),
          ],
        )?;
        Ok(name)
      })
      .await?;

    Ok(Supplier {
      name,
      supplier_name: s.supplier_name,
      tax_id: s.tax_id,
      supplier_group: s.supplier_group,
      supplier_type: s.supplier_type,
      primary_address: None,
      primary_contact: None,
    })
  }

  async fn update_supplier(&self, supplier: &Supplier) -> Result<()> {
    let s = supplier.clone();
    let found = self
      .update_one(
        "UPDATE suppliers SET
           supplier_name = ?1, tax_id = ?2, supplier_group = ?3, supplier_type = ?4,
           primary_address = ?5, primary_contact = ?6
         WHERE name = ?7",
        vec![
          Some(s.supplier_name),
          s.tax_id,
          Some(s.supplier_group),
          Some(s.supplier_type.as_str().to_owned()),
          s.primary_address,
          s.primary_contact,
          Some(s.name.clone()),
        ],
      )
      .await?;
    if !found {
      return Err(Error::NotFound { doctype: "Supplier", name: s.name });
    }
    Ok(())
  }

  // ── Addresses & contacts ──────────────────────────────────────────────────

  async fn country_by_code(&self, code: &str) -> Result<Option<String>> {
    let code = code.trim().to_lowercase();
    Ok(self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT name FROM countries WHERE code = ?1",
            rusqlite::params![code],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?)
  }

  async fn find_address(&self, key: &AddressKey) -> Result<Option<Address>> {
    let key = key.clone();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {ADDRESS_COLUMNS} FROM addresses
               WHERE line1 = ?1 AND city = ?2 AND pincode = ?3 AND country IS ?4
               ORDER BY name LIMIT 1"
            ),
            rusqlite::params![key.line1, key.city, key.pincode, key.country],
            RawAddress::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawAddress::into_address).transpose()
  }

  async fn insert_address(&self, a: NewAddress) -> Result<Address> {
    let links = encode_json(&a.links)?;
    let row = a.clone();
    let name = self
      .conn
      .call(move |conn| {
        let name = next_name(conn, ADDRESS_SERIES)?;
        conn.execute(
          &format!(
            "INSERT INTO addresses ({ADDRESS_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
          ),
          rusqlite::params![
            name,
            row.title,
            row.key.line1,
            row.key.city,
            row.key.pincode,
            row.key.country,
            links,
          ],
        )?;
        Ok(name)
      })
      .await?;

    Ok(Address {
      name,
      title: a.title,
      line1: a.key.line1,
      city: a.key.city,
      pincode: a.key.pincode,
      country: a.key.country,
      links: a.links,
    })
  }

  async fn update_address(&self, address: &Address) -> Result<()> {
    let a = address.clone();
    let found = self
      .update_one(
        "UPDATE addresses SET
           title = ?1, line1 = ?2, city = ?3, pincode = ?4, country = ?5, links = ?6
         WHERE name = ?7",
        vec![
          Some(a.title),
          Some(a.line1),
          Some(a.city),
          Some(a.pincode),
          a.country,
          Some(encode_json(&a.links)?),
          Some(a.name.clone()),
        ],
      )
      .await?;
    if !found {
      return Err(Error::NotFound { doctype: "Address", name: a.name });
    }
    Ok(())
  }

  async fn find_contact(&self, first_name: &str, last_name: &str) -> Result<Option<Contact>> {
    let first = first_name.to_owned();
    let last = last_name.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {CONTACT_COLUMNS} FROM contacts
               WHERE first_name = ?1 AND last_name = ?2
               ORDER BY name LIMIT 1"
            ),
            rusqlite::params![first, last],
            RawContact::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawContact::into_contact).transpose()
  }

  async fn insert_contact(&self, c: NewContact) -> Result<Contact> {
    let phones = encode_json(&c.phones)?;
    let emails = encode_json(&c.emails)?;
    let links = encode_json(&c.links)?;
    let row = c.clone();
    let name = self
      .conn
      .call(move |conn| {
        let name = next_name(conn, CONTACT_SERIES)?;
        conn.execute(
          &format!(
            "INSERT INTO contacts ({CONTACT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
          ),
          rusqlite::params![
            name,
            row.first_name,
            row.last_name,
            row.company_name,
            row.address,
            phones,
            emails,
            links,
          ],
        )?;
        Ok(name)
      })
      .await?;

    Ok(Contact {
      name,
      first_name: c.first_name,
      last_name: c.last_name,
      company_name: c.company_name,
      address: c.address,
      phones: c.phones,
      emails: c.emails,
      links: c.links,
    })
  }

  async fn update_contact(&self, contact: &Contact) -> Result<()> {
    let c = contact.clone();
    let found = self
      .update_one(
        "UPDATE contacts SET
           first_name = ?1, last_name = ?2, company_name = ?3, address = ?4,
           phones = ?5, emails = ?6, links = ?7
         WHERE name = ?8",
        vec![
          Some(c.first_name),
          Some(c.last_name),
          c.company_name,
          c.address,
          Some(encode_json(&c.phones)?),
          Some(encode_json(&c.emails)?),
          Some(encode_json(&c.links)?),
          Some(c.name.clone()),
        ],
      )
      .await?;
    if !found {
      return Err(Error::NotFound { doctype: "Contact", name: c.name });
    }
    Ok(())
  }

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn find_item_by_supplier_part(
    &self,
    supplier: &str,
    part_no:  &str,
  ) -> Result<Option<Item>> {
    let supplier = supplier.to_owned();
    let part_no = part_no.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        let parent: Option<String> = conn
          .query_row(
            "SELECT item FROM item_suppliers WHERE supplier = ?1 AND part_no = ?2
             ORDER BY item LIMIT 1",
            rusqlite::params![supplier, part_no],
            |r| r.get(0),
          )
          .optional()?;
        match parent {
          Some(name) => Ok(load_item(conn, &name)?),
          None => Ok(None),
        }
      })
      .await?;
    Ok(raw.map(RawItem::into_item))
  }

  async fn insert_item(&self, item: NewItem) -> Result<Item> {
    let row = item.clone();
    let name = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let name = next_name(&tx, ITEM_SERIES)?;
        tx.execute(
          "INSERT INTO items (name, item_name, description, item_group, stock_uom, is_stock_item)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            name,
            row.item_name,
            row.description,
            row.item_group,
            row.stock_uom,
            row.is_stock_item,
          ],
        )?;
        for (idx, si) in row.supplier_items.iter().enumerate() {
          tx.execute(
            "INSERT INTO item_suppliers (item, idx, supplier, part_no) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![name, idx as i64, si.supplier, si.part_no],
          )?;
        }
        tx.commit()?;
        Ok(name)
      })
      .await?;

    Ok(Item {
      name,
      item_name: item.item_name,
      description: item.description,
      item_group: item.item_group,
      stock_uom: item.stock_uom,
      is_stock_item: item.is_stock_item,
      supplier_items: item.supplier_items,
    })
  }

  // ── Taxes ─────────────────────────────────────────────────────────────────

  async fn upsert_tax_template(&self, template: TaxTemplate) -> Result<()> {
    let rows = encode_json(&template.rows)?;
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if template.is_default {
          tx.execute(
            "UPDATE tax_templates SET is_default = 0 WHERE name != ?1",
            rusqlite::params![template.name],
          )?;
        }
        tx.execute(
          "INSERT INTO tax_templates (name, is_default, rows) VALUES (?1, ?2, ?3)
           ON CONFLICT(name) DO UPDATE SET
             is_default = excluded.is_default, rows = excluded.rows",
          rusqlite::params![template.name, template.is_default, rows],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_tax_template(&self, name: &str) -> Result<Option<TaxTemplate>> {
    let name = name.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT name, is_default, rows FROM tax_templates WHERE name = ?1",
            rusqlite::params![name],
            RawTaxTemplate::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawTaxTemplate::into_template).transpose()
  }

  async fn default_tax_template(&self) -> Result<Option<TaxTemplate>> {
    let raw = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row(
            "SELECT name, is_default, rows FROM tax_templates
             WHERE is_default = 1 ORDER BY name LIMIT 1",
            [],
            RawTaxTemplate::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawTaxTemplate::into_template).transpose()
  }

  // ── Purchase invoices ─────────────────────────────────────────────────────

  async fn purchase_invoice_exists(&self, supplier: &str, bill_no: &str) -> Result<bool> {
    let supplier = supplier.to_owned();
    let bill_no = bill_no.to_owned();
    let cancelled = DocStatus::Cancelled.as_i64();
    Ok(self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM purchase_invoices
             WHERE supplier = ?1 AND bill_no = ?2 AND docstatus != ?3 LIMIT 1",
            rusqlite::params![supplier, bill_no, cancelled],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?)
  }

  async fn insert_purchase_invoice(&self, inv: NewPurchaseInvoice) -> Result<PurchaseInvoice> {
    let taxes = encode_json(&inv.taxes)?;
    let posting = encode_date(inv.posting_date);
    let due = encode_date(inv.due_date);
    let bill_date = encode_date(inv.bill_date);
    let draft = DocStatus::Draft.as_i64();
    let row = inv.clone();

    let name = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let name = next_name(&tx, INVOICE_SERIES)?;
        tx.execute(
          &format!(
            "INSERT INTO purchase_invoices ({INVOICE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
          ),
          rusqlite::params![
            name,
            row.supplier,
            posting,
            due,
            row.bill_no,
            bill_date,
            draft,
            row.taxes_and_charges,
            taxes,
            row.payment_terms_template,
            row.net_total,
            row.total_taxes,
            row.grand_total,
          ],
        )?;

        for (idx, it) in row.items.iter().enumerate() {
          tx.execute(
            "INSERT INTO purchase_invoice_items (
               parent, idx, item_code, item_name, qty, uom, price_list_rate,
               discount_percentage, discount_amount, rate, amount, base_rate, base_amount
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            rusqlite::params![
              name,
              idx as i64,
              it.item_code,
              it.item_name,
              it.qty,
              it.uom,
              it.price_list_rate,
              it.discount_percentage,
              it.discount_amount,
              it.rate,
              it.amount,
              it.base_rate,
              it.base_amount,
            ],
          )?;
        }

        for (idx, e) in row.payment_schedule.iter().enumerate() {
          tx.execute(
            "INSERT INTO payment_schedules (
               parent, idx, payment_term, due_date, invoice_portion, payment_amount
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
              name,
              idx as i64,
              e.payment_term,
              encode_date(e.due_date),
              e.invoice_portion,
              e.payment_amount,
            ],
          )?;
        }

        tx.commit()?;
        Ok(name)
      })
      .await?;

    Ok(PurchaseInvoice {
      name,
      supplier: inv.supplier,
      posting_date: inv.posting_date,
      due_date: inv.due_date,
      bill_no: inv.bill_no,
      bill_date: inv.bill_date,
      docstatus: DocStatus::Draft,
      items: inv.items,
      taxes_and_charges: inv.taxes_and_charges,
      taxes: inv.taxes,
      payment_terms_template: inv.payment_terms_template,
      payment_schedule: inv.payment_schedule,
      net_total: inv.net_total,
      total_taxes: inv.total_taxes,
      grand_total: inv.grand_total,
    })
  }

  async fn get_purchase_invoice(&self, name: &str) -> Result<Option<PurchaseInvoice>> {
    let name = name.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(load_invoice(conn, &name)?))
      .await?;
    raw.map(RawInvoice::into_invoice).transpose()
  }

  async fn set_purchase_invoice_docstatus(
    &self,
    name: &str,
    from: DocStatus,
    to:   DocStatus,
  ) -> Result<bool> {
    let name = name.to_owned();
    let (from, to) = (from.as_i64(), to.as_i64());
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE purchase_invoices SET docstatus = ?1 WHERE name = ?2 AND docstatus = ?3",
          rusqlite::params![to, name, from],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── File attachments ──────────────────────────────────────────────────────

  async fn attachment_exists(&self, file_url: &str, doctype: &str, name: &str) -> Result<bool> {
    let file_url = file_url.to_owned();
    let doctype = doctype.to_owned();
    let name = name.to_owned();
    Ok(self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM files
             WHERE file_url = ?1 AND attached_to_doctype = ?2 AND attached_to_name = ?3
             LIMIT 1",
            rusqlite::params![file_url, doctype, name],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?)
  }

  async fn insert_attachment(&self, f: NewFileAttachment) -> Result<FileAttachment> {
    let row = f.clone();
    let name = self
      .conn
      .call(move |conn| {
        let name = next_name(conn, FILE_SERIES)?;
        conn.execute(
          "INSERT INTO files (
             name, file_url, file_name, is_private, attached_to_doctype, attached_to_name
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            name,
            row.file_url,
            row.file_name,
            row.is_private,
            row.attached_to_doctype,
            row.attached_to_name,
          ],
        )?;
        Ok(name)
      })
      .await?;

    Ok(FileAttachment {
      name,
      file_url: f.file_url,
      file_name: f.file_name,
      is_private: f.is_private,
      attached_to_doctype: f.attached_to_doctype,
      attached_to_name: f.attached_to_name,
    })
  }
}
