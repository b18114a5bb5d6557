//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`. Child lists (links, phones, tax rows) are stored as compact
//! JSON. Rows are read into `Raw*` structs inside the connection thread and
//! decoded into domain types outside it.

use aiflow_core::{
  invoice::{
    DocStatus, InvoiceItem, Item, PaymentScheduleEntry, PurchaseInvoice, SupplierItem,
    TaxTemplate,
  },
  party::{Address, Contact, Supplier, SupplierType},
  record::{AiConfig, AiPrompt, AiQuery, DocumentStatus, OutputMode, SourceDocument},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_json<T: Serialize>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

/// Build `PREFIX-00042` from a naming-series counter value.
pub fn series_name(prefix: &str, n: i64) -> String { format!("{prefix}-{n:05}") }

// ─── AI records ──────────────────────────────────────────────────────────────

pub struct RawAiConfig {
  pub name:      String,
  pub api_key:   String,
  pub interface: String,
}

impl RawAiConfig {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { name: row.get(0)?, api_key: row.get(1)?, interface: row.get(2)? })
  }

  pub fn into_config(self) -> AiConfig {
    AiConfig {
      name:      self.name,
      api_key:   self.api_key,
      interface: self.interface.into(),
    }
  }
}

pub struct RawPrompt {
  pub name:        String,
  pub text:        String,
  pub output_mode: String,
  pub json_schema: Option<String>,
  pub for_doctype: String,
}

impl RawPrompt {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:        row.get(0)?,
      text:        row.get(1)?,
      output_mode: row.get(2)?,
      json_schema: row.get(3)?,
      for_doctype: row.get(4)?,
    })
  }

  pub fn into_prompt(self) -> Result<AiPrompt> {
    Ok(AiPrompt {
      name:        self.name,
      text:        self.text,
      output_mode: OutputMode::parse(&self.output_mode),
      json_schema: self.json_schema.as_deref().map(decode_json).transpose()?,
      for_doctype: self.for_doctype,
    })
  }
}

pub struct RawSourceDocument {
  pub name:        String,
  pub fulltext:    String,
  pub status:      String,
  pub external_id: Option<i64>,
}

impl RawSourceDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:        row.get(0)?,
      fulltext:    row.get(1)?,
      status:      row.get(2)?,
      external_id: row.get(3)?,
    })
  }

  pub fn into_document(self) -> Result<SourceDocument> {
    Ok(SourceDocument {
      name:        self.name,
      fulltext:    self.fulltext,
      status:      DocumentStatus::parse(&self.status)?,
      external_id: self.external_id,
    })
  }
}

pub const QUERY_COLUMNS: &str = "name, document_type, source_doc, ai, prompt, \
  effective_prompt, ai_response, ai_response_json, supplier, document, created_at";

pub struct RawQuery {
  pub name:             String,
  pub document_type:    String,
  pub source_doc:       String,
  pub ai:               String,
  pub prompt:           String,
  pub effective_prompt: String,
  pub ai_response:      String,
  pub ai_response_json: String,
  pub supplier:         Option<String>,
  pub document:         Option<String>,
  pub created_at:       String,
}

impl RawQuery {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:             row.get(0)?,
      document_type:    row.get(1)?,
      source_doc:       row.get(2)?,
      ai:               row.get(3)?,
      prompt:           row.get(4)?,
      effective_prompt: row.get(5)?,
      ai_response:      row.get(6)?,
      ai_response_json: row.get(7)?,
      supplier:         row.get(8)?,
      document:         row.get(9)?,
      created_at:       row.get(10)?,
    })
  }

  pub fn into_query(self) -> Result<AiQuery> {
    Ok(AiQuery {
      name:             self.name,
      document_type:    self.document_type,
      source_doc:       self.source_doc,
      ai:               self.ai,
      prompt:           self.prompt,
      effective_prompt: self.effective_prompt,
      ai_response:      self.ai_response,
      ai_response_json: self.ai_response_json,
      supplier:         self.supplier,
      document:         self.document,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

// ─── Parties ─────────────────────────────────────────────────────────────────

pub const SUPPLIER_COLUMNS: &str = "name, supplier_name, tax_id, supplier_group, \
  supplier_type, primary_address, primary_contact";

pub struct RawSupplier {
  pub name:            String,
  pub supplier_name:   String,
  pub tax_id:          Option<String>,
  pub supplier_group:  String,
  pub supplier_type:   String,
  pub primary_address: Option<String>,
  pub primary_contact: Option<String>,
}

impl RawSupplier {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:            row.get(0)?,
      supplier_name:   row.get(1)?,
      tax_id:          row.get(2)?,
      supplier_group:  row.get(3)?,
      supplier_type:   row.get(4)?,
      primary_address: row.get(5)?,
      primary_contact: row.get(6)?,
    })
  }

  pub fn into_supplier(self) -> Supplier {
    Supplier {
      name:            self.name,
      supplier_name:   self.supplier_name,
      tax_id:          self.tax_id,
      supplier_group:  self.supplier_group,
      supplier_type:   SupplierType::parse(&self.supplier_type),
      primary_address: self.primary_address,
      primary_contact: self.primary_contact,
    }
  }
}

pub const ADDRESS_COLUMNS: &str = "name, title, line1, city, pincode, country, links";

pub struct RawAddress {
  pub name:    String,
  pub title:   String,
  pub line1:   String,
  pub city:    String,
  pub pincode: String,
  pub country: Option<String>,
  pub links:   String,
}

impl RawAddress {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:    row.get(0)?,
      title:   row.get(1)?,
      line1:   row.get(2)?,
      city:    row.get(3)?,
      pincode: row.get(4)?,
      country: row.get(5)?,
      links:   row.get(6)?,
    })
  }

  pub fn into_address(self) -> Result<Address> {
    Ok(Address {
      name:    self.name,
      title:   self.title,
      line1:   self.line1,
      city:    self.city,
      pincode: self.pincode,
      country: self.country,
      links:   decode_json(&self.links)?,
    })
  }
}

pub const CONTACT_COLUMNS: &str =
  "name, first_name, last_name, company_name, address, phones, emails, links";

pub struct RawContact {
  pub name:         String,
  pub first_name:   String,
  pub last_name:    String,
  pub company_name: Option<String>,
  pub address:      Option<String>,
  pub phones:       String,
  pub emails:       String,
  pub links:        String,
}

impl RawContact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:         row.get(0)?,
      first_name:   row.get(1)?,
      last_name:    row.get(2)?,
      company_name: row.get(3)?,
      address:      row.get(4)?,
      phones:       row.get(5)?,
      emails:       row.get(6)?,
      links:        row.get(7)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      name:         self.name,
      first_name:   self.first_name,
      last_name:    self.last_name,
      company_name: self.company_name,
      address:      self.address,
      phones:       decode_json(&self.phones)?,
      emails:       decode_json(&self.emails)?,
      links:        decode_json(&self.links)?,
    })
  }
}

// ─── Items ───────────────────────────────────────────────────────────────────

pub struct RawItem {
  pub name:           String,
  pub item_name:      String,
  pub description:    String,
  pub item_group:     String,
  pub stock_uom:      String,
  pub is_stock_item:  bool,
  pub supplier_items: Vec<(String, String)>,
}

impl RawItem {
  pub fn into_item(self) -> Item {
    Item {
      name:           self.name,
      item_name:      self.item_name,
      description:    self.description,
      item_group:     self.item_group,
      stock_uom:      self.stock_uom,
      is_stock_item:  self.is_stock_item,
      supplier_items: self
        .supplier_items
        .into_iter()
        .map(|(supplier, part_no)| SupplierItem { supplier, part_no })
        .collect(),
    }
  }
}

// ─── Taxes ───────────────────────────────────────────────────────────────────

pub struct RawTaxTemplate {
  pub name:       String,
  pub is_default: bool,
  pub rows:       String,
}

impl RawTaxTemplate {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { name: row.get(0)?, is_default: row.get(1)?, rows: row.get(2)? })
  }

  pub fn into_template(self) -> Result<TaxTemplate> {
    Ok(TaxTemplate {
      name:       self.name,
      is_default: self.is_default,
      rows:       decode_json(&self.rows)?,
    })
  }
}

// ─── Purchase invoices ───────────────────────────────────────────────────────

pub const INVOICE_COLUMNS: &str = "name, supplier, posting_date, due_date, bill_no, \
  bill_date, docstatus, taxes_and_charges, taxes, payment_terms_template, \
  net_total, total_taxes, grand_total";

pub struct RawInvoice {
  pub name:                   String,
  pub supplier:               String,
  pub posting_date:           String,
  pub due_date:               String,
  pub bill_no:                String,
  pub bill_date:              String,
  pub docstatus:              i64,
  pub taxes_and_charges:      Option<String>,
  pub taxes:                  String,
  pub payment_terms_template: Option<String>,
  pub net_total:              f64,
  pub total_taxes:            f64,
  pub grand_total:            f64,
  pub items:                  Vec<InvoiceItem>,
  pub schedule:               Vec<RawScheduleEntry>,
}

pub struct RawScheduleEntry {
  pub payment_term:    String,
  pub due_date:        String,
  pub invoice_portion: f64,
  pub payment_amount:  f64,
}

impl RawInvoice {
  /// Reads the header columns; child rows are attached by the caller.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:                   row.get(0)?,
      supplier:               row.get(1)?,
      posting_date:           row.get(2)?,
      due_date:               row.get(3)?,
      bill_no:                row.get(4)?,
      bill_date:              row.get(5)?,
      docstatus:              row.get(6)?,
      taxes_and_charges:      row.get(7)?,
      taxes:                  row.get(8)?,
      payment_terms_template: row.get(9)?,
      net_total:              row.get(10)?,
      total_taxes:            row.get(11)?,
      grand_total:            row.get(12)?,
      items:                  Vec::new(),
      schedule:               Vec::new(),
    })
  }

  pub fn into_invoice(self) -> Result<PurchaseInvoice> {
    let payment_schedule = self
      .schedule
      .into_iter()
      .map(|e| {
        Ok(PaymentScheduleEntry {
          payment_term:    e.payment_term,
          due_date:        decode_date(&e.due_date)?,
          invoice_portion: e.invoice_portion,
          payment_amount:  e.payment_amount,
        })
      })
      .collect::<Result<_>>()?;

    Ok(PurchaseInvoice {
      name: self.name,
      supplier: self.supplier,
      posting_date: decode_date(&self.posting_date)?,
      due_date: decode_date(&self.due_date)?,
      bill_no: self.bill_no,
      bill_date: decode_date(&self.bill_date)?,
      docstatus: DocStatus::from_i64(self.docstatus)?,
      items: self.items,
      taxes_and_charges: self.taxes_and_charges,
      taxes: decode_json(&self.taxes)?,
      payment_terms_template: self.payment_terms_template,
      payment_schedule,
      net_total: self.net_total,
      total_taxes: self.total_taxes,
      grand_total: self.grand_total,
    })
  }
}

pub fn invoice_item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InvoiceItem> {
  Ok(InvoiceItem {
    item_code:           row.get(0)?,
    item_name:           row.get(1)?,
    qty:                 row.get(2)?,
    uom:                 row.get(3)?,
    price_list_rate:     row.get(4)?,
    discount_percentage: row.get(5)?,
    discount_amount:     row.get(6)?,
    rate:                row.get(7)?,
    amount:              row.get(8)?,
    base_rate:           row.get(9)?,
    base_amount:         row.get(10)?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn series_names_are_zero_padded() {
    assert_eq!(series_name("SUP", 7), "SUP-00007");
    assert_eq!(series_name("PINV", 123456), "PINV-123456");
  }

  #[test]
  fn dates_round_trip() {
    let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(encode_date(d), "2024-02-29");
    assert_eq!(decode_date("2024-02-29").unwrap(), d);
    assert!(decode_date("29.02.2024").is_err());
  }
}
