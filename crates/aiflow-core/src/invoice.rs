//! Items, purchase invoices, tax templates and file attachments.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const PURCHASE_INVOICE_DOCTYPE: &str = "Purchase Invoice";

// ─── Item ────────────────────────────────────────────────────────────────────

/// A supplier's own code for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierItem {
  pub supplier: String,
  pub part_no:  String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
  /// The item code, assigned from the `ITEM-#####` naming series.
  pub name:           String,
  pub item_name:      String,
  pub description:    String,
  pub item_group:     String,
  pub stock_uom:      String,
  pub is_stock_item:  bool,
  pub supplier_items: Vec<SupplierItem>,
}

#[derive(Debug, Clone)]
pub struct NewItem {
  pub item_name:      String,
  pub description:    String,
  pub item_group:     String,
  pub stock_uom:      String,
  pub is_stock_item:  bool,
  pub supplier_items: Vec<SupplierItem>,
}

// ─── Document status ─────────────────────────────────────────────────────────

/// Submission state of a transactional document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStatus {
  #[default]
  Draft,
  Submitted,
  Cancelled,
}

impl DocStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Draft => "draft",
      Self::Submitted => "submitted",
      Self::Cancelled => "cancelled",
    }
  }

  pub fn as_i64(self) -> i64 {
    match self {
      Self::Draft => 0,
      Self::Submitted => 1,
      Self::Cancelled => 2,
    }
  }

  pub fn from_i64(v: i64) -> Result<Self> {
    match v {
      0 => Ok(Self::Draft),
      1 => Ok(Self::Submitted),
      2 => Ok(Self::Cancelled),
      other => Err(Error::UnknownDocStatus(other)),
    }
  }
}

impl fmt::Display for DocStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ─── Taxes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChargeType {
  /// A percentage of the invoice's net total.
  #[default]
  #[serde(rename = "On Net Total")]
  OnNetTotal,
  /// A fixed amount.
  Actual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRow {
  pub charge_type:  ChargeType,
  pub account_head: String,
  pub description:  String,
  pub rate:         f64,
  /// Fixed amount for `Actual` rows; computed for `OnNetTotal` rows.
  #[serde(default)]
  pub tax_amount:   f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxTemplate {
  pub name:       String,
  /// The template new invoices receive when none is chosen.
  #[serde(default)]
  pub is_default: bool,
  pub rows:       Vec<TaxRow>,
}

// ─── Purchase invoice ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
  pub item_code:           String,
  pub item_name:           String,
  pub qty:                 f64,
  pub uom:                 String,
  pub price_list_rate:     f64,
  pub discount_percentage: f64,
  pub discount_amount:     f64,
  pub rate:                f64,
  pub amount:              f64,
  pub base_rate:           f64,
  pub base_amount:         f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentScheduleEntry {
  pub payment_term:    String,
  pub due_date:        NaiveDate,
  /// Share of the invoice total, in percent.
  pub invoice_portion: f64,
  pub payment_amount:  f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseInvoice {
  pub name:                   String,
  pub supplier:               String,
  pub posting_date:           NaiveDate,
  pub due_date:               NaiveDate,
  /// The supplier's invoice number.
  pub bill_no:                String,
  pub bill_date:              NaiveDate,
  pub docstatus:              DocStatus,
  pub items:                  Vec<InvoiceItem>,
  pub taxes_and_charges:      Option<String>,
  pub taxes:                  Vec<TaxRow>,
  pub payment_terms_template: Option<String>,
  pub payment_schedule:       Vec<PaymentScheduleEntry>,
  pub net_total:              f64,
  pub total_taxes:            f64,
  pub grand_total:            f64,
}

/// Input to [`crate::store::ErpStore::insert_purchase_invoice`]. Stored as a
/// draft; the name is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPurchaseInvoice {
  pub supplier:               String,
  pub posting_date:           NaiveDate,
  pub due_date:               NaiveDate,
  pub bill_no:                String,
  pub bill_date:              NaiveDate,
  pub items:                  Vec<InvoiceItem>,
  pub taxes_and_charges:      Option<String>,
  pub taxes:                  Vec<TaxRow>,
  pub payment_terms_template: Option<String>,
  pub payment_schedule:       Vec<PaymentScheduleEntry>,
  pub net_total:              f64,
  pub total_taxes:            f64,
  pub grand_total:            f64,
}

// ─── File attachment ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAttachment {
  pub name:                String,
  pub file_url:            String,
  pub file_name:           String,
  pub is_private:          bool,
  pub attached_to_doctype: String,
  pub attached_to_name:    String,
}

#[derive(Debug, Clone)]
pub struct NewFileAttachment {
  pub file_url:            String,
  pub file_name:           String,
  pub is_private:          bool,
  pub attached_to_doctype: String,
  pub attached_to_name:    String,
}
