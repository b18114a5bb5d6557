//! Workflow settings supplied by the host configuration.

use aiflow_core::payment::PaymentTermMapping;

pub const DEFAULT_ITEM_GROUP: &str = "All Item Groups";
pub const DEFAULT_STOCK_UOM: &str = "Stk";

#[derive(Debug, Clone)]
pub struct Settings {
  /// Public URL of this service, used for deep links to query records.
  pub base_url:            String,
  /// Document server whose preview URLs are attached to new invoices.
  pub document_server_url: Option<String>,
  /// Item group for items created from invoice lines.
  pub item_group:          String,
  /// Stock unit of measure for items created from invoice lines.
  pub stock_uom:           String,
  /// Payment method → payment term lookup table.
  pub payment_terms:       Vec<PaymentTermMapping>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      base_url:            "http://localhost:8080".to_owned(),
      document_server_url: None,
      item_group:          DEFAULT_ITEM_GROUP.to_owned(),
      stock_uom:           DEFAULT_STOCK_UOM.to_owned(),
      payment_terms:       Vec::new(),
    }
  }
}
