//! The `ErpStore` trait: the data-access interface every workflow runs
//! against.
//!
//! The trait is implemented by storage backends (e.g. `aiflow-store-sqlite`).
//! Lookups return `Ok(None)` when nothing matches; updates that address a
//! record by name return `Ok(false)` when it does not exist.
//!
//! Matching and creation are separate calls. Callers do read-then-create
//! without a lock, so concurrent duplicate invocations can create duplicate
//! rows.

use std::future::Future;

use crate::{
  invoice::{
    DocStatus, FileAttachment, Item, NewFileAttachment, NewItem, NewPurchaseInvoice,
    PurchaseInvoice, TaxTemplate,
  },
  party::{Address, AddressKey, Contact, NewAddress, NewContact, NewSupplier, Supplier},
  record::{AiConfig, AiPrompt, AiQuery, DocumentStatus, NewAiQuery, SourceDocument},
};

/// Abstraction over an ERP record store.
///
/// All methods return `Send` futures so the trait can be used from spawned
/// background jobs and `axum` handlers.
pub trait ErpStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── AI configs, prompts, source documents ─────────────────────────────

  fn upsert_ai(
    &self,
    ai: AiConfig,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_ai<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<AiConfig>, Self::Error>> + Send + 'a;

  fn upsert_prompt(
    &self,
    prompt: AiPrompt,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_prompt<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<AiPrompt>, Self::Error>> + Send + 'a;

  fn upsert_source_document(
    &self,
    doc: SourceDocument,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_source_document<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<SourceDocument>, Self::Error>> + Send + 'a;

  fn set_source_document_status<'a>(
    &'a self,
    name: &'a str,
    status: DocumentStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Queries ───────────────────────────────────────────────────────────

  /// Persist a query record; the store assigns its name.
  fn insert_query(
    &self,
    query: NewAiQuery,
  ) -> impl Future<Output = Result<AiQuery, Self::Error>> + Send + '_;

  fn get_query<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<AiQuery>, Self::Error>> + Send + 'a;

  fn link_query_supplier<'a>(
    &'a self,
    name: &'a str,
    supplier: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn link_query_document<'a>(
    &'a self,
    name: &'a str,
    document: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// The query whose resulting document is `document`.
  fn find_query_by_document<'a>(
    &'a self,
    document: &'a str,
  ) -> impl Future<Output = Result<Option<AiQuery>, Self::Error>> + Send + 'a;

  // ── Suppliers ─────────────────────────────────────────────────────────

  fn get_supplier<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Supplier>, Self::Error>> + Send + 'a;

  fn find_supplier_by_tax_id<'a>(
    &'a self,
    tax_id: &'a str,
  ) -> impl Future<Output = Result<Option<Supplier>, Self::Error>> + Send + 'a;

  fn find_supplier_by_name<'a>(
    &'a self,
    supplier_name: &'a str,
  ) -> impl Future<Output = Result<Option<Supplier>, Self::Error>> + Send + 'a;

  fn insert_supplier(
    &self,
    supplier: NewSupplier,
  ) -> impl Future<Output = Result<Supplier, Self::Error>> + Send + '_;

  /// Overwrite every mutable field of an existing supplier.
  fn update_supplier<'a>(
    &'a self,
    supplier: &'a Supplier,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Addresses & contacts ──────────────────────────────────────────────

  /// Country name for a two-letter code, compared case-insensitively.
  fn country_by_code<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  fn find_address<'a>(
    &'a self,
    key: &'a AddressKey,
  ) -> impl Future<Output = Result<Option<Address>, Self::Error>> + Send + 'a;

  fn insert_address(
    &self,
    address: NewAddress,
  ) -> impl Future<Output = Result<Address, Self::Error>> + Send + '_;

  fn update_address<'a>(
    &'a self,
    address: &'a Address,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn find_contact<'a>(
    &'a self,
    first_name: &'a str,
    last_name: &'a str,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + 'a;

  fn insert_contact(
    &self,
    contact: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn update_contact<'a>(
    &'a self,
    contact: &'a Contact,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Items ─────────────────────────────────────────────────────────────

  /// The item carrying `part_no` as `supplier`'s item code.
  fn find_item_by_supplier_part<'a>(
    &'a self,
    supplier: &'a str,
    part_no: &'a str,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + 'a;

  /// Persist an item; the store assigns its code from the item naming series.
  fn insert_item(
    &self,
    item: NewItem,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  // ── Taxes ─────────────────────────────────────────────────────────────

  fn upsert_tax_template(
    &self,
    template: TaxTemplate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_tax_template<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<TaxTemplate>, Self::Error>> + Send + 'a;

  /// The template flagged as default, if any.
  fn default_tax_template(
    &self,
  ) -> impl Future<Output = Result<Option<TaxTemplate>, Self::Error>> + Send + '_;

  // ── Purchase invoices ─────────────────────────────────────────────────

  /// `true` if a non-cancelled invoice exists for `(supplier, bill_no)`.
  fn purchase_invoice_exists<'a>(
    &'a self,
    supplier: &'a str,
    bill_no: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert a draft invoice with all its child rows atomically.
  fn insert_purchase_invoice(
    &self,
    invoice: NewPurchaseInvoice,
  ) -> impl Future<Output = Result<PurchaseInvoice, Self::Error>> + Send + '_;

  fn get_purchase_invoice<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<PurchaseInvoice>, Self::Error>> + Send + 'a;

  /// Move invoice `name` from `from` to `to`. `Ok(false)` when no invoice
  /// of that name currently has docstatus `from`.
  fn set_purchase_invoice_docstatus<'a>(
    &'a self,
    name: &'a str,
    from: DocStatus,
    to: DocStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── File attachments ──────────────────────────────────────────────────

  fn attachment_exists<'a>(
    &'a self,
    file_url: &'a str,
    doctype: &'a str,
    name: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn insert_attachment(
    &self,
    attachment: NewFileAttachment,
  ) -> impl Future<Output = Result<FileAttachment, Self::Error>> + Send + '_;
}
