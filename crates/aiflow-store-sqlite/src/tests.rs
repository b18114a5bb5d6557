//! Integration tests for `SqliteStore` against an in-memory database.

use aiflow_core::{
  invoice::{
    ChargeType, DocStatus, InvoiceItem, NewFileAttachment, NewItem, NewPurchaseInvoice,
    PaymentScheduleEntry, SupplierItem, TaxRow, TaxTemplate,
  },
  party::{AddressKey, Link, NewAddress, NewContact, NewSupplier, SupplierType},
  record::{AiConfig, AiInterface, AiPrompt, DocumentStatus, NewAiQuery, OutputMode, SourceDocument},
  store::ErpStore,
};
use chrono::NaiveDate;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn new_supplier(name: &str, tax_id: Option<&str>) -> NewSupplier {
  NewSupplier {
    supplier_name:  name.into(),
    tax_id:         tax_id.map(Into::into),
    supplier_group: "All Supplier Groups".into(),
    supplier_type:  SupplierType::Company,
  }
}

fn new_item(supplier: &str, part_no: &str) -> NewItem {
  NewItem {
    item_name:      "Widget".into(),
    description:    "A widget".into(),
    item_group:     "All Item Groups".into(),
    stock_uom:      "Stk".into(),
    is_stock_item:  true,
    supplier_items: vec![SupplierItem { supplier: supplier.into(), part_no: part_no.into() }],
  }
}

fn line(item_code: &str, qty: f64, rate: f64) -> InvoiceItem {
  InvoiceItem {
    item_code:           item_code.into(),
    item_name:           "Widget".into(),
    qty,
    uom:                 "Stk".into(),
    price_list_rate:     rate,
    discount_percentage: 0.0,
    discount_amount:     0.0,
    rate,
    amount:              qty * rate,
    base_rate:           rate,
    base_amount:         qty * rate,
  }
}

fn new_invoice(supplier: &str, bill_no: &str, items: Vec<InvoiceItem>) -> NewPurchaseInvoice {
  let net: f64 = items.iter().map(|i| i.amount).sum();
  NewPurchaseInvoice {
    supplier:               supplier.into(),
    posting_date:           date(2024, 3, 1),
    due_date:               date(2024, 3, 31),
    bill_no:                bill_no.into(),
    bill_date:              date(2024, 3, 1),
    items,
    taxes_and_charges:      None,
    taxes:                  vec![],
    payment_terms_template: None,
    payment_schedule:       vec![PaymentScheduleEntry {
      payment_term:    "Bank Transfer".into(),
      due_date:        date(2024, 3, 31),
      invoice_portion: 100.0,
      payment_amount:  net,
    }],
    net_total:              net,
    total_taxes:            0.0,
    grand_total:            net,
  }
}

// ─── AI records ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn ai_config_upsert_overwrites() {
  let s = store().await;
  let mut cfg = AiConfig {
    name:      "gpt".into(),
    api_key:   "sk-1".into(),
    interface: AiInterface::OpenAi,
  };
  s.upsert_ai(cfg.clone()).await.unwrap();
  cfg.api_key = "sk-2".into();
  s.upsert_ai(cfg).await.unwrap();

  let fetched = s.get_ai("gpt").await.unwrap().unwrap();
  assert_eq!(fetched.api_key, "sk-2");
  assert_eq!(fetched.interface, AiInterface::OpenAi);
  assert!(s.get_ai("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn prompt_schema_roundtrip() {
  let s = store().await;
  s.upsert_prompt(AiPrompt {
    name:        "invoice".into(),
    text:        "Extract the invoice.".into(),
    output_mode: OutputMode::StructuredJson,
    json_schema: Some(serde_json::json!({ "type": "object" })),
    for_doctype: "Purchase Invoice".into(),
  })
  .await
  .unwrap();

  let p = s.get_prompt("invoice").await.unwrap().unwrap();
  assert_eq!(p.output_mode, OutputMode::StructuredJson);
  assert_eq!(p.json_schema, Some(serde_json::json!({ "type": "object" })));
}

#[tokio::test]
async fn source_document_status_update() {
  let s = store().await;
  s.upsert_source_document(SourceDocument {
    name:        "DOC-1".into(),
    fulltext:    "Invoice 4711".into(),
    status:      DocumentStatus::Pending,
    external_id: Some(42),
  })
  .await
  .unwrap();

  assert!(
    s.set_source_document_status("DOC-1", DocumentStatus::AiResponseReceived)
      .await
      .unwrap()
  );
  assert!(
    !s.set_source_document_status("DOC-2", DocumentStatus::AiResponseReceived)
      .await
      .unwrap()
  );

  let doc = s.get_source_document("DOC-1").await.unwrap().unwrap();
  assert_eq!(doc.status, DocumentStatus::AiResponseReceived);
  assert_eq!(doc.external_id, Some(42));
}

// ─── Queries ─────────────────────────────────────────────────────────────────

fn new_query() -> NewAiQuery {
  NewAiQuery {
    document_type:    "Purchase Invoice".into(),
    source_doc:       "DOC-1".into(),
    ai:               "gpt".into(),
    prompt:           "invoice".into(),
    effective_prompt: "Extract.\n\nInvoice".into(),
    ai_response:      "{}".into(),
    ai_response_json: "{}".into(),
  }
}

#[tokio::test]
async fn queries_get_sequential_names() {
  let s = store().await;
  let a = s.insert_query(new_query()).await.unwrap();
  let b = s.insert_query(new_query()).await.unwrap();
  assert_eq!(a.name, "AIQ-00001");
  assert_eq!(b.name, "AIQ-00002");
}

#[tokio::test]
async fn query_links_and_lookup_by_document() {
  let s = store().await;
  let q = s.insert_query(new_query()).await.unwrap();

  assert!(s.link_query_supplier(&q.name, "SUP-00001").await.unwrap());
  assert!(s.link_query_document(&q.name, "PINV-00001").await.unwrap());
  assert!(!s.link_query_document("AIQ-09999", "PINV-00001").await.unwrap());

  let found = s.find_query_by_document("PINV-00001").await.unwrap().unwrap();
  assert_eq!(found.name, q.name);
  assert_eq!(found.supplier.as_deref(), Some("SUP-00001"));
  assert!(s.find_query_by_document("PINV-00002").await.unwrap().is_none());
}

// ─── Suppliers, addresses, contacts ──────────────────────────────────────────

#[tokio::test]
async fn supplier_lookup_by_tax_id_and_name() {
  let s = store().await;
  let sup = s.insert_supplier(new_supplier("ACME GmbH", Some("DE1"))).await.unwrap();
  assert_eq!(sup.name, "SUP-00001");

  let by_tax = s.find_supplier_by_tax_id("DE1").await.unwrap().unwrap();
  assert_eq!(by_tax.name, sup.name);
  let by_name = s.find_supplier_by_name("ACME GmbH").await.unwrap().unwrap();
  assert_eq!(by_name.name, sup.name);
  assert!(s.find_supplier_by_tax_id("DE2").await.unwrap().is_none());
}

#[tokio::test]
async fn supplier_update_persists_primary_links() {
  let s = store().await;
  let mut sup = s.insert_supplier(new_supplier("ACME GmbH", None)).await.unwrap();
  sup.primary_address = Some("ADDR-00001".into());
  sup.tax_id = Some("DE1".into());
  s.update_supplier(&sup).await.unwrap();

  let fetched = s.get_supplier(&sup.name).await.unwrap().unwrap();
  assert_eq!(fetched.primary_address.as_deref(), Some("ADDR-00001"));
  assert_eq!(fetched.tax_id.as_deref(), Some("DE1"));
}

#[tokio::test]
async fn update_missing_supplier_errors() {
  let s = store().await;
  let mut sup = s.insert_supplier(new_supplier("ACME GmbH", None)).await.unwrap();
  sup.name = "SUP-09999".into();
  let err = s.update_supplier(&sup).await.unwrap_err();
  assert!(matches!(err, Error::NotFound { doctype: "Supplier", .. }));
}

#[tokio::test]
async fn country_code_is_case_insensitive() {
  let s = store().await;
  assert_eq!(s.country_by_code("DE").await.unwrap().as_deref(), Some("Germany"));
  assert_eq!(s.country_by_code("de").await.unwrap().as_deref(), Some("Germany"));
  assert!(s.country_by_code("xx").await.unwrap().is_none());
}

#[tokio::test]
async fn address_matched_on_composite_key() {
  let s = store().await;
  let key = AddressKey {
    line1:   "Hauptstr. 1".into(),
    city:    "Berlin".into(),
    pincode: "10115".into(),
    country: Some("Germany".into()),
  };
  let addr = s
    .insert_address(NewAddress {
      title: "ACME GmbH - Main Address".into(),
      key:   key.clone(),
      links: vec![Link::supplier("SUP-00001")],
    })
    .await
    .unwrap();

  let found = s.find_address(&key).await.unwrap().unwrap();
  assert_eq!(found.name, addr.name);
  assert!(found.is_linked_to("SUP-00001"));

  let other = AddressKey { country: None, ..key };
  assert!(s.find_address(&other).await.unwrap().is_none());
}

#[tokio::test]
async fn contact_update_keeps_child_lists() {
  let s = store().await;
  let mut c = s
    .insert_contact(NewContact {
      first_name:   "Ada".into(),
      last_name:    "Lovelace".into(),
      company_name: Some("ACME GmbH".into()),
      address:      None,
      phones:       vec![],
      emails:       vec![],
      links:        vec![],
    })
    .await
    .unwrap();

  c.add_phone("+49 30 1234");
  c.add_email("ada@example.com");
  c.links.push(Link::supplier("SUP-00001"));
  s.update_contact(&c).await.unwrap();

  let found = s.find_contact("Ada", "Lovelace").await.unwrap().unwrap();
  assert_eq!(found.phones.len(), 1);
  assert!(found.phones[0].is_primary);
  assert_eq!(found.emails[0].email_id, "ada@example.com");
  assert!(found.is_linked_to("SUP-00001"));
  assert!(s.find_contact("Ada", "Byron").await.unwrap().is_none());
}

// ─── Items & taxes ───────────────────────────────────────────────────────────

#[tokio::test]
async fn item_found_by_supplier_part_number() {
  let s = store().await;
  let item = s.insert_item(new_item("SUP-00001", "A-1")).await.unwrap();
  assert_eq!(item.name, "ITEM-00001");

  let found = s.find_item_by_supplier_part("SUP-00001", "A-1").await.unwrap().unwrap();
  assert_eq!(found.name, item.name);
  assert_eq!(found.supplier_items.len(), 1);
  assert!(s.find_item_by_supplier_part("SUP-00002", "A-1").await.unwrap().is_none());
}

#[tokio::test]
async fn only_one_default_tax_template() {
  let s = store().await;
  let row = TaxRow {
    charge_type:  ChargeType::OnNetTotal,
    account_head: "VAT 19%".into(),
    description:  "VAT".into(),
    rate:         19.0,
    tax_amount:   0.0,
  };
  s.upsert_tax_template(TaxTemplate { name: "DE 19".into(), is_default: true, rows: vec![row.clone()] })
    .await
    .unwrap();
  s.upsert_tax_template(TaxTemplate { name: "DE 7".into(), is_default: true, rows: vec![row] })
    .await
    .unwrap();

  let default = s.default_tax_template().await.unwrap().unwrap();
  assert_eq!(default.name, "DE 7");
  let old = s.get_tax_template("DE 19").await.unwrap().unwrap();
  assert!(!old.is_default);
  assert_eq!(old.rows[0].rate, 19.0);
}

// ─── Purchase invoices ───────────────────────────────────────────────────────

#[tokio::test]
async fn invoice_roundtrip_with_children() {
  let s = store().await;
  let sup = s.insert_supplier(new_supplier("ACME GmbH", None)).await.unwrap();
  let item = s.insert_item(new_item(&sup.name, "A-1")).await.unwrap();

  let inv = s
    .insert_purchase_invoice(new_invoice(&sup.name, "4711", vec![line(&item.name, 2.0, 10.0)]))
    .await
    .unwrap();
  assert_eq!(inv.name, "PINV-00001");
  assert_eq!(inv.docstatus, DocStatus::Draft);

  let fetched = s.get_purchase_invoice(&inv.name).await.unwrap().unwrap();
  assert_eq!(fetched.items.len(), 1);
  assert_eq!(fetched.items[0].amount, 20.0);
  assert_eq!(fetched.payment_schedule.len(), 1);
  assert_eq!(fetched.payment_schedule[0].due_date, date(2024, 3, 31));
  assert_eq!(fetched.grand_total, 20.0);
}

#[tokio::test]
async fn invoice_insert_is_atomic() {
  let s = store().await;
  let sup = s.insert_supplier(new_supplier("ACME GmbH", None)).await.unwrap();

  // The second line references an item that does not exist.
  let item = s.insert_item(new_item(&sup.name, "A-1")).await.unwrap();
  let bad = new_invoice(&sup.name, "4711", vec![
    line(&item.name, 1.0, 5.0),
    line("ITEM-09999", 1.0, 5.0),
  ]);
  assert!(s.insert_purchase_invoice(bad).await.is_err());

  assert!(!s.purchase_invoice_exists(&sup.name, "4711").await.unwrap());
  assert!(s.get_purchase_invoice("PINV-00001").await.unwrap().is_none());
}

#[tokio::test]
async fn cancelled_invoice_does_not_count_as_duplicate() {
  let s = store().await;
  let sup = s.insert_supplier(new_supplier("ACME GmbH", None)).await.unwrap();
  let item = s.insert_item(new_item(&sup.name, "A-1")).await.unwrap();
  let inv = s
    .insert_purchase_invoice(new_invoice(&sup.name, "4711", vec![line(&item.name, 1.0, 5.0)]))
    .await
    .unwrap();

  assert!(s.purchase_invoice_exists(&sup.name, "4711").await.unwrap());
  assert!(
    s.set_purchase_invoice_docstatus(&inv.name, DocStatus::Draft, DocStatus::Submitted)
      .await
      .unwrap()
  );
  assert!(
    s.set_purchase_invoice_docstatus(&inv.name, DocStatus::Submitted, DocStatus::Cancelled)
      .await
      .unwrap()
  );
  assert!(!s.purchase_invoice_exists(&sup.name, "4711").await.unwrap());
}

#[tokio::test]
async fn docstatus_moves_only_from_the_expected_state() {
  let s = store().await;
  let sup = s.insert_supplier(new_supplier("ACME GmbH", None)).await.unwrap();
  let item = s.insert_item(new_item(&sup.name, "A-1")).await.unwrap();
  let inv = s
    .insert_purchase_invoice(new_invoice(&sup.name, "4711", vec![line(&item.name, 1.0, 5.0)]))
    .await
    .unwrap();

  // A draft cannot be cancelled directly.
  assert!(
    !s.set_purchase_invoice_docstatus(&inv.name, DocStatus::Submitted, DocStatus::Cancelled)
      .await
      .unwrap()
  );
  assert!(
    s.set_purchase_invoice_docstatus(&inv.name, DocStatus::Draft, DocStatus::Submitted)
      .await
      .unwrap()
  );
  assert!(
    s.set_purchase_invoice_docstatus(&inv.name, DocStatus::Submitted, DocStatus::Cancelled)
      .await
      .unwrap()
  );
  // Nor does a cancelled invoice come back.
  assert!(
    !s.set_purchase_invoice_docstatus(&inv.name, DocStatus::Draft, DocStatus::Submitted)
      .await
      .unwrap()
  );

  let stored = s.get_purchase_invoice(&inv.name).await.unwrap().unwrap();
  assert_eq!(stored.docstatus, DocStatus::Cancelled);
  assert!(
    !s.set_purchase_invoice_docstatus("PINV-09999", DocStatus::Draft, DocStatus::Submitted)
      .await
      .unwrap()
  );
}

// ─── Files ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn attachment_exists_after_insert() {
  let s = store().await;
  let url = "https://docs.example.com/api/documents/42/preview/";
  assert!(!s.attachment_exists(url, "Purchase Invoice", "PINV-00001").await.unwrap());

  let f = s
    .insert_attachment(NewFileAttachment {
      file_url:            url.into(),
      file_name:           "View Document".into(),
      is_private:          true,
      attached_to_doctype: "Purchase Invoice".into(),
      attached_to_name:    "PINV-00001".into(),
    })
    .await
    .unwrap();
  assert_eq!(f.name, "FILE-00001");
  assert!(s.attachment_exists(url, "Purchase Invoice", "PINV-00001").await.unwrap());
}
