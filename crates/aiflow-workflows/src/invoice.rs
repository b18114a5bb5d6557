//! Purchase invoice creation from the invoice JSON of a query.

use aiflow_core::{
  dates::InvoiceDates,
  invoice::{
    InvoiceItem, Item, NewFileAttachment, NewItem, NewPurchaseInvoice,
    PURCHASE_INVOICE_DOCTYPE, PurchaseInvoice, SupplierItem,
  },
  model::ChatModel,
  payload::{InvoiceDetails, InvoicePayload, PurchasedItem, require},
  payment::{match_payment_term, single_schedule},
  pricing::{LinePricing, apply_taxes, round_currency, totals},
  store::ErpStore,
};
use chrono::Local;
use serde::Serialize;
use uuid::Uuid;

use crate::{Error, Result, Workflows, payload::QueryDocument, store_err};

const PREVIEW_FILE_NAME: &str = "View Document";

/// Result of [`Workflows::create_purchase_invoice`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvoiceOutcome {
  Created { invoice: PurchaseInvoice },
  /// A live invoice with the same supplier and bill number exists; nothing
  /// was written.
  Duplicate { notice: String },
}

impl InvoiceOutcome {
  pub fn message(&self) -> String {
    match self {
      Self::Created { invoice } => invoice.name.clone(),
      Self::Duplicate { notice } => notice.clone(),
    }
  }
}

/// An invoice line with every required value present.
struct Line {
  part_no:     String,
  item_name:   String,
  description: String,
  qty:         f64,
  unit_price:  f64,
  total:       f64,
}

impl Line {
  fn from_purchased(item: PurchasedItem) -> Result<Self> {
    let item_name = require(item.item_name, "Missing key in JSON data: ItemName")?;
    Ok(Self {
      part_no: item.item_number.unwrap_or_else(fallback_part_no),
      description: item.description.unwrap_or_else(|| item_name.clone()),
      qty: require(item.quantity, "Missing key in JSON data: Quantity")?,
      unit_price: require(item.unit_price, "Missing key in JSON data: UnitPrice")?,
      total: require(item.total, "Missing key in JSON data: Total")?,
      item_name,
    })
  }
}

/// `AI-` followed by eight random hex digits.
fn fallback_part_no() -> String {
  let id = Uuid::new_v4().simple().to_string();
  format!("AI-{}", &id[..8])
}

impl<S, M> Workflows<S, M>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  /// Build a draft purchase invoice for the query's supplier from its invoice
  /// JSON, and link it back to the query.
  ///
  /// Every check runs before the first write, so an abort leaves no
  /// invoice, schedule or item behind.
  #[tracing::instrument(skip_all, fields(query = %doc.name))]
  pub async fn create_purchase_invoice(&self, doc: &QueryDocument) -> Result<InvoiceOutcome> {
    let json = doc.response_json().ok_or(Error::InvalidJson)?;
    let details = InvoiceDetails::from_response(&json)?;
    let payload: InvoicePayload =
      serde_json::from_value(json).map_err(aiflow_core::Error::from)?;

    let supplier_name = require(
      doc.supplier.clone().filter(|s| !s.is_empty()),
      "Supplier name is missing in the request.",
    )?;
    let details = require(
      details,
      "Invoice details are missing in the JSON data.",
    )?;
    let purchased = require(
      payload.items_purchased.map(|i| i.item_list).filter(|l| !l.is_empty()),
      "Items purchased are missing in the JSON data.",
    )?;
    let bill_no = require(
      details.invoice_number,
      "InvoiceNumber is missing in the InvoiceDetails.",
    )?;
    let invoice_date = require(
      details.invoice_date,
      "InvoiceDate is missing in the InvoiceDetails.",
    )?;

    let supplier = self
      .store
      .get_supplier(&supplier_name)
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::NotFound { doctype: "Supplier", name: supplier_name.clone() })?;

    if self
      .store
      .purchase_invoice_exists(&supplier.name, &bill_no)
      .await
      .map_err(store_err)?
    {
      let notice = format!(
        "Purchase Invoice with Invoice Number '{bill_no}' already exists for supplier '{}'.",
        supplier.name
      );
      tracing::info!(bill_no = %bill_no, "duplicate invoice skipped");
      return Ok(InvoiceOutcome::Duplicate { notice });
    }

    let payment = payload.payment_information.unwrap_or_default();
    let dates = InvoiceDates::resolve(
      Some(&invoice_date),
      payment.payment_due_date.as_deref(),
      Local::now().date_naive(),
    );

    let method = payment.payment_method.unwrap_or_default();
    let term = match_payment_term(&self.settings.payment_terms, &method)
      .ok_or_else(|| Error::UnmatchedPaymentTerm(method.clone()))?
      .term
      .clone();

    let lines = purchased
      .into_iter()
      .map(Line::from_purchased)
      .collect::<Result<Vec<_>>>()?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
      let item = self.create_or_get_item(&supplier.name, &line).await?;
      let pricing = LinePricing::compute(line.qty, line.unit_price, line.total);
      items.push(InvoiceItem {
        item_code:           item.name,
        item_name:           item.item_name,
        qty:                 line.qty,
        uom:                 item.stock_uom,
        price_list_rate:     line.unit_price,
        discount_percentage: pricing.discount_percentage,
        discount_amount:     pricing.discount_amount,
        rate:                pricing.rate,
        amount:              pricing.amount,
        base_rate:           pricing.rate,
        base_amount:         pricing.amount,
      });
    }

    let template = self.store.default_tax_template().await.map_err(store_err)?;
    let net_total = round_currency(items.iter().map(|i| i.amount).sum());
    let taxes = template
      .as_ref()
      .map(|t| apply_taxes(&t.rows, net_total))
      .unwrap_or_default();
    let totals = totals(items.iter().map(|i| i.amount), &taxes);

    let invoice = self
      .store
      .insert_purchase_invoice(NewPurchaseInvoice {
        supplier: supplier.name.clone(),
        posting_date: dates.posting,
        due_date: dates.due,
        bill_no,
        bill_date: dates.posting,
        items,
        taxes_and_charges: template.map(|t| t.name),
        taxes,
        payment_terms_template: Some(term.clone()),
        payment_schedule: single_schedule(&term, dates.due, totals.grand_total),
        net_total: totals.net_total,
        total_taxes: totals.total_taxes,
        grand_total: totals.grand_total,
      })
      .await
      .map_err(store_err)?;

    self.attach_preview(doc, &invoice.name).await?;

    let linked = self
      .store
      .link_query_document(&doc.name, &invoice.name)
      .await
      .map_err(store_err)?;
    if !linked {
      tracing::warn!(invoice = %invoice.name, "query not found; invoice left unlinked");
    }

    tracing::info!(
      invoice = %invoice.name,
      grand_total = invoice.grand_total,
      "purchase invoice created"
    );
    Ok(InvoiceOutcome::Created { invoice })
  }

  /// The item registered under the supplier's part number, created when
  /// none is.
  async fn create_or_get_item(&self, supplier: &str, line: &Line) -> Result<Item> {
    if let Some(item) = self
      .store
      .find_item_by_supplier_part(supplier, &line.part_no)
      .await
      .map_err(store_err)?
    {
      tracing::debug!(item = %item.name, part_no = %line.part_no, "reusing item");
      return Ok(item);
    }

    let item = self
      .store
      .insert_item(NewItem {
        item_name:      line.item_name.clone(),
        description:    line.description.clone(),
        item_group:     self.settings.item_group.clone(),
        stock_uom:      self.settings.stock_uom.clone(),
        is_stock_item:  true,
        supplier_items: vec![SupplierItem {
          supplier: supplier.to_owned(),
          part_no:  line.part_no.clone(),
        }],
      })
      .await
      .map_err(store_err)?;
    tracing::debug!(item = %item.name, part_no = %line.part_no, "item created");
    Ok(item)
  }

  /// Attach the document server's preview of the source document, when a
  /// server is configured and the document has an external id.
  async fn attach_preview(&self, doc: &QueryDocument, invoice: &str) -> Result<()> {
    let (Some(server), Some(source)) = (&self.settings.document_server_url, &doc.source_doc)
    else {
      return Ok(());
    };
    let Some(external_id) = self
      .store
      .get_source_document(source)
      .await
      .map_err(store_err)?
      .and_then(|d| d.external_id)
    else {
      return Ok(());
    };

    let file_url = format!(
      "{}/api/documents/{external_id}/preview/",
      server.trim_end_matches('/')
    );
    if self
      .store
      .attachment_exists(&file_url, PURCHASE_INVOICE_DOCTYPE, invoice)
      .await
      .map_err(store_err)?
    {
      return Ok(());
    }

    self
      .store
      .insert_attachment(NewFileAttachment {
        file_url,
        file_name: PREVIEW_FILE_NAME.to_owned(),
        is_private: true,
        attached_to_doctype: PURCHASE_INVOICE_DOCTYPE.to_owned(),
        attached_to_name: invoice.to_owned(),
      })
      .await
      .map_err(store_err)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fallback_part_numbers_are_short_hex() {
    let code = fallback_part_no();
    assert_eq!(code.len(), 11);
    assert!(code.starts_with("AI-"));
    assert!(code[3..].chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[test]
  fn description_defaults_to_item_name() {
    let line = Line::from_purchased(PurchasedItem {
      item_number: None,
      item_name:   Some("Widget".into()),
      description: None,
      quantity:    Some(2.0),
      unit_price:  Some(10.0),
      total:       Some(20.0),
    })
    .unwrap();
    assert_eq!(line.description, "Widget");
    assert!(line.part_no.starts_with("AI-"));
  }

  #[test]
  fn line_without_quantity_is_rejected() {
    let err = Line::from_purchased(PurchasedItem {
      item_name: Some("Widget".into()),
      unit_price: Some(10.0),
      total: Some(20.0),
      ..Default::default()
    })
    .err()
    .unwrap();
    assert_eq!(err.to_string(), "Missing key in JSON data: Quantity");
  }
}
