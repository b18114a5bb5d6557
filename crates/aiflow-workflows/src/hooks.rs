//! Document-event hook: propagate purchase invoice submission and
//! cancellation back to the source document.

use aiflow_core::{
  invoice::DocStatus, model::ChatModel, record::DocumentStatus, store::ErpStore,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, Workflows, store_err};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceEvent {
  Submit,
  Cancel,
}

impl InvoiceEvent {
  /// The docstatus an invoice must have for this event, and the one it moves
  /// to: drafts are submitted, submitted invoices are cancelled.
  fn transition(self) -> (DocStatus, DocStatus) {
    match self {
      Self::Submit => (DocStatus::Draft, DocStatus::Submitted),
      Self::Cancel => (DocStatus::Submitted, DocStatus::Cancelled),
    }
  }

  fn document_status(self) -> DocumentStatus {
    match self {
      Self::Submit => DocumentStatus::WorkflowSuccessful,
      Self::Cancel => DocumentStatus::DestinationDocumentCancelled,
    }
  }
}

/// What [`Workflows::on_purchase_invoice_event`] changed.
#[derive(Debug, Clone, Serialize)]
pub struct HookOutcome {
  pub invoice:         String,
  pub docstatus:       DocStatus,
  /// The source document whose status was advanced, if the invoice came
  /// from a query.
  pub source_document: Option<String>,
  pub status:          Option<DocumentStatus>,
}

impl<S, M> Workflows<S, M>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  #[tracing::instrument(skip(self))]
  pub async fn on_purchase_invoice_event(
    &self,
    invoice: &str,
    event: InvoiceEvent,
  ) -> Result<HookOutcome> {
    let (from, docstatus) = event.transition();
    let moved = self
      .store
      .set_purchase_invoice_docstatus(invoice, from, docstatus)
      .await
      .map_err(store_err)?;
    if !moved {
      let current = self
        .store
        .get_purchase_invoice(invoice)
        .await
        .map_err(store_err)?
        .ok_or_else(|| Error::NotFound {
          doctype: "Purchase Invoice",
          name:    invoice.to_owned(),
        })?
        .docstatus;
      tracing::warn!(current = current.as_str(), "invoice not in the expected state");
      return Err(Error::InvalidTransition {
        invoice:   invoice.to_owned(),
        current,
        requested: docstatus,
      });
    }

    let mut outcome = HookOutcome {
      invoice: invoice.to_owned(),
      docstatus,
      source_document: None,
      status: None,
    };

    let Some(query) = self
      .store
      .find_query_by_document(invoice)
      .await
      .map_err(store_err)?
    else {
      tracing::debug!("invoice has no originating query");
      return Ok(outcome);
    };

    let status = event.document_status();
    let updated = self
      .store
      .set_source_document_status(&query.source_doc, status)
      .await
      .map_err(store_err)?;
    if updated {
      tracing::info!(source = %query.source_doc, status = status.as_str(), "source document advanced");
      outcome.source_document = Some(query.source_doc);
      outcome.status = Some(status);
    } else {
      tracing::warn!(source = %query.source_doc, "source document not found");
    }
    Ok(outcome)
  }
}
