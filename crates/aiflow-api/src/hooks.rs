//! Document-event endpoints called by the host when a purchase invoice is
//! submitted or cancelled.

use aiflow_core::{model::ChatModel, store::ErpStore};
use aiflow_workflows::{HookOutcome, InvoiceEvent};
use axum::extract::State;

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  extract::{Json, Path},
};

/// `POST /api/hooks/purchase-invoice/{name}/{submit|cancel}`
pub async fn purchase_invoice<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Path((name, event)): Path<(String, InvoiceEvent)>,
) -> Result<Json<HookOutcome>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  let outcome = state.workflows.on_purchase_invoice_event(&name, event).await?;
  Ok(Json(outcome))
}
