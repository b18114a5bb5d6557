//! The AI workflows: run a prompt against a source document, then turn the
//! extracted invoice JSON into suppliers, items and purchase invoices.
//!
//! Everything runs against an [`ErpStore`] and a [`ChatModel`]; callers wire
//! in concrete implementations (SQLite and OpenAI in the server binary).
//!
//! ```rust,ignore
//! let workflows = Workflows::new(store, model, Settings::default());
//! let outcome = workflows.call_ai("gpt", "invoice", doc, false).await?;
//! ```

mod ai;
mod hooks;
mod invoice;
mod supplier;

pub mod error;
pub mod event;
pub mod payload;
pub mod settings;

use std::sync::Arc;

use aiflow_core::{model::ChatModel, store::ErpStore};
use tokio::sync::broadcast;

pub use ai::CallOutcome;
pub use error::{Error, Result};
pub use event::Event;
pub use hooks::{HookOutcome, InvoiceEvent};
pub use invoice::InvoiceOutcome;
pub use payload::{QueryDocument, SourceDocumentPayload};
pub use settings::Settings;
pub use supplier::SupplierOutcome;

const EVENT_CAPACITY: usize = 64;

/// Entry point for every workflow operation.
///
/// Cheap to clone: store, model and settings are shared behind `Arc`s, and
/// clones publish to the same event channel.
pub struct Workflows<S, M> {
  store:    Arc<S>,
  model:    Arc<M>,
  settings: Arc<Settings>,
  events:   broadcast::Sender<Event>,
}

impl<S, M> Clone for Workflows<S, M> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      model:    self.model.clone(),
      settings: self.settings.clone(),
      events:   self.events.clone(),
    }
  }
}

impl<S, M> Workflows<S, M>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  pub fn new(store: Arc<S>, model: Arc<M>, settings: Settings) -> Self {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self { store, model, settings: Arc::new(settings), events }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn settings(&self) -> &Settings { &self.settings }

  /// Receive realtime events published by background jobs.
  pub fn subscribe(&self) -> broadcast::Receiver<Event> { self.events.subscribe() }

  fn publish(&self, event: Event) {
    // No subscribers is not an error.
    let _ = self.events.send(event);
  }
}

fn store_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Store(Box::new(e))
}
