//! Running a prompt against a source document and recording the answer.

use aiflow_core::{
  extract::extract_json,
  model::{ChatModel, FunctionSpec},
  record::{AiInterface, AiQuery, DocumentStatus, NewAiQuery, OutputMode},
  store::ErpStore,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
  Error, Result, Workflows, event::Event, payload::SourceDocumentPayload, store_err,
};

const AI_NOT_FOUND: &str = "AI not found!";
const INVOICE_SYSTEM_PROMPT: &str =
  "You are a wizard that generates invoice details in JSON format.";
const INVOICE_FUNCTION: &str = "generate_invoice";
const INVOICE_FUNCTION_DESCRIPTION: &str =
  "Generates an invoice based on the provided schema.";

/// Result of [`Workflows::call_ai`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallOutcome {
  /// No AI config with the requested name.
  NotFound { message: String },
  /// The run was handed to a background task.
  Enqueued { job_id: Uuid },
  /// The run finished synchronously.
  Completed { query: AiQuery, message: String },
}

impl CallOutcome {
  pub fn message(&self) -> String {
    match self {
      Self::NotFound { message } | Self::Completed { message, .. } => message.clone(),
      Self::Enqueued { job_id } => job_id.to_string(),
    }
  }
}

impl<S, M> Workflows<S, M>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  /// Resolve the AI config and run `prompt` against `doc`, in the background
  /// when `background` is set.
  pub async fn call_ai(
    &self,
    ai: &str,
    prompt: &str,
    doc: SourceDocumentPayload,
    background: bool,
  ) -> Result<CallOutcome> {
    let Some(config) = self.store.get_ai(ai).await.map_err(store_err)? else {
      return Ok(CallOutcome::NotFound { message: AI_NOT_FOUND.to_owned() });
    };

    if let AiInterface::Other(name) = config.interface {
      return Err(Error::UnsupportedInterface(name));
    }

    if background {
      let job_id = Uuid::new_v4();
      let this = self.clone();
      let ai = config.name;
      let prompt = prompt.to_owned();
      tracing::info!(%job_id, ai = %ai, prompt = %prompt, doc = %doc.name, "enqueueing AI query");

      tokio::spawn(async move {
        match this.run_query(&ai, &prompt, &doc).await {
          Ok(query) => {
            tracing::info!(%job_id, query = %query.name, "AI query finished");
            this.publish(Event::response_received(job_id));
          }
          Err(e) => {
            tracing::error!(%job_id, error = %e, "AI query failed");
            this.publish(Event::job_failed(job_id, &e));
          }
        }
      });

      return Ok(CallOutcome::Enqueued { job_id });
    }

    let query = self.run_query(&config.name, prompt, &doc).await?;
    let url = format!(
      "{}/app/ai-query/{}",
      self.settings.base_url.trim_end_matches('/'),
      query.name
    );
    Ok(CallOutcome::Completed {
      message: format!("AI query successful. Check out response: {url}"),
      query,
    })
  }

  /// Send the prompt, extract JSON from the answer, persist the query and
  /// advance the source document to `AI-Response-Received`.
  #[tracing::instrument(skip_all, fields(ai = %ai, prompt = %prompt, doc = %doc.name))]
  pub async fn run_query(
    &self,
    ai: &str,
    prompt: &str,
    doc: &SourceDocumentPayload,
  ) -> Result<AiQuery> {
    let config = self
      .store
      .get_ai(ai)
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::NotFound { doctype: "AI", name: ai.to_owned() })?;
    let template = self
      .store
      .get_prompt(prompt)
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::NotFound { doctype: "AI Prompt", name: prompt.to_owned() })?;

    let fulltext = match &doc.document_fulltext {
      Some(text) => text.clone(),
      None => self
        .store
        .get_source_document(&doc.name)
        .await
        .map_err(store_err)?
        .map(|d| d.fulltext)
        .unwrap_or_default(),
    };
    let effective_prompt = template.effective_prompt(&fulltext);

    let response = match template.output_mode {
      OutputMode::StructuredJson => {
        let function = FunctionSpec {
          system:      INVOICE_SYSTEM_PROMPT.to_owned(),
          name:        INVOICE_FUNCTION.to_owned(),
          description: INVOICE_FUNCTION_DESCRIPTION.to_owned(),
          parameters:  template
            .json_schema
            .clone()
            .unwrap_or_else(|| json!({ "type": "object" })),
        };
        self
          .model
          .call_function(&config.api_key, &effective_prompt, &function)
          .await
      }
      OutputMode::Chat => self.model.chat(&config.api_key, &effective_prompt).await,
    }
    .map_err(|e| Error::Llm(Box::new(e)))?
    .unwrap_or_default();

    let extraction = extract_json(&response);
    if !extraction.is_json() {
      tracing::warn!("model response carried no usable JSON");
    }

    let query = self
      .store
      .insert_query(NewAiQuery {
        document_type: template.for_doctype.clone(),
        source_doc: doc.name.clone(),
        ai: config.name.clone(),
        prompt: template.name.clone(),
        effective_prompt,
        ai_response: response.trim().to_owned(),
        ai_response_json: extraction.into_stored(),
      })
      .await
      .map_err(store_err)?;

    let updated = self
      .store
      .set_source_document_status(&doc.name, DocumentStatus::AiResponseReceived)
      .await
      .map_err(store_err)?;
    if !updated {
      tracing::warn!("source document not found; status left unchanged");
    }

    tracing::info!(query = %query.name, "AI query recorded");
    Ok(query)
  }
}
