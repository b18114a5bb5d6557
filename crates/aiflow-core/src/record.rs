//! AI-side records: provider configs, prompt templates, query results, and the
//! source documents whose text feeds a prompt.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── AI config ───────────────────────────────────────────────────────────────

/// The LLM provider interface an [`AiConfig`] talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AiInterface {
  /// An OpenAI-compatible chat-completions endpoint.
  OpenAi,
  /// Any interface name this crate has no client for.
  Other(String),
}

impl AiInterface {
  pub fn as_str(&self) -> &str {
    match self {
      Self::OpenAi => "openAI",
      Self::Other(s) => s.as_str(),
    }
  }
}

impl From<String> for AiInterface {
  fn from(s: String) -> Self {
    if s == "openAI" { Self::OpenAi } else { Self::Other(s) }
  }
}

impl From<AiInterface> for String {
  fn from(i: AiInterface) -> Self { i.as_str().to_owned() }
}

/// A stored record naming an LLM provider, its API key and interface.
#[derive(Clone, Serialize, Deserialize)]
pub struct AiConfig {
  pub name:      String,
  pub api_key:   String,
  pub interface: AiInterface,
}

impl fmt::Debug for AiConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AiConfig")
      .field("name", &self.name)
      .field("api_key", &"<redacted>")
      .field("interface", &self.interface)
      .finish()
  }
}

// ─── Prompt template ─────────────────────────────────────────────────────────

/// How the model is asked to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputMode {
  /// Plain chat completion; the answer is free text.
  #[default]
  Chat,
  /// Schema-constrained function call; the answer is the call's arguments.
  #[serde(rename = "Structured Output (JSON)")]
  StructuredJson,
}

impl OutputMode {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Chat => "Chat",
      Self::StructuredJson => "Structured Output (JSON)",
    }
  }

  /// Unknown or empty modes fall back to [`OutputMode::Chat`].
  pub fn parse(s: &str) -> Self {
    if s == Self::StructuredJson.as_str() {
      Self::StructuredJson
    } else {
      Self::Chat
    }
  }
}

/// Stored instruction text plus output mode and optional JSON schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiPrompt {
  pub name:        String,
  pub text:        String,
  #[serde(default)]
  pub output_mode: OutputMode,
  /// JSON schema handed to the model in structured mode.
  #[serde(default)]
  pub json_schema: Option<serde_json::Value>,
  /// The document type this prompt produces, e.g. `"Purchase Invoice"`.
  #[serde(default)]
  pub for_doctype: String,
}

impl AiPrompt {
  /// The prompt actually sent: instruction text, a blank line, the document
  /// text.
  pub fn effective_prompt(&self, fulltext: &str) -> String {
    format!("{}\n\n{}", self.text, fulltext)
  }
}

// ─── Source document ─────────────────────────────────────────────────────────

/// Workflow status carried on a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DocumentStatus {
  #[default]
  Pending,
  #[serde(rename = "AI-Response-Received")]
  AiResponseReceived,
  #[serde(rename = "Workflow-Successful")]
  WorkflowSuccessful,
  #[serde(rename = "Destination-Document-Cancelled")]
  DestinationDocumentCancelled,
}

impl DocumentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "Pending",
      Self::AiResponseReceived => "AI-Response-Received",
      Self::WorkflowSuccessful => "Workflow-Successful",
      Self::DestinationDocumentCancelled => "Destination-Document-Cancelled",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "Pending" => Ok(Self::Pending),
      "AI-Response-Received" => Ok(Self::AiResponseReceived),
      "Workflow-Successful" => Ok(Self::WorkflowSuccessful),
      "Destination-Document-Cancelled" => {
        Ok(Self::DestinationDocumentCancelled)
      }
      other => Err(Error::UnknownStatus(other.to_owned())),
    }
  }
}

/// The originating business document (e.g. a scanned invoice).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
  pub name:        String,
  /// Text extracted from the scan by the document server.
  #[serde(default)]
  pub fulltext:    String,
  #[serde(default)]
  pub status:      DocumentStatus,
  /// The document's id on the external document server, if known.
  #[serde(default)]
  pub external_id: Option<i64>,
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// The persisted record of one AI invocation and its parsed result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiQuery {
  pub name:             String,
  pub document_type:    String,
  pub source_doc:       String,
  pub ai:               String,
  pub prompt:           String,
  pub effective_prompt: String,
  pub ai_response:      String,
  /// Pretty-printed JSON, or a marker/error string when extraction failed.
  pub ai_response_json: String,
  pub supplier:         Option<String>,
  /// The purchase invoice created from this query.
  pub document:         Option<String>,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::ErpStore::insert_query`]. The name and creation
/// timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAiQuery {
  pub document_type:    String,
  pub source_doc:       String,
  pub ai:               String,
  pub prompt:           String,
  pub effective_prompt: String,
  pub ai_response:      String,
  pub ai_response_json: String,
}
