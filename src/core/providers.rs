//! Provider adapters: the seam between the tutor core and a chat backend.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::models::{fetch_gemini_models, fetch_openai_models};
use crate::core::chat_stream::{
    complete_gemini, complete_openai, spawn_gemini_stream, spawn_openai_stream, StreamTarget,
};
use crate::core::config::Config;
use crate::core::message::ApiMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Gemini",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Gemini => "gemini-2.0-flash",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn api_key_env_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(format!("Unknown provider '{other}'. Use openai or gemini.")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0}")]
    Api(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("The provider returned no text")]
    EmptyResponse,
}

/// Terminal and incremental events of one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Chunk(String),
    Completed(String),
    Errored(String),
}

pub type StreamEnvelope = (StreamEvent, Uuid);

/// Write end of a stream, handed to the adapter task.
///
/// Exactly one terminal event leaves a sink: `complete` and `fail` consume
/// it, and dropping an unfinished sink reports whatever text accumulated as
/// the completion. Cancellation therefore always ends in `Completed`.
pub struct StreamSink {
    tx: mpsc::UnboundedSender<StreamEnvelope>,
    stream_id: Uuid,
    accumulated: String,
    finished: bool,
}

impl StreamSink {
    pub fn new(tx: mpsc::UnboundedSender<StreamEnvelope>, stream_id: Uuid) -> Self {
        Self {
            tx,
            stream_id,
            accumulated: String::new(),
            finished: false,
        }
    }

    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    pub fn chunk(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.accumulated.push_str(text);
        let _ = self
            .tx
            .send((StreamEvent::Chunk(text.to_string()), self.stream_id));
    }

    /// Finish successfully. `full_text` overrides the accumulated chunks for
    /// adapters that post-process the final reply.
    pub fn complete(mut self, full_text: Option<String>) {
        self.finished = true;
        let text = full_text.unwrap_or_else(|| std::mem::take(&mut self.accumulated));
        let _ = self.tx.send((StreamEvent::Completed(text), self.stream_id));
    }

    pub fn fail(mut self, message: String) {
        self.finished = true;
        let _ = self.tx.send((StreamEvent::Errored(message), self.stream_id));
    }
}

impl Drop for StreamSink {
    fn drop(&mut self) {
        if !self.finished {
            let text = std::mem::take(&mut self.accumulated);
            let _ = self.tx.send((StreamEvent::Completed(text), self.stream_id));
        }
    }
}

/// Cancellation handle for an in-flight stream.
#[derive(Debug, Clone)]
pub struct StreamController {
    stream_id: Uuid,
    cancel: CancellationToken,
}

impl StreamController {
    pub fn new(stream_id: Uuid, cancel: CancellationToken) -> Self {
        Self { stream_id, cancel }
    }

    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    pub fn abort(&self) {
        self.cancel.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[async_trait]
pub trait TutorProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// One-shot completion, used for summaries and titles.
    async fn send_message(
        &self,
        model: String,
        history: Vec<ApiMessage>,
    ) -> Result<String, ProviderError>;

    /// Start streaming a reply into `sink`; returns immediately.
    fn stream_message(
        &self,
        model: String,
        history: Vec<ApiMessage>,
        sink: StreamSink,
    ) -> StreamController;

    async fn list_models(&self) -> Result<Vec<String>, ProviderError>;
}

#[derive(Clone)]
struct HttpProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpProvider {
    fn target(&self, model: String) -> StreamTarget {
        StreamTarget {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model,
        }
    }
}

pub struct OpenAiProvider {
    http: HttpProvider,
}

pub struct GeminiProvider {
    http: HttpProvider,
}

#[async_trait]
impl TutorProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn send_message(
        &self,
        model: String,
        history: Vec<ApiMessage>,
    ) -> Result<String, ProviderError> {
        complete_openai(&self.http.target(model), &history).await
    }

    fn stream_message(
        &self,
        model: String,
        history: Vec<ApiMessage>,
        sink: StreamSink,
    ) -> StreamController {
        let cancel = CancellationToken::new();
        let controller = StreamController::new(sink.stream_id(), cancel.clone());
        spawn_openai_stream(self.http.target(model), history, sink, cancel);
        controller
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        fetch_openai_models(&self.http.client, &self.http.base_url, &self.http.api_key).await
    }
}

#[async_trait]
impl TutorProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn send_message(
        &self,
        model: String,
        history: Vec<ApiMessage>,
    ) -> Result<String, ProviderError> {
        complete_gemini(&self.http.target(model), &history).await
    }

    fn stream_message(
        &self,
        model: String,
        history: Vec<ApiMessage>,
        sink: StreamSink,
    ) -> StreamController {
        let cancel = CancellationToken::new();
        let controller = StreamController::new(sink.stream_id(), cancel.clone());
        spawn_gemini_stream(self.http.target(model), history, sink, cancel);
        controller
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        fetch_gemini_models(&self.http.client, &self.http.base_url, &self.http.api_key).await
    }
}

/// Build the adapter for the configured backend. `None` when no API key is
/// available, which the UI reports as a configuration error.
pub fn build_provider(config: &Config) -> Option<Arc<dyn TutorProvider>> {
    let api_key = config.resolved_api_key()?;
    let http = HttpProvider {
        client: Client::new(),
        base_url: config.resolved_base_url(),
        api_key,
    };
    let provider: Arc<dyn TutorProvider> = match config.provider_kind() {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider { http }),
        ProviderKind::Gemini => Arc::new(GeminiProvider { http }),
    };
    Some(provider)
}

/// Extra guidance appended to provider errors the learner can act on.
pub fn provider_error_hint(kind: ProviderKind, message: &str) -> Option<&'static str> {
    let lower = message.to_ascii_lowercase();
    if kind == ProviderKind::Gemini
        && lower.contains("model")
        && (lower.contains("not found") || lower.contains("not_found"))
    {
        return Some("Hint: this Gemini model is not available. Run /models to pick one that is.");
    }
    if lower.contains("model_not_found") || lower.contains("does not exist") {
        return Some("Hint: run /models to choose an available model.");
    }
    if lower.contains("401")
        || lower.contains("invalid api key")
        || lower.contains("incorrect api key")
        || lower.contains("api_key_invalid")
    {
        return Some("Hint: check your API key with `english-tutor set api-key <key>`.");
    }
    if lower.contains("429") || lower.contains("rate limit") || lower.contains("resource_exhausted")
    {
        return Some("Hint: the provider is rate limiting requests. Wait a moment and try again.");
    }
    None
}
