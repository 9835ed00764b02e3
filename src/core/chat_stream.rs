use futures_util::StreamExt;
use memchr::memchr;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{
    ChatMessage, ChatRequest, ChatResponse, CompletionResponse, GenerateContentRequest,
    GenerateContentResponse,
};
use crate::core::message::ApiMessage;
use crate::core::providers::{ProviderError, StreamSink};
use crate::utils::url::{construct_api_url, construct_gemini_url};

/// Everything a spawned request needs, cloned out of the provider.
#[derive(Clone)]
pub struct StreamTarget {
    pub client: Client,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseLine {
    Chunk(String),
    Done,
    Error(String),
    Ignore,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

pub(crate) fn parse_openai_line(line: &str) -> SseLine {
    let Some(payload) = extract_data_payload(line) else {
        return SseLine::Ignore;
    };
    if payload == "[DONE]" {
        return SseLine::Done;
    }
    if payload.trim().is_empty() {
        return SseLine::Ignore;
    }
    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => response
            .choices
            .first()
            .and_then(|choice| choice.delta.content.clone())
            .map(SseLine::Chunk)
            .unwrap_or(SseLine::Ignore),
        Err(_) => SseLine::Error(format_api_error(payload)),
    }
}

pub(crate) fn parse_gemini_line(line: &str) -> SseLine {
    let Some(payload) = extract_data_payload(line) else {
        return SseLine::Ignore;
    };
    if payload.trim().is_empty() {
        return SseLine::Ignore;
    }
    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(_) => return SseLine::Error(format_api_error(payload)),
    };
    if value.get("error").is_some() {
        return SseLine::Error(format_api_error(payload));
    }
    match serde_json::from_value::<GenerateContentResponse>(value) {
        Ok(response) => response
            .text()
            .filter(|text| !text.is_empty())
            .map(SseLine::Chunk)
            .unwrap_or(SseLine::Ignore),
        Err(_) => SseLine::Error(format_api_error(payload)),
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

pub(crate) fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            if let Some(summary) = extract_error_summary(&json_value) {
                if !summary.is_empty() {
                    return format!("API Error: {}\n```json\n{}\n```", summary, pretty_json);
                }
            }
            return format!("API Error:\n```json\n{}\n```", pretty_json);
        }
    }

    format!("API Error:\n```\n{}\n```", trimmed)
}

async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    debug!(%status, "provider returned an error status");
    ProviderError::Api(format!("HTTP {}: {}", status.as_u16(), format_api_error(&body)))
}

/// Feed an SSE byte stream line by line into `on_line` until it asks to stop.
async fn pump_sse_lines<F>(response: reqwest::Response, mut on_line: F) -> Result<(), ProviderError>
where
    F: FnMut(&str) -> Result<bool, ProviderError>,
{
    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);

        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let keep_going = match std::str::from_utf8(&buffer[..newline_pos]) {
                Ok(line) => on_line(line.trim())?,
                Err(e) => {
                    debug!("skipping invalid UTF-8 in stream: {e}");
                    true
                }
            };
            buffer.drain(..=newline_pos);
            if !keep_going {
                return Ok(());
            }
        }
    }

    if let Ok(rest) = std::str::from_utf8(&buffer) {
        if !rest.trim().is_empty() {
            on_line(rest.trim())?;
        }
    }
    Ok(())
}

fn apply_line(parsed: SseLine, sink: &mut StreamSink) -> Result<bool, ProviderError> {
    match parsed {
        SseLine::Chunk(text) => {
            sink.chunk(&text);
            Ok(true)
        }
        SseLine::Done => Ok(false),
        SseLine::Error(message) => Err(ProviderError::Api(message)),
        SseLine::Ignore => Ok(true),
    }
}

async fn openai_stream_body(
    target: &StreamTarget,
    history: &[ApiMessage],
    sink: &mut StreamSink,
) -> Result<(), ProviderError> {
    let request = ChatRequest {
        model: target.model.clone(),
        messages: history.iter().map(ChatMessage::from).collect(),
        stream: true,
    };
    let response = target
        .client
        .post(construct_api_url(&target.base_url, "chat/completions"))
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", target.api_key))
        .json(&request)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }

    pump_sse_lines(response, |line| apply_line(parse_openai_line(line), sink)).await
}

async fn gemini_stream_body(
    target: &StreamTarget,
    history: &[ApiMessage],
    sink: &mut StreamSink,
) -> Result<(), ProviderError> {
    let endpoint = format!("models/{}:streamGenerateContent", target.model);
    let response = target
        .client
        .post(construct_gemini_url(
            &target.base_url,
            &endpoint,
            &target.api_key,
            true,
        ))
        .json(&GenerateContentRequest::from_history(history))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }

    pump_sse_lines(response, |line| apply_line(parse_gemini_line(line), sink)).await
}

pub fn spawn_openai_stream(
    target: StreamTarget,
    history: Vec<ApiMessage>,
    mut sink: StreamSink,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let outcome = tokio::select! {
            result = openai_stream_body(&target, &history, &mut sink) => Some(result),
            _ = cancel.cancelled() => None,
        };
        finish_stream(sink, outcome);
    });
}

pub fn spawn_gemini_stream(
    target: StreamTarget,
    history: Vec<ApiMessage>,
    mut sink: StreamSink,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let outcome = tokio::select! {
            result = gemini_stream_body(&target, &history, &mut sink) => Some(result),
            _ = cancel.cancelled() => None,
        };
        finish_stream(sink, outcome);
    });
}

/// Cancellation (`None`) drops the request future and completes with the
/// text received so far.
fn finish_stream(sink: StreamSink, outcome: Option<Result<(), ProviderError>>) {
    match outcome {
        Some(Ok(())) | None => sink.complete(None),
        Some(Err(err)) => sink.fail(err.to_string()),
    }
}

pub async fn complete_openai(
    target: &StreamTarget,
    history: &[ApiMessage],
) -> Result<String, ProviderError> {
    let request = ChatRequest {
        model: target.model.clone(),
        messages: history.iter().map(ChatMessage::from).collect(),
        stream: false,
    };
    let response = target
        .client
        .post(construct_api_url(&target.base_url, "chat/completions"))
        .header("Authorization", format!("Bearer {}", target.api_key))
        .json(&request)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    let body = response.text().await?;
    let parsed: CompletionResponse = serde_json::from_str(&body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ProviderError::EmptyResponse)
}

pub async fn complete_gemini(
    target: &StreamTarget,
    history: &[ApiMessage],
) -> Result<String, ProviderError> {
    let endpoint = format!("models/{}:generateContent", target.model);
    let response = target
        .client
        .post(construct_gemini_url(
            &target.base_url,
            &endpoint,
            &target.api_key,
            false,
        ))
        .json(&GenerateContentRequest::from_history(history))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    let body = response.text().await?;
    let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
    parsed
        .text()
        .filter(|text| !text.trim().is_empty())
        .ok_or(ProviderError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::providers::{StreamEnvelope, StreamEvent};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    #[test]
    fn openai_lines_handle_spacing_variants() {
        assert_eq!(
            parse_openai_line(r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#),
            SseLine::Chunk("Hello".into())
        );
        assert_eq!(
            parse_openai_line(r#"data:{"choices":[{"delta":{"content":"World"}}]}"#),
            SseLine::Chunk("World".into())
        );
        assert_eq!(parse_openai_line("data: [DONE]"), SseLine::Done);
        assert_eq!(parse_openai_line("data:[DONE]"), SseLine::Done);
        assert_eq!(parse_openai_line(": keep-alive"), SseLine::Ignore);
        assert_eq!(
            parse_openai_line(r#"data: {"choices":[{"delta":{}}]}"#),
            SseLine::Ignore
        );
    }

    #[test]
    fn openai_error_payloads_become_errors() {
        let parsed = parse_openai_line(r#"data: {"error":{"message":"internal server error"}}"#);
        let expected = r#"API Error: internal server error
```json
{
  "error": {
    "message": "internal server error"
  }
}
```"#;
        assert_eq!(parsed, SseLine::Error(expected.to_string()));
    }

    #[test]
    fn gemini_lines_yield_text_and_errors() {
        assert_eq!(
            parse_gemini_line(
                r#"data: {"candidates":[{"content":{"role":"model","parts":[{"text":"Hi "}]}}]}"#
            ),
            SseLine::Chunk("Hi ".into())
        );
        assert_eq!(
            parse_gemini_line(r#"data: {"candidates":[{"finishReason":"STOP"}]}"#),
            SseLine::Ignore
        );
        match parse_gemini_line(
            r#"data: {"error":{"code":404,"message":"models/foo is not found","status":"NOT_FOUND"}}"#,
        ) {
            SseLine::Error(text) => assert!(text.starts_with("API Error: models/foo is not found")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn format_api_error_handles_json_without_summary_and_plaintext() {
        assert_eq!(
            format_api_error(r#"{"status":"failed"}"#),
            "API Error:\n```json\n{\n  \"status\": \"failed\"\n}\n```"
        );
        assert_eq!(
            format_api_error("api failure"),
            "API Error:\n```\napi failure\n```"
        );
        assert_eq!(format_api_error("  "), "API Error:\n```\n<empty>\n```");
    }

    #[test]
    fn apply_line_routes_into_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel::<StreamEnvelope>();
        let id = Uuid::new_v4();
        let mut sink = StreamSink::new(tx, id);

        assert!(apply_line(SseLine::Chunk("Hel".into()), &mut sink).unwrap());
        assert!(apply_line(SseLine::Ignore, &mut sink).unwrap());
        assert!(!apply_line(SseLine::Done, &mut sink).unwrap());
        assert!(apply_line(SseLine::Error("bad".into()), &mut sink).is_err());
        finish_stream(sink, None);

        assert_eq!(rx.try_recv().unwrap().0, StreamEvent::Chunk("Hel".into()));
        assert_eq!(
            rx.try_recv().unwrap().0,
            StreamEvent::Completed("Hel".into())
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn finish_stream_reports_errors_once() {
        let (tx, mut rx) = mpsc::unbounded_channel::<StreamEnvelope>();
        let sink = StreamSink::new(tx, Uuid::new_v4());
        finish_stream(sink, Some(Err(ProviderError::Api("API Error: nope".into()))));
        assert_eq!(
            rx.try_recv().unwrap().0,
            StreamEvent::Errored("API Error: nope".into())
        );
        assert!(rx.try_recv().is_err());
    }
}
