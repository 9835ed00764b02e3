use crate::api::{GeminiModelsResponse, ModelInfo, ModelsResponse};
use crate::core::chat_stream::format_api_error;
use crate::core::providers::ProviderError;
use crate::utils::url::{construct_api_url, construct_gemini_url};

async fn checked_body(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::Api(format!(
            "HTTP {}: {}",
            status.as_u16(),
            format_api_error(&body)
        )));
    }
    Ok(body)
}

pub async fn fetch_openai_models(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
) -> Result<Vec<String>, ProviderError> {
    let response = client
        .get(construct_api_url(base_url, "models"))
        .header("Authorization", format!("Bearer {api_key}"))
        .send()
        .await?;
    let body = checked_body(response).await?;
    let mut parsed: ModelsResponse = serde_json::from_str(&body)?;
    sort_models(&mut parsed.data);
    Ok(parsed.data.into_iter().map(|m| m.id).collect())
}

pub async fn fetch_gemini_models(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
) -> Result<Vec<String>, ProviderError> {
    let response = client
        .get(construct_gemini_url(base_url, "models", api_key, false))
        .send()
        .await?;
    let body = checked_body(response).await?;
    let parsed: GeminiModelsResponse = serde_json::from_str(&body)?;
    Ok(gemini_chat_model_ids(parsed))
}

/// Newest first by creation date, then by id.
pub fn sort_models(models: &mut [ModelInfo]) {
    models.sort_by(|a, b| match (a.created, b.created) {
        (Some(a_created), Some(b_created)) => b_created.cmp(&a_created).then(a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
}

/// Models that can generate content, with the `models/` prefix removed.
fn gemini_chat_model_ids(response: GeminiModelsResponse) -> Vec<String> {
    response
        .models
        .into_iter()
        .filter(|m| {
            m.supported_generation_methods.is_empty()
                || m
                    .supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
        })
        .map(|m| {
            m.name
                .strip_prefix("models/")
                .map(str::to_string)
                .unwrap_or(m.name)
        })
        .collect()
}
