/// OpenAI chat-completions provider
///
/// Requests a JSON object reply and hands the parsed content to the
/// normalizer, since the model may wrap the array under an arbitrary key.
use reqwest::Client as HttpClient;
use serde_json::Value;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        ChatCompletionRequest, ChatCompletionResponse, ChatMessage, MovieRecord, Prompt,
        ResponseFormat,
    },
    services::{normalize::normalize, providers::RecommendationProvider},
};

use super::{provider_error, TEMPERATURE};

const REQUEST_FAILED: &str = "OpenAI API request failed";

const SYSTEM_MESSAGE: &str = "You are a world-class movie recommendation engine. You must respond ONLY with a JSON array of 8 movie objects. Each object MUST have: title, year, rating (x.x/10), trailerLink (YouTube link), description (2 sentences), and genre (array).";

#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(http_client: HttpClient, config: &Config, api_key: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url: config.openai_api_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
        }
    }

    fn chat_request(&self, prompt: &Prompt) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_MESSAGE),
                ChatMessage::user(prompt.as_str()),
            ],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
            temperature: TEMPERATURE,
        }
    }
}

#[async_trait::async_trait]
impl RecommendationProvider for OpenAiProvider {
    async fn recommend(&self, prompt: &Prompt) -> AppResult<Vec<MovieRecord>> {
        let url = format!("{}/v1/chat/completions", self.api_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.chat_request(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                provider = "openai",
                "OpenAI request failed"
            );
            return Err(provider_error(status, &body, REQUEST_FAILED));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AppError::UnrecognizedResponseShape)?;

        let parsed: Value = serde_json::from_str(&content)?;
        let records = normalize(parsed).inspect_err(|_| {
            tracing::error!(
                payload = %content,
                provider = "openai",
                "Invalid response format from OpenAI"
            );
        })?;

        tracing::info!(
            model = %self.model,
            results = records.len(),
            provider = "openai",
            "Recommendations received"
        );

        Ok(records)
    }

    fn surface_error(&self, error: AppError) -> AppError {
        tracing::error!(error = %error, provider = "openai", "OpenAI error");
        match error {
            e if e.is_transient() => AppError::QuotaExceeded,
            AppError::Provider { message, .. } => AppError::ProviderRequestFailed(message),
            other => other,
        }
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_provider() -> OpenAiProvider {
        OpenAiProvider::new(HttpClient::new(), &Config::default(), "sk-test".to_string())
    }

    #[test]
    fn test_chat_request_shape() {
        let provider = create_test_provider();
        let prompt = Prompt::new("Recommend 8 movies for a \"Dark\" mood.".to_string());
        let body = serde_json::to_value(provider.chat_request(&prompt)).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("JSON array of 8 movie objects"));
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], prompt.as_str());
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_surface_error_keeps_provider_message() {
        let provider = create_test_provider();
        let err = provider.surface_error(AppError::Provider {
            status: Some(401),
            code: Some("invalid_api_key".to_string()),
            message: "Incorrect API key provided".to_string(),
        });

        match err {
            AppError::ProviderRequestFailed(message) => {
                assert_eq!(message, "Incorrect API key provided")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_surface_error_maps_rate_limit_to_quota() {
        let provider = create_test_provider();
        let err = provider.surface_error(AppError::Provider {
            status: Some(429),
            code: Some("rate_limit_exceeded".to_string()),
            message: "Rate limit reached".to_string(),
        });
        assert!(matches!(err, AppError::QuotaExceeded));
    }
}
