/// Gemini provider
///
/// Uses schema-constrained generation so the model replies with a JSON array
/// shaped like [`MovieRecord`]. The same endpoint, with only the Google Search
/// tool attached, backs the source-link search.
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        GeminiContent, GeminiGenerationConfig, GeminiRequest, GeminiResponse,
        GeminiThinkingConfig, GeminiTool, MovieRecord, Prompt,
    },
    services::{normalize::records_from_values, providers::RecommendationProvider},
};

use super::{provider_error, TEMPERATURE};

const REQUEST_FAILED: &str = "Gemini API request failed";

/// Response schema matching [`MovieRecord`]
fn movie_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING", "description": "The title of the movie." },
                "year": { "type": "STRING", "description": "The release year." },
                "rating": { "type": "STRING", "description": "The rating out of 10, e.g., 8.5/10." },
                "trailerLink": { "type": "STRING", "description": "A direct link to the official trailer on YouTube." },
                "description": { "type": "STRING", "description": "A short 2-sentence synopsis." },
                "genre": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "The genres of the movie."
                }
            },
            "required": ["title", "year", "rating", "trailerLink", "description", "genre"]
        }
    })
}

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    model: String,
    grounding: bool,
}

impl GeminiProvider {
    pub fn new(http_client: HttpClient, config: &Config) -> Self {
        Self {
            http_client,
            api_key: config.gemini_api_key.clone(),
            api_url: config.gemini_api_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            grounding: config.gemini_grounding,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        )
    }

    fn recommendation_request(&self, prompt: &Prompt) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent::user(prompt.as_str())],
            generation_config: Some(GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: movie_schema(),
                temperature: TEMPERATURE,
                thinking_config: GeminiThinkingConfig { thinking_budget: 0 },
            }),
            tools: if self.grounding {
                vec![GeminiTool::default()]
            } else {
                Vec::new()
            },
        }
    }

    /// Issues one generateContent call
    pub async fn generate(&self, body: &GeminiRequest) -> AppResult<GeminiResponse> {
        let mut request = self.http_client.post(self.endpoint()).json(body);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-goog-api-key", api_key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                provider = "gemini",
                "Gemini request failed"
            );
            return Err(provider_error(status, &body, REQUEST_FAILED));
        }

        Ok(response.json().await?)
    }

    /// Grounded search with no response schema, used for source links
    pub async fn search(&self, prompt: &str) -> AppResult<GeminiResponse> {
        let body = GeminiRequest {
            contents: vec![GeminiContent::user(prompt)],
            generation_config: None,
            tools: vec![GeminiTool::default()],
        };
        self.generate(&body).await
    }
}

#[async_trait::async_trait]
impl RecommendationProvider for GeminiProvider {
    async fn recommend(&self, prompt: &Prompt) -> AppResult<Vec<MovieRecord>> {
        let response = self.generate(&self.recommendation_request(prompt)).await?;

        let text = response.text().ok_or_else(|| {
            tracing::error!(provider = "gemini", "Gemini response carried no text");
            AppError::UnrecognizedResponseShape
        })?;

        let records = match serde_json::from_str::<Value>(text.trim())? {
            Value::Array(items) => records_from_values(items),
            other => {
                tracing::error!(
                    payload = %other,
                    provider = "gemini",
                    "Gemini reply is not a JSON array"
                );
                return Err(AppError::UnrecognizedResponseShape);
            }
        };

        tracing::info!(
            model = %self.model,
            results = records.len(),
            provider = "gemini",
            "Recommendations received"
        );

        Ok(records)
    }

    fn surface_error(&self, error: AppError) -> AppError {
        tracing::error!(error = %error, provider = "gemini", "Gemini API error");
        if error.is_transient() {
            AppError::QuotaExceeded
        } else {
            AppError::FetchFailed
        }
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
