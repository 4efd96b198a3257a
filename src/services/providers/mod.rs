/// Language-model provider abstraction
///
/// Each provider turns a rendered prompt into movie records using its own
/// wire format. Retry and error surfacing are applied uniformly by the
/// caller through [`RecommendationProvider::surface_error`].
use reqwest::{Client as HttpClient, StatusCode};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{ApiErrorEnvelope, MovieRecord, Prompt, ProviderConfig, ProviderKind},
};

pub mod gemini;
pub mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Sampling temperature used for every recommendation call
pub const TEMPERATURE: f32 = 0.7;

/// Trait for recommendation backends
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Single attempt at producing recommendations for a prompt.
    ///
    /// Rate-limit failures must come back as errors for which
    /// [`AppError::is_transient`] holds so the caller can retry them.
    async fn recommend(&self, prompt: &Prompt) -> AppResult<Vec<MovieRecord>>;

    /// Maps a failure that survived retries to the error reported to callers
    fn surface_error(&self, error: AppError) -> AppError;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Builds the provider selected by `selection`.
///
/// OpenAI needs a credential, taken from the selection or else from the
/// environment config; without one this fails before any request is sent.
pub fn create_provider(
    config: &Config,
    http_client: &HttpClient,
    selection: &ProviderConfig,
) -> AppResult<Box<dyn RecommendationProvider>> {
    match selection.provider {
        ProviderKind::Gemini => Ok(Box::new(GeminiProvider::new(http_client.clone(), config))),
        ProviderKind::OpenAi => {
            let api_key = selection
                .credential()
                .or_else(|| {
                    config
                        .openai_api_key
                        .as_deref()
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                })
                .ok_or(AppError::MissingCredential)?;

            Ok(Box::new(OpenAiProvider::new(
                http_client.clone(),
                config,
                api_key.to_string(),
            )))
        }
    }
}

/// Builds an [`AppError::Provider`] from a non-2xx response body.
pub(crate) fn provider_error(status: StatusCode, body: &str, fallback: &str) -> AppError {
    let error = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .unwrap_or_default();

    AppError::Provider {
        status: Some(status.as_u16()),
        code: error.code_token(),
        message: error
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    }
}
