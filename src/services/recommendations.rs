use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppResult,
    models::{
        MovieRecord, Prompt, ProviderConfig, ProviderKind, SearchMode, SearchRequest,
        WebSourceResult,
    },
    services::{
        prompt,
        providers::{self, GeminiProvider, RecommendationProvider},
        retry::RetryPolicy,
        sources,
    },
};

/// Entry point for recommendation requests.
///
/// Holds no per-request state: every call builds its provider from the
/// selection it is given, so one instance can be shared freely.
#[derive(Clone)]
pub struct Recommender {
    config: Arc<Config>,
    http_client: HttpClient,
    retry: RetryPolicy,
}

impl Recommender {
    pub fn new(config: Config) -> Self {
        Self::with_client(config, HttpClient::new())
    }

    pub fn with_client(config: Config, http_client: HttpClient) -> Self {
        Self {
            retry: RetryPolicy::from_config(&config),
            config: Arc::new(config),
            http_client,
        }
    }

    /// Builds a recommender from environment configuration
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(Config::from_env()?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Retry schedule applied to calls against `provider`
    pub fn retry_policy_for(&self, provider: ProviderKind) -> RetryPolicy {
        match provider {
            ProviderKind::Gemini => self.retry,
            ProviderKind::OpenAi if self.config.retry_all_providers => self.retry,
            ProviderKind::OpenAi => RetryPolicy::none(),
        }
    }

    /// Validates `request`, renders its prompt and dispatches it
    pub async fn recommend(
        &self,
        request: &SearchRequest,
        selection: &ProviderConfig,
    ) -> AppResult<Vec<MovieRecord>> {
        let prompt = prompt::build(request)?;
        self.dispatch(&prompt, selection).await
    }

    /// Sends an already rendered prompt to the selected provider
    pub async fn dispatch(
        &self,
        prompt: &Prompt,
        selection: &ProviderConfig,
    ) -> AppResult<Vec<MovieRecord>> {
        let provider = providers::create_provider(&self.config, &self.http_client, selection)?;
        let span = tracing::info_span!(
            "recommendation",
            request_id = %Uuid::new_v4(),
            provider = provider.name(),
        );

        dispatch_with(
            provider.as_ref(),
            self.retry_policy_for(selection.provider),
            prompt,
        )
        .instrument(span)
        .await
    }

    /// Source links for a movie, restricted to `websites` when possible
    pub async fn find_sources(&self, movie_title: &str, websites: &[String]) -> Vec<WebSourceResult> {
        let gemini = GeminiProvider::new(self.http_client.clone(), &self.config);
        sources::find_sources(&gemini, self.retry, movie_title, websites).await
    }
}

/// Runs one provider call under `retry` and surfaces whatever failure remains
pub async fn dispatch_with(
    provider: &dyn RecommendationProvider,
    retry: RetryPolicy,
    prompt: &Prompt,
) -> AppResult<Vec<MovieRecord>> {
    tracing::debug!(provider = provider.name(), "Dispatching recommendation prompt");

    retry
        .execute(|| provider.recommend(prompt))
        .await
        .map_err(|e| provider.surface_error(e))
}

/// Flat parameter set accepted from the UI layer
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationParams {
    pub mode: SearchMode,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub story_query: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub openai_key: Option<String>,
    #[serde(default)]
    pub exclude_titles: Vec<String>,
}

impl RecommendationParams {
    pub fn into_parts(self) -> (SearchRequest, ProviderConfig) {
        let request = SearchRequest {
            mode: self.mode,
            genres: self.genres,
            query: self.query,
            mood: self.mood,
            story_query: self.story_query,
            exclude_titles: self.exclude_titles,
        };
        let selection = ProviderConfig {
            provider: self.provider,
            credential: self.openai_key,
        };
        (request, selection)
    }
}

/// Recommendation call for the UI layer; errors arrive as display strings
pub async fn get_recommendations(
    recommender: &Recommender,
    params: RecommendationParams,
) -> Result<Vec<MovieRecord>, String> {
    let (request, selection) = params.into_parts();
    recommender
        .recommend(&request, &selection)
        .await
        .map_err(|e| e.user_message())
}

/// Source-link search for the UI layer; never fails
pub async fn get_movie_sources(
    recommender: &Recommender,
    movie_title: &str,
    websites: &[String],
) -> Vec<WebSourceResult> {
    recommender.find_sources(movie_title, websites).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{AppError, ValidationError},
        services::providers::MockRecommendationProvider,
    };
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    fn movies(count: usize) -> Vec<MovieRecord> {
        (0..count)
            .map(|i| MovieRecord {
                title: format!("Movie {i}"),
                ..Default::default()
            })
            .collect()
    }

    fn quota_error() -> AppError {
        AppError::Provider {
            status: Some(429),
            code: Some("RESOURCE_EXHAUSTED".to_string()),
            message: "Resource has been exhausted".to_string(),
        }
    }

    fn mock_provider() -> MockRecommendationProvider {
        let mut provider = MockRecommendationProvider::new();
        provider.expect_name().return_const("mock");
        provider
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_success_makes_one_call() {
        let mut provider = mock_provider();
        provider
            .expect_recommend()
            .times(1)
            .returning(|_| Ok(movies(8)));
        provider.expect_surface_error().never();

        let prompt = prompt::build(&SearchRequest::for_mood("Dark")).unwrap();
        let result = dispatch_with(&provider, RetryPolicy::default(), &prompt).await;

        assert_eq!(assert_ok!(result).len(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried_then_succeed() {
        let mut provider = mock_provider();
        let mut seq = mockall::Sequence::new();
        provider
            .expect_recommend()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(quota_error()));
        provider
            .expect_recommend()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(movies(8)));

        let prompt = prompt::build(&SearchRequest::similar_to("Heat")).unwrap();
        let result = dispatch_with(&provider, RetryPolicy::default(), &prompt).await;

        assert_eq!(result.unwrap().len(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_quota_is_surfaced_by_provider() {
        let mut provider = mock_provider();
        provider
            .expect_recommend()
            .times(3)
            .returning(|_| Err(quota_error()));
        provider
            .expect_surface_error()
            .times(1)
            .withf(|e| e.is_transient())
            .returning(|_| AppError::QuotaExceeded);

        let prompt = prompt::build(&SearchRequest::by_genres(["Horror"])).unwrap();
        let result = dispatch_with(&provider, RetryPolicy::default(), &prompt).await;

        assert!(matches!(assert_err!(result), AppError::QuotaExceeded));
    }

    #[tokio::test]
    async fn test_prompt_is_forwarded_verbatim() {
        let prompt = prompt::build(&SearchRequest::by_story("a heist by retired magicians")).unwrap();

        let mut provider = mock_provider();
        provider
            .expect_recommend()
            .with(eq(prompt.clone()))
            .times(1)
            .returning(|_| Ok(movies(1)));

        assert_ok!(dispatch_with(&provider, RetryPolicy::none(), &prompt).await);
    }

    #[tokio::test]
    async fn test_validation_error_precedes_credential_check() {
        let recommender = Recommender::new(Config::default());
        let selection = ProviderConfig::new(ProviderKind::OpenAi);

        let result = recommender
            .recommend(&SearchRequest::similar_to("  "), &selection)
            .await;
        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::EmptyQuery))
        ));

        let result = recommender
            .recommend(&SearchRequest::similar_to("Heat"), &selection)
            .await;
        assert!(matches!(result, Err(AppError::MissingCredential)));
    }

    #[test]
    fn test_retry_policy_for_providers() {
        let recommender = Recommender::new(Config::default());
        assert_eq!(
            recommender.retry_policy_for(ProviderKind::OpenAi),
            recommender.retry_policy_for(ProviderKind::Gemini)
        );

        let literal = Recommender::new(Config {
            retry_all_providers: false,
            ..Config::default()
        });
        assert_eq!(literal.retry_policy_for(ProviderKind::OpenAi).max_attempts, 1);
        assert_eq!(literal.retry_policy_for(ProviderKind::Gemini).max_attempts, 3);
    }

    #[tokio::test]
    async fn test_boundary_renders_error_string() {
        let recommender = Recommender::new(Config::default());
        let params = RecommendationParams {
            mode: SearchMode::Genre,
            ..Default::default()
        };

        let result = get_recommendations(&recommender, params).await;
        assert_eq!(result.unwrap_err(), "Select some genres first");
    }

    #[test]
    fn test_params_deserialize_from_ui_shape() {
        let params: RecommendationParams = serde_json::from_value(serde_json::json!({
            "mode": "story",
            "storyQuery": "space opera",
            "provider": "openai",
            "openaiKey": "sk-1",
            "excludeTitles": ["Dune"]
        }))
        .unwrap();

        let (request, selection) = params.into_parts();
        assert_eq!(request.mode, SearchMode::Story);
        assert_eq!(request.story_query, "space opera");
        assert_eq!(request.exclude_titles, vec!["Dune"]);
        assert_eq!(selection.provider, ProviderKind::OpenAi);
        assert_eq!(selection.credential(), Some("sk-1"));
    }
}
