use crate::{
    error::AppResult,
    models::{MovieRecord, ProviderConfig, SearchRequest},
    services::recommendations::Recommender,
};

/// Titles already shown, in display order
pub fn exclusion_titles(prior_results: &[MovieRecord]) -> Vec<String> {
    prior_results.iter().map(|m| m.title.clone()).collect()
}

/// Copy of `request` whose exclusion list is the titles of `prior_results`
pub fn next_page_request(prior_results: &[MovieRecord], request: &SearchRequest) -> SearchRequest {
    request.with_exclusions(exclusion_titles(prior_results))
}

/// Fetches another batch for the same search, asking the provider to skip
/// everything in `prior_results`.
///
/// The returned batch is not filtered against `prior_results`; exclusion is
/// only requested in the prompt. Callers must not overlap calls.
pub async fn load_more(
    recommender: &Recommender,
    prior_results: &[MovieRecord],
    request: &SearchRequest,
    selection: &ProviderConfig,
) -> AppResult<Vec<MovieRecord>> {
    let next = next_page_request(prior_results, request);
    tracing::debug!(
        excluded = next.exclude_titles.len(),
        "Loading more recommendations"
    );
    recommender.recommend(&next, selection).await
}
