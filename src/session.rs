//! Per-user browsing context.
//!
//! Holds what the UI would otherwise keep in ambient browser storage: the
//! current search inputs, accumulated results, watchlist and saved websites.
//! It is also the scheduling layer that keeps recommendation calls from
//! overlapping.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{MovieRecord, ProviderConfig, ProviderKind, SearchMode, SearchRequest, WebSourceResult},
    services::{pagination, prompt, recommendations::Recommender},
};

/// Serializable session contents, for hosts that persist them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionState {
    pub request: SearchRequest,
    pub provider: ProviderConfig,
    pub results: Vec<MovieRecord>,
    pub watchlist: Vec<MovieRecord>,
    pub websites: Vec<String>,
    #[serde(skip)]
    generation: u64,
}

pub struct BrowseSession {
    recommender: Recommender,
    state: RwLock<SessionState>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a dispatch finishes, however it finishes
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BrowseSession {
    pub fn new(recommender: Recommender) -> Self {
        Self::restore(recommender, SessionState::default())
    }

    pub fn restore(recommender: Recommender, state: SessionState) -> Self {
        Self {
            recommender,
            state: RwLock::new(state),
            in_flight: AtomicBool::new(false),
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn begin(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    /// Runs a fresh search, replacing the current results
    pub async fn search(&self) -> AppResult<Vec<MovieRecord>> {
        let _guard = self.begin().ok_or(AppError::RequestInFlight)?;

        let (request, selection, generation) = {
            let mut state = self.state.write().await;
            prompt::validate(&state.request)?;
            state.results.clear();
            state.generation += 1;
            (
                state.request.with_exclusions(Vec::new()),
                state.provider.clone(),
                state.generation,
            )
        };

        tracing::debug!(mode = ?request.mode, provider = %selection.provider, "Starting search");
        let batch = self.recommender.recommend(&request, &selection).await?;

        let mut state = self.state.write().await;
        if state.generation == generation {
            state.results = batch.clone();
        } else {
            tracing::debug!("Discarding stale search results");
        }
        Ok(batch)
    }

    /// Appends another batch to the current results.
    ///
    /// Ignored (empty batch, nothing dispatched) while another request is in
    /// flight, when there are no results yet, or when the inputs are invalid.
    pub async fn load_more(&self) -> AppResult<Vec<MovieRecord>> {
        let Some(_guard) = self.begin() else {
            tracing::debug!("Load more ignored, request in flight");
            return Ok(Vec::new());
        };

        let (request, selection, prior, generation) = {
            let state = self.state.read().await;
            if state.results.is_empty() || prompt::validate(&state.request).is_err() {
                return Ok(Vec::new());
            }
            (
                state.request.clone(),
                state.provider.clone(),
                state.results.clone(),
                state.generation,
            )
        };

        let batch = pagination::load_more(&self.recommender, &prior, &request, &selection).await?;

        let mut state = self.state.write().await;
        if state.generation == generation {
            state.results.extend(batch.iter().cloned());
        } else {
            tracing::debug!("Discarding stale load-more batch");
        }
        Ok(batch)
    }

    /// Drops the current results; batches still in flight will be discarded
    pub async fn clear_results(&self) {
        let mut state = self.state.write().await;
        state.results.clear();
        state.generation += 1;
    }

    pub async fn results(&self) -> Vec<MovieRecord> {
        self.state.read().await.results.clone()
    }

    pub async fn request(&self) -> SearchRequest {
        self.state.read().await.request.clone()
    }

    pub async fn set_mode(&self, mode: SearchMode) {
        self.state.write().await.request.mode = mode;
    }

    /// Adds or removes a genre and switches to genre mode
    pub async fn toggle_genre(&self, genre: &str) {
        let mut state = self.state.write().await;
        let genres = &mut state.request.genres;
        if let Some(pos) = genres.iter().position(|g| g == genre) {
            genres.remove(pos);
        } else {
            genres.push(genre.to_string());
        }
        state.request.mode = SearchMode::Genre;
    }

    pub async fn set_query(&self, query: impl Into<String>) {
        self.state.write().await.request.query = query.into();
    }

    pub async fn set_story_query(&self, story: impl Into<String>) {
        self.state.write().await.request.story_query = story.into();
    }

    pub async fn set_mood(&self, mood: impl Into<String>) {
        self.state.write().await.request.mood = mood.into();
    }

    pub async fn set_provider(&self, provider: ProviderKind) {
        self.state.write().await.provider.provider = provider;
    }

    pub async fn set_credential(&self, credential: Option<String>) {
        self.state.write().await.provider.credential = credential;
    }

    // Watchlist

    /// Adds the movie, or removes it if a movie with the same title is present.
    /// Returns whether the movie is now on the watchlist.
    pub async fn toggle_watchlist(&self, movie: &MovieRecord) -> bool {
        let mut state = self.state.write().await;
        let before = state.watchlist.len();
        state.watchlist.retain(|m| !m.same_title(movie));
        if state.watchlist.len() == before {
            state.watchlist.push(movie.clone());
            true
        } else {
            false
        }
    }

    pub async fn is_watchlisted(&self, title: &str) -> bool {
        self.state
            .read()
            .await
            .watchlist
            .iter()
            .any(|m| m.title == title)
    }

    pub async fn watchlist(&self) -> Vec<MovieRecord> {
        self.state.read().await.watchlist.clone()
    }

    // Websites

    /// Saves a site domain. Returns false for blank input or duplicates.
    pub async fn add_website(&self, input: &str) -> bool {
        let Some(site) = clean_site(input) else {
            return false;
        };
        let mut state = self.state.write().await;
        if state.websites.contains(&site) {
            return false;
        }
        state.websites.push(site);
        true
    }

    pub async fn remove_website(&self, site: &str) {
        self.state.write().await.websites.retain(|s| s != site);
    }

    pub async fn websites(&self) -> Vec<String> {
        self.state.read().await.websites.clone()
    }

    /// Source links for a movie on the saved websites
    pub async fn find_sources(&self, movie_title: &str) -> Vec<WebSourceResult> {
        let websites = self.websites().await;
        self.recommender.find_sources(movie_title, &websites).await
    }
}

/// Strips the scheme and any path: `https://www.netflix.com/browse` becomes
/// `www.netflix.com`.
fn clean_site(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let host = without_scheme.split('/').next().unwrap_or_default();
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, error::ValidationError};

    fn session() -> BrowseSession {
        BrowseSession::new(Recommender::new(Config::default()))
    }

    fn movie(title: &str) -> MovieRecord {
        MovieRecord {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_site() {
        assert_eq!(
            clean_site("https://www.netflix.com/browse").as_deref(),
            Some("www.netflix.com")
        );
        assert_eq!(clean_site("http://hulu.com").as_deref(), Some("hulu.com"));
        assert_eq!(clean_site(" imdb.com/title ").as_deref(), Some("imdb.com"));
        assert_eq!(clean_site("   "), None);
        assert_eq!(clean_site("https://"), None);
    }

    #[tokio::test]
    async fn test_websites_ignore_duplicates() {
        let session = session();
        assert!(session.add_website("https://netflix.com/").await);
        assert!(!session.add_website("netflix.com").await);
        assert!(session.add_website("max.com").await);
        assert_eq!(session.websites().await, vec!["netflix.com", "max.com"]);

        session.remove_website("netflix.com").await;
        assert_eq!(session.websites().await, vec!["max.com"]);
    }

    #[tokio::test]
    async fn test_watchlist_toggles_by_title() {
        let session = session();
        let heat = movie("Heat");

        assert!(session.toggle_watchlist(&heat).await);
        assert!(session.is_watchlisted("Heat").await);

        let other_heat = MovieRecord {
            year: "1986".to_string(),
            ..movie("Heat")
        };
        assert!(!session.toggle_watchlist(&other_heat).await);
        assert!(session.watchlist().await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_genre_switches_mode() {
        let session = session();
        session.set_mode(SearchMode::Mood).await;

        session.toggle_genre("Drama").await;
        session.toggle_genre("Crime").await;
        session.toggle_genre("Drama").await;

        let request = session.request().await;
        assert_eq!(request.mode, SearchMode::Genre);
        assert_eq!(request.genres, vec!["Crime"]);
    }

    #[tokio::test]
    async fn test_search_surfaces_validation_error_and_keeps_results() {
        let state = SessionState {
            results: vec![movie("Kept")],
            ..Default::default()
        };
        let session = BrowseSession::restore(Recommender::new(Config::default()), state);

        let result = session.search().await;
        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::EmptySelection))
        ));
        assert_eq!(session.results().await.len(), 1);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_search_rejected_while_busy() {
        let session = session();
        let _guard = session.begin().unwrap();

        assert!(matches!(
            session.search().await,
            Err(AppError::RequestInFlight)
        ));
        assert!(session.load_more().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_more_without_results_is_ignored() {
        let session = session();
        session.toggle_genre("Action").await;

        assert!(session.load_more().await.unwrap().is_empty());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_missing_credential_releases_busy_flag() {
        let session = session();
        session.set_mood("Dark").await;
        session.set_mode(SearchMode::Mood).await;
        session.set_provider(ProviderKind::OpenAi).await;

        assert!(matches!(
            session.search().await,
            Err(AppError::MissingCredential)
        ));
        assert!(!session.is_busy());
    }

    #[test]
    fn test_snapshot_round_trip_skips_generation() {
        let state = SessionState {
            websites: vec!["netflix.com".to_string()],
            generation: 7,
            ..Default::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("generation").is_none());

        let restored: SessionState = serde_json::from_value(json).unwrap();
        assert_eq!(restored.websites, vec!["netflix.com"]);
        assert_eq!(restored.generation, 0);
    }
}
