//! Movie recommendation orchestration.
//!
//! Turns a search intent (genres, a similar title, a mood or a plot idea) into
//! a prompt, sends it to Gemini or OpenAI with rate-limit backoff, and
//! normalizes the reply into [`MovieRecord`]s.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, AppResult, ValidationError};
pub use models::{MovieRecord, ProviderConfig, ProviderKind, SearchMode, SearchRequest, WebSourceResult};
pub use services::{get_movie_sources, get_recommendations, RecommendationParams, Recommender};
pub use session::{BrowseSession, SessionState};
