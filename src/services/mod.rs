pub mod normalize;
pub mod pagination;
pub mod prompt;
pub mod providers;
pub mod recommendations;
pub mod retry;
pub mod sources;

pub use recommendations::{get_movie_sources, get_recommendations, RecommendationParams, Recommender};
pub use retry::RetryPolicy;
