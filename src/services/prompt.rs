use crate::{
    error::ValidationError,
    models::{Prompt, SearchMode, SearchRequest},
};

/// Number of titles every recommendation call asks for
pub const RECOMMENDATION_COUNT: usize = 8;

const CLOSING: &str = " Provide accurate ratings and direct trailer links.";

/// Validates a search request and renders the provider prompt.
///
/// Only the field that belongs to the request's mode is consulted, and it is
/// interpolated as typed; trimming only decides whether it is blank. A
/// non-empty exclusion list is embedded verbatim as a "do not include" clause;
/// providers are not guaranteed to honour it.
pub fn build(request: &SearchRequest) -> Result<Prompt, ValidationError> {
    validate(request)?;

    let exclusion = exclusion_clause(&request.exclude_titles);
    let text = match request.mode {
        SearchMode::Genre => format!(
            "Recommend {RECOMMENDATION_COUNT} high-quality movies in the following genres: {}.{exclusion}{CLOSING}",
            request.genres.join(", ")
        ),
        SearchMode::Similar => format!(
            "Recommend {RECOMMENDATION_COUNT} movies similar to: \"{}\".{exclusion}{CLOSING}",
            request.query
        ),
        SearchMode::Mood => format!(
            "Recommend {RECOMMENDATION_COUNT} movies for a \"{}\" mood.{exclusion}{CLOSING}",
            request.mood
        ),
        SearchMode::Story => format!(
            "I have a specific plot idea or story vibe: \"{}\". Recommend {RECOMMENDATION_COUNT} existing movies that share similar narrative structures, themes, or plot elements.{exclusion}{CLOSING}",
            request.story_query
        ),
    };

    Ok(Prompt::new(text))
}

/// Mode-specific input checks, run before any network call
pub fn validate(request: &SearchRequest) -> Result<(), ValidationError> {
    match request.mode {
        SearchMode::Genre if request.genres.is_empty() => Err(ValidationError::EmptySelection),
        SearchMode::Similar if request.query.trim().is_empty() => Err(ValidationError::EmptyQuery),
        SearchMode::Mood if request.mood.is_empty() => Err(ValidationError::NoMoodSelected),
        SearchMode::Story if request.story_query.trim().is_empty() => {
            Err(ValidationError::EmptyStory)
        }
        _ => Ok(()),
    }
}

fn exclusion_clause(titles: &[String]) -> String {
    if titles.is_empty() {
        String::new()
    } else {
        format!(" Do NOT include any of these movies: {}.", titles.join(", "))
    }
}

/// Prompt for the source-link search
pub fn sources_prompt(movie_title: &str, websites: &[String]) -> String {
    let site_search = if websites.is_empty() {
        String::new()
    } else {
        format!(" strictly searching on: {}", websites.join(", "))
    };

    format!(
        "Find the most relevant official pages or streaming links for the movie \"{movie_title}\"{site_search}. Focus on providing direct links. Only return high-confidence matching URLs."
    )
}
