use crate::{
    models::{GroundingChunk, WebSourceResult},
    services::{prompt::sources_prompt, providers::GeminiProvider, retry::RetryPolicy},
};

/// How many unfiltered links to offer when no chunk matches the user's sites
const FALLBACK_LIMIT: usize = 3;

/// Finds official or streaming pages for a movie, preferring the given
/// domains.
///
/// Best effort: any failure is logged and yields an empty list.
pub async fn find_sources(
    gemini: &GeminiProvider,
    retry: RetryPolicy,
    movie_title: &str,
    websites: &[String],
) -> Vec<WebSourceResult> {
    let prompt = sources_prompt(movie_title, websites);

    match retry.execute(|| gemini.search(&prompt)).await {
        Ok(response) => {
            let sources = select_sources(response.grounding_chunks(), websites);
            tracing::info!(
                title = %movie_title,
                sites = websites.len(),
                results = sources.len(),
                "Source search completed"
            );
            sources
        }
        Err(e) => {
            tracing::error!(error = %e, title = %movie_title, "Gemini search error");
            Vec::new()
        }
    }
}

/// Picks grounding links whose URI mentions one of `websites`.
///
/// With no websites every link qualifies. When nothing matches, the first
/// few links are returned instead.
pub fn select_sources(chunks: &[GroundingChunk], websites: &[String]) -> Vec<WebSourceResult> {
    let domains: Vec<String> = websites.iter().map(|d| d.to_lowercase()).collect();

    let matched: Vec<WebSourceResult> = chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .filter_map(|web| {
            web.uri
                .as_deref()
                .filter(|uri| !uri.is_empty())
                .map(|uri| (uri, web.title.as_deref().filter(|t| !t.is_empty())))
        })
        .filter(|(uri, _)| {
            let uri = uri.to_lowercase();
            domains.is_empty() || domains.iter().any(|d| uri.contains(d.as_str()))
        })
        .map(|(uri, title)| WebSourceResult {
            title: title.unwrap_or("Source Link").to_string(),
            uri: uri.to_string(),
        })
        .collect();

    if !matched.is_empty() {
        return matched;
    }

    chunks
        .iter()
        .take(FALLBACK_LIMIT)
        .filter_map(|chunk| chunk.web.as_ref())
        .filter_map(|web| {
            let uri = web.uri.as_deref().filter(|uri| !uri.is_empty())?;
            Some(WebSourceResult {
                title: web
                    .title
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .unwrap_or("Related Source")
                    .to_string(),
                uri: uri.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroundingWeb;

    fn chunk(uri: &str, title: Option<&str>) -> GroundingChunk {
        GroundingChunk {
            web: Some(GroundingWeb {
                uri: Some(uri.to_string()),
                title: title.map(str::to_string),
            }),
        }
    }

    #[test]
    fn test_filters_by_domain_case_insensitively() {
        let chunks = vec![
            chunk("https://www.Netflix.com/title/70131314", Some("Inception | Netflix")),
            chunk("https://www.imdb.com/title/tt1375666", Some("IMDb")),
        ];
        let sources = select_sources(&chunks, &["netflix.com".to_string()]);

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].title, "Inception | Netflix");
    }

    #[test]
    fn test_no_websites_keeps_everything_with_default_title() {
        let chunks = vec![
            chunk("https://a.example/1", None),
            GroundingChunk { web: None },
            chunk("https://b.example/2", Some("B")),
        ];
        let sources = select_sources(&chunks, &[]);

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "Source Link");
        assert_eq!(sources[1].uri, "https://b.example/2");
    }

    #[test]
    fn test_falls_back_to_first_three_chunks() {
        let chunks = vec![
            chunk("https://a.example/1", None),
            chunk("https://b.example/2", Some("B")),
            chunk("https://c.example/3", None),
            chunk("https://d.example/4", None),
        ];
        let sources = select_sources(&chunks, &["hulu.com".to_string()]);

        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].title, "Related Source");
        assert_eq!(sources[1].title, "B");
        assert_eq!(sources[2].uri, "https://c.example/3");
    }

    #[test]
    fn test_empty_chunks_yield_nothing() {
        assert!(select_sources(&[], &["netflix.com".to_string()]).is_empty());
    }
}
