use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Genres offered by the genre picker
pub const GENRES: &[&str] = &[
    "Action",
    "Comedy",
    "Drama",
    "Horror",
    "Sci-Fi",
    "Thriller",
    "Romance",
    "Animation",
    "Documentary",
    "Mystery",
    "Adventure",
    "Fantasy",
    "Crime",
];

/// Moods offered by the mood picker
pub const MOODS: &[&str] = &[
    "Happy",
    "Emotional",
    "Mind-bending",
    "Motivational",
    "Chilled",
    "Dark",
    "Romantic",
    "Intense",
];

/// A single recommended movie as returned by a provider.
///
/// Every field defaults when absent so that partially-formed provider records
/// still reach the caller. Identity for watchlist and exclusion purposes is
/// the `title` alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: String,
    /// Free-form rating text such as "8.5/10"
    #[serde(default, deserialize_with = "lenient_string")]
    pub rating: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub trailer_link: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub genre: Vec<String>,
}

impl MovieRecord {
    /// Converts one element of a provider array, passing malformed elements
    /// through as empty records.
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Provider returned a malformed movie record");
                Self::default()
            }
        }
    }

    /// Same movie for de-duplication purposes
    pub fn same_title(&self, other: &MovieRecord) -> bool {
        self.title == other.title
    }
}

/// A link found by the source-link search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebSourceResult {
    pub title: String,
    pub uri: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) => vec![s],
        _ => Vec::new(),
    })
}
