use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Recommendation strategy chosen by the user
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Genre,
    Similar,
    Mood,
    Story,
}

/// Input for one recommendation call.
///
/// Only the field belonging to `mode` is read when building a prompt; the
/// others are carried along untouched so a session can switch modes without
/// losing what the user typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub mode: SearchMode,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub story_query: String,
    #[serde(default)]
    pub exclude_titles: Vec<String>,
}

impl SearchRequest {
    pub fn by_genres<I, S>(genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: SearchMode::Genre,
            genres: genres.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn similar_to(query: impl Into<String>) -> Self {
        Self {
            mode: SearchMode::Similar,
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn for_mood(mood: impl Into<String>) -> Self {
        Self {
            mode: SearchMode::Mood,
            mood: mood.into(),
            ..Default::default()
        }
    }

    pub fn by_story(story: impl Into<String>) -> Self {
        Self {
            mode: SearchMode::Story,
            story_query: story.into(),
            ..Default::default()
        }
    }

    /// Copy of this request with the exclusion list replaced
    pub fn with_exclusions(&self, titles: Vec<String>) -> Self {
        Self {
            exclude_titles: titles,
            ..self.clone()
        }
    }
}

/// Which language-model backend serves a request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Provider selection plus the caller-supplied credential, if any
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    #[serde(default)]
    pub credential: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// The credential, treating blank strings as absent
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Rendered natural-language prompt sent to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
