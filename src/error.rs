/// Status string Gemini reports for quota exhaustion
const QUOTA_TOKEN: &str = "RESOURCE_EXHAUSTED";

/// Input problems caught before any provider is contacted.
///
/// The display strings are shown to the user verbatim.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Select some genres first")]
    EmptySelection,

    #[error("Enter a movie title")]
    EmptyQuery,

    #[error("Select your mood")]
    NoMoodSelected,

    #[error("Explain the story first")]
    EmptyStory,
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("OpenAI API Key is missing. Please add it in the settings (gear icon).")]
    MissingCredential,

    /// Raw failure reported by a provider, before classification
    #[error("Provider error (status {status:?}, code {code:?}): {message}")]
    Provider {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    #[error("Quota exceeded. Please wait a moment before trying again.")]
    QuotaExceeded,

    #[error("Failed to fetch recommendations. Please try again.")]
    FetchFailed,

    #[error("{0}")]
    ProviderRequestFailed(String),

    #[error("Invalid response format from provider")]
    UnrecognizedResponseShape,

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid JSON from provider: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("A recommendation request is already in progress")]
    RequestInFlight,
}

impl AppError {
    /// Whether the failure signals rate limiting or quota exhaustion.
    ///
    /// Only the response status and the provider's error code are consulted;
    /// message text is free-form and may contain unrelated digits.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Provider { status, code, .. } => {
                *status == Some(429) || code.as_deref() == Some(QUOTA_TOKEN)
            }
            AppError::HttpClient(e) => e.status().map(|s| s.as_u16()) == Some(429),
            _ => false,
        }
    }

    /// The single display string handed to the UI layer.
    ///
    /// Provider internals and raw payloads never leak through here.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(_)
            | AppError::MissingCredential
            | AppError::QuotaExceeded
            | AppError::FetchFailed
            | AppError::ProviderRequestFailed(_)
            | AppError::RequestInFlight => self.to_string(),
            AppError::Provider { .. } if self.is_transient() => {
                AppError::QuotaExceeded.to_string()
            }
            AppError::Provider { .. }
            | AppError::UnrecognizedResponseShape
            | AppError::HttpClient(_)
            | AppError::InvalidJson(_) => AppError::FetchFailed.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
