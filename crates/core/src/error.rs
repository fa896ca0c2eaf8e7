use ingpt_llm::ProviderError;
use snafu::Snafu;

use crate::notice::{Notice, REQUEST_FAILED};

/// Failures a generation can end in. None of them are fatal.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GenerationError {
    #[snafu(display(
        "{provider_name} API key not configured. Please check your settings or environment variables."
    ))]
    Configuration {
        stage: &'static str,
        provider_name: String,
    },
    #[snafu(display("generation request failed on `{stage}`, {source}"))]
    RequestFailure {
        stage: &'static str,
        source: ProviderError,
    },
    #[snafu(display("generation cancelled on `{stage}`"))]
    Cancelled { stage: &'static str },
}

impl GenerationError {
    /// Maps a provider failure onto the generation taxonomy.
    pub fn from_provider(stage: &'static str, error: ProviderError) -> Self {
        if error.is_cancelled() {
            Self::Cancelled { stage }
        } else {
            Self::RequestFailure {
                stage,
                source: error,
            }
        }
    }

    /// The toast for this error. Cancellation is silent.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Configuration { .. } => Some(Notice::blocking(self.to_string())),
            Self::RequestFailure { .. } => Some(Notice::transient(REQUEST_FAILED)),
            Self::Cancelled { .. } => None,
        }
    }
}

/// Display name for a configured provider id.
pub fn provider_display_name(provider_id: &str) -> String {
    match provider_id.trim().to_ascii_lowercase().as_str() {
        "" | "gemini" | "google" | "rig-gemini" => "Gemini".to_string(),
        "openai" | "rig-openai" => "OpenAI".to_string(),
        other => other.to_string(),
    }
}
