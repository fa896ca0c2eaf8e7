use snafu::Snafu;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider_id: String,
    pub api_key: String,
    pub endpoint: String,
}

impl ProviderConfig {
    pub fn new(
        provider_id: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into().trim().to_string(),
            api_key: api_key.into().trim().to_string(),
            endpoint: endpoint.into().trim().to_string(),
        }
    }
}

/// One-shot completion request. The prompt is the user's raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub model_id: String,
    pub prompt: String,
}

impl GenerateRequest {
    pub fn new(model_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            prompt: prompt.into(),
        }
    }
}

pub use futures::future::BoxFuture;
pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProviderError {
    #[snafu(display("missing API key for provider '{provider_id}'"))]
    MissingApiKey {
        stage: &'static str,
        provider_id: String,
    },
    #[snafu(display("provider '{provider_id}' is not supported"))]
    UnsupportedProvider {
        stage: &'static str,
        provider_id: String,
    },
    #[snafu(display("generate request for model '{model_id}' has an empty prompt"))]
    EmptyPrompt {
        stage: &'static str,
        model_id: String,
    },
    #[snafu(display("http client failed on `{stage}`, {source}"))]
    HttpClient {
        stage: &'static str,
        source: rig::http_client::Error,
    },
    #[snafu(display("completions failed on `{stage}`, {source}"))]
    CompletionsFailed {
        stage: &'static str,
        source: rig::completion::CompletionError,
    },
    #[snafu(display("provider returned no text for model '{model_id}'"))]
    EmptyCompletion {
        stage: &'static str,
        model_id: String,
    },
    #[snafu(display("request cancelled on `{stage}`"))]
    Cancelled { stage: &'static str },
}

impl ProviderError {
    /// True when the error only reflects a cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

pub trait LlmProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Runs one completion. Resolves to `ProviderError::Cancelled` as soon as
    /// `cancel` fires; any response arriving afterwards is dropped.
    fn generate<'a>(
        &'a self,
        request: GenerateRequest,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, ProviderResult<String>>;
}
