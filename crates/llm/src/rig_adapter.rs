use rig::completion::{CompletionModel, Message as RigMessage};
use rig::message::AssistantContent;
use rig::prelude::CompletionClient;
use rig::providers::{gemini, openai};
use snafu::{ResultExt, ensure};
use tokio_util::sync::CancellationToken;

use super::provider::{
    BoxFuture, CancelledSnafu, CompletionsFailedSnafu, EmptyCompletionSnafu, EmptyPromptSnafu,
    GenerateRequest, HttpClientSnafu, LlmProvider, MissingApiKeySnafu, ProviderConfig,
    ProviderResult,
};

pub const RIG_GEMINI_PROVIDER_ID: &str = "gemini";
pub const RIG_OPENAI_PROVIDER_ID: &str = "openai";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Gemini,
    OpenAi,
}

pub struct RigProviderAdapter {
    config: ProviderConfig,
    backend: Backend,
}

impl RigProviderAdapter {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        ensure!(
            !config.api_key.is_empty(),
            MissingApiKeySnafu {
                stage: "rig-adapter-new",
                provider_id: config.provider_id.clone(),
            }
        );

        let backend = if config.provider_id == RIG_OPENAI_PROVIDER_ID {
            Backend::OpenAi
        } else {
            Backend::Gemini
        };

        Ok(Self { config, backend })
    }

    fn build_gemini_client(config: &ProviderConfig) -> ProviderResult<gemini::Client> {
        let mut builder = gemini::Client::builder().api_key(config.api_key.as_str());
        if !config.endpoint.is_empty() {
            builder = builder.base_url(config.endpoint.as_str());
        }
        builder.build().context(HttpClientSnafu {
            stage: "build-gemini-client",
        })
    }

    fn build_openai_client(config: &ProviderConfig) -> ProviderResult<openai::Client> {
        let mut builder = openai::Client::builder().api_key(config.api_key.as_str());
        if !config.endpoint.is_empty() {
            builder = builder.base_url(config.endpoint.as_str());
        }
        builder.build().context(HttpClientSnafu {
            stage: "build-openai-client",
        })
    }

    async fn complete(&self, request: &GenerateRequest) -> ProviderResult<String> {
        match self.backend {
            Backend::Gemini => {
                let client = Self::build_gemini_client(&self.config)?;
                let model = client.completion_model(request.model_id.clone());
                Self::complete_with(model, request).await
            }
            Backend::OpenAi => {
                let client = Self::build_openai_client(&self.config)?;
                let model = client.completion_model(request.model_id.clone());
                Self::complete_with(model, request).await
            }
        }
    }

    async fn complete_with<M>(model: M, request: &GenerateRequest) -> ProviderResult<String>
    where
        M: CompletionModel,
    {
        let response = model
            .completion_request(RigMessage::user(request.prompt.clone()))
            .send()
            .await
            .context(CompletionsFailedSnafu {
                stage: "send-completion",
            })?;

        // Reasoning and tool-call parts are not shown; only plain text reaches the chat.
        let text = response
            .choice
            .iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<String>();

        ensure!(
            !text.trim().is_empty(),
            EmptyCompletionSnafu {
                stage: "extract-completion-text",
                model_id: request.model_id.clone(),
            }
        );

        Ok(text)
    }
}

impl LlmProvider for RigProviderAdapter {
    fn id(&self) -> &str {
        &self.config.provider_id
    }

    fn generate<'a>(
        &'a self,
        request: GenerateRequest,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(async move {
            ensure!(
                !request.prompt.trim().is_empty(),
                EmptyPromptSnafu {
                    stage: "generate",
                    model_id: request.model_id.clone(),
                }
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(
                        provider_id = %self.config.provider_id,
                        model_id = %request.model_id,
                        "completion request cancelled before a response arrived"
                    );
                    CancelledSnafu { stage: "await-completion" }.fail()
                }
                result = self.complete(&request) => {
                    if let Err(error) = &result {
                        tracing::warn!(
                            provider_id = %self.config.provider_id,
                            model_id = %request.model_id,
                            error = %error,
                            "completion request failed"
                        );
                    }
                    result
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_GEMINI_MODEL, ProviderError};

    fn adapter(provider_id: &str) -> RigProviderAdapter {
        match RigProviderAdapter::new(ProviderConfig::new(provider_id, "test-key", "")) {
            Ok(adapter) => adapter,
            Err(error) => panic!("adapter should build: {error}"),
        }
    }

    #[test]
    fn backend_follows_provider_id() {
        assert_eq!(adapter("gemini").backend, Backend::Gemini);
        assert_eq!(adapter("openai").backend, Backend::OpenAi);
        assert_eq!(adapter("openai").id(), RIG_OPENAI_PROVIDER_ID);
    }

    #[tokio::test]
    async fn whitespace_prompt_is_rejected_without_a_request() {
        let adapter = adapter("gemini");
        let result = adapter
            .generate(
                GenerateRequest::new(DEFAULT_GEMINI_MODEL, "  \n "),
                CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(ProviderError::EmptyPrompt { .. })));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_the_call() {
        let adapter = adapter("gemini");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = adapter
            .generate(GenerateRequest::new(DEFAULT_GEMINI_MODEL, "hello"), cancel)
            .await;

        match result {
            Err(error) => assert!(error.is_cancelled()),
            Ok(text) => panic!("expected cancellation, got {text:?}"),
        }
    }
}
