//! OpenAI implementation of intent extraction.
//!
//! Uses a small chat model in JSON mode so a reply fits comfortably inside
//! the webhook's response window.

use std::sync::Arc;
use std::time::Duration;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, ResponseFormat,
    },
};
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::base::{
    config::Config,
    types::{Analysis, Res},
};

use super::{AnalysisError, GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    /// `None` when no API key is configured.
    client: Option<Client<OpenAIConfig>>,
    config: Config,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let client = config.openai_api_key.as_ref().filter(|key| !key.is_empty()).map(|key| {
            let cfg = OpenAIConfig::new().with_api_key(key.clone());
            Client::with_config(cfg)
        });

        if client.is_none() {
            warn!("OPENAI_API_KEY is not set; every message will be answered with a fallback.");
        }

        Self { client, config: config.clone() }
    }

    /// Build the chat request for a single customer message.
    fn build_request(&self, text: &str) -> Res<CreateChatCompletionRequest> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default().content(self.config.assistant_system_directive.clone()).build()?.into(),
            ChatCompletionRequestUserMessageArgs::default().content(format!("User message: {text}")).build()?.into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.openai_model)
            .messages(messages)
            .temperature(self.config.openai_temperature)
            .max_completion_tokens(self.config.openai_max_tokens)
            .response_format(ResponseFormat::JsonObject)
            .build()?;

        Ok(request)
    }

    /// Helper function to make OpenAI API calls with retry logic and timeout handling.
    async fn call_openai_api(&self, client: &Client<OpenAIConfig>, request: CreateChatCompletionRequest) -> Res<CreateChatCompletionResponse> {
        const RETRY_DELAY_MS: u64 = 500;

        let max_retries = self.config.openai_max_retries;
        let limit = Duration::from_secs(self.config.openai_timeout_secs);
        let mut retries = 0;

        loop {
            let result = timeout(limit, client.chat().create(request.clone())).await;

            match result {
                Ok(Ok(response)) => {
                    debug!("OpenAI API call succeeded after {} attempts", retries + 1);
                    return Ok(response);
                }
                Ok(Err(err)) => {
                    if retries >= max_retries {
                        return Err(anyhow::anyhow!("OpenAI API call failed after {} attempts: {err}", retries + 1));
                    }
                    retries += 1;
                    warn!("OpenAI API call failed, retrying {retries}/{max_retries}: {err}");
                }
                Err(_) => {
                    if retries >= max_retries {
                        return Err(anyhow::anyhow!("OpenAI API call timed out after {} attempts", retries + 1));
                    }
                    retries += 1;
                    warn!("OpenAI API call timed out, retrying {retries}/{max_retries}");
                }
            }

            let delay = Duration::from_millis(RETRY_DELAY_MS * 2_u64.pow(retries - 1));
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::analyze_message", skip(self))]
    async fn analyze_message(&self, text: &str) -> Res<Analysis> {
        let client = self.client.as_ref().ok_or(AnalysisError::NotConfigured)?;

        let request = self.build_request(text)?;
        let response = self.call_openai_api(client, request).await?;

        let content = response.choices.first().and_then(|choice| choice.message.content.clone()).ok_or(AnalysisError::Empty)?;

        let analysis = parse_analysis(&content)?;

        info!("Analysis result: {:?} with {} items", analysis.intent, analysis.items.len());

        Ok(analysis)
    }
}

/// Parse the model's JSON reply into a normalized [`Analysis`].
///
/// JSON mode should make fences impossible, but a fenced reply is still accepted.
pub fn parse_analysis(content: &str) -> Result<Analysis, AnalysisError> {
    let mut content = content.trim();

    if let Some(rest) = content.strip_prefix("```") {
        let inner = rest.split("```").next().unwrap_or_default();
        content = inner.strip_prefix("json").unwrap_or(inner).trim();
    }

    let analysis: Analysis = serde_json::from_str(content)?;

    Ok(analysis.normalize())
}

// Tests.
