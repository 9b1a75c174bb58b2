use crate::domain::entities::completion::{Completion, TokenUsage};
use crate::domain::error::DomainError;
use crate::domain::ports::completion_port::CompletionProvider;
use crate::domain::values::chat_role::ChatMessage;
use crate::infrastructure::http;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Chat completions from an Azure OpenAI deployment.
pub struct AzureOpenAiChat {
    client: Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: TokenUsage,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl AzureOpenAiChat {
    pub fn new(endpoint: &str, api_key: &str, deployment: &str, api_version: &str) -> Result<Self, DomainError> {
        Ok(Self {
            client: http::client()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            deployment: deployment.to_string(),
            api_version: api_version.to_string(),
            temperature: 0.1,
            max_tokens: 800,
        })
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait::async_trait]
impl CompletionProvider for AzureOpenAiChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, DomainError> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        );
        tracing::debug!(messages = messages.len(), deployment = %self.deployment, "requesting completion");

        let resp = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&ChatRequest {
                messages,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            })
            .send()
            .await
            .map_err(|e| http::send_error(e, "Azure OpenAI chat", DomainError::Completion))?;
        let resp = http::check_status(resp, "Azure OpenAI chat", DomainError::Completion).await?;

        let result: ChatResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Parse(format!("completion response: {e}")))?;
        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::Completion("response contained no choices".into()))?;

        Ok(Completion {
            content,
            model: result.model.unwrap_or_else(|| self.deployment.clone()),
            usage: result.usage,
        })
    }

    fn model(&self) -> &str {
        &self.deployment
    }
}
