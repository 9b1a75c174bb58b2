use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::EmbeddingProvider;
use crate::infrastructure::http;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Embeddings from an Azure OpenAI deployment.
pub struct AzureOpenAiEmbedder {
    client: Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl AzureOpenAiEmbedder {
    pub fn new(
        endpoint: &str,
        api_key: &str,
        deployment: &str,
        api_version: &str,
        dimensions: usize,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            client: http::client()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            deployment: deployment.to_string(),
            api_version: api_version.to_string(),
            dimensions,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for AzureOpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        tracing::debug!(count = texts.len(), deployment = %self.deployment, "requesting embeddings");

        let resp = self
            .client
            .post(self.url())
            .header("api-key", &self.api_key)
            .json(&EmbeddingRequest { input: texts, dimensions: self.dimensions })
            .send()
            .await
            .map_err(|e| http::send_error(e, "Azure OpenAI embeddings", DomainError::Embedding))?;
        let resp = http::check_status(resp, "Azure OpenAI embeddings", DomainError::Embedding).await?;

        let mut result: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Parse(format!("embedding response: {e}")))?;
        if result.data.len() != texts.len() {
            return Err(DomainError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }
        result.data.sort_by_key(|d| d.index);
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimensions
    }
}
