// SPDX-License-Identifier: MIT

//! HTTP backend for both provider families

use super::{LlmClient, ModelProvider, ProviderRequest, ProviderResponse};
use crate::adk::error::{ConductorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::env;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
struct Endpoint {
    api_key: String,
    base_url: String,
}

/// reqwest client that posts each tagged request to its family's endpoint
pub struct HttpLlmClient {
    client: Client,
    openai: Option<Endpoint>,
    anthropic: Option<Endpoint>,
}

impl HttpLlmClient {
    /// A client with no credentials; add families with `with_openai`/`with_anthropic`
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            openai: None,
            anthropic: None,
        }
    }

    /// Read `OPENAI_API_KEY`/`OPENAI_BASE_URL` and `ANTHROPIC_API_KEY`/`ANTHROPIC_BASE_URL`.
    ///
    /// A family without a key is left unconfigured and fails at request time.
    pub fn from_env() -> Self {
        let mut client = Self::new();

        if let Ok(key) = env::var("OPENAI_API_KEY") {
            let base_url =
                env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());
            client = client.with_openai(key, base_url);
        }

        if let Ok(key) = env::var("ANTHROPIC_API_KEY") {
            let base_url = env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_BASE_URL.to_string());
            client = client.with_anthropic(key, base_url);
        }

        client
    }

    pub fn with_openai(mut self, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.openai = Some(Endpoint {
            api_key: api_key.into(),
            base_url: base_url.into(),
        });
        self
    }

    pub fn with_anthropic(
        mut self,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        self.anthropic = Some(Endpoint {
            api_key: api_key.into(),
            base_url: base_url.into(),
        });
        self
    }

    pub fn is_configured(&self, provider: ModelProvider) -> bool {
        match provider {
            ModelProvider::OpenAi => self.openai.is_some(),
            ModelProvider::Anthropic => self.anthropic.is_some(),
        }
    }

    async fn post_openai(&self, body: &Value) -> Result<Value> {
        let endpoint = self
            .openai
            .as_ref()
            .ok_or_else(|| ConductorError::config("OPENAI_API_KEY must be set"))?;
        let url = format!("{}/chat/completions", endpoint.base_url);

        log::debug!(
            "OpenAI request body: {}",
            serde_json::to_string_pretty(body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", endpoint.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        Self::read_json(ModelProvider::OpenAi, resp).await
    }

    async fn post_anthropic(&self, body: &Value) -> Result<Value> {
        let endpoint = self
            .anthropic
            .as_ref()
            .ok_or_else(|| ConductorError::config("ANTHROPIC_API_KEY must be set"))?;
        let url = format!("{}/messages", endpoint.base_url);

        log::debug!(
            "Anthropic request body: {}",
            serde_json::to_string_pretty(body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &endpoint.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        Self::read_json(ModelProvider::Anthropic, resp).await
    }

    async fn read_json(provider: ModelProvider, resp: reqwest::Response) -> Result<Value> {
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            return Err(ConductorError::api(
                provider.as_str(),
                format!("{}: {}", status, text),
            ));
        }

        let json: Value = resp.json().await?;
        log::debug!("{} response: {}", provider, json);
        Ok(json)
    }
}

impl Default for HttpLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse> {
        log::debug!("Sending {} chat request", request.provider().as_str());
        match request {
            ProviderRequest::OpenAi(body) => {
                Ok(ProviderResponse::OpenAi(self.post_openai(&body).await?))
            }
            ProviderRequest::Anthropic(body) => {
                Ok(ProviderResponse::Anthropic(self.post_anthropic(&body).await?))
            }
        }
    }
}
