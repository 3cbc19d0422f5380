//! OpenAI-compatible chat-completion client (OpenRouter by default).

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::completion::{
    CompletionClient, CompletionError, CompletionRequest, PromptMessage,
};
use crate::config::CompletionSettings;

use super::error::InfraError;

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionReply {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
    site_url: String,
}

impl OpenRouterClient {
    pub fn new(settings: &CompletionSettings) -> Result<Self, InfraError> {
        let endpoint = join_endpoint(&settings.base_url)?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            site_url: settings.site_url.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("lekha/", env!("CARGO_PKG_VERSION"))
    }
}

fn join_endpoint(base: &Url) -> Result<Url, InfraError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions")
        .map_err(|err| InfraError::configuration(format!("invalid completion base url: {err}")))
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::NotConfigured)?;

        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            target = "lekha::completion",
            app = request.app_title,
            model = %self.model,
            "sending completion request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", request.app_title)
            .json(&body)
            .send()
            .await
            .map_err(|err| CompletionError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatCompletionReply = response
            .json()
            .await
            .map_err(|err| CompletionError::Malformed(err.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Malformed("response contained no choices".into()))
    }
}
