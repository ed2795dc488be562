//! OpenAI Chat Completions client.
//!
//! Blocking implementation of [`TextGenerator`]. One request per call, no
//! retries; the assisted explainer decides what to do with failures.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::assisted::{GenerationRequest, TextGenerator};
use crate::{AuraError, AuraResult};

/// OpenAI Chat Completions API endpoint.
const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Model and sampling settings for the OpenAI client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gpt-4".into()
}

fn default_temperature() -> f64 {
    0.7
}

const fn default_max_tokens() -> usize {
    1500
}

const fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug)]
pub struct OpenAi {
    client: Client,
    api_key: String,
    settings: OpenAiSettings,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, settings: OpenAiSettings) -> AuraResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AuraError::ExternalService(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            settings,
        })
    }

    /// Create a client from the `OPENAI_API_KEY` environment variable.
    pub fn from_env(settings: OpenAiSettings) -> AuraResult<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AuraError::MissingCredential(API_KEY_VAR.to_string()))?;
        Self::new(api_key, settings)
    }

    fn build_request(&self, request: &GenerationRequest) -> ChatRequest {
        let mut messages: Vec<Message> = request
            .system
            .iter()
            .map(|s| Message {
                role: "system",
                content: s.clone(),
            })
            .collect();
        messages.push(Message {
            role: "user",
            content: request.prompt.clone(),
        });

        ChatRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: usize,
    temperature: f64,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn first_content(response: ChatResponse) -> AuraResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| AuraError::ExternalService("response contained no message content".into()))
}

impl TextGenerator for OpenAi {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn generate(&self, request: &GenerationRequest) -> AuraResult<String> {
        let body = self.build_request(request);

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| AuraError::ExternalService(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuraError::ExternalService(e.to_string()))?
            .json::<ChatResponse>()
            .map_err(|e| AuraError::ExternalService(format!("malformed response: {e}")))?;

        first_content(response)
    }
}
