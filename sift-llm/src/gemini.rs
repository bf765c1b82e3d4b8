//! Gemini `generateContent` client.
//!
//! The REST API is stateless, so a [`GeminiConversation`] keeps the turn
//! history itself and resends it with every message.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{Conversation, ConversationOptions, GroundingMetadata, LlmError, ModelResponse, SearchModel};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Sampling parameters sent with every request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_p: 1.0,
            top_k: 1,
            max_output_tokens: 2048,
        }
    }
}

/// Configuration for the Gemini client
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub generation: GenerationConfig,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            generation: GenerationConfig::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, body: &GenerateContentRequest<'_>) -> Result<GenerateContentResponse, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            error!("Gemini returned {}: {}", status, body);
            return Err(map_http_error(status, body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| LlmError::Decode(e.to_string()))
    }
}

impl SearchModel for GeminiClient {
    fn start_conversation(&self, options: ConversationOptions) -> Box<dyn Conversation> {
        Box::new(GeminiConversation {
            client: self.clone(),
            options,
            history: Vec::new(),
        })
    }
}

pub struct GeminiConversation {
    client: GeminiClient,
    options: ConversationOptions,
    history: Vec<Content>,
}

impl GeminiConversation {
    /// Number of completed user/model turns
    pub fn turns(&self) -> usize {
        self.history.len() / 2
    }
}

#[async_trait]
impl Conversation for GeminiConversation {
    async fn send_message(&mut self, text: &str) -> Result<ModelResponse, LlmError> {
        debug!("sending turn {} to {}", self.turns() + 1, self.client.model());

        // History only grows once the turn succeeds, so a failed or dropped
        // request leaves the conversation as it was
        let user = Content::new("user", text);
        let contents: Vec<&Content> = self.history.iter().chain(std::iter::once(&user)).collect();
        let tools = if self.options.web_search {
            vec![Tool::default()]
        } else {
            Vec::new()
        };
        let request = GenerateContentRequest {
            contents,
            tools,
            generation_config: &self.client.config.generation,
        };

        let candidate = self.client.generate(&request).await.and_then(first_candidate)?;
        drop(request);

        let text = answer_text(&candidate)?;

        self.history.push(user);
        self.history.push(Content::new("model", &text));

        Ok(ModelResponse {
            text,
            grounding_metadata: candidate.grounding_metadata,
        })
    }
}

/// Finish reasons for which Gemini withholds the answer
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "RECITATION", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

fn first_candidate(response: GenerateContentResponse) -> Result<Candidate, LlmError> {
    if let Some(reason) = response.prompt_feedback.and_then(|feedback| feedback.block_reason) {
        return Err(LlmError::Blocked(reason));
    }
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .ok_or(LlmError::NoCandidates)
}

fn answer_text(candidate: &Candidate) -> Result<String, LlmError> {
    let reason = candidate.finish_reason.as_deref();
    if let Some(reason) = reason.filter(|r| BLOCKING_FINISH_REASONS.contains(r)) {
        return Err(LlmError::Blocked(reason.to_string()));
    }

    let parts: Vec<&str> = candidate
        .content
        .iter()
        .flat_map(|content| &content.parts)
        .filter_map(|part| part.text.as_deref())
        .collect();
    if parts.is_empty() {
        return Err(LlmError::Blocked(reason.unwrap_or("no text in answer").to_string()));
    }

    Ok(parts.concat())
}

fn map_http_error(status: StatusCode, body: String) -> LlmError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .ok()
        .and_then(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    LlmError::Api {
        status: status.as_u16(),
        message,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<&'a Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn new(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize, Default)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize, Default)]
struct GoogleSearch {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_search_tool_and_generation_config() {
        let user = Content::new("user", "weather");
        let generation = GenerationConfig::default();
        let request = GenerateContentRequest {
            contents: vec![&user],
            tools: vec![Tool::default()],
            generation_config: &generation,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "weather");
        assert_eq!(json["tools"][0]["google_search"], serde_json::json!({}));
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(json["generationConfig"]["topK"], 1);
    }

    #[test]
    fn request_omits_tools_without_web_search() {
        let generation = GenerationConfig::default();
        let request = GenerateContentRequest {
            contents: Vec::new(),
            tools: Vec::new(),
            generation_config: &generation,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn http_error_prefers_provider_message() {
        let err = map_http_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#.to_string(),
        );
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert!(matches!(err, LlmError::Api { status: 502, ref message } if message == "upstream down"));
    }

    #[test]
    fn candidate_without_text_is_blocked() {
        let candidate: Candidate = serde_json::from_str(r#"{"finishReason":"STOP"}"#).unwrap();
        assert!(matches!(answer_text(&candidate), Err(LlmError::Blocked(reason)) if reason == "STOP"));

        let candidate: Candidate = serde_json::from_str(
            r#"{"content":{"role":"model","parts":[{"text":"partial"}]},"finishReason":"RECITATION"}"#,
        )
        .unwrap();
        assert!(matches!(answer_text(&candidate), Err(LlmError::Blocked(reason)) if reason == "RECITATION"));

        let candidate: Candidate = serde_json::from_str(
            r#"{"content":{"role":"model","parts":[{"text":"Sunny"},{"text":" today"}]},"finishReason":"STOP"}"#,
        )
        .unwrap();
        assert_eq!(answer_text(&candidate).unwrap(), "Sunny today");
    }
}
