use async_trait::async_trait;

use crate::{GroundingMetadata, LlmError};

/// Options applied when a conversation is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversationOptions {
    /// Let the model ground its answers with a web search tool
    pub web_search: bool,
}

impl ConversationOptions {
    pub fn with_web_search() -> Self {
        Self { web_search: true }
    }
}

/// One model turn: the answer text plus optional grounding data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: String,
    pub grounding_metadata: Option<GroundingMetadata>,
}

impl ModelResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            grounding_metadata: None,
        }
    }

    pub fn with_grounding(mut self, metadata: GroundingMetadata) -> Self {
        self.grounding_metadata = Some(metadata);
        self
    }
}

/// A hosted generative model able to open conversations
pub trait SearchModel: Send + Sync {
    fn start_conversation(&self, options: ConversationOptions) -> Box<dyn Conversation>;
}

/// Stateful exchange with the model; each call appends a turn
#[async_trait]
pub trait Conversation: Send {
    async fn send_message(&mut self, text: &str) -> Result<ModelResponse, LlmError>;
}
