use sift_llm::{Conversation, LlmError, ModelResponse};
use tokio::sync::Mutex;
use tracing::debug;

/// A single search session - one conversation with the model
/// Turns on the same session are serialized by the conversation lock
pub struct SearchSession {
    conversation: Mutex<Box<dyn Conversation>>,
    pub session_id: String,
}

impl SearchSession {
    pub fn new(session_id: String, conversation: Box<dyn Conversation>) -> Self {
        Self {
            conversation: Mutex::new(conversation),
            session_id,
        }
    }

    /// Send one message on this conversation and wait for the answer
    pub async fn send(&self, http_request_id: &str, text: &str) -> Result<ModelResponse, LlmError> {
        debug!("[{}] - [{}] Acquiring conversation lock", http_request_id, self.session_id);
        let mut conversation = self.conversation.lock().await;
        debug!("[{}] - [{}] Conversation lock acquired", http_request_id, self.session_id);

        conversation.send_message(text).await
    }
}
