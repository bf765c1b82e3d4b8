pub mod error;
pub mod gemini;
pub mod grounding;
pub mod provider;

pub use error::LlmError;
pub use gemini::{GeminiClient, GeminiConfig, GenerationConfig};
pub use grounding::{GroundingChunk, GroundingMetadata, GroundingSupport, SearchEntryPoint, TextSegment, WebSource};
pub use provider::{Conversation, ConversationOptions, ModelResponse, SearchModel};
