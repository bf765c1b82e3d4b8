mod markdown;
mod sources;

pub use markdown::{format_markdown, render_html, to_markdown};
pub use sources::{extract_sources, Source};

use serde::Serialize;
use sift_llm::ModelResponse;

/// A model answer ready for the browser
#[derive(Debug, Clone, Serialize)]
pub struct FormattedResponse {
    pub text: String,
    pub html: String,
    pub sources: Vec<Source>,
}

impl From<ModelResponse> for FormattedResponse {
    fn from(response: ModelResponse) -> Self {
        let sources = extract_sources(response.grounding_metadata.as_ref());
        let html = format_markdown(&response.text);
        Self {
            text: response.text,
            html,
            sources,
        }
    }
}
