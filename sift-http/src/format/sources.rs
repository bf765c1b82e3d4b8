use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sift_llm::GroundingMetadata;

/// A web page cited by a grounded answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Collect the cited pages, one entry per url.
///
/// Supports are walked in order. A url keeps the position where it was first
/// seen, while title and snippet come from the last support citing it.
/// Missing or malformed metadata yields no sources.
pub fn extract_sources(metadata: Option<&GroundingMetadata>) -> Vec<Source> {
    let Some(metadata) = metadata else {
        return Vec::new();
    };
    let (Some(_), Some(supports)) = (&metadata.grounding_chunks, &metadata.grounding_supports) else {
        return Vec::new();
    };

    let mut by_url: IndexMap<String, Source> = IndexMap::new();

    for support in supports {
        let snippet = support
            .segment
            .as_ref()
            .and_then(|segment| segment.text.as_deref())
            .unwrap_or_default();

        for &index in support.grounding_chunk_indices.iter().flatten() {
            let Some(web) = metadata.web_source(index) else {
                continue;
            };
            let Some(url) = web.uri.as_deref() else {
                continue;
            };

            by_url.insert(
                url.to_string(),
                Source {
                    title: web.title.clone().unwrap_or_else(|| url.to_string()),
                    url: url.to_string(),
                    snippet: snippet.to_string(),
                },
            );
        }
    }

    by_url.into_values().collect()
}
