use axum::{extract::State, Json};
use sift_llm::{ConversationOptions, ModelResponse};
use tokio::time::timeout;
use tracing::{error, info};
use uuid::Uuid;

use super::types::{required, FollowUpRequest, SearchParams, SearchResponse};
use crate::session::SearchSession;
use crate::{ApiError, ApiJson, ApiQuery, ServerState};

/// GET /search?q= - start a new grounded conversation
pub async fn handle_search(
    State(state): State<ServerState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let request_id = Uuid::new_v4().to_string();

    let query = required(params.q.as_deref())
        .ok_or_else(|| ApiError::Validation("Query parameter 'q' is required".to_string()))?;
    info!("[{}] GET /search q={:?}", request_id, query);

    let conversation = state
        .model
        .start_conversation(ConversationOptions::with_web_search());
    let session = state.session_manager.new_session(conversation);

    // Only keep the session once its first turn succeeded
    let response = send_turn(&state, &request_id, &session, query).await?;
    let session = state.session_manager.insert(&request_id, session).await;

    Ok(Json(SearchResponse {
        answer: response.into(),
        session_id: session.session_id.clone(),
    }))
}

/// POST /follow-up - continue an existing conversation
pub async fn handle_follow_up(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<FollowUpRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let request_id = Uuid::new_v4().to_string();

    let (Some(session_id), Some(query)) = (
        required(payload.session_id.as_deref()),
        required(payload.query.as_deref()),
    ) else {
        return Err(ApiError::Validation(
            "Both 'sessionId' and 'query' are required".to_string(),
        ));
    };
    info!("[{}] POST /follow-up session={} q={:?}", request_id, session_id, query);

    let session = state
        .session_manager
        .get_session(&request_id, session_id)
        .await
        .ok_or(ApiError::SessionNotFound)?;

    let response = send_turn(&state, &request_id, &session, query).await?;

    Ok(Json(SearchResponse {
        answer: response.into(),
        session_id: session.session_id.clone(),
    }))
}

/// Fallback for any unmatched method or path
pub async fn handle_not_found() -> ApiError {
    ApiError::RouteNotFound
}

async fn send_turn(
    state: &ServerState,
    request_id: &str,
    session: &SearchSession,
    query: &str,
) -> Result<ModelResponse, ApiError> {
    match timeout(state.upstream_timeout, session.send(request_id, query)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => {
            error!("[{}] - [{}] Model request failed: {}", request_id, session.session_id, e);
            Err(e.into())
        }
        Err(_) => {
            error!(
                "[{}] - [{}] Model request timed out after {:?}",
                request_id, session.session_id, state.upstream_timeout
            );
            Err(ApiError::UpstreamTimeout(state.upstream_timeout))
        }
    }
}
