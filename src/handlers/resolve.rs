use crate::error::ApiError;
use crate::response::ItemResponse;
use crate::state::AppState;
use axum::extract::State;

/// GET handler for every path outside the API prefix
///
/// Redirects for links, stored content for payloads, 404 when nothing in the
/// path hierarchy claims the path.
pub async fn resolve_handler(
    State(state): State<AppState>,
    path: String,
    query: Option<String>,
) -> Result<ItemResponse, ApiError> {
    let response = state.engine.resolve_request(&path, query.as_deref()).await?;
    tracing::debug!("Served {}", path);
    Ok(response)
}
