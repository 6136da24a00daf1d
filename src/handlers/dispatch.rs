use crate::auth::is_admin;
use crate::error::ApiError;
use crate::path::{api_sub_path, normalize_request_path};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use super::{api, resolve};

/// Fallback handler for every path without a fixed route
///
/// Paths under the configured API prefix go to the item API; everything else
/// is a public read resolved through the path hierarchy.
pub async fn dispatch_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }

    let path = normalize_request_path(uri.path());
    let site = &state.config.site;

    let Some(sub_path) = api_sub_path(&path, &site.api_prefix) else {
        return match method {
            Method::GET | Method::HEAD => {
                let query = uri.query().map(str::to_string);
                resolve::resolve_handler(State(state), path, query)
                    .await
                    .into_response()
            }
            _ => ApiError::MethodNotAllowed("Invalid path for API".to_string()).into_response(),
        };
    };

    let sub_path = sub_path.to_lowercase();
    let admin = is_admin(&headers, &site.admin_token);
    tracing::debug!("API {} {} (admin: {})", method, sub_path, admin);

    match method {
        Method::GET if sub_path.is_empty() => api::settings_handler(State(state)).await.into_response(),
        Method::GET => api::get_item_handler(State(state), sub_path).await.into_response(),
        Method::PUT => {
            let path = (!sub_path.is_empty()).then_some(sub_path);
            api::put_item_handler(State(state), path, admin, body)
                .await
                .into_response()
        }
        Method::DELETE => api::delete_item_handler(State(state), sub_path, admin)
            .await
            .into_response(),
        other => ApiError::MethodNotAllowed(format!("Method {} is not allowed for the API", other))
            .into_response(),
    }
}
