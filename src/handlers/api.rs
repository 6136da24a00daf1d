use crate::error::{ApiError, ErrorResponse};
use crate::models::{ItemLookupResponse, PublicSettings, WriteResponse};
use crate::routes;
use crate::state::AppState;
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::Value as JsonValue;

/// GET {apiPrefix} handler - Public resolver settings
#[utoipa::path(
    get,
    path = routes::API_ROOT,
    responses(
        (status = 200, description = "Public settings; maxDefinedPathLevel is withheld in lockdown mode", body = PublicSettings)
    ),
    tag = "items"
)]
pub async fn settings_handler(State(state): State<AppState>) -> Json<PublicSettings> {
    Json(state.engine.public_settings())
}

/// GET {apiPrefix}/{path} handler - Inspect the item stored at exactly this path
#[utoipa::path(
    get,
    path = routes::API_ITEM,
    params(
        ("path" = String, Path, description = "Item path below the API prefix")
    ),
    responses(
        (status = 200, description = "Item found", body = ItemLookupResponse),
        (status = 404, description = "No item at this path", body = ItemLookupResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn get_item_handler(
    State(state): State<AppState>,
    path: String,
) -> Result<(StatusCode, Json<ItemLookupResponse>), ApiError> {
    match state.engine.inspect(&path).await? {
        Some(item) => Ok((
            StatusCode::OK,
            Json(ItemLookupResponse {
                found: true,
                item: Some(item),
            }),
        )),
        None => {
            tracing::debug!("No item at {}", path);
            Ok((
                StatusCode::NOT_FOUND,
                Json(ItemLookupResponse {
                    found: false,
                    item: None,
                }),
            ))
        }
    }
}

/// PUT {apiPrefix}/{path} handler - Create or override an item
///
/// Admin rights come from `Authorization: Bearer <ADMIN_TOKEN>`.
/// A PUT to the bare prefix (`path` is `None`) stores the item at a
/// server-generated path, named in the response.
#[utoipa::path(
    put,
    path = routes::API_ITEM,
    params(
        ("path" = String, Path, description = "Item path below the API prefix; omit to generate one")
    ),
    request_body(
        content = serde_json::Value,
        description = "Item fields (`type`, `payload`, `validity`, `inheritPath`, `inheritParam`, `contentType`) plus an optional `override: true`"
    ),
    responses(
        (status = 200, description = "Item stored", body = WriteResponse),
        (status = 400, description = "Invalid item, path or JSON, or a conflicting item", body = ErrorResponse),
        (status = 403, description = "Admin credential required", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn put_item_handler(
    State(state): State<AppState>,
    path: Option<String>,
    is_admin: bool,
    body: Bytes,
) -> Result<(StatusCode, Json<WriteResponse>), ApiError> {
    let raw: JsonValue = serde_json::from_slice(&body)?;

    let path = state.engine.put(path.as_deref(), &raw, is_admin).await?;

    Ok((StatusCode::OK, Json(WriteResponse { ok: true, path })))
}

/// DELETE {apiPrefix}/{path} handler - Remove an item (admin bearer token only)
#[utoipa::path(
    delete,
    path = routes::API_ITEM,
    params(
        ("path" = String, Path, description = "Item path below the API prefix")
    ),
    responses(
        (status = 200, description = "Item deleted", body = WriteResponse),
        (status = 403, description = "Admin credential required", body = ErrorResponse),
        (status = 404, description = "No item at this path", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn delete_item_handler(
    State(state): State<AppState>,
    path: String,
    is_admin: bool,
) -> Result<(StatusCode, Json<WriteResponse>), ApiError> {
    state.engine.delete(&path, is_admin).await?;

    Ok((StatusCode::OK, Json(WriteResponse { ok: true, path })))
}
