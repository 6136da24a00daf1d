use utoipa::OpenApi;

use crate::error::{ErrorResponse, HealthResponse, UnhealthyResponse};
use crate::handlers;
use crate::models::{ItemLookupResponse, PublicSettings, WriteResponse};

/// OpenAPI documentation
///
/// Item paths are documented under the default `/_` prefix; a deployment
/// with a different `API_PREFIX` serves the same operations below it.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "pathlink API",
        version = "1.0.0",
        description = "Path-addressable redirects and stored content with hierarchical path resolution"
    ),
    paths(
        handlers::health::health_handler,
        handlers::api::settings_handler,
        handlers::api::get_item_handler,
        handlers::api::put_item_handler,
        handlers::api::delete_item_handler
    ),
    components(
        schemas(
            PublicSettings,
            ItemLookupResponse,
            WriteResponse,
            ErrorResponse,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "items", description = "Item inspection and lifecycle operations")
    )
)]
pub struct ApiDoc;
