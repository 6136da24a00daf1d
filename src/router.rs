use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::routes;
use crate::state::AppState;

/// Build the application router
///
/// Fixed routes (health, docs) are matched first; every other request falls
/// through to the dispatcher, which splits API calls from public reads.
pub fn build_router(state: AppState) -> Router {
    let cors = state.config.site.allow_cors.layer();

    let router = Router::new()
        .route(routes::HEALTH, get(handlers::health_handler))
        .merge(SwaggerUi::new(routes::SWAGGER_UI).url(routes::OPENAPI_JSON, ApiDoc::openapi()))
        .fallback(handlers::dispatch_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}
