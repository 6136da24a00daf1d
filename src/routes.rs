// Route path constants for the fixed endpoints; everything else is dispatched
// at runtime against the configured API prefix.

pub const HEALTH: &str = "/health";
pub const SWAGGER_UI: &str = "/swagger-ui";
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";

// Documentation-only paths for the default API prefix
pub const API_ROOT: &str = "/_";
pub const API_ITEM: &str = "/_/{path}";
