use axum::http::{header, HeaderMap};

/// Whether the request carries the admin bearer token
///
/// Exact match of `Authorization: Bearer <token>`. Every write re-checks;
/// nothing is cached between requests. An empty token never grants access.
pub fn is_admin(headers: &HeaderMap, admin_token: &str) -> bool {
    if admin_token.is_empty() {
        return false;
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == admin_token)
}
