use std::fmt;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use url::Url;

/// Cross-origin policy for every response the service produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Any origin may call the service
    Open,
    /// No CORS headers are emitted
    Closed,
    /// Only origins matching one of these entries
    AllowList(Vec<String>),
}

impl CorsPolicy {
    /// `*`/`true` opens the service, empty/`false` closes it, anything else
    /// is a comma-separated allow-list.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "*" | "true" => CorsPolicy::Open,
            "" | "false" => CorsPolicy::Closed,
            list => {
                let entries: Vec<String> = list
                    .split(',')
                    .map(|entry| entry.trim().to_ascii_lowercase())
                    .filter(|entry| !entry.is_empty())
                    .collect();
                if entries.is_empty() {
                    CorsPolicy::Closed
                } else {
                    CorsPolicy::AllowList(entries)
                }
            }
        }
    }

    /// The tower layer enforcing this policy, `None` when closed
    pub fn layer(&self) -> Option<CorsLayer> {
        let allow_origin = match self {
            CorsPolicy::Closed => return None,
            CorsPolicy::Open => AllowOrigin::any(),
            CorsPolicy::AllowList(entries) => {
                let entries = Arc::new(entries.clone());
                AllowOrigin::predicate(move |origin: &HeaderValue, _| {
                    origin
                        .to_str()
                        .is_ok_and(|origin| origin_allowed(origin, &entries))
                })
            }
        };

        Some(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods([Method::GET, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
    }
}

impl fmt::Display for CorsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorsPolicy::Open => write!(f, "open"),
            CorsPolicy::Closed => write!(f, "closed"),
            CorsPolicy::AllowList(entries) => write!(f, "allow-list [{}]", entries.join(", ")),
        }
    }
}

/// An origin matches an entry written either as a full origin
/// (`https://short.example`) or as a bare host (`short.example`).
pub fn origin_allowed(origin: &str, entries: &[String]) -> bool {
    let origin = origin.to_ascii_lowercase();
    let host = Url::parse(&origin)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string));

    entries.iter().any(|entry| {
        entry.trim_end_matches('/') == origin || host.as_deref() == Some(entry.as_str())
    })
}
