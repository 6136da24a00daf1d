use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::error::EngineError;
use crate::item::{shim_content_type, ItemKind};
use crate::resolver::Resolved;

const X_ROBOTS_TAG: HeaderName = HeaderName::from_static("x-robots-tag");

/// What a resolved item serves to the client
#[derive(Debug, Clone, PartialEq)]
pub enum ItemResponse {
    /// `302 Found` to the final target URL
    Redirect(Url),
    /// `200 OK` with the stored payload
    Content {
        body: String,
        content_type: Option<String>,
    },
}

impl IntoResponse for ItemResponse {
    fn into_response(self) -> Response {
        match self {
            ItemResponse::Redirect(target) => (
                StatusCode::FOUND,
                [
                    (header::LOCATION, target.to_string()),
                    (X_ROBOTS_TAG, "noindex".to_string()),
                ],
                target.to_string(),
            )
                .into_response(),
            ItemResponse::Content { body, content_type } => {
                let mut response = Response::new(Body::from(body));
                if let Some(content_type) = content_type {
                    match HeaderValue::from_str(&content_type) {
                        Ok(value) => {
                            response.headers_mut().insert(header::CONTENT_TYPE, value);
                        }
                        Err(_) => tracing::warn!("Dropping unusable content type {:?}", content_type),
                    }
                }
                response
            }
        }
    }
}

/// Turn a resolved item into the response for `request_path`
///
/// `request_path` keeps its original case so an inherited suffix is forwarded
/// as the client sent it; `query` is the raw query string, if any.
pub fn build(request_path: &str, query: Option<&str>, resolved: &Resolved) -> Result<ItemResponse, EngineError> {
    let item = &resolved.item;
    match &item.kind {
        ItemKind::Link {
            inherit_path,
            inherit_param,
        } => {
            let mut target = Url::parse(&item.payload).map_err(|source| EngineError::BadPayloadUrl {
                path: resolved.matched_path.clone(),
                source,
            })?;

            if *inherit_path {
                if let Some(suffix) = inherited_suffix(request_path, &resolved.matched_path) {
                    append_path(&mut target, suffix);
                }
            }
            if *inherit_param {
                if let Some(query) = query.filter(|q| !q.is_empty()) {
                    merge_query(&mut target, query);
                }
            }

            Ok(ItemResponse::Redirect(target))
        }
        ItemKind::Payload { content_type } => Ok(ItemResponse::Content {
            body: item.payload.clone(),
            content_type: Some(shim_content_type(content_type)).filter(|ct| !ct.is_empty()),
        }),
    }
}

/// Part of `request_path` below `matched`, compared ASCII case-insensitively
fn inherited_suffix<'a>(request_path: &'a str, matched: &str) -> Option<&'a str> {
    let head = request_path.get(..matched.len())?;
    if !head.eq_ignore_ascii_case(matched) {
        return None;
    }
    let suffix = &request_path[matched.len()..];
    (!suffix.is_empty()).then_some(suffix)
}

fn append_path(target: &mut Url, suffix: &str) {
    let path = format!("{}{}", target.path().trim_end_matches('/'), suffix);
    target.set_path(&path);
}

/// Set every inbound parameter on `target`, replacing same-named ones
fn merge_query(target: &mut Url, query: &str) {
    let mut pairs: Vec<(String, String)> = target.query_pairs().into_owned().collect();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()).into_owned() {
        match pairs.iter().position(|(k, _)| *k == key) {
            Some(first) => {
                pairs[first].1 = value;
                let mut index = 0;
                pairs.retain(|(k, _)| {
                    let keep = index <= first || *k != key;
                    index += 1;
                    keep
                });
            }
            None => pairs.push((key, value)),
        }
    }

    if pairs.is_empty() {
        return;
    }
    target.query_pairs_mut().clear().extend_pairs(pairs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;

    fn resolved(path: &str, item: Item) -> Resolved {
        Resolved {
            item,
            matched_path: path.to_string(),
        }
    }

    fn redirect_target(response: ItemResponse) -> String {
        match response {
            ItemResponse::Redirect(url) => url.to_string(),
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_link_redirects_to_payload() {
        let r = resolved("/a", Item::link("https://ex.com/x", false, false));
        let target = redirect_target(build("/a", Some("q=1"), &r).unwrap());
        assert_eq!(target, "https://ex.com/x");
    }

    #[test]
    fn test_inherit_path_appends_suffix() {
        let r = resolved("/a", Item::link("https://ex.com/x", true, false));
        let target = redirect_target(build("/a/b/c", None, &r).unwrap());
        assert_eq!(target, "https://ex.com/x/b/c");
    }

    #[test]
    fn test_inherit_path_keeps_suffix_case() {
        let r = resolved("/docs", Item::link("https://ex.com/", true, false));
        let target = redirect_target(build("/Docs/ReadMe", None, &r).unwrap());
        assert_eq!(target, "https://ex.com/ReadMe");
    }

    #[test]
    fn test_inherit_path_on_exact_match_is_a_noop() {
        let r = resolved("/a", Item::link("https://ex.com/x", true, false));
        let target = redirect_target(build("/a", None, &r).unwrap());
        assert_eq!(target, "https://ex.com/x");
    }

    #[test]
    fn test_inherit_param_overwrites_existing_keys() {
        let r = resolved("/a", Item::link("https://ex.com/x?x=0&y=2&x=9", false, true));
        let target = redirect_target(build("/a", Some("x=1&z=3"), &r).unwrap());
        assert_eq!(target, "https://ex.com/x?x=1&y=2&z=3");
    }

    #[test]
    fn test_query_ignored_without_inherit_param() {
        let r = resolved("/a", Item::link("https://ex.com/x?y=2", true, false));
        let target = redirect_target(build("/a/b", Some("x=1"), &r).unwrap());
        assert_eq!(target, "https://ex.com/x/b?y=2");
    }

    #[test]
    fn test_docs_guide_scenario() {
        let r = resolved("/docs", Item::link("https://example.org/docs", true, true));
        let target = redirect_target(build("/docs/guide", Some("x=1"), &r).unwrap());
        assert_eq!(target, "https://example.org/docs/guide?x=1");
    }

    #[test]
    fn test_broken_link_is_internal() {
        let r = resolved("/a", Item::link("not a url", false, false));
        let err = build("/a", None, &r).unwrap_err();
        assert!(matches!(err, EngineError::BadPayloadUrl { ref path, .. } if path == "/a"));
        assert_eq!(err.kind(), crate::error::ErrorKind::Internal);
    }

    #[test]
    fn test_payload_content_type_shim() {
        let r = resolved("/p", Item::content("hello", "text/plain"));
        assert_eq!(
            build("/p", None, &r).unwrap(),
            ItemResponse::Content {
                body: "hello".to_string(),
                content_type: Some("text/plain; charset=UTF-8".to_string()),
            }
        );
    }

    #[test]
    fn test_payload_without_content_type() {
        let r = resolved("/p", Item::content("raw", ""));
        let response = build("/p", None, &r).unwrap().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_redirect_response_headers() {
        let response = ItemResponse::Redirect(Url::parse("https://ex.com/x").unwrap()).into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "https://ex.com/x");
        assert_eq!(response.headers()["x-robots-tag"], "noindex");
    }
}
