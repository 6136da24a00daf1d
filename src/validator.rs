use axum::http::HeaderValue;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use url::Url;

use crate::item::{Item, ItemKind};

/// Reason an untrusted write payload was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ItemRejection {
    #[error("Bad type")]
    BadType,
    #[error("Bad validity")]
    BadValidity,
    #[error("Bad payload")]
    BadPayload,
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Invalid contentType")]
    InvalidContentType,
}

/// Normalize and validate an untrusted write payload into an [`Item`]
///
/// `createdAt` is always taken from `now`; whatever the client sent is ignored.
/// Extra fields such as `override` are not part of the item and are dropped.
pub fn validate(raw: &JsonValue, now: DateTime<Utc>) -> Result<Item, ItemRejection> {
    let type_name = raw.get("type").and_then(JsonValue::as_str);
    if !matches!(type_name, Some("link") | Some("payload")) {
        return Err(ItemRejection::BadType);
    }

    let validity = match raw.get("validity") {
        None => None,
        Some(value) => Some(parse_validity(value)?),
    };

    let payload = raw
        .get("payload")
        .and_then(JsonValue::as_str)
        .ok_or(ItemRejection::BadPayload)?
        .to_string();

    let kind = if type_name == Some("link") {
        if Url::parse(&payload).is_err() {
            return Err(ItemRejection::InvalidUrl);
        }
        ItemKind::Link {
            inherit_path: truthy(raw.get("inheritPath")),
            inherit_param: truthy(raw.get("inheritParam")),
        }
    } else {
        let content_type = raw
            .get("contentType")
            .and_then(JsonValue::as_str)
            .filter(|ct| HeaderValue::from_str(ct).is_ok())
            .ok_or(ItemRejection::InvalidContentType)?;
        ItemKind::Payload {
            content_type: content_type.to_string(),
        }
    };

    Ok(Item {
        created_at: now,
        validity,
        payload,
        kind,
    })
}

fn parse_validity(value: &JsonValue) -> Result<u64, ItemRejection> {
    if let Some(seconds) = value.as_u64() {
        return Ok(seconds);
    }
    match value.as_f64() {
        Some(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds.trunc() as u64),
        _ => Err(ItemRejection::BadValidity),
    }
}

/// Loose boolean coercion for client-supplied flags
fn truthy(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(JsonValue::String(s)) => !s.is_empty(),
        Some(JsonValue::Array(_)) | Some(JsonValue::Object(_)) => true,
    }
}
