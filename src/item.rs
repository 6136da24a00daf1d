use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A stored unit addressed by a path
///
/// Serializes to the persisted record layout: the common fields plus the
/// variant fields flattened next to a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<u64>,
    pub payload: String,
    #[serde(flatten)]
    pub kind: ItemKind,
}

/// Variant-specific fields, tagged by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    #[serde(rename_all = "camelCase")]
    Link {
        inherit_path: bool,
        inherit_param: bool,
    },
    #[serde(rename_all = "camelCase")]
    Payload { content_type: String },
}

impl Item {
    #[cfg(test)]
    pub fn link(payload: impl Into<String>, inherit_path: bool, inherit_param: bool) -> Self {
        Self {
            created_at: Utc::now(),
            validity: None,
            payload: payload.into(),
            kind: ItemKind::Link {
                inherit_path,
                inherit_param,
            },
        }
    }

    #[cfg(test)]
    pub fn content(payload: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            created_at: Utc::now(),
            validity: None,
            payload: payload.into(),
            kind: ItemKind::Payload {
                content_type: content_type.into(),
            },
        }
    }

    #[cfg(test)]
    pub fn with_validity(mut self, validity: u64) -> Self {
        self.validity = Some(validity);
        self
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ItemKind::Link { .. } => "link",
            ItemKind::Payload { .. } => "payload",
        }
    }

    /// True for a link that claims every deeper, unmapped sub-path
    pub fn inherits_path(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Link {
                inherit_path: true,
                ..
            }
        )
    }

    /// Validity as a positive number of seconds, `None` meaning no expiry
    pub fn expiry_seconds(&self) -> Option<u64> {
        self.validity.filter(|v| *v > 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let seconds = i64::try_from(self.expiry_seconds()?).ok()?;
        self.created_at.checked_add_signed(Duration::try_seconds(seconds)?)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at <= now)
    }
}

/// Unlabeled `text/plain` is served as UTF-8
pub fn shim_content_type(content_type: &str) -> String {
    if content_type == "text/plain" {
        format!("{}; charset=UTF-8", content_type)
    } else {
        content_type.to_string()
    }
}
