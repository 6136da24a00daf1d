use serde::{Deserialize, Serialize};

use crate::item::Item;

/// Public subset of the resolver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    pub api_prefix: String,
    /// Withheld while lockdown mode is active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_defined_path_level: Option<usize>,
    pub max_guest_validity: u64,
    pub lockdown_mode: bool,
}

/// Response type for item lookups under the API prefix
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ItemLookupResponse {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub item: Option<Item>,
}

/// Response type for successful writes and deletes
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WriteResponse {
    pub ok: bool,
    /// Effective path, server-generated for writes to the bare API prefix
    pub path: String,
}
