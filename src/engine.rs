use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::authorize::{authorize_write, WriteRequest};
use crate::config::SiteSettings;
use crate::error::EngineError;
use crate::item::Item;
use crate::models::PublicSettings;
use crate::resolver::resolve;
use crate::response::{build, ItemResponse};
use crate::store::ItemStore;
use crate::validator::validate;

const GENERATED_PATH_LEN: usize = 6;
const GENERATED_PATH_DRAWS: usize = 8;

/// Resolution and item lifecycle over one store and one set of settings
#[derive(Clone)]
pub struct ItemEngine {
    store: Arc<dyn ItemStore>,
    settings: Arc<SiteSettings>,
}

impl ItemEngine {
    pub fn new(store: Arc<dyn ItemStore>, settings: SiteSettings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
        }
    }

    pub fn store(&self) -> &dyn ItemStore {
        self.store.as_ref()
    }

    /// Serve a public request for `path`
    ///
    /// Candidates are looked up lowercased; the inherited suffix keeps the
    /// case the client sent.
    pub async fn resolve_request(&self, path: &str, query: Option<&str>) -> Result<ItemResponse, EngineError> {
        let lowered = path.to_lowercase();
        let resolved = resolve(self.store(), &lowered, self.settings.max_defined_path_level)
            .await?
            .ok_or_else(|| EngineError::NotFound(path.to_string()))?;

        build(path, query, &resolved)
    }

    /// Item stored at exactly `path`, without hierarchy matching
    pub async fn inspect(&self, path: &str) -> Result<Option<Item>, EngineError> {
        Ok(self.store.read(path).await?)
    }

    /// Validate, authorize and store a write, returning the effective path
    ///
    /// # Arguments
    /// * `path` - Target path, or `None` for a server-generated single-segment path
    /// * `raw` - Untrusted JSON body; a top-level `override: true` requests an overwrite
    /// * `is_admin` - Whether the caller presented the admin bearer token
    ///
    /// # Returns
    /// * `Ok(path)` - Item stored at `path`
    /// * `Err(_)` - Rejected before anything was written
    ///
    /// # Errors
    /// Returns the first failed check (item shape, path depth, admin
    /// requirement, reserved prefix, conflict, guest validity ceiling), or a
    /// store error
    pub async fn put(&self, path: Option<&str>, raw: &JsonValue, is_admin: bool) -> Result<String, EngineError> {
        let item = validate(raw, Utc::now())?;
        let request = WriteRequest {
            is_admin,
            override_requested: raw.get("override") == Some(&JsonValue::Bool(true)),
        };

        let path = match path {
            Some(path) => path.to_string(),
            None => self.generate_path().await?,
        };

        authorize_write(self.store(), &path, &item, request, &self.settings).await?;
        self.store.write(&path, &item).await?;

        tracing::info!(
            "Stored {} item at {} (admin: {}, override: {})",
            item.type_name(),
            path,
            request.is_admin,
            request.override_requested
        );
        Ok(path)
    }

    /// Remove the item at exactly `path`; admins only
    ///
    /// # Errors
    /// Returns `AdminRequired` for guests (checked before existence so absence
    /// is not revealed), `NotFound` when nothing is stored at `path`, or a
    /// store error
    pub async fn delete(&self, path: &str, is_admin: bool) -> Result<(), EngineError> {
        if !is_admin {
            return Err(EngineError::AdminRequired);
        }
        if self.store.read(path).await?.is_none() {
            return Err(EngineError::NotFound(path.to_string()));
        }
        self.store.delete(path).await?;

        tracing::info!("Deleted item at {}", path);
        Ok(())
    }

    pub fn public_settings(&self) -> PublicSettings {
        PublicSettings {
            api_prefix: self.settings.api_prefix.clone(),
            max_defined_path_level: (!self.settings.lockdown_mode)
                .then_some(self.settings.max_defined_path_level),
            max_guest_validity: self.settings.max_guest_validity,
            lockdown_mode: self.settings.lockdown_mode,
        }
    }

    /// Draw `/xxxxxx` paths until one is free
    async fn generate_path(&self) -> Result<String, EngineError> {
        for _ in 0..GENERATED_PATH_DRAWS {
            let id = Uuid::new_v4().simple().to_string();
            let path = format!("/{}", &id[..GENERATED_PATH_LEN]);
            if self.store.read(&path).await?.is_none() {
                return Ok(path);
            }
            tracing::debug!("Generated path {} is taken, drawing again", path);
        }
        Err(EngineError::AlreadyExists)
    }
}
