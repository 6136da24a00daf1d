//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::config::{Config, SiteSettings, StorageConfig};
use crate::cors::CorsPolicy;
use crate::engine::ItemEngine;
use crate::state::AppState;
use crate::store::MemoryItemStore;

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub fn site_settings() -> SiteSettings {
    SiteSettings {
        api_prefix: "/_".to_string(),
        max_defined_path_level: 2,
        max_guest_validity: 300,
        lockdown_mode: false,
        allow_cors: CorsPolicy::Closed,
        admin_token: ADMIN_TOKEN.to_string(),
        reserved_prefixes: ["/health", "/swagger-ui", "/api-docs", "/.well-known", "/robots.txt", "/favicon.ico"]
            .iter()
            .map(|prefix| prefix.to_string())
            .collect(),
    }
}

/// Application state over a fresh in-memory store
pub fn app_state(site: SiteSettings) -> AppState {
    let config = Config {
        service_port: 3000,
        service_host: "127.0.0.1".to_string(),
        storage: StorageConfig::Memory,
        site: site.clone(),
    };

    AppState {
        engine: ItemEngine::new(Arc::new(MemoryItemStore::new()), site),
        config: Arc::new(config),
    }
}
