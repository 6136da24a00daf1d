use crate::config::Config;
use crate::engine::ItemEngine;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: ItemEngine,
    pub config: Arc<Config>,
}
