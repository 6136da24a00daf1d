//! Write authorization and hierarchy conflict checks.
//!
//! Checks run in a fixed order and the first failure wins:
//! path shape, depth limit, admin requirement (override or lockdown),
//! reserved prefixes, conflict scan, guest validity ceiling.
//! Nothing here writes; the caller commits only after `authorize_write`
//! returns `Ok`.

use crate::config::SiteSettings;
use crate::error::EngineError;
use crate::item::{Item, ItemKind};
use crate::path::{candidate_paths, is_well_formed, path_depth};
use crate::store::ItemStore;

/// Caller-side facts about a write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteRequest {
    pub is_admin: bool,
    pub override_requested: bool,
}

pub async fn authorize_write(
    store: &dyn ItemStore,
    path: &str,
    item: &Item,
    request: WriteRequest,
    settings: &SiteSettings,
) -> Result<(), EngineError> {
    if !is_well_formed(path) {
        return Err(EngineError::InvalidPath(path.to_string()));
    }

    let depth = path_depth(path);
    if depth > settings.max_defined_path_level {
        return Err(EngineError::PathTooDeep {
            max: settings.max_defined_path_level,
            depth,
        });
    }

    if request.override_requested && !request.is_admin {
        return Err(EngineError::OverrideDenied);
    }
    if settings.lockdown_mode && !request.is_admin {
        return Err(EngineError::LockdownDenied);
    }

    if !request.override_requested && settings.is_reserved(path) {
        return Err(EngineError::ReservedPath(path.to_string()));
    }

    check_conflict(store, path, request.override_requested, settings.max_defined_path_level)
        .await?;

    if exceeds_guest_ceiling(item, settings.max_guest_validity) && !request.is_admin {
        return Err(EngineError::GuestForbidden);
    }

    Ok(())
}

/// Scan `path` and its ancestors for items that already claim it
///
/// Override only lifts the exact-path conflict; an ancestor link with
/// `inheritPath` claims the whole subtree either way.
pub async fn check_conflict(
    store: &dyn ItemStore,
    path: &str,
    override_requested: bool,
    max_level: usize,
) -> Result<(), EngineError> {
    for candidate in candidate_paths(path, max_level) {
        let Some(existing) = store.read(&candidate).await? else {
            continue;
        };

        if candidate == path {
            if !override_requested {
                return Err(EngineError::AlreadyExists);
            }
            continue;
        }

        match existing.kind {
            ItemKind::Payload { .. } => continue,
            ItemKind::Link { inherit_path: true, .. } => {
                return Err(EngineError::InheritedConflict(candidate));
            }
            ItemKind::Link { .. } => continue,
        }
    }
    Ok(())
}

/// Non-admins must ask for an expiry within the configured ceiling
///
/// A validity of 0 means "never expires", so it exceeds any ceiling.
fn exceeds_guest_ceiling(item: &Item, max_guest_validity: u64) -> bool {
    if max_guest_validity == 0 {
        return false;
    }
    match item.expiry_seconds() {
        Some(validity) => validity > max_guest_validity,
        None => true,
    }
}
