use anyhow::Result;

use crate::item::Item;
use crate::path::candidate_paths;
use crate::store::ItemStore;

/// An item selected for a request, with the candidate path it was stored at
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub item: Item,
    pub matched_path: String,
}

/// Find the item serving `path`, longest match first
///
/// A stored item matches when it sits at exactly `path`, or when it is a link
/// with `inheritPath` at a shallower candidate (a catch-all for unmapped
/// sub-paths). Anything else found on the way is skipped.
pub async fn resolve(store: &dyn ItemStore, path: &str, max_level: usize) -> Result<Option<Resolved>> {
    for candidate in candidate_paths(path, max_level) {
        let Some(item) = store.read(&candidate).await? else {
            continue;
        };

        if candidate == path || item.inherits_path() {
            tracing::debug!("Resolved {} to {} item at {}", path, item.type_name(), candidate);
            return Ok(Some(Resolved {
                item,
                matched_path: candidate,
            }));
        }

        tracing::trace!("Skipping {} item at {} for {}", item.type_name(), candidate, path);
    }

    Ok(None)
}
