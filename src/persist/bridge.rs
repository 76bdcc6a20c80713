//! Persistence bridge between in-memory state and the key/value store.
//!
//! DESIGN
//! ======
//! Each state slice lives under its own key. Slices are read once at start
//! and written back after every mutation that touches them.
//!
//! ERROR HANDLING
//! ==============
//! Reads never fail: a missing key yields the slice default, and an
//! unreadable or malformed value is logged and also treated as absent. A
//! corrupt entry in storage must not keep the dashboard from opening.
//! Writes do propagate errors so the caller can surface them.

#[cfg(test)]
#[path = "bridge_test.rs"]
mod tests;

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::storage::{
    KeyValueStore, PANELS_KEY, SCREEN_LAYOUTS_MAP_KEY, SCREEN_LIST_KEY, SCREEN_PANEL_MAP_KEY, SCREENS_KEY,
    StorageError,
};
use crate::state::{Layouts, PanelId, PanelRegistry, Screen, ScreenId, ScreenList, ScreenRegistry, Workspace};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// GENERIC SLICES
// =============================================================================

/// Read and decode one slice. Absent or unreadable values yield `None`.
pub fn load_slice<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "storage read failed; using default");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "stored value malformed; using default");
            None
        }
    }
}

/// Encode and write one slice.
///
/// # Errors
///
/// Returns a [`PersistError`] if encoding or the store write fails.
pub fn save_slice<T, S>(store: &S, key: &'static str, value: &T) -> Result<(), PersistError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| PersistError::Encode { key, source })?;
    store.set_item(key, &raw)?;
    debug!(key, bytes = raw.len(), "slice saved");
    Ok(())
}

// =============================================================================
// WORKSPACE
// =============================================================================

/// Load the workspace, repairing any dangling references.
///
/// Stores written by older builds kept panel ids and layouts in two separate
/// screen-keyed maps instead of the `screens` registry; those are folded in
/// when `screens` is absent.
pub fn load_workspace<S: KeyValueStore + ?Sized>(store: &S) -> Workspace {
    let list: ScreenList = load_slice(store, SCREEN_LIST_KEY).unwrap_or_default();
    let screens: ScreenRegistry = load_slice(store, SCREENS_KEY).unwrap_or_else(|| load_split_screens(store, &list));
    let panels: PanelRegistry = load_slice(store, PANELS_KEY).unwrap_or_default();

    let mut workspace = Workspace::from_parts(list, screens, panels);
    workspace.repair();
    debug!(
        screens = workspace.list().len(),
        panels = workspace.panels().len(),
        "workspace loaded"
    );
    workspace
}

#[derive(serde::Deserialize)]
#[serde(transparent)]
struct ScreenPanelMap(#[serde(with = "super::codec::map_envelope")] HashMap<ScreenId, Vec<PanelId>>);

#[derive(serde::Deserialize)]
#[serde(transparent)]
struct ScreenLayoutsMap(#[serde(with = "super::codec::map_envelope")] HashMap<ScreenId, Layouts>);

fn load_split_screens<S: KeyValueStore + ?Sized>(store: &S, list: &ScreenList) -> ScreenRegistry {
    let panel_map: Option<ScreenPanelMap> = load_slice(store, SCREEN_PANEL_MAP_KEY);
    let layouts_map: Option<ScreenLayoutsMap> = load_slice(store, SCREEN_LAYOUTS_MAP_KEY);
    if panel_map.is_none() && layouts_map.is_none() {
        return ScreenRegistry::new();
    }

    let mut panel_map = panel_map.map(|m| m.0).unwrap_or_default();
    let mut layouts_map = layouts_map.map(|m| m.0).unwrap_or_default();
    let mut registry = ScreenRegistry::new();
    for id in list.iter() {
        registry.insert(Screen {
            id: id.clone(),
            panel_ids: panel_map.remove(id).unwrap_or_default(),
            layouts: layouts_map.remove(id).unwrap_or_default(),
        });
    }
    debug!(screens = registry.len(), "migrated split screen maps");
    registry
}

/// Write every workspace slice.
///
/// # Errors
///
/// Returns the first [`PersistError`] encountered.
pub fn save_workspace<S: KeyValueStore + ?Sized>(store: &S, workspace: &Workspace) -> Result<(), PersistError> {
    save_slice(store, SCREEN_LIST_KEY, workspace.list())?;
    save_slice(store, SCREENS_KEY, workspace.screens())?;
    save_slice(store, PANELS_KEY, workspace.panels())?;
    Ok(())
}
