//! Virtual screens: the ordered screen list and the screen registry.
//!
//! SYSTEM CONTEXT
//! ==============
//! The list decides tab order; the registry owns each screen's panel ids
//! and layouts. Both are plain containers here; the cross-slice operations
//! (cascading deletes, copy) live on `Workspace` so they apply atomically.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ids::{PanelId, ScreenId};
use super::layout::Layouts;

/// One page of the dashboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub id: ScreenId,
    /// Panels on this screen, in insertion order.
    pub panel_ids: Vec<PanelId>,
    pub layouts: Layouts,
}

impl Screen {
    #[must_use]
    pub fn new(id: ScreenId) -> Self {
        Self { id, panel_ids: Vec::new(), layouts: Layouts::new() }
    }

    #[must_use]
    pub fn owns(&self, panel_id: &PanelId) -> bool {
        self.panel_ids.contains(panel_id)
    }
}

/// Ordered screen ids, as shown in the screen switcher.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenList(Vec<ScreenId>);

impl ScreenList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ScreenId> {
        self.0.get(index)
    }

    #[must_use]
    pub fn position(&self, id: &ScreenId) -> Option<usize> {
        self.0.iter().position(|s| s == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScreenId> {
        self.0.iter()
    }

    pub(crate) fn push(&mut self, id: ScreenId) {
        self.0.push(id);
    }

    /// Caller guarantees `index <= len`.
    pub(crate) fn insert(&mut self, index: usize, id: ScreenId) {
        self.0.insert(index, id);
    }

    /// Caller guarantees `index < len`.
    pub(crate) fn remove(&mut self, index: usize) -> ScreenId {
        self.0.remove(index)
    }

    pub(crate) fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&ScreenId) -> bool,
    {
        self.0.retain(keep);
    }

    pub(crate) fn dedup_preserving_order(&mut self) -> usize {
        let before = self.0.len();
        let mut seen = std::collections::HashSet::new();
        self.0.retain(|id| seen.insert(id.clone()));
        before - self.0.len()
    }
}

impl FromIterator<ScreenId> for ScreenList {
    fn from_iter<I: IntoIterator<Item = ScreenId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// All screens keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenRegistry {
    #[serde(with = "crate::persist::codec::map_envelope")]
    screens: HashMap<ScreenId, Screen>,
}

impl ScreenRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.screens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &ScreenId) -> Option<&Screen> {
        self.screens.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &ScreenId) -> Option<&mut Screen> {
        self.screens.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ScreenId) -> bool {
        self.screens.contains_key(id)
    }

    pub(crate) fn insert(&mut self, screen: Screen) {
        self.screens.insert(screen.id.clone(), screen);
    }

    pub(crate) fn remove(&mut self, id: &ScreenId) -> Option<Screen> {
        self.screens.remove(id)
    }

    pub fn values(&self) -> impl Iterator<Item = &Screen> {
        self.screens.values()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut Screen> {
        self.screens.values_mut()
    }
}
