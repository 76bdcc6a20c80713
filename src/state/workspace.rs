//! Workspace: screens and their panels mutated as one unit.
//!
//! DESIGN
//! ======
//! `Workspace` owns the screen list, the screen registry, and the panel
//! registry together so every operation that touches more than one of them
//! (cascading deletes, copy, add panel) either applies fully or not at all.
//! Index arguments are bounds-checked up front; a failed operation leaves
//! the workspace untouched.
//!
//! INVARIANTS
//! ==========
//! - Every id in the list has a registry entry, and every registry entry is
//!   listed exactly once.
//! - Every panel id owned by a screen has a panel entry, and every panel is
//!   owned by exactly one screen.
//! - Every layout rect names a panel owned by its screen.

#[cfg(test)]
#[path = "workspace_test.rs"]
mod tests;

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use super::ids::{PanelId, ScreenId};
use super::layout::{Breakpoint, LayoutError, LayoutRect, Layouts, default_rect, find_overlaps};
use super::panels::{Panel, PanelCode, PanelError, PanelRegistry, PanelStatePatch};
use super::screens::{Screen, ScreenList, ScreenRegistry};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("screen index {index} out of range (len {len})")]
    InvalidIndex { index: usize, len: usize },
    #[error("screen not found: {0}")]
    ScreenNotFound(ScreenId),
    #[error(transparent)]
    Panel(#[from] PanelError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("inconsistent workspace: {0}")]
    Inconsistent(String),
}

/// Counts of dangling references dropped by [`Workspace::repair`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub duplicate_screen_ids: usize,
    pub missing_screens: usize,
    pub orphan_screens: usize,
    pub missing_panels: usize,
    pub orphan_panels: usize,
    pub stray_rects: usize,
    pub mislabeled_panels: usize,
}

impl RepairReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// WORKSPACE
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct Workspace {
    list: ScreenList,
    screens: ScreenRegistry,
    panels: PanelRegistry,
    breakpoint: Breakpoint,
}

impl Workspace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a workspace from persisted slices without checking them.
    /// Call [`Workspace::repair`] afterwards when the source is untrusted.
    #[must_use]
    pub fn from_parts(list: ScreenList, screens: ScreenRegistry, panels: PanelRegistry) -> Self {
        Self { list, screens, panels, breakpoint: Breakpoint::default() }
    }

    #[must_use]
    pub fn list(&self) -> &ScreenList {
        &self.list
    }

    #[must_use]
    pub fn screens(&self) -> &ScreenRegistry {
        &self.screens
    }

    #[must_use]
    pub fn panels(&self) -> &PanelRegistry {
        &self.panels
    }

    #[must_use]
    pub fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    /// Switch the tier that new panels are placed on.
    pub fn set_breakpoint(&mut self, breakpoint: Breakpoint) {
        self.breakpoint = breakpoint;
    }

    /// Screen at list position `index`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::InvalidIndex`] when `index` is out of range.
    pub fn screen_at(&self, index: usize) -> Result<&Screen, WorkspaceError> {
        let id = self.checked_id(index)?;
        self.screens
            .get(id)
            .ok_or_else(|| WorkspaceError::ScreenNotFound(id.clone()))
    }

    fn checked_id(&self, index: usize) -> Result<&ScreenId, WorkspaceError> {
        self.list
            .get(index)
            .ok_or(WorkspaceError::InvalidIndex { index, len: self.list.len() })
    }

    // -------------------------------------------------------------------------
    // Screen list operations
    // -------------------------------------------------------------------------

    /// Append a new empty screen.
    pub fn add_screen(&mut self) -> ScreenId {
        let id = ScreenId::generate();
        self.screens.insert(Screen::new(id.clone()));
        self.list.push(id.clone());
        info!(screen_id = %id, screens = self.list.len(), "screen added");
        id
    }

    /// Remove the screen at `index` together with all of its panels.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::InvalidIndex`] when `index` is out of range.
    pub fn remove_screen(&mut self, index: usize) -> Result<ScreenId, WorkspaceError> {
        self.checked_id(index)?;
        let id = self.list.remove(index);
        if let Some(screen) = self.screens.remove(&id) {
            for panel_id in &screen.panel_ids {
                self.panels.remove(panel_id);
            }
            info!(screen_id = %id, panels = screen.panel_ids.len(), "screen removed");
        }
        Ok(id)
    }

    /// Move the screen at `current` so it ends up at `target`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::InvalidIndex`] if either index is out of range.
    pub fn move_screen(&mut self, current: usize, target: usize) -> Result<(), WorkspaceError> {
        self.checked_id(current)?;
        self.checked_id(target)?;
        if current == target {
            return Ok(());
        }
        let id = self.list.remove(current);
        debug!(screen_id = %id, current, target, "screen moved");
        self.list.insert(target, id);
        Ok(())
    }

    /// Duplicate the screen at `index` with fresh panel ids, placing the copy
    /// directly after the source in the list.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::InvalidIndex`] when `index` is out of range.
    pub fn copy_screen(&mut self, index: usize) -> Result<ScreenId, WorkspaceError> {
        let source = self.screen_at(index)?;

        let renames: HashMap<PanelId, PanelId> = source
            .panel_ids
            .iter()
            .map(|old| (old.clone(), PanelId::generate()))
            .collect();

        let mut copies = Vec::with_capacity(source.panel_ids.len());
        for old_id in &source.panel_ids {
            let panel = self
                .panels
                .get(old_id)
                .ok_or_else(|| WorkspaceError::Inconsistent(format!("screen {} lists missing panel {old_id}", source.id)))?;
            let new_id = renames[old_id].clone();
            copies.push(Panel { id: new_id, ..panel.clone() });
        }

        let new_screen = Screen {
            id: ScreenId::generate(),
            panel_ids: source.panel_ids.iter().map(|old| renames[old].clone()).collect(),
            layouts: source.layouts.renamed(&renames),
        };
        let new_id = new_screen.id.clone();
        info!(source = %source.id, screen_id = %new_id, panels = copies.len(), "screen copied");

        for panel in copies {
            self.panels.insert(panel);
        }
        self.screens.insert(new_screen);
        self.list.insert(index + 1, new_id.clone());
        Ok(new_id)
    }

    // -------------------------------------------------------------------------
    // Panel operations
    // -------------------------------------------------------------------------

    /// Add a panel of type `code` to a screen.
    ///
    /// The rect is placed on the current breakpoint only. A caller-supplied
    /// rect keeps its geometry but is re-keyed to the new panel id.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::ScreenNotFound`] or a layout error for a
    /// zero-sized caller rect.
    pub fn add_panel(
        &mut self,
        screen_id: &ScreenId,
        code: PanelCode,
        layout_item: Option<LayoutRect>,
    ) -> Result<PanelId, WorkspaceError> {
        let breakpoint = self.breakpoint;
        let screen = self
            .screens
            .get_mut(screen_id)
            .ok_or_else(|| WorkspaceError::ScreenNotFound(screen_id.clone()))?;

        let panel_id = PanelId::generate();
        let rect = match layout_item {
            Some(item) => {
                let rect = LayoutRect { panel_id: panel_id.clone(), ..item };
                rect.validate()?;
                rect
            }
            None => default_rect(panel_id.clone(), screen.layouts.tier(breakpoint), breakpoint, code),
        };

        screen.layouts.push(breakpoint, rect);
        screen.panel_ids.push(panel_id.clone());
        self.panels.insert(Panel::new(panel_id.clone(), code));
        info!(%screen_id, %panel_id, panel_code = code.as_str(), breakpoint = breakpoint.name(), "panel added");
        Ok(panel_id)
    }

    /// Remove a panel and every rect that places it. Unknown panel ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::ScreenNotFound`] for an unknown screen.
    pub fn remove_panel(&mut self, screen_id: &ScreenId, panel_id: &PanelId) -> Result<(), WorkspaceError> {
        let screen = self
            .screens
            .get_mut(screen_id)
            .ok_or_else(|| WorkspaceError::ScreenNotFound(screen_id.clone()))?;

        if !screen.owns(panel_id) {
            debug!(%screen_id, %panel_id, "remove_panel: panel not on screen");
            return Ok(());
        }

        screen.panel_ids.retain(|id| id != panel_id);
        screen.layouts.remove_panel(panel_id);
        self.panels.remove(panel_id);
        info!(%screen_id, %panel_id, "panel removed");
        Ok(())
    }

    /// Shallow-merge a partial state into one panel.
    ///
    /// # Errors
    ///
    /// Returns a [`PanelError`] for unknown panels or mismatched patch types.
    pub fn update_panel_state(&mut self, panel_id: &PanelId, patch: PanelStatePatch) -> Result<(), WorkspaceError> {
        self.panels.update_state(panel_id, patch)?;
        debug!(%panel_id, "panel state updated");
        Ok(())
    }

    /// Replace a screen's layouts wholesale.
    ///
    /// Rects for panels the screen does not own are dropped; overlapping rects
    /// are kept and logged.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::ScreenNotFound`] or [`LayoutError::EmptyRect`].
    pub fn update_layouts(&mut self, screen_id: &ScreenId, mut layouts: Layouts) -> Result<(), WorkspaceError> {
        let screen = self
            .screens
            .get_mut(screen_id)
            .ok_or_else(|| WorkspaceError::ScreenNotFound(screen_id.clone()))?;

        layouts.validate()?;
        let dropped = layouts.retain_panels(|id| screen.owns(id));
        if dropped > 0 {
            warn!(%screen_id, dropped, "update_layouts: dropped rects for panels not on screen");
        }
        for (tier, rects) in layouts.iter() {
            let overlaps = find_overlaps(rects);
            if !overlaps.is_empty() {
                warn!(%screen_id, tier, count = overlaps.len(), "update_layouts: overlapping rects");
            }
        }

        screen.layouts = layouts;
        debug!(%screen_id, "layouts replaced");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Consistency
    // -------------------------------------------------------------------------

    /// Verify the workspace invariants.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Inconsistent`] describing the first violation.
    pub fn check_invariants(&self) -> Result<(), WorkspaceError> {
        let fail = |msg: String| Err(WorkspaceError::Inconsistent(msg));

        let mut listed = HashSet::new();
        for id in self.list.iter() {
            if !listed.insert(id) {
                return fail(format!("screen {id} listed twice"));
            }
            if !self.screens.contains(id) {
                return fail(format!("listed screen {id} has no registry entry"));
            }
        }
        if listed.len() != self.screens.len() {
            return fail(format!("{} registered screens but {} listed", self.screens.len(), listed.len()));
        }

        let mut owned = HashSet::new();
        for screen in self.screens.values() {
            for panel_id in &screen.panel_ids {
                if !owned.insert(panel_id) {
                    return fail(format!("panel {panel_id} owned twice"));
                }
                if !self.panels.contains(panel_id) {
                    return fail(format!("screen {} lists missing panel {panel_id}", screen.id));
                }
            }
            if let Some(rect) = screen.layouts.rects().find(|rect| !screen.owns(&rect.panel_id)) {
                return fail(format!("screen {} has rect for foreign panel {}", screen.id, rect.panel_id));
            }
        }
        if owned.len() != self.panels.len() {
            return fail(format!("{} panels but {} owned by screens", self.panels.len(), owned.len()));
        }
        for panel_id in self.panels.ids() {
            if let Some(panel) = self.panels.get(panel_id) {
                if panel.panel_code != panel.panel_state.code() {
                    return fail(format!("panel {panel_id} code does not match its state"));
                }
            }
        }
        Ok(())
    }

    /// Drop dangling references so the invariants hold again.
    ///
    /// Registry screens missing from the list are appended rather than
    /// discarded, so a half-finished copy is recovered instead of lost.
    pub fn repair(&mut self) -> RepairReport {
        let mut report = RepairReport { duplicate_screen_ids: self.list.dedup_preserving_order(), ..RepairReport::default() };

        let before = self.list.len();
        let screens = &self.screens;
        self.list.retain(|id| screens.contains(id));
        report.missing_screens = before - self.list.len();

        let mut orphans: Vec<ScreenId> = self
            .screens
            .values()
            .map(|s| s.id.clone())
            .filter(|id| self.list.position(id).is_none())
            .collect();
        orphans.sort();
        report.orphan_screens = orphans.len();
        for id in orphans {
            self.list.push(id);
        }

        let mut owned = HashSet::new();
        for screen in self.screens.values_mut() {
            let before = screen.panel_ids.len();
            let panels = &self.panels;
            screen
                .panel_ids
                .retain(|id| panels.contains(id) && owned.insert(id.clone()));
            report.missing_panels += before - screen.panel_ids.len();

            let ids = screen.panel_ids.clone();
            report.stray_rects += screen.layouts.retain_panels(|id| ids.contains(id));
        }

        let before = self.panels.len();
        self.panels.retain(|id| owned.contains(id));
        report.orphan_panels = before - self.panels.len();

        let mislabeled: Vec<PanelId> = self
            .panels
            .ids()
            .filter(|id| {
                self.panels
                    .get(id)
                    .is_some_and(|p| p.panel_code != p.panel_state.code())
            })
            .cloned()
            .collect();
        report.mislabeled_panels = mislabeled.len();
        for id in mislabeled {
            if let Some(mut panel) = self.panels.remove(&id) {
                panel.panel_code = panel.panel_state.code();
                self.panels.insert(panel);
            }
        }

        if !report.is_clean() {
            warn!(?report, "workspace repaired");
        }
        report
    }
}
