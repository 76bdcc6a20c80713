//! Responsive grid layouts for panels on a screen.
//!
//! DESIGN
//! ======
//! Each screen keeps one rect list per breakpoint tier. The grid library on
//! the rendering side recomputes a whole tier after every drag or resize, so
//! tiers are replaced wholesale rather than patched rect-by-rect.
//!
//! TRADE-OFFS
//! ==========
//! Overlapping rects are detected and reported but never rejected: the grid
//! compacts collisions itself on the next render, and refusing a settled
//! layout would leave the screen stuck on the previous arrangement.

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::ids::PanelId;
use super::panels::PanelCode;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout rect for panel {0} has zero width or height")]
    EmptyRect(PanelId),
    #[error("unknown breakpoint: {0}")]
    UnknownBreakpoint(String),
}

// =============================================================================
// BREAKPOINTS
// =============================================================================

/// Viewport-width tier with its own grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    #[default]
    Lg,
    Md,
    Sm,
    Xs,
    Xxs,
}

impl Breakpoint {
    pub const ALL: [Breakpoint; 5] = [Self::Lg, Self::Md, Self::Sm, Self::Xs, Self::Xxs];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Lg => "lg",
            Self::Md => "md",
            Self::Sm => "sm",
            Self::Xs => "xs",
            Self::Xxs => "xxs",
        }
    }

    /// Number of grid columns at this tier.
    #[must_use]
    pub fn columns(self) -> u32 {
        match self {
            Self::Lg => 12,
            Self::Md => 10,
            Self::Sm => 6,
            Self::Xs => 4,
            Self::Xxs => 2,
        }
    }

    /// Smallest viewport width (px) served by this tier.
    #[must_use]
    pub fn min_width(self) -> u32 {
        match self {
            Self::Lg => 1200,
            Self::Md => 996,
            Self::Sm => 768,
            Self::Xs => 480,
            Self::Xxs => 0,
        }
    }

    /// Pick the widest tier whose minimum width fits `width_px`.
    #[must_use]
    pub fn for_width(width_px: u32) -> Self {
        Self::ALL
            .into_iter()
            .find(|bp| width_px >= bp.min_width())
            .unwrap_or(Self::Xxs)
    }

    /// Parse a tier name as stored in layout maps.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownBreakpoint`] for names outside the fixed set.
    pub fn parse(raw: &str) -> Result<Self, LayoutError> {
        Self::ALL
            .into_iter()
            .find(|bp| bp.name() == raw)
            .ok_or_else(|| LayoutError::UnknownBreakpoint(raw.to_owned()))
    }
}

// =============================================================================
// RECTS
// =============================================================================

/// One panel's grid cell position and size for one breakpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRect {
    /// Panel this rect places (`i` in grid-layout terms).
    #[serde(rename = "i")]
    pub panel_id: PanelId,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl LayoutRect {
    #[must_use]
    pub fn new(panel_id: PanelId, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { panel_id, x, y, w, h }
    }

    /// # Errors
    ///
    /// Returns [`LayoutError::EmptyRect`] when width or height is zero.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.w == 0 || self.h == 0 {
            return Err(LayoutError::EmptyRect(self.panel_id.clone()));
        }
        Ok(())
    }

    /// First row below this rect.
    #[must_use]
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    #[must_use]
    pub fn overlaps(&self, other: &LayoutRect) -> bool {
        self.x < other.x.saturating_add(other.w)
            && other.x < self.x.saturating_add(self.w)
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Place a new panel beneath everything already on the tier.
#[must_use]
pub fn default_rect(panel_id: PanelId, existing: &[LayoutRect], breakpoint: Breakpoint, code: PanelCode) -> LayoutRect {
    let (w, h) = code.default_size();
    let y = existing.iter().map(LayoutRect::bottom).max().unwrap_or(0);
    LayoutRect { panel_id, x: 0, y, w: w.min(breakpoint.columns()), h }
}

/// Index pairs of rects that share at least one grid cell.
#[must_use]
pub fn find_overlaps(rects: &[LayoutRect]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in rects.iter().enumerate() {
        for (j, b) in rects.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

// =============================================================================
// LAYOUTS
// =============================================================================

/// Per-breakpoint rect lists for one screen, keyed by tier name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layouts(BTreeMap<String, Vec<LayoutRect>>);

impl Layouts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn tier(&self, breakpoint: Breakpoint) -> &[LayoutRect] {
        self.0.get(breakpoint.name()).map_or(&[], Vec::as_slice)
    }

    pub fn push(&mut self, breakpoint: Breakpoint, rect: LayoutRect) {
        self.0.entry(breakpoint.name().to_owned()).or_default().push(rect);
    }

    pub fn set_tier(&mut self, name: impl Into<String>, rects: Vec<LayoutRect>) {
        self.0.insert(name.into(), rects);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LayoutRect])> {
        self.0.iter().map(|(name, rects)| (name.as_str(), rects.as_slice()))
    }

    pub fn rects(&self) -> impl Iterator<Item = &LayoutRect> {
        self.0.values().flatten()
    }

    /// Drop every rect for `panel_id` across all tiers.
    pub fn remove_panel(&mut self, panel_id: &PanelId) {
        for rects in self.0.values_mut() {
            rects.retain(|rect| &rect.panel_id != panel_id);
        }
    }

    /// Keep only rects whose panel satisfies `keep`. Returns how many were dropped.
    pub fn retain_panels<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&PanelId) -> bool,
    {
        let mut dropped = 0;
        for rects in self.0.values_mut() {
            let before = rects.len();
            rects.retain(|rect| keep(&rect.panel_id));
            dropped += before - rects.len();
        }
        dropped
    }

    /// Copy of these layouts with panel ids rewritten through `renames`.
    /// Rects whose id is not in `renames` are dropped.
    #[must_use]
    pub fn renamed(&self, renames: &HashMap<PanelId, PanelId>) -> Self {
        let tiers = self
            .0
            .iter()
            .map(|(name, rects)| {
                let rewritten = rects
                    .iter()
                    .filter_map(|rect| {
                        renames
                            .get(&rect.panel_id)
                            .map(|new_id| LayoutRect { panel_id: new_id.clone(), ..rect.clone() })
                    })
                    .collect();
                (name.clone(), rewritten)
            })
            .collect();
        Self(tiers)
    }

    /// # Errors
    ///
    /// Returns the first zero-sized rect found.
    pub fn validate(&self) -> Result<(), LayoutError> {
        self.rects().try_for_each(LayoutRect::validate)
    }
}

impl FromIterator<(String, Vec<LayoutRect>)> for Layouts {
    fn from_iter<I: IntoIterator<Item = (String, Vec<LayoutRect>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
