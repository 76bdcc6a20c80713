//! Panel types, per-type UI state, and the panel registry.
//!
//! DESIGN
//! ======
//! Panel state is a closed tagged union keyed by `panelCode`. Partial updates
//! arrive as a patch of the same tag; a patch for a different panel type is
//! refused instead of being merged, so a clock can never pick up board keys.

#[cfg(test)]
#[path = "panels_test.rs"]
mod tests;

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::ids::PanelId;
use crate::board::EditorDocument;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("panel not found: {0}")]
    NotFound(PanelId),
    #[error("{patch:?} patch cannot be applied to a {state:?} panel")]
    StateMismatch { state: PanelCode, patch: PanelCode },
    #[error("invalid panel state patch: {0}")]
    InvalidPatch(#[from] serde_json::Error),
}

// =============================================================================
// PANEL CODE
// =============================================================================

/// Closed set of panel types a screen can host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelCode {
    Clock,
    Board,
    StockChart,
    Memo,
    ExchangeRate,
    News,
}

impl PanelCode {
    pub const ALL: [PanelCode; 6] =
        [Self::Clock, Self::Board, Self::StockChart, Self::Memo, Self::ExchangeRate, Self::News];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clock => "clock",
            Self::Board => "board",
            Self::StockChart => "stock_chart",
            Self::Memo => "memo",
            Self::ExchangeRate => "exchange_rate",
            Self::News => "news",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_str() == raw)
    }

    /// Initial grid size `(w, h)` for a freshly added panel.
    #[must_use]
    pub fn default_size(self) -> (u32, u32) {
        match self {
            Self::Clock | Self::ExchangeRate => (3, 2),
            Self::Board => (6, 6),
            Self::StockChart => (6, 4),
            Self::Memo => (3, 3),
            Self::News => (4, 4),
        }
    }
}

// =============================================================================
// PANEL STATE
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockState {
    pub time_zone: String,
    pub hour12: bool,
    pub show_seconds: bool,
}

impl Default for ClockState {
    fn default() -> Self {
        Self { time_zone: "seoul".into(), hour12: false, show_seconds: true }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPanelState {
    /// Post currently opened in the panel, if any.
    pub selected_board_id: Option<i64>,
    /// Unsaved editor content for a new post.
    pub draft: Option<EditorDocument>,
    pub page: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChartState {
    pub symbol: String,
    pub interval: String,
}

impl Default for StockChartState {
    fn default() -> Self {
        Self { symbol: "KOSPI".into(), interval: "1d".into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoState {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateState {
    pub base: String,
    pub quote: String,
}

impl Default for ExchangeRateState {
    fn default() -> Self {
        Self { base: "USD".into(), quote: "KRW".into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsState {
    pub category: String,
}

impl Default for NewsState {
    fn default() -> Self {
        Self { category: "economy".into() }
    }
}

/// UI state of one panel, tagged by its panel code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "panelCode", rename_all = "snake_case")]
pub enum PanelState {
    Clock(ClockState),
    Board(BoardPanelState),
    StockChart(StockChartState),
    Memo(MemoState),
    ExchangeRate(ExchangeRateState),
    News(NewsState),
}

impl PanelState {
    #[must_use]
    pub fn default_for(code: PanelCode) -> Self {
        match code {
            PanelCode::Clock => Self::Clock(ClockState::default()),
            PanelCode::Board => Self::Board(BoardPanelState::default()),
            PanelCode::StockChart => Self::StockChart(StockChartState::default()),
            PanelCode::Memo => Self::Memo(MemoState::default()),
            PanelCode::ExchangeRate => Self::ExchangeRate(ExchangeRateState::default()),
            PanelCode::News => Self::News(NewsState::default()),
        }
    }

    #[must_use]
    pub fn code(&self) -> PanelCode {
        match self {
            Self::Clock(_) => PanelCode::Clock,
            Self::Board(_) => PanelCode::Board,
            Self::StockChart(_) => PanelCode::StockChart,
            Self::Memo(_) => PanelCode::Memo,
            Self::ExchangeRate(_) => PanelCode::ExchangeRate,
            Self::News(_) => PanelCode::News,
        }
    }

    /// Shallow-merge `patch`: fields present in the patch overwrite, the rest stay.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::StateMismatch`] when the patch targets another panel type.
    pub fn merge(&mut self, patch: PanelStatePatch) -> Result<(), PanelError> {
        match (self, patch) {
            (Self::Clock(state), PanelStatePatch::Clock(p)) => {
                set(&mut state.time_zone, p.time_zone);
                set(&mut state.hour12, p.hour12);
                set(&mut state.show_seconds, p.show_seconds);
            }
            (Self::Board(state), PanelStatePatch::Board(p)) => {
                set(&mut state.selected_board_id, p.selected_board_id);
                set(&mut state.draft, p.draft);
                set(&mut state.page, p.page);
            }
            (Self::StockChart(state), PanelStatePatch::StockChart(p)) => {
                set(&mut state.symbol, p.symbol);
                set(&mut state.interval, p.interval);
            }
            (Self::Memo(state), PanelStatePatch::Memo(p)) => {
                set(&mut state.text, p.text);
            }
            (Self::ExchangeRate(state), PanelStatePatch::ExchangeRate(p)) => {
                set(&mut state.base, p.base);
                set(&mut state.quote, p.quote);
            }
            (Self::News(state), PanelStatePatch::News(p)) => {
                set(&mut state.category, p.category);
            }
            (state, patch) => {
                return Err(PanelError::StateMismatch { state: state.code(), patch: patch.code() });
            }
        }
        Ok(())
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

// =============================================================================
// PATCHES
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClockPatch {
    pub time_zone: Option<String>,
    pub hour12: Option<bool>,
    pub show_seconds: Option<bool>,
}

/// `selectedBoardId` and `draft` are nullable: an explicit `null` clears
/// the field (`Some(None)`), a missing key leaves it alone (`None`).
#[allow(clippy::option_option)]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardPatch {
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub selected_board_id: Option<Option<i64>>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub draft: Option<Option<EditorDocument>>,
    pub page: Option<u32>,
}

/// Marks a key that was present in the patch, including an explicit `null`.
#[allow(clippy::option_option)]
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StockChartPatch {
    pub symbol: Option<String>,
    pub interval: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoPatch {
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExchangeRatePatch {
    pub base: Option<String>,
    pub quote: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewsPatch {
    pub category: Option<String>,
}

/// Partial panel state update, tagged the same way as [`PanelState`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "panelCode", rename_all = "snake_case")]
pub enum PanelStatePatch {
    Clock(ClockPatch),
    Board(BoardPatch),
    StockChart(StockChartPatch),
    Memo(MemoPatch),
    ExchangeRate(ExchangeRatePatch),
    News(NewsPatch),
}

impl PanelStatePatch {
    #[must_use]
    pub fn code(&self) -> PanelCode {
        match self {
            Self::Clock(_) => PanelCode::Clock,
            Self::Board(_) => PanelCode::Board,
            Self::StockChart(_) => PanelCode::StockChart,
            Self::Memo(_) => PanelCode::Memo,
            Self::ExchangeRate(_) => PanelCode::ExchangeRate,
            Self::News(_) => PanelCode::News,
        }
    }

    /// Parse an untagged JSON object as a patch for a panel of type `code`.
    /// An explicit `panelCode` key in the object wins over `code`.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::InvalidPatch`] if the object does not fit the patch shape.
    pub fn from_json(code: PanelCode, mut value: serde_json::Value) -> Result<Self, PanelError> {
        if let Some(obj) = value.as_object_mut() {
            obj.entry("panelCode")
                .or_insert_with(|| serde_json::Value::String(code.as_str().to_owned()));
        }
        Ok(serde_json::from_value(value)?)
    }
}

// =============================================================================
// PANEL + REGISTRY
// =============================================================================

/// One widget instance placed on a screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub id: PanelId,
    pub panel_code: PanelCode,
    pub panel_state: PanelState,
}

impl Panel {
    #[must_use]
    pub fn new(id: PanelId, code: PanelCode) -> Self {
        Self { id, panel_code: code, panel_state: PanelState::default_for(code) }
    }
}

/// All panels across all screens, keyed by panel id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelRegistry {
    #[serde(with = "crate::persist::codec::map_envelope")]
    panels: HashMap<PanelId, Panel>,
}

impl PanelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.panels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &PanelId) -> Option<&Panel> {
        self.panels.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &PanelId) -> bool {
        self.panels.contains_key(id)
    }

    pub fn insert(&mut self, panel: Panel) {
        self.panels.insert(panel.id.clone(), panel);
    }

    /// Remove a panel. Absent ids are a no-op.
    pub fn remove(&mut self, id: &PanelId) -> Option<Panel> {
        self.panels.remove(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &PanelId> {
        self.panels.keys()
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&PanelId) -> bool,
    {
        self.panels.retain(|id, _| keep(id));
    }

    /// # Errors
    ///
    /// Returns [`PanelError::NotFound`] for unknown ids, or a merge error.
    pub fn update_state(&mut self, id: &PanelId, patch: PanelStatePatch) -> Result<(), PanelError> {
        let panel = self
            .panels
            .get_mut(id)
            .ok_or_else(|| PanelError::NotFound(id.clone()))?;
        panel.panel_state.merge(patch)
    }
}
