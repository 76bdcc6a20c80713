//! Dashboard layout state: screens, panels, and their grid layouts.
//!
//! SYSTEM CONTEXT
//! ==============
//! Everything the user arranges on the dashboard lives here. The types are
//! plain data plus synchronous mutation methods; persistence and the
//! application context wrap them from the outside.

pub mod ids;
pub mod layout;
pub mod panels;
pub mod screens;
pub mod workspace;

pub use ids::{PanelId, ScreenId};
pub use layout::{Breakpoint, LayoutError, LayoutRect, Layouts};
pub use panels::{Panel, PanelCode, PanelError, PanelRegistry, PanelState, PanelStatePatch};
pub use screens::{Screen, ScreenList, ScreenRegistry};
pub use workspace::{RepairReport, Workspace, WorkspaceError};
