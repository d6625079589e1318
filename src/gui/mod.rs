//! GUI module - User interface components

mod app;
mod control_panel;
mod dashboard_viewer;

pub use app::DashboardApp;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use dashboard_viewer::DashboardViewer;
