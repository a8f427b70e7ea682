pub mod app;
pub mod cli;
pub mod config;
pub mod confirmation;
pub mod controls;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod host;
pub mod layout;
pub mod panel;
pub mod placement;
pub mod raycast;
pub mod reconciler;
pub mod settings;
pub mod surface;
pub mod widget;

pub use app::{run, run_with_overrides};
pub use error::{PanelError, UrlValidationError};
pub use panel::PanelController;
