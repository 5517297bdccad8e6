//! TUI widgets for ChronoChat

pub mod feed;
pub mod input;
pub mod pickers;
pub mod status;

pub use feed::ChatFeedWidget;
pub use input::InputWidget;
pub use pickers::{PickerEntry, PickerSection, SelectionPanelWidget};
pub use status::{HotkeyBarWidget, StatusBarWidget};
