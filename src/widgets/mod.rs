pub mod editor;
pub mod modal;
pub mod sidebar;
pub mod status_bar;
pub mod terminal;

pub use editor::Editor;
pub use modal::ExtensionsPanel;
pub use sidebar::Sidebar;
pub use status_bar::{SlotAlignment, StatusBar, StatusSlot};
pub use terminal::TerminalPane;
