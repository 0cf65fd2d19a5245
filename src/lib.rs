//! Terminal text editor library: buffer, history, search, sidebar, shell
//! pane and extensions overlay behind a single controller.

pub mod app;
pub mod buffer;
pub mod config;
pub mod directory;
pub mod events;
pub mod extensions;
pub mod history;
pub mod logging;
pub mod pty;
pub mod runtime;
pub mod search;
pub mod syntax;
pub mod ui;
pub mod viewport;
pub mod widgets;

// Re-export main types for convenience
pub use app::{App, BaseMode, Mode};
pub use buffer::Buffer;
