//! File logging and the panic hook.
//!
//! The TUI owns stdout, so log records go to `<data_dir>/termpad/termpad.log`
//! through a non-blocking appender. `RUST_LOG` overrides the default filter.

use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE_NAME: &str = "termpad.log";
const DEFAULT_FILTER: &str = "termpad=info,editor=info,warn";

/// Directory that receives the log file.
pub fn default_log_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("termpad")
}

/// Install the global subscriber writing into `log_dir`. Returns the guard
/// that flushes pending records on drop, or `None` if logging could not be
/// set up; the editor runs without logs in that case.
pub fn init(log_dir: &Path) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("termpad: cannot create log directory {}: {}", log_dir.display(), e);
        return None;
    }

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .try_init()
        .ok()?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "termpad starting");
    Some(guard)
}

/// Restore the terminal before the default hook prints the panic, so the
/// message is readable and the shell is not left in raw mode.
pub fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            crate::runtime::restore_terminal();
            tracing::error!("panic: {}", info);
            default_hook(info);
        }));
    });
}
