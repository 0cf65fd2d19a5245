use anyhow::{bail, Result};

use editor::config::{default_config_dir, ConfigManager};
use editor::pty::{default_shell, PtyChannel};
use editor::viewport::terminal_pane_height;
use editor::{logging, runtime, App};

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = logging::init(&logging::default_log_dir());
    logging::install_panic_hook();

    // Get command line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 2 {
        bail!("usage: termpad [FILE]");
    }

    let mut config_manager = ConfigManager::new(&default_config_dir());
    let config_warning = match config_manager.load() {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(path = %config_manager.config_path().display(), "{:#}", e);
            Some(format!("config ignored: {:#}", e))
        }
    };
    let config = config_manager.into_config();

    let mut app = match args.get(1) {
        Some(path) => App::with_file(path, config)?,
        None => App::new(config),
    };
    if let Some(warning) = config_warning {
        app.set_status_message(warning);
    }

    let (width, height) = ratatui::crossterm::terminal::size().unwrap_or((80, 24));
    let rows = terminal_pane_height(height, true).saturating_sub(2).max(1);
    match PtyChannel::spawn(&default_shell(), rows, width.saturating_sub(2).max(1)) {
        Ok(pty) => app.attach_pty(pty),
        Err(e) => app.set_pty_error(&e),
    }

    let mut terminal = match runtime::setup_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            runtime::restore_terminal();
            return Err(e);
        }
    };
    let result = runtime::run(&mut app, &mut terminal).await;

    // The shell is reaped before the terminal is handed back.
    drop(app);
    runtime::restore_terminal();

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}
