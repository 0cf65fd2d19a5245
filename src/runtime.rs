//! Terminal setup and the async event loop.
//!
//! Every event is handled on this task. Input, signals, PTY reads and
//! installs run elsewhere and report back through the [`EventBus`].

use std::io::{stdout, Stdout};
use std::time::Duration;

use anyhow::Result;
use ratatui::{
    backend::CrosstermBackend,
    crossterm::{
        cursor::Show,
        event::{self, Event, KeyEventKind},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    },
    Terminal,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::{AppEvent, Command, EventBus};
use crate::extensions::run_install;
use crate::App;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

const INPUT_POLL: Duration = Duration::from_millis(100);

/// Enter raw mode and the alternate screen.
pub fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

/// Best-effort terminal restore; safe to call more than once.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(stdout(), LeaveAlternateScreen, Show);
}

/// Drive `app` until it quits.
pub async fn run(app: &mut App, terminal: &mut Tui) -> Result<()> {
    let mut bus = EventBus::new();
    let cancel = CancellationToken::new();
    let input = spawn_input_reader(bus.sender(), cancel.clone());
    spawn_signal_listener(bus.sender(), cancel.clone());

    let size = terminal.size()?;
    dispatch(app, &bus, AppEvent::Resize(size.width, size.height));
    terminal.draw(|f| app.render(f))?;

    while app.running {
        let Some(event) = bus.next().await else {
            break;
        };
        dispatch(app, &bus, event);
        if app.running {
            terminal.draw(|f| app.render(f))?;
        }
    }

    cancel.cancel();
    if let Err(e) = input.await {
        tracing::debug!("input reader ended abnormally: {}", e);
    }
    tracing::info!("event loop finished");
    Ok(())
}

/// Hand one event to the controller and carry out what it asks for.
pub fn dispatch(app: &mut App, bus: &EventBus, event: AppEvent) {
    for command in app.handle_event(event) {
        match command {
            Command::ReadPty => {
                let Some(read) = app.pty_read() else {
                    continue;
                };
                let sender = bus.sender();
                tokio::spawn(async move {
                    let bytes = read.await;
                    let _ = sender.send(AppEvent::PtyOutput(bytes));
                });
            }
            Command::Install(request) => {
                tracing::info!(index = request.index, "running installer");
                let sender = bus.sender();
                tokio::spawn(async move {
                    let result = run_install(request).await;
                    let _ = sender.send(AppEvent::InstallFinished(result));
                });
            }
            Command::Quit => tracing::info!("quit requested"),
        }
    }
}

fn spawn_input_reader(sender: UnboundedSender<AppEvent>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !cancel.is_cancelled() {
            match event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    tracing::error!("input poll failed: {}", e);
                    let _ = sender.send(AppEvent::Quit);
                    return;
                }
            }
            let event = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::KeyInput(key),
                Ok(Event::Resize(width, height)) => AppEvent::Resize(width, height),
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!("input read failed: {}", e);
                    let _ = sender.send(AppEvent::Quit);
                    return;
                }
            };
            if sender.send(event).is_err() {
                return;
            }
        }
    })
}

#[cfg(unix)]
fn spawn_signal_listener(sender: UnboundedSender<AppEvent>, cancel: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let (Ok(mut term), Ok(mut hup)) = (signal(SignalKind::terminate()), signal(SignalKind::hangup()))
        else {
            tracing::warn!("cannot install signal handlers");
            return;
        };
        tokio::select! {
            _ = term.recv() => tracing::info!("SIGTERM received"),
            _ = hup.recv() => tracing::info!("SIGHUP received"),
            _ = cancel.cancelled() => return,
        }
        let _ = sender.send(AppEvent::Quit);
    });
}

#[cfg(not(unix))]
fn spawn_signal_listener(sender: UnboundedSender<AppEvent>, cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = cancel.cancelled() => return,
        }
        let _ = sender.send(AppEvent::Quit);
    });
}
