use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::buffer::{Buffer, CursorMovement};
use crate::config::Config;
use crate::directory::{Activation, DirectoryLister, DirectoryView, FsLister};
use crate::events::{AppEvent, Command};
use crate::extensions::{ExtensionsOverlay, InstallResult, OverlayAction};
use crate::history::History;
use crate::pty::PtyChannel;
use crate::search::SearchIndex;
use crate::syntax::{Highlighter, Language};
use crate::viewport::{terminal_pane_height, Viewport};
use crate::widgets::StatusBar;

/// The mode an overlay returns to when it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseMode {
    Editor,
    Sidebar,
}

/// Input focus. Overlays carry the base mode they shadow, so at most one
/// overlay can be active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Editor,
    Sidebar,
    SearchOverlay(BaseMode),
    TerminalFocus(BaseMode),
    ExtensionsOverlay(BaseMode),
}

impl Mode {
    pub fn base(&self) -> BaseMode {
        match *self {
            Mode::Editor => BaseMode::Editor,
            Mode::Sidebar => BaseMode::Sidebar,
            Mode::SearchOverlay(base) | Mode::TerminalFocus(base) | Mode::ExtensionsOverlay(base) => {
                base
            }
        }
    }

    pub fn is_overlay(&self) -> bool {
        !matches!(self, Mode::Editor | Mode::Sidebar)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Editor => "EDITOR",
            Mode::Sidebar => "SIDEBAR",
            Mode::SearchOverlay(_) => "SEARCH",
            Mode::TerminalFocus(_) => "TERMINAL",
            Mode::ExtensionsOverlay(_) => "EXTENSIONS",
        }
    }
}

impl From<BaseMode> for Mode {
    fn from(base: BaseMode) -> Self {
        match base {
            BaseMode::Editor => Mode::Editor,
            BaseMode::Sidebar => Mode::Sidebar,
        }
    }
}

/// The controller: owns every component and routes each event to exactly
/// one of them.
pub struct App {
    /// Whether the application is running
    pub running: bool,

    pub buffer: Buffer,
    pub history: History,
    pub search: SearchIndex,
    pub viewport: Viewport,
    pub directory: DirectoryView,
    lister: Box<dyn DirectoryLister>,

    /// Language of the open file, used for highlighting
    pub language: Language,
    pub highlighter: Highlighter,

    pub mode: Mode,

    pty: Option<PtyChannel>,
    pty_error: Option<String>,
    /// Every byte read from the shell, in arrival order
    pub pty_output: Vec<u8>,
    /// Terminal emulation of `pty_output` for display
    pub terminal_screen: vt100::Parser,
    read_in_flight: bool,
    pty_closed: bool,

    pub extensions: ExtensionsOverlay,

    /// Message to display on status bar
    pub status_message: String,
    pub status_bar: StatusBar,

    pub config: Config,

    /// Last known window size (width, height)
    pub window: (u16, u16),
}

impl App {
    /// Empty buffer, sidebar on the current directory.
    pub fn new(config: Config) -> Self {
        let mut app = Self::bare(config);
        app.status_message = "New file".to_string();
        app.load_dir(Path::new("."));
        app
    }

    /// Open `file_path` at startup. A missing file starts an empty buffer
    /// bound to that path; any other read failure is an error.
    pub fn with_file(file_path: &str, config: Config) -> Result<Self> {
        let path = PathBuf::from(file_path);
        let mut app = Self::bare(config);

        match std::fs::read(&path) {
            Ok(data) => {
                app.buffer
                    .load_from_bytes(&data)
                    .with_context(|| format!("cannot open {}", path.display()))?;
                app.language = Language::from_path(&path);
                app.status_message = format!("Opened {} [{}]", path.display(), app.language);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                app.language = Language::from_path(&path);
                app.status_message = format!("New file {} [{}]", path.display(), app.language);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("cannot open {}", path.display()));
            }
        }
        app.buffer.set_path(path.clone());
        app.history.reset(&app.buffer);

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        app.load_dir(parent);
        Ok(app)
    }

    fn bare(config: Config) -> Self {
        let buffer = Buffer::new();
        let history = History::with_limit(&buffer, config.editor.history_limit);
        let window: (u16, u16) = (80, 24);
        let extensions = ExtensionsOverlay::new().with_output_limit(config.editor.status_output_limit);
        let terminal_screen = vt100::Parser::new(
            terminal_pane_height(window.1, true).saturating_sub(2).max(1),
            window.0.saturating_sub(2).max(1),
            config.ui.terminal_scrollback,
        );

        let mut app = Self {
            running: true,
            buffer,
            history,
            search: SearchIndex::new(),
            viewport: Viewport::default(),
            directory: DirectoryView::new(),
            lister: Box::new(FsLister),
            language: Language::PlainText,
            highlighter: Highlighter::new(),
            mode: Mode::Editor,
            pty: None,
            pty_error: None,
            pty_output: Vec::new(),
            terminal_screen,
            read_in_flight: false,
            pty_closed: false,
            extensions,
            status_message: String::new(),
            status_bar: StatusBar::new(),
            config,
            window,
        };
        app.relayout();
        app.init_status_bar();
        app
    }

    /// Hand a running shell to the controller.
    pub fn attach_pty(&mut self, pty: PtyChannel) {
        self.pty = Some(pty.with_read_chunk(self.config.editor.pty_read_chunk));
        self.pty_error = None;
        self.pty_closed = false;
    }

    /// Record that the shell could not be started; the terminal pane stays
    /// disabled for the session.
    pub fn set_pty_error(&mut self, err: &anyhow::Error) {
        tracing::warn!("pty unavailable: {:#}", err);
        let message = format!("pty error: {:#}", err);
        self.pty_error = Some(message.clone());
        self.status_message = message;
    }

    pub fn has_pty(&self) -> bool {
        self.pty.is_some()
    }

    pub fn read_in_flight(&self) -> bool {
        self.read_in_flight
    }

    pub fn pty_closed(&self) -> bool {
        self.pty_closed
    }

    pub fn terminal_visible(&self) -> bool {
        matches!(self.mode, Mode::TerminalFocus(_))
    }

    /// The single outstanding PTY read, if a shell is attached.
    pub fn pty_read(&self) -> Option<impl Future<Output = Vec<u8>> + Send + 'static> {
        self.pty.as_ref().map(PtyChannel::read_once)
    }

    /// Set a status message
    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Vec<Command> {
        match event {
            AppEvent::KeyInput(key) => self.handle_key(key),
            AppEvent::Resize(width, height) => {
                self.resize(width, height);
                Vec::new()
            }
            AppEvent::PtyOutput(bytes) => self.handle_pty_output(bytes),
            AppEvent::InstallFinished(result) => {
                self.handle_install_finished(result);
                Vec::new()
            }
            AppEvent::Quit => self.quit(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match self.mode {
            Mode::SearchOverlay(base) => {
                self.handle_search_key(key, base);
                Vec::new()
            }
            Mode::TerminalFocus(base) => {
                self.handle_terminal_key(key, base);
                Vec::new()
            }
            Mode::ExtensionsOverlay(base) => self.handle_extensions_key(key, base),
            Mode::Editor | Mode::Sidebar => self.handle_base_key(key),
        }
    }

    fn handle_base_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let base = self.mode.base();
        let in_editor = base == BaseMode::Editor;

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => return self.quit(),
            (KeyCode::Char('t'), KeyModifiers::CONTROL) => return self.open_terminal(base),
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => self.save_file(),
            (KeyCode::Char('f'), KeyModifiers::CONTROL) => {
                self.search.clear();
                self.mode = Mode::SearchOverlay(base);
            }
            (KeyCode::Char('z'), KeyModifiers::CONTROL) => self.undo(),
            (KeyCode::Char('y'), KeyModifiers::CONTROL) => self.redo(),
            (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                self.mode = Mode::ExtensionsOverlay(base);
            }
            (KeyCode::Tab, _) => {
                self.mode = if in_editor { Mode::Sidebar } else { Mode::Editor };
            }
            (KeyCode::Up, _) if in_editor => self.move_cursor(CursorMovement::Up),
            (KeyCode::Down, _) if in_editor => self.move_cursor(CursorMovement::Down),
            (KeyCode::Left, _) if in_editor => self.move_cursor(CursorMovement::Left),
            (KeyCode::Right, _) if in_editor => self.move_cursor(CursorMovement::Right),
            (KeyCode::Up, _) => self.directory.move_up(),
            (KeyCode::Down, _) => self.directory.move_down(),
            (KeyCode::Enter, _) if in_editor => self.edit(Buffer::insert_newline),
            (KeyCode::Enter, _) => self.activate_sidebar(),
            (KeyCode::Backspace, _) if in_editor => self.edit(Buffer::backspace),
            (KeyCode::Char(c), modifiers)
                if in_editor && !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.edit(|b| b.insert_char(c))
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_search_key(&mut self, key: KeyEvent, base: BaseMode) {
        match key.code {
            // The query survives until the overlay is opened again.
            KeyCode::Esc => self.mode = base.into(),
            KeyCode::Enter => {
                if let Some(row) = self.search.next() {
                    self.buffer.jump_to_row(row);
                    self.viewport.ensure_visible(row);
                }
            }
            KeyCode::Backspace => {
                self.search.pop_char(&self.buffer);
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.search.push_char(c, &self.buffer);
            }
            _ => {}
        }
    }

    fn handle_terminal_key(&mut self, key: KeyEvent, base: BaseMode) {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) | (KeyCode::Char('t'), KeyModifiers::CONTROL) => {
                self.mode = base.into();
                self.relayout();
            }
            _ => {
                if let Some(bytes) = key_to_bytes(&key) {
                    self.write_pty(&bytes);
                }
            }
        }
    }

    fn handle_extensions_key(&mut self, key: KeyEvent, base: BaseMode) -> Vec<Command> {
        match self.extensions.handle_key(key) {
            OverlayAction::None => Vec::new(),
            OverlayAction::Close => {
                self.mode = base.into();
                Vec::new()
            }
            OverlayAction::Install(request) => {
                self.status_message = self.extensions.status().to_string();
                vec![Command::Install(request)]
            }
        }
    }

    fn handle_pty_output(&mut self, bytes: Vec<u8>) -> Vec<Command> {
        self.read_in_flight = false;
        if self.pty.is_none() {
            return Vec::new();
        }
        if bytes.is_empty() {
            if !self.pty_closed {
                tracing::info!("shell output ended");
                self.pty_closed = true;
                self.status_message = "terminal closed".to_string();
            }
            return Vec::new();
        }

        self.pty_output.extend_from_slice(&bytes);
        self.terminal_screen.process(&bytes);
        self.schedule_read()
    }

    fn handle_install_finished(&mut self, result: InstallResult) {
        match self.extensions.apply_result(&result) {
            Some(status) => self.status_message = status,
            None => tracing::debug!(index = result.index, "dropping install result for unknown slot"),
        }
    }

    fn quit(&mut self) -> Vec<Command> {
        self.running = false;
        vec![Command::Quit]
    }

    fn open_terminal(&mut self, base: BaseMode) -> Vec<Command> {
        if self.pty.is_none() {
            self.status_message = self
                .pty_error
                .clone()
                .unwrap_or_else(|| "terminal unavailable".to_string());
            return Vec::new();
        }
        self.mode = Mode::TerminalFocus(base);
        self.relayout();
        self.schedule_read()
    }

    /// Issue the next PTY read unless one is already outstanding, the shell
    /// has ended, or the pane is hidden.
    fn schedule_read(&mut self) -> Vec<Command> {
        if self.pty.is_none() || self.pty_closed || self.read_in_flight || !self.terminal_visible() {
            return Vec::new();
        }
        self.read_in_flight = true;
        vec![Command::ReadPty]
    }

    fn write_pty(&mut self, bytes: &[u8]) {
        if self.pty_closed {
            self.status_message = "terminal closed".to_string();
            return;
        }
        let Some(pty) = self.pty.as_mut() else {
            return;
        };
        if let Err(e) = pty.write_input(bytes) {
            tracing::warn!("pty write failed: {:#}", e);
            self.status_message = format!("terminal write failed: {:#}", e);
        }
    }

    fn move_cursor(&mut self, movement: CursorMovement) {
        self.buffer.move_cursor(movement);
        self.viewport.ensure_visible(self.buffer.cursor_pos.0);
    }

    /// Apply one logical edit; a successful edit ends with a snapshot.
    fn edit(&mut self, op: impl FnOnce(&mut Buffer) -> bool) {
        if op(&mut self.buffer) {
            self.history.push_snapshot(&self.buffer);
            self.after_buffer_change();
        }
    }

    fn undo(&mut self) {
        if self.history.undo(&mut self.buffer) {
            self.after_buffer_change();
        }
    }

    fn redo(&mut self) {
        if self.history.redo(&mut self.buffer) {
            self.after_buffer_change();
        }
    }

    fn after_buffer_change(&mut self) {
        self.search.refresh(&self.buffer);
        self.viewport.ensure_visible(self.buffer.cursor_pos.0);
    }

    fn save_file(&mut self) {
        match self.buffer.save() {
            Ok(path) => {
                tracing::info!(path = %path.display(), "saved");
                self.status_message = format!("Saved {} [{}]", path.display(), self.language);
            }
            Err(e) => {
                tracing::warn!("save failed: {:#}", e);
                self.status_message = format!("{:#}", e);
            }
        }
    }

    fn load_dir(&mut self, path: &Path) {
        if let Err(e) = self.directory.load(self.lister.as_ref(), path) {
            tracing::warn!("{:#}", e);
            self.status_message = format!("{:#}", e);
        }
    }

    fn activate_sidebar(&mut self) {
        match self.directory.activate(self.lister.as_ref()) {
            Ok(Activation::OpenFile(path)) => self.open_file(&path),
            Ok(Activation::EnteredDir(_)) | Ok(Activation::Nothing) => {}
            Err(e) => {
                tracing::warn!("{:#}", e);
                self.status_message = format!("{:#}", e);
            }
        }
    }

    /// Replace the buffer with `path`. On failure nothing changes except the
    /// status line.
    pub fn open_file(&mut self, path: &Path) {
        match Buffer::from_path(path) {
            Ok(buffer) => {
                self.buffer = buffer;
                self.language = Language::from_path(path);
                self.history.reset(&self.buffer);
                self.search.refresh(&self.buffer);
                self.viewport.top = 0;
                self.mode = Mode::Editor;
                self.status_message = format!("Opened {} [{}]", path.display(), self.language);
                tracing::info!(path = %path.display(), language = %self.language, "opened file");
            }
            Err(e) => {
                tracing::warn!("{:#}", e);
                self.status_message = format!("{:#}", e);
            }
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.window = (width, height);
        self.relayout();

        let rows = terminal_pane_height(height, true).saturating_sub(2).max(1);
        let cols = width.saturating_sub(2).max(1);
        self.terminal_screen.set_size(rows, cols);
        if let Some(pty) = &self.pty {
            if let Err(e) = pty.resize(rows, cols) {
                tracing::debug!("{:#}", e);
            }
        }
    }

    /// Recompute the editor height after the window or the pane changed.
    fn relayout(&mut self) {
        self.viewport.resize(self.window.1, self.terminal_visible());
        self.viewport.ensure_visible(self.buffer.cursor_pos.0);
    }
}

/// Bytes a key sends to the shell.
pub fn key_to_bytes(key: &KeyEvent) -> Option<Vec<u8>> {
    let bytes = match key.code {
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if !c.is_ascii_alphabetic() {
                return None;
            }
            vec![(c.to_ascii_lowercase() as u8) & 0x1f]
        }
        KeyCode::Char(c) => {
            let mut out = Vec::new();
            if key.modifiers.contains(KeyModifiers::ALT) {
                out.push(0x1b);
            }
            let mut utf8 = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            out
        }
        _ => return None,
    };
    Some(bytes)
}
