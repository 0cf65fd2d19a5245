//! End-to-end tests for the controller: keys in, buffer/mode/commands out.

use std::fs;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::TempDir;

use editor::config::Config;
use editor::directory::FsLister;
use editor::events::{AppEvent, Command};
use editor::extensions::{Extension, ExtensionsOverlay, InstallResult};
use editor::pty::PtyChannel;
use editor::syntax::Language;
use editor::{App, BaseMode, Mode};

fn key(code: KeyCode) -> AppEvent {
    AppEvent::KeyInput(KeyEvent::new(code, KeyModifiers::NONE))
}

fn ctrl(c: char) -> AppEvent {
    AppEvent::KeyInput(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.handle_event(key(KeyCode::Char(c)));
    }
}

#[derive(Clone, Default)]
struct Sink(Arc<Mutex<Vec<u8>>>);

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn app_with_shell(output: &[u8]) -> (App, Sink) {
    let sink = Sink::default();
    let mut app = App::new(Config::default());
    app.attach_pty(PtyChannel::from_parts(
        Box::new(sink.clone()),
        Box::new(Cursor::new(output.to_vec())),
    ));
    (app, sink)
}

#[test]
fn test_insert_and_undo() {
    let mut app = App::new(Config::default());
    type_text(&mut app, "abc");
    assert_eq!(app.buffer.content, vec!["abc"]);
    assert_eq!(app.buffer.cursor_pos, (0, 3));

    app.handle_event(ctrl('z'));
    assert_eq!(app.buffer.content, vec!["ab"]);
    assert_eq!(app.buffer.cursor_pos, (0, 2));

    for _ in 0..3 {
        app.handle_event(ctrl('z'));
    }
    assert_eq!(app.buffer.content, vec![""]);
    assert_eq!(app.buffer.cursor_pos, (0, 0));

    app.handle_event(ctrl('z'));
    assert_eq!(app.buffer.content, vec![""]);
    assert_eq!(app.history.undo_len(), 1);

    app.handle_event(ctrl('y'));
    assert_eq!(app.buffer.content, vec!["a"]);
}

#[test]
fn test_newline_and_backspace_at_boundary() {
    let mut app = App::new(Config::default());
    type_text(&mut app, "hello");

    app.handle_event(key(KeyCode::Enter));
    assert_eq!(app.buffer.content, vec!["hello", ""]);
    assert_eq!(app.buffer.cursor_pos, (1, 0));

    app.handle_event(key(KeyCode::Backspace));
    assert_eq!(app.buffer.content, vec!["hello"]);
    assert_eq!(app.buffer.cursor_pos, (0, 5));
}

#[test]
fn test_open_crlf_file_at_startup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("crlf.txt");
    fs::write(&path, b"a\r\nb\r\nc").unwrap();

    let mut app = App::with_file(path.to_str().unwrap(), Config::default()).unwrap();
    assert_eq!(app.buffer.content, vec!["a", "b", "c"]);
    assert!(app.status_message.starts_with("Opened"));

    app.handle_event(ctrl('s'));
    assert_eq!(fs::read(&path).unwrap(), b"a\nb\nc");
    assert!(app.status_message.starts_with("Saved"));
}

#[test]
fn test_missing_startup_file_becomes_new_buffer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fresh.py");

    let mut app = App::with_file(path.to_str().unwrap(), Config::default()).unwrap();
    assert_eq!(app.buffer.content, vec![""]);
    assert_eq!(app.language, Language::Python);
    assert!(app.status_message.starts_with("New file"));

    type_text(&mut app, "x = 1");
    app.handle_event(ctrl('s'));
    assert_eq!(fs::read_to_string(&path).unwrap(), "x = 1");
}

#[test]
fn test_binary_startup_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blob.bin");
    fs::write(&path, [0xff, 0x00, 0xfe]).unwrap();
    assert!(App::with_file(path.to_str().unwrap(), Config::default()).is_err());
}

#[test]
fn test_search_cycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("words.txt");
    fs::write(&path, "foo\nbar\nFoo\nbaz").unwrap();
    let mut app = App::with_file(path.to_str().unwrap(), Config::default()).unwrap();

    app.handle_event(ctrl('f'));
    assert_eq!(app.mode, Mode::SearchOverlay(BaseMode::Editor));
    type_text(&mut app, "foo");
    assert_eq!(app.search.matches(), &[0, 2]);
    assert_eq!(app.search.current(), 0);
    // Typing into the overlay never edits the buffer.
    assert_eq!(app.buffer.content[0], "foo");

    app.handle_event(key(KeyCode::Enter));
    assert_eq!(app.search.current(), 1);
    assert_eq!(app.buffer.cursor_pos.0, 2);

    app.handle_event(key(KeyCode::Enter));
    assert_eq!(app.search.current(), 0);
    assert_eq!(app.buffer.cursor_pos.0, 0);

    app.handle_event(key(KeyCode::Esc));
    assert_eq!(app.mode, Mode::Editor);
    assert!(app.running);
    assert_eq!(app.search.query(), "foo");

    app.handle_event(ctrl('f'));
    assert_eq!(app.search.query(), "");
}

#[test]
fn test_search_matches_follow_edits() {
    let mut app = App::new(Config::default());
    type_text(&mut app, "ab");
    app.handle_event(ctrl('f'));
    type_text(&mut app, "abc");
    assert!(app.search.matches().is_empty());
    app.handle_event(key(KeyCode::Esc));

    type_text(&mut app, "c");
    assert_eq!(app.search.matches(), &[0]);
}

#[test]
fn test_directory_navigation() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("a")).unwrap();
    fs::write(dir.path().join("b.txt"), "from disk").unwrap();

    let mut app = App::new(Config::default());
    app.directory.load(&FsLister, dir.path()).unwrap();
    app.handle_event(key(KeyCode::Tab));
    assert_eq!(app.mode, Mode::Sidebar);

    app.handle_event(key(KeyCode::Enter));
    assert_eq!(app.directory.dir(), dir.path().join("a"));
    assert_eq!(app.mode, Mode::Sidebar);
    assert_eq!(app.directory.selected(), 0);

    app.directory.load(&FsLister, dir.path()).unwrap();
    app.handle_event(key(KeyCode::Down));
    assert_eq!(app.directory.selected(), 1);
    app.handle_event(key(KeyCode::Enter));

    assert_eq!(app.mode, Mode::Editor);
    assert_eq!(app.buffer.content, vec!["from disk"]);
    assert_eq!(app.buffer.path.as_deref(), Some(dir.path().join("b.txt").as_path()));
    assert_eq!(app.language, Language::PlainText);
    assert_eq!(app.history.undo_len(), 1);
}

#[test]
fn test_opening_source_file_sets_language() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.GO"), "package main").unwrap();

    let mut app = App::new(Config::default());
    app.directory.load(&FsLister, dir.path()).unwrap();
    app.handle_event(key(KeyCode::Tab));
    app.handle_event(key(KeyCode::Enter));
    assert_eq!(app.language, Language::Go);
    assert!(app.status_message.contains("[go]"));
}

#[test]
fn test_sidebar_keys_do_not_edit() {
    let mut app = App::new(Config::default());
    app.handle_event(key(KeyCode::Tab));
    type_text(&mut app, "xyz");
    app.handle_event(key(KeyCode::Backspace));
    assert_eq!(app.buffer.content, vec![""]);
    assert_eq!(app.mode, Mode::Sidebar);
}

#[tokio::test]
async fn test_pty_write_path_and_read_pump() {
    let (mut app, sink) = app_with_shell(b"hello from shell");

    let commands = app.handle_event(ctrl('t'));
    assert_eq!(commands, vec![Command::ReadPty]);
    assert!(app.terminal_visible());
    assert!(app.read_in_flight());

    type_text(&mut app, "ls");
    app.handle_event(key(KeyCode::Enter));
    assert_eq!(&*sink.0.lock().unwrap(), b"ls\r");
    assert_eq!(app.buffer.content, vec![""]);

    let bytes = app.pty_read().unwrap().await;
    let commands = app.handle_event(AppEvent::PtyOutput(bytes));
    assert_eq!(commands, vec![Command::ReadPty]);
    assert_eq!(app.pty_output, b"hello from shell");

    let bytes = app.pty_read().unwrap().await;
    assert!(bytes.is_empty());
    let commands = app.handle_event(AppEvent::PtyOutput(bytes));
    assert!(commands.is_empty());
    assert!(app.pty_closed());
    assert_eq!(app.status_message, "terminal closed");
    assert_eq!(app.pty_output, b"hello from shell");
}

#[test]
fn test_reads_pause_while_pane_is_hidden() {
    let (mut app, _sink) = app_with_shell(b"");

    assert_eq!(app.handle_event(ctrl('t')), vec![Command::ReadPty]);
    app.handle_event(key(KeyCode::Esc));
    assert_eq!(app.mode, Mode::Editor);
    assert!(app.running);

    let commands = app.handle_event(AppEvent::PtyOutput(b"late".to_vec()));
    assert!(commands.is_empty());
    assert!(!app.read_in_flight());
    assert_eq!(app.pty_output, b"late");

    // Reopening resumes the pump.
    assert_eq!(app.handle_event(ctrl('t')), vec![Command::ReadPty]);
}

#[test]
fn test_terminal_keeps_one_read_outstanding() {
    let (mut app, _sink) = app_with_shell(b"");
    assert_eq!(app.handle_event(ctrl('t')), vec![Command::ReadPty]);
    app.handle_event(ctrl('t'));
    // Still in flight from the first open.
    assert!(app.handle_event(ctrl('t')).is_empty());
    assert!(app.read_in_flight());
}

#[test]
fn test_terminal_toggle_shrinks_viewport() {
    let (mut app, _sink) = app_with_shell(b"");
    app.handle_event(AppEvent::Resize(100, 40));
    assert_eq!(app.viewport.rows, 36);

    app.handle_event(ctrl('t'));
    assert_eq!(app.viewport.rows, 26);

    app.handle_event(key(KeyCode::Esc));
    assert_eq!(app.viewport.rows, 36);
}

#[test]
fn test_ctrl_c_in_terminal_goes_to_shell() {
    let (mut app, sink) = app_with_shell(b"");
    app.handle_event(ctrl('t'));
    let commands = app.handle_event(ctrl('c'));
    assert!(commands.is_empty());
    assert!(app.running);
    assert_eq!(&*sink.0.lock().unwrap(), &[0x03]);
}

#[test]
fn test_extensions_install_flow() {
    let mut app = App::new(Config::default());
    app.extensions = ExtensionsOverlay::with_extensions(vec![Extension::new(
        "Fake tool",
        "termpad-test-missing-tool",
        "Never installed.",
        "exit 3",
    )]);

    app.handle_event(ctrl('e'));
    assert_eq!(app.mode, Mode::ExtensionsOverlay(BaseMode::Editor));

    let commands = app.handle_event(key(KeyCode::Enter));
    let [Command::Install(request)] = commands.as_slice() else {
        panic!("expected an install command, got {:?}", commands);
    };
    assert_eq!(request.index, 0);
    assert_eq!(request.invocation, "exit 3");
    assert!(app.status_message.starts_with("Installing Fake tool"));

    app.handle_event(key(KeyCode::Esc));
    assert_eq!(app.mode, Mode::Editor);

    app.handle_event(AppEvent::InstallFinished(InstallResult {
        index: 0,
        success: false,
        output: "x".repeat(300),
    }));
    let expected = format!("Fake tool install failed: ...{}", "x".repeat(200));
    assert_eq!(app.status_message, expected);
    assert!(!app.extensions.items()[0].installed);
}

#[test]
fn test_extensions_escape_from_search_returns_to_base() {
    let mut app = App::new(Config::default());
    app.handle_event(key(KeyCode::Tab));
    assert_eq!(app.mode, Mode::Sidebar);

    app.handle_event(ctrl('e'));
    app.handle_event(key(KeyCode::Char('/')));
    assert!(app.extensions.is_searching());
    app.handle_event(key(KeyCode::Esc));
    assert_eq!(app.mode, Mode::Sidebar);
    assert!(app.running);
}

#[test]
fn test_history_limit_from_config_is_capped() {
    let mut config = Config::default();
    config.editor.history_limit = 500;
    let mut app = App::new(config);
    for _ in 0..400 {
        app.handle_event(key(KeyCode::Char('a')));
    }
    assert_eq!(app.history.undo_len(), 200);
}

#[test]
fn test_quit_paths() {
    let mut app = App::new(Config::default());
    assert_eq!(app.handle_event(ctrl('c')), vec![Command::Quit]);
    assert!(!app.running);

    let mut app = App::new(Config::default());
    assert_eq!(app.handle_event(AppEvent::Quit), vec![Command::Quit]);
    assert!(!app.running);
}

#[test]
fn test_pty_error_disables_terminal() {
    let mut app = App::new(Config::default());
    app.set_pty_error(&anyhow::anyhow!("no pty"));
    assert_eq!(app.status_message, "pty error: no pty");

    assert!(app.handle_event(ctrl('t')).is_empty());
    assert_eq!(app.mode, Mode::Editor);
    assert_eq!(app.status_message, "pty error: no pty");
}
