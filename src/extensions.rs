//! Extensions overlay: a catalogue of external language tools that can be
//! installed through the system shell. Extensions are only installed, never
//! loaded.

use std::path::Path;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Maximum number of output bytes surfaced in a failure message.
pub const DEFAULT_OUTPUT_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub name: String,
    /// Executable looked up on `PATH` to decide whether the tool is present.
    pub probe: String,
    pub description: String,
    /// Shell command line that installs the tool.
    pub install: String,
    pub installed: bool,
}

impl Extension {
    pub fn new(name: &str, probe: &str, description: &str, install: &str) -> Self {
        Self {
            name: name.to_string(),
            probe: probe.to_string(),
            description: description.to_string(),
            install: install.to_string(),
            installed: false,
        }
    }
}

/// The tools offered out of the box.
pub fn builtin_extensions() -> Vec<Extension> {
    vec![
        Extension::new(
            "Go Tools (gopls)",
            "gopls",
            "Language Server for Go: autocompletion, diagnostics, navigation.",
            "go install golang.org/x/tools/gopls@latest",
        ),
        Extension::new(
            "Python (pyright)",
            "pyright",
            "Type checking and language features for Python.",
            "npm install -g pyright",
        ),
        Extension::new(
            "TypeScript (typescript-language-server)",
            "typescript-language-server",
            "Provides JS/TS autocompletion and hover info.",
            "npm install -g typescript typescript-language-server",
        ),
        Extension::new(
            "HTML / CSS (vscode-langservers-extracted)",
            "vscode-html-languageserver",
            "HTML/CSS/JS language servers (via vscode-langservers-extracted).",
            "npm install -g vscode-langservers-extracted",
        ),
    ]
}

/// Whether `command` resolves to an executable file on `PATH`.
pub fn probe_installed(command: &str) -> bool {
    if command.contains(std::path::MAIN_SEPARATOR) {
        return is_executable(Path::new(command));
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| is_executable(&dir.join(command))))
        .unwrap_or(false)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Completion of one install attempt, tagged with the descriptor slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    pub index: usize,
    pub success: bool,
    pub output: String,
}

/// Work an install needs, detached from the overlay so it can run as a
/// future.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub index: usize,
    pub invocation: String,
    pub probe: String,
}

/// Run an install through `bash -lc`, capturing combined output. Success
/// means exit status 0 and the probe finding the tool afterwards.
///
/// The invocation runs with stderr joined onto stdout so both streams land in
/// one pipe in the order they were written.
pub async fn run_install(request: InstallRequest) -> InstallResult {
    tracing::info!(index = request.index, invocation = %request.invocation, "starting install");
    let output = tokio::process::Command::new("bash")
        .arg("-lc")
        .arg(format!("{{ {}\n}} 2>&1", request.invocation))
        .stdin(std::process::Stdio::null())
        .output()
        .await;

    match output {
        Ok(out) => {
            // Anything on stderr came from bash itself, before the redirect.
            let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&out.stderr));
            let success = out.status.success() && probe_installed(&request.probe);
            tracing::info!(index = request.index, success, status = ?out.status, "install finished");
            InstallResult {
                index: request.index,
                success,
                output: combined,
            }
        }
        Err(e) => {
            tracing::warn!(index = request.index, "install could not start: {}", e);
            InstallResult {
                index: request.index,
                success: false,
                output: e.to_string(),
            }
        }
    }
}

/// Keep at most the last `limit` bytes of `text`, cut on a char boundary.
pub fn tail_bytes(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut start = text.len() - limit;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

/// Outcome of a key press inside the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayAction {
    None,
    Close,
    Install(InstallRequest),
}

pub struct ExtensionsOverlay {
    items: Vec<Extension>,
    /// Index into `filtered`.
    selected: usize,
    /// Maps displayed rows to `items` indices.
    filtered: Vec<usize>,
    status: String,
    search_active: bool,
    search_query: String,
    output_limit: usize,
}

const HINT: &str = "Use ↑/↓ to navigate, Enter to install, / or Ctrl+F to search, Esc to return";

impl ExtensionsOverlay {
    /// Built-in catalogue, with `installed` probed on `PATH`.
    pub fn new() -> Self {
        let mut items = builtin_extensions();
        for item in &mut items {
            item.installed = probe_installed(&item.probe);
        }
        Self::with_extensions(items)
    }

    /// Overlay over a given catalogue; `installed` is taken as is.
    pub fn with_extensions(items: Vec<Extension>) -> Self {
        let mut overlay = Self {
            items,
            selected: 0,
            filtered: Vec::new(),
            status: HINT.to_string(),
            search_active: false,
            search_query: String::new(),
            output_limit: DEFAULT_OUTPUT_LIMIT,
        };
        overlay.rebuild_filter();
        overlay
    }

    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = limit;
        self
    }

    pub fn items(&self) -> &[Extension] {
        &self.items
    }

    pub fn filtered(&self) -> &[usize] {
        &self.filtered
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_searching(&self) -> bool {
        self.search_active
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.filtered.len() {
            self.selected += 1;
        }
    }

    pub fn begin_search(&mut self) {
        self.search_active = true;
        self.search_query.clear();
        self.rebuild_filter();
    }

    pub fn type_search(&mut self, c: char) {
        self.search_query.push(c);
        self.rebuild_filter();
    }

    pub fn backspace_search(&mut self) {
        if self.search_query.pop().is_some() {
            self.rebuild_filter();
        }
    }

    pub fn end_search(&mut self) {
        self.search_active = false;
        self.rebuild_filter();
    }

    /// Start installing the selected entry, unless nothing is selected or it
    /// is already present.
    pub fn install_selected(&mut self) -> OverlayAction {
        let Some(&index) = self.filtered.get(self.selected) else {
            self.status = "No extension selected".to_string();
            return OverlayAction::None;
        };
        let item = &self.items[index];
        if item.installed {
            self.status = format!("{} is already installed", item.name);
            return OverlayAction::None;
        }
        self.status = format!("Installing {} ...", item.name);
        OverlayAction::Install(InstallRequest {
            index,
            invocation: item.install.clone(),
            probe: item.probe.clone(),
        })
    }

    /// Bind an install completion to its descriptor. Returns the status text,
    /// or `None` when the slot no longer exists and the result is dropped.
    pub fn apply_result(&mut self, result: &InstallResult) -> Option<String> {
        let item = self.items.get_mut(result.index)?;
        item.installed = result.success || probe_installed(&item.probe);

        self.status = if result.success {
            format!("{} installed successfully", item.name)
        } else {
            let out = result.output.trim();
            if out.is_empty() {
                format!("{} install failed (no output)", item.name)
            } else if out.len() > self.output_limit {
                format!(
                    "{} install failed: ...{}",
                    item.name,
                    tail_bytes(out, self.output_limit)
                )
            } else {
                format!("{} install failed: {}", item.name, out)
            }
        };
        self.rebuild_filter();
        Some(self.status.clone())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> OverlayAction {
        if self.search_active {
            match key.code {
                KeyCode::Esc => {
                    self.end_search();
                    return OverlayAction::Close;
                }
                KeyCode::Backspace => self.backspace_search(),
                KeyCode::Enter => return self.install_selected(),
                KeyCode::Up => self.move_up(),
                KeyCode::Down => self.move_down(),
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.type_search(c)
                }
                _ => {}
            }
            return OverlayAction::None;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => return OverlayAction::Close,
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => self.move_up(),
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => self.move_down(),
            (KeyCode::Char('/'), _) | (KeyCode::Char('f'), KeyModifiers::CONTROL) => {
                self.begin_search()
            }
            (KeyCode::Enter, _) => return self.install_selected(),
            _ => {}
        }
        OverlayAction::None
    }

    /// Filter over `name + description`, case-insensitive. The selection is
    /// clamped into the filtered view.
    fn rebuild_filter(&mut self) {
        let query = self.search_query.trim().to_lowercase();
        self.filtered = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                query.is_empty()
                    || item.name.to_lowercase().contains(&query)
                    || item.description.to_lowercase().contains(&query)
            })
            .map(|(i, _)| i)
            .collect();

        if self.filtered.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len() - 1;
        }
    }
}

impl Default for ExtensionsOverlay {
    fn default() -> Self {
        Self::new()
    }
}
