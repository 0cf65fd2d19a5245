//! File-tree sidebar state: one directory level at a time.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Directory-listing collaborator. Must return a stable order per call.
pub trait DirectoryLister {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>>;
}

/// Lists the real filesystem, sorted by file name.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLister;

impl DirectoryLister for FsLister {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = std::fs::read_dir(dir)
            .with_context(|| format!("cannot read dir {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type().map(|t| t.is_dir()).unwrap_or(false),
            })
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// What activating the selected entry asks the controller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The view descended into a subdirectory.
    EnteredDir(PathBuf),
    /// A file was chosen; the controller opens it.
    OpenFile(PathBuf),
    /// Nothing selected, or the directory could not be listed.
    Nothing,
}

#[derive(Debug, Clone)]
pub struct DirectoryView {
    dir: PathBuf,
    entries: Vec<DirEntry>,
    selected: usize,
}

impl DirectoryView {
    pub fn new() -> Self {
        Self {
            dir: PathBuf::from("."),
            entries: Vec::new(),
            selected: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&DirEntry> {
        self.entries.get(self.selected)
    }

    /// List `path` and reset the selection. On failure the view still moves
    /// to `path` but shows no entries.
    pub fn load(&mut self, lister: &dyn DirectoryLister, path: impl Into<PathBuf>) -> Result<()> {
        self.dir = path.into();
        self.selected = 0;
        match lister.list(&self.dir) {
            Ok(entries) => {
                self.entries = entries;
                Ok(())
            }
            Err(e) => {
                self.entries.clear();
                Err(e)
            }
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }

    pub fn activate(&mut self, lister: &dyn DirectoryLister) -> Result<Activation> {
        let Some(entry) = self.selected_entry() else {
            return Ok(Activation::Nothing);
        };
        let target = self.dir.join(&entry.name);
        let is_dir = entry.is_dir;
        if is_dir {
            self.load(lister, target.clone())?;
            Ok(Activation::EnteredDir(target))
        } else {
            Ok(Activation::OpenFile(target))
        }
    }
}

impl Default for DirectoryView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeLister(HashMap<PathBuf, Vec<DirEntry>>);

    impl DirectoryLister for FakeLister {
        fn list(&self, dir: &Path) -> Result<Vec<DirEntry>> {
            self.0
                .get(dir)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such dir"))
        }
    }

    fn entry(name: &str, is_dir: bool) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            is_dir,
        }
    }

    #[test]
    fn test_selection_is_clamped() {
        let lister = FakeLister(HashMap::from([(
            PathBuf::from("/r"),
            vec![entry("a", false), entry("b", false)],
        )]));
        let mut view = DirectoryView::new();
        view.load(&lister, "/r").unwrap();
        view.move_up();
        assert_eq!(view.selected(), 0);
        view.move_down();
        view.move_down();
        assert_eq!(view.selected(), 1);
    }

    #[test]
    fn test_activate_directory_descends() {
        let lister = FakeLister(HashMap::from([
            (PathBuf::from("/r"), vec![entry("sub", true)]),
            (PathBuf::from("/r/sub"), vec![entry("f.py", false)]),
        ]));
        let mut view = DirectoryView::new();
        view.load(&lister, "/r").unwrap();

        let activation = view.activate(&lister).unwrap();
        assert_eq!(activation, Activation::EnteredDir(PathBuf::from("/r/sub")));
        assert_eq!(view.entries(), &[entry("f.py", false)]);

        let activation = view.activate(&lister).unwrap();
        assert_eq!(activation, Activation::OpenFile(PathBuf::from("/r/sub/f.py")));
    }

    #[test]
    fn test_failed_listing_leaves_empty_view() {
        let lister = FakeLister(HashMap::new());
        let mut view = DirectoryView::new();
        assert!(view.load(&lister, "/missing").is_err());
        assert!(view.entries().is_empty());
        assert_eq!(view.activate(&lister).unwrap(), Activation::Nothing);
    }
}
