use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// In-memory index of every file in the vault tree, with a by-basename
/// map backing link-text fallback resolution.
#[derive(Default)]
pub(crate) struct FileIndex {
    paths: BTreeSet<PathBuf>,
    by_name: HashMap<String, Vec<PathBuf>>,
}

impl FileIndex {
    pub(crate) fn insert(&mut self, path: PathBuf) {
        if let Some(name) = path.file_name() {
            let name = name.to_string_lossy().to_string();
            let entries = self.by_name.entry(name).or_default();
            if !entries.contains(&path) {
                entries.push(path.clone());
            }
        }
        self.paths.insert(path);
    }

    pub(crate) fn remove(&mut self, path: &Path) {
        self.paths.remove(path);
        if let Some(name) = path.file_name() {
            let name = name.to_string_lossy().to_string();
            if let Some(entries) = self.by_name.get_mut(&name) {
                entries.retain(|p| p != path);
                if entries.is_empty() {
                    self.by_name.remove(&name);
                }
            }
        }
    }

    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.paths.len()
    }

    /// Files carrying this base name, in index order.
    pub(crate) fn by_name(&self, name: &str) -> &[PathBuf] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Cached list of every folder path in the tree. Built once when the
/// vault opens, then kept consistent through the structural
/// notifications; feeds pickers only.
#[derive(Default)]
pub(crate) struct FolderIndex {
    folders: Vec<String>,
}

impl FolderIndex {
    pub(crate) fn insert(&mut self, folder: String) {
        if !self.folders.contains(&folder) {
            self.folders.push(folder);
        }
    }

    pub(crate) fn remove(&mut self, folder: &str) {
        self.folders.retain(|f| f != folder);
    }

    pub(crate) fn all(&self) -> &[String] {
        &self.folders
    }
}
