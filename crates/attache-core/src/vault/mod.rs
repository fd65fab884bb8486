use crate::error::{AttacheError, Result};
use crate::vfs::FileSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod index;
mod resolve;


use index::{FileIndex, FolderIndex};

/// Facade over a vault root and a `FileSystem`.
///
/// Mutations (rename, copy, delete, create) go through `Vault` so the
/// indexes stay consistent with the tree; read-only lookups hit the
/// indexes directly. All paths at this surface are vault-relative.
pub struct Vault {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    files: FileIndex,
    folders: FolderIndex,
}

impl Vault {
    /// Open a vault and build its indexes from a full scan.
    pub fn open(root: PathBuf, fs: Arc<dyn FileSystem>) -> Self {
        let mut vault = Self {
            root,
            fs,
            files: FileIndex::default(),
            folders: FolderIndex::default(),
        };
        vault.reindex();
        vault
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebuild both indexes from the tree.
    pub fn reindex(&mut self) {
        self.files = FileIndex::default();
        for path in self.fs.list_files(&self.root) {
            if let Ok(rel) = path.strip_prefix(&self.root) {
                self.files.insert(rel.to_path_buf());
            }
        }

        self.folders = FolderIndex::default();
        for path in self.fs.list_dirs(&self.root) {
            if let Ok(rel) = path.strip_prefix(&self.root) {
                self.folders.insert(rel.to_string_lossy().to_string());
            }
        }

        log::debug!(
            "indexed {} files, {} folders under {}",
            self.files.len(),
            self.folders.all().len(),
            self.root.display()
        );
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn contains(&self, rel: &Path) -> bool {
        self.files.contains(rel)
    }

    /// All markdown notes of the vault, sorted.
    pub fn notes(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|p| p.extension().map(|e| e == "md").unwrap_or(false))
            .cloned()
            .collect()
    }

    /// All files of the vault, sorted.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// All folder paths, for pickers.
    pub fn folders(&self) -> &[String] {
        self.folders.all()
    }

    pub fn absolute(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    pub fn read_note(&self, rel: &Path) -> Result<String> {
        if !self.contains(rel) {
            return Err(AttacheError::NoteNotFound(rel.to_path_buf()));
        }
        Ok(self.fs.read_to_string(&self.absolute(rel))?)
    }

    pub fn read(&self, rel: &Path) -> Result<Vec<u8>> {
        Ok(self.fs.read(&self.absolute(rel))?)
    }

    pub fn write(&mut self, rel: &Path, contents: &[u8]) -> Result<()> {
        self.fs.write(&self.absolute(rel), contents)?;
        self.files.insert(rel.to_path_buf());
        Ok(())
    }

    pub fn append(&self, rel: &Path, contents: &[u8]) -> Result<()> {
        Ok(self.fs.append(&self.absolute(rel), contents)?)
    }

    // ------------------------------------------------------------------
    // Mutations (indexes kept in sync)
    // ------------------------------------------------------------------

    pub fn rename_file(&mut self, from: &Path, to: &Path) -> Result<()> {
        self.fs.rename(&self.absolute(from), &self.absolute(to))?;
        self.files.remove(from);
        self.files.insert(to.to_path_buf());
        Ok(())
    }

    pub fn copy_file(&mut self, from: &Path, to: &Path) -> Result<()> {
        self.fs.copy(&self.absolute(from), &self.absolute(to))?;
        self.files.insert(to.to_path_buf());
        Ok(())
    }

    pub fn remove_file(&mut self, rel: &Path) -> Result<()> {
        self.fs.remove_file(&self.absolute(rel))?;
        self.files.remove(rel);
        Ok(())
    }

    pub fn create_dir_all(&mut self, rel: &Path) -> Result<()> {
        self.fs.create_dir_all(&self.absolute(rel))?;
        self.folders.insert(rel.to_string_lossy().to_string());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Folder notifications (structural events from the host)
    // ------------------------------------------------------------------

    pub fn on_folder_create(&mut self, rel: &str) {
        self.folders.insert(rel.to_string());
    }

    /// A folder was renamed to `rel`. Indexed paths sharing the new
    /// folder's base name are re-checked against the tree and dropped
    /// when they no longer exist.
    pub fn on_folder_rename(&mut self, rel: &str) {
        let name = Path::new(rel)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let stale: Vec<String> = self
            .folders
            .all()
            .iter()
            .filter(|folder| folder.contains(&name))
            .filter(|folder| !self.fs.exists(&self.root.join(folder)))
            .cloned()
            .collect();
        for folder in stale {
            self.folders.remove(&folder);
        }

        self.folders.insert(rel.to_string());
    }

    pub fn on_folder_delete(&mut self, rel: &str) {
        self.folders.remove(rel);
    }
}
