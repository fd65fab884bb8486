use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Abstract interface for vault storage operations.
pub trait FileSystem: Send + Sync {
    /// Read the entire contents of a file into a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Read the entire contents of a file as bytes.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write contents to a file, creating or truncating it.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Append contents to an existing file.
    fn append(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Move a file to a new path.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Copy a file to a new path.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// List all files under the root directory. Recursive.
    fn list_files(&self, root: &Path) -> Vec<PathBuf>;

    /// List all directories under the root directory, the root itself
    /// excluded. Recursive.
    fn list_dirs(&self, root: &Path) -> Vec<PathBuf>;
}

/// Standard implementation of FileSystem using std::fs and walkdir.
pub struct PhysicalFileSystem;

impl FileSystem for PhysicalFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn append(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new().append(true).open(path)?;
        file.write_all(contents)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.path().is_file() {
                files.push(entry.path().to_path_buf());
            }
        }

        files
    }

    fn list_dirs(&self, root: &Path) -> Vec<PathBuf> {
        let mut dirs = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.path().is_dir() {
                dirs.push(entry.path().to_path_buf());
            }
        }

        dirs
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::FileSystem;
    use std::collections::{BTreeMap, BTreeSet};
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        files: BTreeMap<PathBuf, Vec<u8>>,
        dirs: BTreeSet<PathBuf>,
        /// When set, the next rename of this source path fails.
        fail_rename_of: Option<PathBuf>,
    }

    /// In-memory FileSystem double for vault and formatter tests.
    #[derive(Default)]
    pub struct MemoryFileSystem {
        state: Mutex<State>,
    }

    impl MemoryFileSystem {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
            let mut state = self.state.lock().unwrap();
            state.files.insert(path.into(), contents.into());
        }

        pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
            self.state.lock().unwrap().files.get(path).cloned()
        }

        /// Arrange for the rename of `path` to fail with a permission
        /// error, once.
        pub fn fail_rename_of(&self, path: impl Into<PathBuf>) {
            self.state.lock().unwrap().fail_rename_of = Some(path.into());
        }

        fn not_found(path: &Path) -> io::Error {
            io::Error::new(io::ErrorKind::NotFound, path.display().to_string())
        }
    }

    impl FileSystem for MemoryFileSystem {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            let bytes = self.read(path)?;
            String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        }

        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.contents(path).ok_or_else(|| Self::not_found(path))
        }

        fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
            self.insert(path.to_path_buf(), contents.to_vec());
            Ok(())
        }

        fn append(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
            let mut state = self.state.lock().unwrap();
            let file = state
                .files
                .get_mut(path)
                .ok_or_else(|| Self::not_found(path))?;
            file.extend_from_slice(contents);
            Ok(())
        }

        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.fail_rename_of.as_deref() == Some(from) {
                state.fail_rename_of = None;
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    from.display().to_string(),
                ));
            }
            let contents = state.files.remove(from).ok_or_else(|| Self::not_found(from))?;
            state.files.insert(to.to_path_buf(), contents);
            Ok(())
        }

        fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
            let mut state = self.state.lock().unwrap();
            let contents = state.files.get(from).cloned().ok_or_else(|| Self::not_found(from))?;
            state.files.insert(to.to_path_buf(), contents);
            Ok(())
        }

        fn remove_file(&self, path: &Path) -> io::Result<()> {
            let mut state = self.state.lock().unwrap();
            state
                .files
                .remove(path)
                .map(|_| ())
                .ok_or_else(|| Self::not_found(path))
        }

        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            self.state.lock().unwrap().dirs.insert(path.to_path_buf());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            let state = self.state.lock().unwrap();
            state.files.contains_key(path) || state.dirs.contains(path)
        }

        fn list_files(&self, root: &Path) -> Vec<PathBuf> {
            let state = self.state.lock().unwrap();
            state
                .files
                .keys()
                .filter(|p| p.starts_with(root))
                .cloned()
                .collect()
        }

        fn list_dirs(&self, root: &Path) -> Vec<PathBuf> {
            let state = self.state.lock().unwrap();
            let mut dirs: BTreeSet<PathBuf> = state
                .dirs
                .iter()
                .filter(|p| p.starts_with(root) && p.as_path() != root)
                .cloned()
                .collect();

            // Parents of stored files are implied directories.
            for file in state.files.keys() {
                let mut parent = file.parent();
                while let Some(dir) = parent {
                    if dir == root || !dir.starts_with(root) {
                        break;
                    }
                    dirs.insert(dir.to_path_buf());
                    parent = dir.parent();
                }
            }

            dirs.into_iter().collect()
        }
    }
}
