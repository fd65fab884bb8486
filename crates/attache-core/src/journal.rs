use crate::config::LogSettings;
use crate::error::Result;
use crate::vault::Vault;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

pub const LOG_FILE: &str = "Attachment Name Formatting Log.md";
const LOG_TITLE: &str = "# Attachment Name Formatting Log\n";

/// Append-only rename journal: one `##` section per pass, one line per
/// move, written before the move executes. A disabled journal is a
/// no-op.
pub struct Journal {
    enabled: bool,
    folder: String,
}

impl Journal {
    pub fn new(settings: &LogSettings) -> Self {
        Self {
            enabled: settings.enabled,
            folder: settings.folder.clone(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            folder: String::new(),
        }
    }

    fn log_path(&self) -> PathBuf {
        if self.folder.is_empty() {
            PathBuf::from(LOG_FILE)
        } else {
            Path::new(&self.folder).join(LOG_FILE)
        }
    }

    /// Open a pass section: `## <note path> [<timestamp>]`.
    pub fn begin_pass(&self, vault: &mut Vault, note: &Path, stamp: DateTime<Local>) -> Result<()> {
        self.write(
            vault,
            &format!(
                "## {} [{}]\n",
                note.display(),
                stamp.format("%Y-%m-%d %H:%M:%S")
            ),
        )
    }

    pub fn record_rename(&self, vault: &mut Vault, old: &str, new: &str) -> Result<()> {
        self.write(vault, &format!("Rename attachment {} to {}\n", old, new))
    }

    pub fn record_copy(&self, vault: &mut Vault, old: &str, new: &str) -> Result<()> {
        self.write(vault, &format!("Copy attachment {} to {}\n", old, new))
    }

    fn write(&self, vault: &mut Vault, line: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let path = self.log_path();
        if !vault.contains(&path) {
            vault.write(&path, LOG_TITLE.as_bytes())?;
        }
        vault.append(&path, line.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::memory::MemoryFileSystem;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn open_vault(fs: MemoryFileSystem) -> Vault {
        Vault::open(PathBuf::from("vault"), Arc::new(fs))
    }

    #[test]
    fn disabled_journal_writes_nothing() {
        let mut vault = open_vault(MemoryFileSystem::new());
        let journal = Journal::disabled();
        journal
            .begin_pass(&mut vault, Path::new("Trip.md"), Local::now())
            .unwrap();
        assert!(!vault.contains(Path::new(LOG_FILE)));
    }

    #[test]
    fn creates_the_log_with_a_title_then_appends() {
        let mut vault = open_vault(MemoryFileSystem::new());
        let journal = Journal::new(&LogSettings {
            enabled: true,
            folder: String::new(),
        });

        let stamp = Local.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        journal
            .begin_pass(&mut vault, Path::new("Trip.md"), stamp)
            .unwrap();
        journal
            .record_rename(&mut vault, "photo.png", "Trip_image_1.png")
            .unwrap();

        let log = vault.read_note(Path::new(LOG_FILE)).unwrap();
        assert!(log.starts_with("# Attachment Name Formatting Log\n"));
        assert!(log.contains("## Trip.md [2026-03-14 15:09:26]\n"));
        assert!(log.contains("Rename attachment photo.png to Trip_image_1.png\n"));
    }

    #[test]
    fn log_lives_in_the_configured_folder() {
        let mut vault = open_vault(MemoryFileSystem::new());
        let journal = Journal::new(&LogSettings {
            enabled: true,
            folder: "meta".to_string(),
        });
        journal
            .record_rename(&mut vault, "a.png", "b.png")
            .unwrap();
        assert!(vault.contains(&Path::new("meta").join(LOG_FILE)));
    }
}
