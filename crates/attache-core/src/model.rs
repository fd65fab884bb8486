use std::ops::Range;
use std::path::{Path, PathBuf};

/// A link token discovered in a note's parsed content.
///
/// Re-derived from the current note source on every formatting pass,
/// never cached across passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRef {
    /// The link target as written, e.g. `photos/shot 1.png`.
    pub link: String,
    /// Exact source text of the embed, e.g. `![[photos/shot 1.png]]`.
    pub raw: String,
    /// Byte range of `raw` in the note source.
    pub span: Range<usize>,
}

/// An embed bound to a concrete file in the vault tree.
///
/// Transient, scoped to one formatting pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    /// Vault-relative path.
    pub path: PathBuf,
    /// Base name with extension.
    pub name: String,
    /// Base name without extension.
    pub stem: String,
    pub extension: String,
}

impl ResolvedAttachment {
    /// Bind a vault-relative path. Files without an extension are not
    /// attachments.
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_string();
        let stem = path.file_stem()?.to_string_lossy().to_string();
        let extension = path.extension()?.to_string_lossy().to_string();
        Some(Self {
            path,
            name,
            stem,
            extension,
        })
    }

    /// Folder containing the attachment, vault-relative.
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}
