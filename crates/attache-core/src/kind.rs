use serde::{Deserialize, Serialize};

/// Semantic category of an attachment, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Audio,
    Video,
    Pdf,
}

/// Extensions swept by the unused-attachment job on top of the
/// registry tables.
pub const UNUSED_SWEEP_EXTRA: &[&str] = &["webm"];

impl AttachmentKind {
    /// Bucket iteration order. Sequence numbering walks kinds in this
    /// order, each kind carrying its own counter.
    pub const ALL: [AttachmentKind; 4] = [
        AttachmentKind::Image,
        AttachmentKind::Audio,
        AttachmentKind::Video,
        AttachmentKind::Pdf,
    ];

    /// Recognized extensions for this kind, lowercase, in the order the
    /// per-extension enable flags refer to.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            AttachmentKind::Image => &["png", "jpg", "jpeg", "gif", "bmp", "svg"],
            AttachmentKind::Audio => &["mp3", "wav", "m4a", "ogg", "3gp", "flac"],
            AttachmentKind::Video => &["mp4", "ogv", "mov", "mkv"],
            AttachmentKind::Pdf => &["pdf"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Video => "video",
            AttachmentKind::Pdf => "pdf",
        }
    }

    /// Classify a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<AttachmentKind> {
        let ext = ext.to_ascii_lowercase();
        AttachmentKind::ALL
            .into_iter()
            .find(|kind| kind.extensions().contains(&ext.as_str()))
    }

    /// Position of an extension in this kind's table, for the
    /// per-extension enable flags.
    pub fn extension_index(self, ext: &str) -> Option<usize> {
        let ext = ext.to_ascii_lowercase();
        self.extensions().iter().position(|e| *e == ext)
    }
}

impl std::fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_extensions_case_insensitively() {
        assert_eq!(AttachmentKind::from_extension("png"), Some(AttachmentKind::Image));
        assert_eq!(AttachmentKind::from_extension("PNG"), Some(AttachmentKind::Image));
        assert_eq!(AttachmentKind::from_extension("flac"), Some(AttachmentKind::Audio));
        assert_eq!(AttachmentKind::from_extension("mkv"), Some(AttachmentKind::Video));
        assert_eq!(AttachmentKind::from_extension("pdf"), Some(AttachmentKind::Pdf));
        assert_eq!(AttachmentKind::from_extension("md"), None);
        assert_eq!(AttachmentKind::from_extension("webm"), None);
    }

    #[test]
    fn extension_index_matches_table_order() {
        assert_eq!(AttachmentKind::Image.extension_index("png"), Some(0));
        assert_eq!(AttachmentKind::Image.extension_index("SVG"), Some(5));
        assert_eq!(AttachmentKind::Audio.extension_index("png"), None);
    }
}
