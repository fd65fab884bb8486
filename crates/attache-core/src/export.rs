use crate::config::Settings;
use crate::error::Result;
use crate::kind::{AttachmentKind, UNUSED_SWEEP_EXTRA};
use crate::model::{EmbedRef, ResolvedAttachment};
use crate::parser;
use crate::vault::Vault;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Result of an export job.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Vault-relative archive path; `None` when nothing was bundled.
    pub archive: Option<PathBuf>,
    pub bundled: usize,
    pub deleted: usize,
}

/// Bundle every embedded attachment of one note into
/// `<note stem>_Attachments.tar.gz` at the vault root, entries grouped
/// under their kind name. With `delete_current`, the bundled
/// attachments are deleted afterwards and their embeds stripped from
/// the note.
pub fn export_note(vault: &mut Vault, settings: &Settings, note: &Path) -> Result<ExportOutcome> {
    let content = vault.read_note(note)?;

    let mut bundled: Vec<(AttachmentKind, ResolvedAttachment)> = Vec::new();
    let mut matched: Vec<EmbedRef> = Vec::new();
    for embed in parser::parse_embeds(&content) {
        let Some(kind) = kind_of_link(&embed.link) else {
            continue;
        };
        let Some(attachment) = vault.resolve_attachment(&embed) else {
            continue;
        };
        matched.push(embed);
        if !bundled.iter().any(|(_, seen)| seen.path == attachment.path) {
            bundled.push((kind, attachment));
        }
    }

    if bundled.is_empty() {
        log::debug!("no attachments found in {}", note.display());
        return Ok(ExportOutcome::default());
    }

    let mut archive = ArchiveBuilder::new();
    for (kind, attachment) in &bundled {
        let data = vault.read(&attachment.path)?;
        archive.add(format!("{}/{}", kind.name(), attachment.name), &data)?;
    }

    let stem = note
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let archive_path = PathBuf::from(format!("{}_Attachments.tar.gz", stem));
    vault.write(&archive_path, &archive.finish()?)?;
    log::info!("exported {} attachments to {}", bundled.len(), archive_path.display());

    let mut deleted = 0;
    if settings.export.delete_current {
        let mut content = content;
        for embed in &matched {
            content = content.replacen(&embed.raw, "", 1);
        }
        for (_, attachment) in &bundled {
            vault.remove_file(&attachment.path)?;
            deleted += 1;
        }
        vault.write(note, content.as_bytes())?;
    }

    Ok(ExportOutcome {
        archive: Some(archive_path),
        bundled: bundled.len(),
        deleted,
    })
}

/// Sweep every attachment-kind file no note embeds into
/// `Unused_Attachments.tar.gz`. With `delete_unused`, the swept files
/// are deleted afterwards.
pub fn export_unused(vault: &mut Vault, settings: &Settings) -> Result<ExportOutcome> {
    let mut candidates: BTreeSet<PathBuf> = vault
        .files()
        .filter(|path| is_sweepable(path))
        .cloned()
        .collect();

    // Drop everything still referenced; unresolved embeds are skipped.
    for note in vault.notes() {
        let Ok(content) = vault.read_note(&note) else {
            continue;
        };
        for embed in parser::parse_embeds(&content) {
            if let Some(attachment) = vault.resolve_attachment(&embed) {
                candidates.remove(&attachment.path);
            }
        }
    }

    if candidates.is_empty() {
        log::debug!("no unused attachments found");
        return Ok(ExportOutcome::default());
    }

    let mut archive = ArchiveBuilder::new();
    for path in &candidates {
        let data = vault.read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        archive.add(name, &data)?;
    }

    let archive_path = PathBuf::from("Unused_Attachments.tar.gz");
    vault.write(&archive_path, &archive.finish()?)?;
    log::info!(
        "exported {} unused attachments to {}",
        candidates.len(),
        archive_path.display()
    );

    let mut deleted = 0;
    if settings.export.delete_unused {
        for path in &candidates {
            vault.remove_file(path)?;
            deleted += 1;
        }
    }

    Ok(ExportOutcome {
        archive: Some(archive_path),
        bundled: candidates.len(),
        deleted,
    })
}

fn kind_of_link(link: &str) -> Option<AttachmentKind> {
    AttachmentKind::from_extension(&parser::link_extension(link)?)
}

fn is_sweepable(path: &Path) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };
    let ext = ext.to_string_lossy().to_ascii_lowercase();
    AttachmentKind::from_extension(&ext).is_some() || UNUSED_SWEEP_EXTRA.contains(&ext.as_str())
}

/// Gzip tarball accumulated in memory, written out through the vault.
struct ArchiveBuilder {
    tar: tar::Builder<GzEncoder<Vec<u8>>>,
}

impl ArchiveBuilder {
    fn new() -> Self {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        Self {
            tar: tar::Builder::new(encoder),
        }
    }

    fn add(&mut self, name: String, data: &[u8]) -> std::io::Result<()> {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        self.tar.append_data(&mut header, name, data)
    }

    fn finish(self) -> std::io::Result<Vec<u8>> {
        let encoder = self.tar.into_inner()?;
        encoder.finish()
    }
}
