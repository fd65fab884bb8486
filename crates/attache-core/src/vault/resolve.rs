use super::Vault;
use crate::model::{EmbedRef, ResolvedAttachment};
use std::path::{Path, PathBuf};

impl Vault {
    /// Resolve an embed to a concrete file in the tree. `None` means
    /// the link maps to nothing; callers skip the embed and tolerate
    /// partial lists.
    pub fn resolve_attachment(&self, embed: &EmbedRef) -> Option<ResolvedAttachment> {
        self.resolve_link(&embed.link)
            .and_then(ResolvedAttachment::from_path)
    }

    /// Resolve a raw link target to a vault-relative path: direct
    /// lookup first, then best match by base name (the shortest path
    /// wins, mirroring how the host metadata layer picks a
    /// destination).
    pub fn resolve_link(&self, link: &str) -> Option<PathBuf> {
        let target = normalize_link(link);
        if target.is_empty() {
            return None;
        }

        let direct = PathBuf::from(&target);
        if self.files.contains(&direct) {
            return Some(direct);
        }

        let name = Path::new(&target).file_name()?.to_string_lossy().to_string();
        self.files
            .by_name(&name)
            .iter()
            .min_by_key(|p| (p.components().count(), p.as_os_str().len()))
            .cloned()
    }
}

/// Reduce a link target as written to a bare vault path: strip
/// relative-path prefixes, decode percent-encoding, drop any
/// `#anchor` or `|alias` suffix.
fn normalize_link(link: &str) -> String {
    let mut target = link.trim();
    loop {
        if let Some(rest) = target.strip_prefix("./") {
            target = rest;
        } else if let Some(rest) = target.strip_prefix("../") {
            target = rest;
        } else {
            break;
        }
    }

    let target = match urlencoding::decode(target) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => target.to_string(),
    };

    let target = target.split('#').next().unwrap_or_default();
    let target = target.split('|').next().unwrap_or_default();
    target.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefixes_and_suffixes() {
        assert_eq!(normalize_link("./photo.png"), "photo.png");
        assert_eq!(normalize_link("../../photo.png"), "photo.png");
        assert_eq!(normalize_link("shot%201.png"), "shot 1.png");
        assert_eq!(normalize_link("doc.pdf#page=3"), "doc.pdf");
        assert_eq!(normalize_link("photo.png|200"), "photo.png");
        assert_eq!(normalize_link("  photo.png "), "photo.png");
    }
}
