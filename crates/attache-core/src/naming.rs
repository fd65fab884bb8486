use crate::config::{ConnectorScheme, Settings};
use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Boundary positions of the multiple-connector scheme, keyed by the
/// right-hand component.
pub(crate) const BOUNDARY_LABEL: usize = 0;
pub(crate) const BOUNDARY_INDEX: usize = 1;
pub(crate) const BOUNDARY_TIME: usize = 2;
pub(crate) const BOUNDARY_HASH: usize = 3;

/// Builds destination base names for one formatting pass over one note.
///
/// The timestamp component is fixed at construction so every name of
/// the pass carries the same stamp; the path hash is derived from the
/// note's containing folder.
pub struct NamePattern {
    scheme: ConnectorScheme,
    exclude_note_name: bool,
    timestamp: Option<String>,
    path_hash: Option<String>,
}

impl NamePattern {
    pub fn new(settings: &Settings, pass_start: DateTime<Local>, note_folder: &Path) -> Self {
        Self {
            scheme: settings.connector.clone(),
            exclude_note_name: settings.exclude_note_name,
            timestamp: settings
                .include_time
                .then(|| pass_start.format("%Y%m%d%H%M%S").to_string()),
            path_hash: settings
                .include_path_hash
                .then(|| folder_hash(note_folder)),
        }
    }

    /// Produce the destination base name, extension included. The
    /// output carries no path separator: connector and label values are
    /// screened at the settings layer.
    pub fn build(&self, note_title: &str, label: &str, index: usize, extension: &str) -> String {
        let index = index.to_string();

        let mut components: Vec<(usize, &str)> = Vec::with_capacity(5);
        if !self.exclude_note_name {
            // The note title opens the name; BOUNDARY_LABEL sits to its
            // right.
            components.push((usize::MAX, note_title));
        }
        components.push((BOUNDARY_LABEL, label));
        components.push((BOUNDARY_INDEX, &index));
        if let Some(timestamp) = &self.timestamp {
            components.push((BOUNDARY_TIME, timestamp));
        }
        if let Some(hash) = &self.path_hash {
            components.push((BOUNDARY_HASH, hash));
        }

        let mut name = String::new();
        for (position, (boundary, component)) in components.iter().enumerate() {
            if position > 0 {
                name.push_str(self.connector_for(*boundary));
            }
            name.push_str(component);
        }

        name.push('.');
        name.push_str(extension);
        name
    }

    fn connector_for(&self, boundary: usize) -> &str {
        match &self.scheme {
            ConnectorScheme::Single { connector } => connector,
            ConnectorScheme::Multiple { connectors } => {
                let boundary = &connectors[boundary];
                if boundary.enabled {
                    &boundary.value
                } else {
                    ""
                }
            }
        }
    }
}

/// First 8 hex characters of the SHA-256 digest of a folder path.
/// Disambiguates identically named attachments across folders.
pub fn folder_hash(folder: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(folder.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}
