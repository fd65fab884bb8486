use crate::error::{AttacheError, Result};
use crate::kind::AttachmentKind;
use serde::{Deserialize, Serialize};

/// Characters that must never reach a generated file name. Connector
/// and label values are screened against this class here, at the
/// settings layer; the naming engine treats clean inputs as a
/// precondition.
pub const ILLEGAL_CHARS: &[char] = &[
    '|', '<', '>', '?', '*', ':', '/', '\\', '"', '#', '^', '[', ']',
];

fn has_illegal(value: &str) -> bool {
    value.chars().any(|c| ILLEGAL_CHARS.contains(&c))
}

fn default_connector() -> String {
    "_".to_string()
}

/// One inter-component boundary of the multiple-connector scheme. A
/// disabled boundary joins its two components directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryConnector {
    pub value: String,
    pub enabled: bool,
}

impl Default for BoundaryConnector {
    fn default() -> Self {
        Self {
            value: default_connector(),
            enabled: true,
        }
    }
}

/// How name components are joined.
///
/// Multiple-connector boundaries are keyed by their right-hand
/// component: 0 = type label, 1 = sequence index, 2 = timestamp,
/// 3 = path hash. When an optional component is absent its left
/// neighbor joins through the next present boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ConnectorScheme {
    Single {
        #[serde(default = "default_connector")]
        connector: String,
    },
    Multiple {
        #[serde(default)]
        connectors: [BoundaryConnector; 4],
    },
}

impl Default for ConnectorScheme {
    fn default() -> Self {
        ConnectorScheme::Single {
            connector: default_connector(),
        }
    }
}

/// Policy for an attachment already renamed under another note's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharedPolicy {
    /// Always re-rename with the current note's title.
    #[default]
    Default,
    /// Copy the file and rename only the copy into the current scheme.
    Copy,
    /// Leave it alone; no sequence number is consumed.
    NoChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMode {
    #[default]
    Relative,
    Absolute,
}

/// Per-kind settings: enable flag, name-component label,
/// per-extension enable flags (parallel to the registry table, missing
/// entries count as enabled), optional destination subfolder under the
/// note's own folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub extensions: Vec<bool>,
    #[serde(default)]
    pub subfolder: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl KindSettings {
    pub fn for_kind(kind: AttachmentKind) -> Self {
        Self {
            enabled: true,
            label: kind.name().to_string(),
            extensions: vec![true; kind.extensions().len()],
            subfolder: None,
        }
    }

    pub fn extension_enabled(&self, index: usize) -> bool {
        self.extensions.get(index).copied().unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Vault-relative folder holding the log file; empty means the
    /// vault root.
    #[serde(default)]
    pub folder: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Delete bundled attachments (and strip their embeds) after
    /// exporting a note.
    #[serde(default)]
    pub delete_current: bool,
    /// Delete unused attachments after the unused-attachment export.
    #[serde(default)]
    pub delete_unused: bool,
}

/// The persisted configuration object. Serialized wholesale as YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub connector: ConnectorScheme,
    pub include_time: bool,
    pub include_path_hash: bool,
    pub exclude_note_name: bool,
    pub shared_policy: SharedPolicy,
    pub image: KindSettings,
    pub audio: KindSettings,
    pub video: KindSettings,
    pub pdf: KindSettings,
    pub auto_format: bool,
    /// Auto passes skip notes under these vault-relative folders.
    pub excluded_folders: Vec<String>,
    pub log: LogSettings,
    pub export: ExportSettings,
    pub copy_path_mode: PathMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connector: ConnectorScheme::default(),
            include_time: false,
            include_path_hash: false,
            exclude_note_name: false,
            shared_policy: SharedPolicy::Default,
            image: KindSettings::for_kind(AttachmentKind::Image),
            audio: KindSettings::for_kind(AttachmentKind::Audio),
            video: KindSettings::for_kind(AttachmentKind::Video),
            pdf: KindSettings::for_kind(AttachmentKind::Pdf),
            auto_format: true,
            excluded_folders: Vec::new(),
            log: LogSettings::default(),
            export: ExportSettings::default(),
            copy_path_mode: PathMode::default(),
        }
    }
}

impl Settings {
    /// Parse from YAML, then normalize and sanitize. Absent fields take
    /// defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut settings: Settings = serde_yaml::from_str(content)?;
        settings.normalize();
        settings.sanitize();
        Ok(settings)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn kind(&self, kind: AttachmentKind) -> &KindSettings {
        match kind {
            AttachmentKind::Image => &self.image,
            AttachmentKind::Audio => &self.audio,
            AttachmentKind::Video => &self.video,
            AttachmentKind::Pdf => &self.pdf,
        }
    }

    pub fn kind_mut(&mut self, kind: AttachmentKind) -> &mut KindSettings {
        match kind {
            AttachmentKind::Image => &mut self.image,
            AttachmentKind::Audio => &mut self.audio,
            AttachmentKind::Video => &mut self.video,
            AttachmentKind::Pdf => &mut self.pdf,
        }
    }

    /// Enforce cross-field invariants: a scheme without the note name
    /// must carry a timestamp, and the shared policy falls back to
    /// `Default` (the other policies need the note-name segment to
    /// disambiguate).
    pub fn normalize(&mut self) {
        if self.exclude_note_name {
            if !self.include_time {
                log::warn!("exclude_note_name requires a timestamp; forcing include_time on");
                self.include_time = true;
            }
            if self.shared_policy != SharedPolicy::Default {
                log::warn!("exclude_note_name resets shared_policy to default");
                self.shared_policy = SharedPolicy::Default;
            }
        }
    }

    /// Replace illegal or empty connector and label values with their
    /// defaults.
    pub fn sanitize(&mut self) {
        match &mut self.connector {
            ConnectorScheme::Single { connector } => {
                if connector.is_empty() || has_illegal(connector) {
                    log::warn!("connector {:?} rejected, reverting to default", connector);
                    *connector = default_connector();
                }
            }
            ConnectorScheme::Multiple { connectors } => {
                for boundary in connectors.iter_mut() {
                    if boundary.value.is_empty() || has_illegal(&boundary.value) {
                        log::warn!(
                            "connector {:?} rejected, reverting to default",
                            boundary.value
                        );
                        boundary.value = default_connector();
                    }
                }
            }
        }

        for kind in AttachmentKind::ALL {
            let ks = self.kind_mut(kind);
            if ks.label.is_empty() || has_illegal(&ks.label) {
                log::warn!("label {:?} rejected, reverting to {:?}", ks.label, kind.name());
                ks.label = kind.name().to_string();
            }
            if let Some(subfolder) = &ks.subfolder {
                if subfolder.is_empty() || has_illegal(subfolder) {
                    log::warn!("subfolder {:?} rejected, cleared", subfolder);
                    ks.subfolder = None;
                }
            }
        }
    }

    /// Change one setting by key. Connector and label values carrying
    /// filesystem-illegal characters are rejected with
    /// `IllegalSetting`; the stored value is left untouched so callers
    /// can decide whether to fall back via [`Settings::reset`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "connector" => {
                if has_illegal(value) {
                    return Err(illegal(key, value));
                }
                let connector = if value.is_empty() {
                    default_connector()
                } else {
                    value.to_string()
                };
                self.connector = ConnectorScheme::Single { connector };
            }
            "connector-mode" => match value {
                "single" => self.connector = ConnectorScheme::default(),
                "multiple" => {
                    self.connector = ConnectorScheme::Multiple {
                        connectors: Default::default(),
                    }
                }
                _ => return Err(invalid(key, value)),
            },
            "include-time" => self.include_time = parse_bool(key, value)?,
            "include-path-hash" => self.include_path_hash = parse_bool(key, value)?,
            "exclude-note-name" => self.exclude_note_name = parse_bool(key, value)?,
            "shared-policy" => {
                self.shared_policy = match value {
                    "default" => SharedPolicy::Default,
                    "copy" => SharedPolicy::Copy,
                    "nochange" => SharedPolicy::NoChange,
                    _ => return Err(invalid(key, value)),
                }
            }
            "auto-format" => self.auto_format = parse_bool(key, value)?,
            "copy-path-mode" => {
                self.copy_path_mode = match value {
                    "relative" => PathMode::Relative,
                    "absolute" => PathMode::Absolute,
                    _ => return Err(invalid(key, value)),
                }
            }
            "log-enabled" => self.log.enabled = parse_bool(key, value)?,
            "log-folder" => self.log.folder = value.to_string(),
            "export-delete-current" => self.export.delete_current = parse_bool(key, value)?,
            "export-delete-unused" => self.export.delete_unused = parse_bool(key, value)?,
            _ => {
                let Some((kind, field)) = parse_kind_key(key) else {
                    return Err(AttacheError::UnknownSetting(key.to_string()));
                };
                match field {
                    "label" => {
                        if has_illegal(value) {
                            return Err(illegal(key, value));
                        }
                        let ks = self.kind_mut(kind);
                        ks.label = if value.is_empty() {
                            kind.name().to_string()
                        } else {
                            value.to_string()
                        };
                    }
                    "enabled" => self.kind_mut(kind).enabled = parse_bool(key, value)?,
                    "subfolder" => {
                        if has_illegal(value) {
                            return Err(illegal(key, value));
                        }
                        self.kind_mut(kind).subfolder = if value.is_empty() {
                            None
                        } else {
                            Some(value.to_string())
                        };
                    }
                    _ => return Err(AttacheError::UnknownSetting(key.to_string())),
                }
            }
        }
        self.normalize();
        Ok(())
    }

    /// Revert one setting to its default value.
    pub fn reset(&mut self, key: &str) -> Result<()> {
        let defaults = Settings::default();
        match key {
            "connector" | "connector-mode" => self.connector = defaults.connector,
            "include-time" => self.include_time = defaults.include_time,
            "include-path-hash" => self.include_path_hash = defaults.include_path_hash,
            "exclude-note-name" => self.exclude_note_name = defaults.exclude_note_name,
            "shared-policy" => self.shared_policy = defaults.shared_policy,
            "auto-format" => self.auto_format = defaults.auto_format,
            "copy-path-mode" => self.copy_path_mode = defaults.copy_path_mode,
            "log-enabled" => self.log.enabled = defaults.log.enabled,
            "log-folder" => self.log.folder = defaults.log.folder,
            "export-delete-current" => self.export.delete_current = defaults.export.delete_current,
            "export-delete-unused" => self.export.delete_unused = defaults.export.delete_unused,
            _ => {
                let Some((kind, field)) = parse_kind_key(key) else {
                    return Err(AttacheError::UnknownSetting(key.to_string()));
                };
                let default_ks = KindSettings::for_kind(kind);
                let ks = self.kind_mut(kind);
                match field {
                    "label" => ks.label = default_ks.label,
                    "enabled" => ks.enabled = default_ks.enabled,
                    "subfolder" => ks.subfolder = default_ks.subfolder,
                    _ => return Err(AttacheError::UnknownSetting(key.to_string())),
                }
            }
        }
        self.normalize();
        Ok(())
    }

    /// Render one setting by key.
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "connector" => match &self.connector {
                ConnectorScheme::Single { connector } => connector.clone(),
                ConnectorScheme::Multiple { connectors } => connectors
                    .iter()
                    .map(|b| if b.enabled { b.value.as_str() } else { "" })
                    .collect::<Vec<_>>()
                    .join(","),
            },
            "connector-mode" => match &self.connector {
                ConnectorScheme::Single { .. } => "single".to_string(),
                ConnectorScheme::Multiple { .. } => "multiple".to_string(),
            },
            "include-time" => self.include_time.to_string(),
            "include-path-hash" => self.include_path_hash.to_string(),
            "exclude-note-name" => self.exclude_note_name.to_string(),
            "shared-policy" => match self.shared_policy {
                SharedPolicy::Default => "default".to_string(),
                SharedPolicy::Copy => "copy".to_string(),
                SharedPolicy::NoChange => "nochange".to_string(),
            },
            "auto-format" => self.auto_format.to_string(),
            "copy-path-mode" => match self.copy_path_mode {
                PathMode::Relative => "relative".to_string(),
                PathMode::Absolute => "absolute".to_string(),
            },
            "log-enabled" => self.log.enabled.to_string(),
            "log-folder" => self.log.folder.clone(),
            "export-delete-current" => self.export.delete_current.to_string(),
            "export-delete-unused" => self.export.delete_unused.to_string(),
            _ => {
                let Some((kind, field)) = parse_kind_key(key) else {
                    return Err(AttacheError::UnknownSetting(key.to_string()));
                };
                let ks = self.kind(kind);
                match field {
                    "label" => ks.label.clone(),
                    "enabled" => ks.enabled.to_string(),
                    "subfolder" => ks.subfolder.clone().unwrap_or_default(),
                    _ => return Err(AttacheError::UnknownSetting(key.to_string())),
                }
            }
        };
        Ok(value)
    }
}

fn parse_kind_key(key: &str) -> Option<(AttachmentKind, &str)> {
    let (kind, field) = key.split_once('.')?;
    let kind = AttachmentKind::ALL
        .into_iter()
        .find(|k| k.name() == kind)?;
    Some((kind, field))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value.parse().map_err(|_| invalid(key, value))
}

fn illegal(field: &str, value: &str) -> AttacheError {
    AttacheError::IllegalSetting {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn invalid(key: &str, value: &str) -> AttacheError {
    AttacheError::InvalidSettingValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_yaml() {
        let settings = Settings::default();
        let yaml = settings.to_yaml().unwrap();
        let parsed = Settings::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let parsed = Settings::from_yaml("{}").unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn connector_with_path_separator_is_rejected() {
        let mut settings = Settings::default();
        let err = settings.set("connector", "a/b").unwrap_err();
        assert!(matches!(err, AttacheError::IllegalSetting { .. }));
        // Value untouched; reset falls back to the default.
        settings.reset("connector").unwrap();
        assert_eq!(settings.get("connector").unwrap(), "_");
    }

    #[test]
    fn illegal_connector_in_file_reverts_to_default() {
        let settings = Settings::from_yaml("connector:\n  mode: single\n  connector: 'a|b'\n").unwrap();
        assert_eq!(settings.get("connector").unwrap(), "_");
    }

    #[test]
    fn exclude_note_name_forces_time_and_default_policy() {
        let mut settings = Settings::default();
        settings.set("shared-policy", "copy").unwrap();
        settings.set("exclude-note-name", "true").unwrap();
        assert!(settings.include_time);
        assert_eq!(settings.shared_policy, SharedPolicy::Default);
        // And include-time cannot be turned back off while active.
        settings.set("include-time", "false").unwrap();
        assert!(settings.include_time);
    }

    #[test]
    fn kind_keys_address_typed_settings() {
        let mut settings = Settings::default();
        settings.set("image.label", "img").unwrap();
        settings.set("pdf.enabled", "false").unwrap();
        settings.set("audio.subfolder", "media").unwrap();
        assert_eq!(settings.kind(AttachmentKind::Image).label, "img");
        assert!(!settings.kind(AttachmentKind::Pdf).enabled);
        assert_eq!(
            settings.kind(AttachmentKind::Audio).subfolder.as_deref(),
            Some("media")
        );
        assert!(settings.set("gif.label", "x").is_err());
    }

    #[test]
    fn empty_label_falls_back_to_kind_name() {
        let mut settings = Settings::default();
        settings.set("image.label", "").unwrap();
        assert_eq!(settings.kind(AttachmentKind::Image).label, "image");
    }
}
